//! Rasterizer for documents that already are images
//!
//! A document is either a single image file or a directory of page images,
//! ordered by file name.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use image::RgbaImage;

use super::{DocumentSource, PageRasterizer};

const PAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp"];

#[derive(Debug, Clone, Copy, Default)]
pub struct ImageDirRasterizer;

impl ImageDirRasterizer {
    /// Page image files of a directory, sorted by name
    pub async fn page_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .with_context(|| format!("cannot list {}", dir.display()))?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_page = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| PAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
            if is_page {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

async fn decode_file(path: PathBuf) -> Result<RgbaImage> {
    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    tokio::task::spawn_blocking(move || -> Result<RgbaImage> {
        let img = image::load_from_memory(&bytes)
            .with_context(|| format!("cannot decode {}", path.display()))?;
        Ok(img.to_rgba8())
    })
    .await?
}

impl PageRasterizer for ImageDirRasterizer {
    async fn rasterize(&self, source: &DocumentSource) -> Result<Vec<RgbaImage>> {
        match source {
            DocumentSource::Bytes { name, bytes } => {
                let bytes = bytes.clone();
                let page = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
                    .await?
                    .with_context(|| format!("cannot decode {}", name))?;
                Ok(vec![page.to_rgba8()])
            }
            DocumentSource::Path(path) => {
                let meta = tokio::fs::metadata(path)
                    .await
                    .with_context(|| format!("cannot open {}", path.display()))?;
                if !meta.is_dir() {
                    return Ok(vec![decode_file(path.clone()).await?]);
                }
                let files = Self::page_files(path).await?;
                if files.is_empty() {
                    bail!("no page images in {}", path.display());
                }
                let mut pages = Vec::with_capacity(files.len());
                for file in files {
                    pages.push(decode_file(file).await?);
                }
                log::info!("Rasterized {} pages from {}", pages.len(), path.display());
                Ok(pages)
            }
        }
    }
}
