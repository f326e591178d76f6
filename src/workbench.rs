//! Asynchronous driver for one editing session
//!
//! The workbench owns the editor together with the collaborators it needs.
//! Editor handlers stay synchronous; the three suspending operations (text
//! layout lookup, language model call, export) are awaited here. Only
//! loading and exporting report failure to the caller.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use image::RgbaImage;

use crate::annotations::handle_editor_msg;
use crate::assist::{self, AssistReport};
use crate::config::EditorConfig;
use crate::domain::{ImageSource, ObjectId};
use crate::export::{self, ExportReport};
use crate::render::FontBook;
use crate::services::{
    DocumentEncoder, DocumentSource, LanguageModel, PageRasterizer, TextLayoutService,
};
use crate::session::{Editor, EditorMsg, Effect};

/// The collaborators a workbench talks to
#[derive(Debug, Clone)]
pub struct Collaborators<R, T, E, M> {
    pub rasterizer: R,
    pub layout: T,
    pub encoder: E,
    pub model: M,
}

pub struct Workbench<R, T, E, M> {
    source: DocumentSource,
    backgrounds: Vec<Arc<RgbaImage>>,
    editor: Editor,
    fonts: FontBook,
    services: Collaborators<R, T, E, M>,
}

impl<R, T, E, M> Workbench<R, T, E, M>
where
    R: PageRasterizer,
    T: TextLayoutService,
    E: DocumentEncoder,
    M: LanguageModel,
{
    /// Rasterize `source` and open a fresh editing session on it
    pub async fn load_document(
        source: DocumentSource,
        config: &EditorConfig,
        services: Collaborators<R, T, E, M>,
    ) -> Result<Self> {
        let fonts = FontBook::load(&config.fonts);
        Self::load_with_fonts(source, config, services, fonts).await
    }

    /// Like [`Workbench::load_document`] with an explicit font book
    pub async fn load_with_fonts(
        source: DocumentSource,
        config: &EditorConfig,
        services: Collaborators<R, T, E, M>,
        fonts: FontBook,
    ) -> Result<Self> {
        let pages = match rasterize(&services.rasterizer, &source).await {
            Ok(pages) => pages,
            Err(e) => {
                log::error!("Cannot render {}: {:#}", source.name(), e);
                return Err(e.context("failed to render document"));
            }
        };
        let page_sizes = pages.iter().map(|p| p.dimensions()).collect();
        log::info!("Loaded {} with {} pages", source.name(), pages.len());
        Ok(Self {
            source,
            backgrounds: pages.into_iter().map(Arc::new).collect(),
            editor: Editor::new(page_sizes, config),
            fonts,
            services,
        })
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub fn source(&self) -> &DocumentSource {
        &self.source
    }

    pub fn page_count(&self) -> usize {
        self.backgrounds.len()
    }

    pub fn background(&self, page: usize) -> Option<&Arc<RgbaImage>> {
        self.backgrounds.get(page)
    }

    /// Handle one editor message, resolving any follow-up work it needs
    pub async fn dispatch(&mut self, msg: EditorMsg) -> Option<ObjectId> {
        let effect = handle_editor_msg(&mut self.editor, msg);
        self.resolve(effect).await
    }

    /// Carry out an effect; returns the text object an edit-text click made
    pub async fn resolve(&mut self, effect: Effect) -> Option<ObjectId> {
        match effect {
            Effect::None => None,
            Effect::QueryTextLayout { page, point } => {
                let runs = match self.services.layout.text_runs(&self.source, page).await {
                    Ok(runs) => runs,
                    Err(e) => {
                        log::warn!("Text layout lookup for page {} failed: {:#}", page, e);
                        Vec::new()
                    }
                };
                self.editor.apply_text_layout(page, point, &runs)
            }
        }
    }

    /// Place an image file picked by the user; unreadable files are ignored
    pub async fn place_image_file(&mut self, path: &Path) -> Option<ObjectId> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Cannot read image {}: {}", path.display(), e);
                return None;
            }
        };
        let probed = tokio::task::spawn_blocking(move || ImageSource::probe(bytes)).await;
        match probed {
            Ok(Ok(source)) => Some(self.editor.place_image(source)),
            Ok(Err(e)) => {
                log::warn!("Ignoring {}: {:#}", path.display(), e);
                None
            }
            Err(e) => {
                log::warn!("Image probe for {} failed: {}", path.display(), e);
                None
            }
        }
    }

    /// Run a free-text instruction against the active page
    pub async fn apply_instruction(&mut self, instruction: &str) -> AssistReport {
        assist::run_instruction(&mut self.editor, &self.services.model, instruction).await
    }

    /// Flatten changed pages and encode the final document
    pub async fn export(&self) -> Result<ExportReport> {
        let result = export::export_document(
            self.editor.store(),
            &self.backgrounds,
            &self.fonts,
            &self.source,
            &self.services.encoder,
        )
        .await;
        result.map_err(|e| {
            log::error!("Cannot export {}: {:#}", self.source.name(), e);
            e.context("failed to export document")
        })
    }

    /// Export and write the result to `path`
    ///
    /// Nothing is written unless encoding succeeded.
    pub async fn export_to(&self, path: &Path) -> Result<ExportReport> {
        let report = self.export().await?;
        tokio::fs::write(path, &report.bytes)
            .await
            .with_context(|| format!("cannot write {}", path.display()))?;
        log::info!("Wrote {} ({} bytes)", path.display(), report.bytes.len());
        Ok(report)
    }
}

async fn rasterize<R: PageRasterizer>(
    rasterizer: &R,
    source: &DocumentSource,
) -> Result<Vec<RgbaImage>> {
    let pages = rasterizer.rasterize(source).await?;
    if pages.is_empty() {
        bail!("{} has no pages", source.name());
    }
    if let Some(index) = pages.iter().position(|p| p.width() == 0 || p.height() == 0) {
        bail!("page {} of {} is empty", index, source.name());
    }
    Ok(pages)
}
