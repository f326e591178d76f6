//! External collaborators consumed by the editing engine
//!
//! The engine never rasterizes, lays out, re-encodes or generates text by
//! itself. Each of those jobs sits behind one of the traits below; the
//! submodules hold file- and process-backed implementations used by the
//! command-line front-end.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

pub mod layout;
pub mod llm;
pub mod pdf;
pub mod raster;

pub use layout::JsonLayoutService;
pub use llm::CommandLanguageModel;
pub use pdf::PdfImageEncoder;
pub use raster::ImageDirRasterizer;

/// A loaded source document
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// A document on disk
    Path(PathBuf),
    /// A document held in memory
    Bytes { name: String, bytes: Arc<[u8]> },
}

impl DocumentSource {
    /// File system location, if the document has one
    pub fn path(&self) -> Option<&Path> {
        match self {
            DocumentSource::Path(path) => Some(path),
            DocumentSource::Bytes { .. } => None,
        }
    }

    /// Human-readable name used in logs
    pub fn name(&self) -> String {
        match self {
            DocumentSource::Path(path) => path.display().to_string(),
            DocumentSource::Bytes { name, .. } => name.clone(),
        }
    }
}

/// One positioned run of text on a rasterized page
///
/// Position and size are in page pixels; `font_size` is in document units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(alias = "fontSize")]
    pub font_size: f32,
}

/// A page bitmap with its overlays burned in
#[derive(Debug, Clone)]
pub struct FlattenedPage {
    pub page_index: usize,
    pub bitmap: RgbaImage,
}

/// Turns a document into one bitmap per page
#[allow(async_fn_in_trait)]
pub trait PageRasterizer {
    async fn rasterize(&self, source: &DocumentSource) -> Result<Vec<RgbaImage>>;
}

/// Looks up the text runs of a page
#[allow(async_fn_in_trait)]
pub trait TextLayoutService {
    async fn text_runs(&self, source: &DocumentSource, page: usize) -> Result<Vec<TextRun>>;
}

/// Produces the final document from the source and the changed pages
///
/// `pages` only holds pages with overlay content, in ascending page order.
/// Every other page must be carried over from `source` untouched.
#[allow(async_fn_in_trait)]
pub trait DocumentEncoder {
    async fn encode(&self, source: &DocumentSource, pages: Vec<FlattenedPage>) -> Result<Vec<u8>>;
}

/// Free-text completion
#[allow(async_fn_in_trait)]
pub trait LanguageModel {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// An unconfigured model fails every request
impl<M: LanguageModel> LanguageModel for Option<M> {
    async fn complete(&self, prompt: &str) -> Result<String> {
        match self {
            Some(model) => model.complete(prompt).await,
            None => anyhow::bail!("no language model configured"),
        }
    }
}
