//! Text layout from a JSON sidecar
//!
//! The sidecar maps page indices to runs:
//! `{"0": [{"text": "...", "x": 0, "y": 0, "width": 0, "height": 0, "fontSize": 12}]}`

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use super::{DocumentSource, TextLayoutService, TextRun};

/// File name looked up next to a document
pub const SIDECAR_NAME: &str = "layout.json";

pub type PageLayouts = BTreeMap<usize, Vec<TextRun>>;

#[derive(Debug, Clone, Default)]
pub struct JsonLayoutService {
    /// Explicit sidecar; otherwise it is looked up next to the document
    sidecar: Option<PathBuf>,
}

impl JsonLayoutService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sidecar(path: impl Into<PathBuf>) -> Self {
        Self {
            sidecar: Some(path.into()),
        }
    }

    fn sidecar_for(&self, source: &DocumentSource) -> Option<PathBuf> {
        if let Some(path) = &self.sidecar {
            return Some(path.clone());
        }
        let path = source.path()?;
        if path.is_dir() {
            Some(path.join(SIDECAR_NAME))
        } else {
            path.parent().map(|dir| dir.join(SIDECAR_NAME))
        }
    }

    pub fn parse(json: &str) -> Result<PageLayouts> {
        serde_json::from_str(json).context("malformed layout sidecar")
    }
}

impl TextLayoutService for JsonLayoutService {
    async fn text_runs(&self, source: &DocumentSource, page: usize) -> Result<Vec<TextRun>> {
        let Some(path) = self.sidecar_for(source) else {
            bail!("no layout sidecar for {}", source.name());
        };
        let json = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("cannot read {}", path.display()))?;
        let mut layouts = Self::parse(&json)?;
        Ok(layouts.remove(&page).unwrap_or_default())
    }
}
