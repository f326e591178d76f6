//! Configuration persistence for editor defaults

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{Color, Point, TextStyle};

/// Stamp presets offered by the stamp tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StampPreset {
    Approved,
    Confidential,
    Draft,
}

impl StampPreset {
    pub fn label(self) -> &'static str {
        match self {
            StampPreset::Approved => "APPROVED",
            StampPreset::Confidential => "CONFIDENTIAL",
            StampPreset::Draft => "DRAFT",
        }
    }

    pub fn color(self) -> Color {
        match self {
            StampPreset::Approved => Color::rgb(0x16, 0xa3, 0x4a),
            StampPreset::Confidential => Color::rgb(0xdc, 0x26, 0x26),
            StampPreset::Draft => Color::rgb(0x6b, 0x72, 0x80),
        }
    }
}

/// Editor configuration persisted between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Pen color for freehand and highlight strokes
    pub pen_color: Color,
    /// Freehand stroke width in page pixels
    pub pen_width: f32,
    /// Global opacity control (freehand, whiteout and new text)
    pub opacity: f32,
    /// Style for newly placed text
    pub text_style: TextStyle,
    /// Content of a freshly placed text object
    pub placeholder_text: String,
    /// Where placed images land
    pub image_anchor: Point,
    /// Where stamps land (baseline)
    pub stamp_anchor: Point,
    /// Font size for stamps
    pub stamp_font_size: f32,
    /// Placed images are downscaled so neither side exceeds this
    pub max_image_dimension: f32,
    /// Font family name -> font file
    pub fonts: BTreeMap<String, PathBuf>,
    /// Program (and arguments) used as the language model; reads the
    /// prompt on stdin and answers on stdout
    pub language_model_command: Vec<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            pen_color: Color::BLACK,
            pen_width: 3.0,
            opacity: 1.0,
            text_style: TextStyle::default(),
            placeholder_text: "New Text".to_string(),
            image_anchor: Point::new(100.0, 100.0),
            stamp_anchor: Point::new(100.0, 150.0),
            stamp_font_size: 48.0,
            max_image_dimension: 300.0,
            fonts: BTreeMap::new(),
            language_model_command: Vec::new(),
        }
    }
}

impl EditorConfig {
    /// Directory name under the platform config dir
    pub const ID: &'static str = "inkpage";

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::ID).join("config.json"))
    }

    /// Load configuration from disk, or return defaults if unavailable
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            log::warn!("Could not determine config directory, using defaults");
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Error loading config, using defaults: {:?}", err);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Save configuration to disk
    pub fn save(&self) {
        let Some(path) = Self::default_path() else {
            log::error!("Could not determine config directory for saving");
            return;
        };
        if let Err(err) = self.save_to(&path) {
            log::error!("Failed to save config: {:?}", err);
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("cannot write {}", path.display()))
    }
}
