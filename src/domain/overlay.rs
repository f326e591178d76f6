//! Overlay object types placed above a page's background bitmap
//!
//! All coordinates are page-bitmap pixels. Numeric style fields are clamped
//! whenever they are written, so an out-of-range object cannot exist.

use std::sync::Arc;

use anyhow::{Context, Result};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use super::color::Color;
use super::geometry::{Point, Rect};

/// Identity of a text, image or redaction object within one document
pub type ObjectId = u64;

pub const FONT_SIZE_MIN: f32 = 8.0;
pub const FONT_SIZE_MAX: f32 = 300.0;
pub const OPACITY_MIN: f32 = 0.1;
pub const OPACITY_MAX: f32 = 1.0;

/// Average glyph advance as a fraction of the font size, used wherever text
/// width has to be estimated without a font
pub const CHAR_WIDTH_FACTOR: f32 = 0.6;
/// Distance from the baseline up to the visual top of a text run, as a
/// fraction of the font size
pub const ASCENT_FACTOR: f32 = 0.8;

pub fn clamp_font_size(size: f32) -> f32 {
    if size.is_nan() {
        return FONT_SIZE_MIN;
    }
    size.clamp(FONT_SIZE_MIN, FONT_SIZE_MAX)
}

pub fn clamp_opacity(opacity: f32) -> f32 {
    if opacity.is_nan() {
        return OPACITY_MAX;
    }
    opacity.clamp(OPACITY_MIN, OPACITY_MAX)
}

/// Estimated rendered width of `text` at `font_size`
pub fn estimate_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * CHAR_WIDTH_FACTOR
}

/// Kinds of object that can be selected, moved and reordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Text,
    Image,
}

/// The stroke tool that produced a drawing path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathTool {
    Freehand,
    Highlight,
    Whiteout,
}

/// Compositing mode for a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaintMode {
    #[default]
    Normal,
    /// Darkens what is underneath instead of covering it (highlighter)
    Multiply,
}

/// One committed (or in-progress) freehand stroke
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrawingPath {
    /// Never empty: a path always starts with its pointer-down position
    points: Vec<Point>,
    pub tool: PathTool,
    pub color: Color,
    pub width: f32,
    pub opacity: f32,
    pub paint_mode: PaintMode,
}

impl DrawingPath {
    pub fn new(
        start: Point,
        tool: PathTool,
        color: Color,
        width: f32,
        opacity: f32,
        paint_mode: PaintMode,
    ) -> Self {
        Self {
            points: vec![start],
            tool,
            color,
            width: width.max(0.5),
            opacity: opacity.clamp(0.0, 1.0),
            paint_mode,
        }
    }

    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Highlight strokes use square caps, everything else is rounded
    pub fn square_caps(&self) -> bool {
        self.tool == PathTool::Highlight
    }
}

/// Editable text run anchored at its baseline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextObject {
    pub id: ObjectId,
    /// Left edge of the run
    pub x: f32,
    /// Baseline
    pub y: f32,
    pub text: String,
    pub font_family: String,
    font_size: f32,
    pub color: Color,
    /// Background highlight; transparent means none
    #[serde(default = "transparent")]
    pub background: Color,
    opacity: f32,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub locked: bool,
}

fn transparent() -> Color {
    Color::TRANSPARENT
}

/// Style applied to newly created text objects
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: f32,
    pub color: Color,
    pub background: Color,
    pub opacity: f32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            font_size: 24.0,
            color: Color::BLACK,
            background: Color::TRANSPARENT,
            opacity: 1.0,
            bold: false,
            italic: false,
            underline: false,
        }
    }
}

impl TextObject {
    pub fn new(id: ObjectId, anchor: Point, text: impl Into<String>, style: &TextStyle) -> Self {
        Self {
            id,
            x: anchor.x,
            y: anchor.y,
            text: text.into(),
            font_family: style.font_family.clone(),
            font_size: clamp_font_size(style.font_size),
            color: style.color,
            background: style.background,
            opacity: clamp_opacity(style.opacity),
            bold: style.bold,
            italic: style.italic,
            underline: style.underline,
            locked: false,
        }
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn set_font_size(&mut self, size: f32) {
        self.font_size = clamp_font_size(size);
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = clamp_opacity(opacity);
    }

    pub fn anchor(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn estimated_width(&self) -> f32 {
        estimate_text_width(&self.text, self.font_size)
    }

    /// Approximate visual bounds used for hit-testing and handles
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.x,
            self.y - self.font_size * ASCENT_FACTOR,
            self.estimated_width().max(self.font_size * CHAR_WIDTH_FACTOR),
            self.font_size,
        )
    }
}

/// Encoded image bytes plus their natural size
///
/// The bytes stay encoded; they are decoded once when the object is placed
/// (to learn its size) and again when the page is flattened.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageSource {
    pub bytes: Arc<[u8]>,
    pub natural_width: u32,
    pub natural_height: u32,
}

impl ImageSource {
    /// Probe an encoded image for its dimensions
    pub fn probe(bytes: impl Into<Arc<[u8]>>) -> Result<Self> {
        let bytes = bytes.into();
        let decoded = image::load_from_memory(&bytes).context("unsupported image data")?;
        Ok(Self {
            natural_width: decoded.width(),
            natural_height: decoded.height(),
            bytes,
        })
    }

    /// Wrap an already-decoded bitmap by encoding it as PNG
    pub fn from_rgba(img: &RgbaImage) -> Result<Self> {
        let mut buffer = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buffer, image::ImageFormat::Png)
            .context("cannot encode PNG")?;
        Ok(Self {
            bytes: buffer.into_inner().into(),
            natural_width: img.width(),
            natural_height: img.height(),
        })
    }

    pub fn decode(&self) -> Result<RgbaImage> {
        let decoded = image::load_from_memory(&self.bytes).context("cannot decode image")?;
        Ok(decoded.to_rgba8())
    }
}

/// Placed raster image
#[derive(Clone, Debug, PartialEq)]
pub struct ImageObject {
    pub id: ObjectId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub source: ImageSource,
    opacity: f32,
    pub locked: bool,
}

impl ImageObject {
    pub fn new(id: ObjectId, anchor: Point, width: f32, height: f32, source: ImageSource) -> Self {
        Self {
            id,
            x: anchor.x,
            y: anchor.y,
            width: width.max(1.0),
            height: height.max(1.0),
            source,
            opacity: 1.0,
            locked: false,
        }
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = clamp_opacity(opacity);
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Opaque white rectangle that permanently occludes background content
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RedactionObject {
    pub id: ObjectId,
    pub rect: Rect,
}

/// Partial update of a text object; `None` fields are left untouched
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextPatch {
    pub text: Option<String>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    pub color: Option<Color>,
    pub background: Option<Color>,
    pub opacity: Option<f32>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub locked: Option<bool>,
}

impl TextPatch {
    pub fn position(at: Point) -> Self {
        Self {
            x: Some(at.x),
            y: Some(at.y),
            ..Default::default()
        }
    }

    /// Apply the patch. Locked objects only accept a change of the lock flag.
    pub fn apply(&self, obj: &mut TextObject) {
        if let Some(locked) = self.locked {
            obj.locked = locked;
        }
        if obj.locked {
            return;
        }
        if let Some(text) = &self.text {
            obj.text = text.clone();
        }
        if let Some(x) = self.x {
            obj.x = x;
        }
        if let Some(y) = self.y {
            obj.y = y;
        }
        if let Some(family) = &self.font_family {
            obj.font_family = family.clone();
        }
        if let Some(size) = self.font_size {
            obj.set_font_size(size);
        }
        if let Some(color) = self.color {
            obj.color = color;
        }
        if let Some(background) = self.background {
            obj.background = background;
        }
        if let Some(opacity) = self.opacity {
            obj.set_opacity(opacity);
        }
        if let Some(bold) = self.bold {
            obj.bold = bold;
        }
        if let Some(italic) = self.italic {
            obj.italic = italic;
        }
        if let Some(underline) = self.underline {
            obj.underline = underline;
        }
    }
}

/// Partial update of an image object; `None` fields are left untouched
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagePatch {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub opacity: Option<f32>,
    pub locked: Option<bool>,
}

impl ImagePatch {
    pub fn position(at: Point) -> Self {
        Self {
            x: Some(at.x),
            y: Some(at.y),
            ..Default::default()
        }
    }

    /// Apply the patch. Locked objects only accept a change of the lock flag.
    pub fn apply(&self, obj: &mut ImageObject) {
        if let Some(locked) = self.locked {
            obj.locked = locked;
        }
        if obj.locked {
            return;
        }
        if let Some(x) = self.x {
            obj.x = x;
        }
        if let Some(y) = self.y {
            obj.y = y;
        }
        if let Some(width) = self.width {
            obj.width = width.max(1.0);
        }
        if let Some(height) = self.height {
            obj.height = height.max(1.0);
        }
        if let Some(opacity) = self.opacity {
            obj.set_opacity(opacity);
        }
    }
}
