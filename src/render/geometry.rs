//! Shared geometry constants
//!
//! This module contains constants and math shared between the interactive
//! editor (hit-testing, stroke creation) and the page compositor.

/// Stroke tool constants
pub mod stroke {
    /// Highlighter width in page pixels
    pub const HIGHLIGHT_WIDTH: f32 = 30.0;
    /// Highlighter opacity
    pub const HIGHLIGHT_OPACITY: f32 = 0.35;
    /// Whiteout eraser width in page pixels
    pub const WHITEOUT_WIDTH: f32 = 20.0;
}

/// Selection handle constants
pub mod handle {
    /// Pointer distance (display units) within which a handle is hit
    pub const HIT_RADIUS: f32 = 8.0;
    /// Smallest width/height an image can be resized to
    pub const MIN_IMAGE_SIZE: f32 = 20.0;
    /// Pointer travel that doubles a text object's font size
    pub const TEXT_SCALE_DISTANCE: f32 = 200.0;
    /// Smallest scale factor a single text resize can apply
    pub const TEXT_MIN_SCALE: f32 = 0.1;
    /// Font size bounds for handle-driven text resize
    pub const TEXT_RESIZE_MIN: f32 = 8.0;
    pub const TEXT_RESIZE_MAX: f32 = 200.0;
}

/// Alignment helper constants
pub mod align {
    /// Left/right page margin in page pixels
    pub const MARGIN: f32 = 50.0;
}

/// Text decoration constants
pub mod text {
    /// Underline offset below the baseline
    pub const UNDERLINE_OFFSET: f32 = 2.0;
    /// Underline thickness as a fraction of the font size
    pub const UNDERLINE_RATIO: f32 = 1.0 / 15.0;
    /// Horizontal shear used for synthesized italics
    pub const ITALIC_SHEAR: f32 = 0.2;
}

/// Edit-text tool constants
pub mod edit_text {
    /// Largest vertical distance from a run's center, as a multiple of its height
    pub const VERTICAL_TOLERANCE: f32 = 1.5;
    /// Redaction height floor as a multiple of the run font size
    pub const REDACTION_HEIGHT_FACTOR: f32 = 2.0;
    /// Baseline of the replacement text, as a fraction of run height below its top
    pub const BASELINE_FACTOR: f32 = 0.8;
    /// Page rasterization resolution relative to document units
    pub const RASTER_SCALE: f32 = 2.0;
}
