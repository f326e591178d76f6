//! Page rendering module
//!
//! This module contains:
//! - Geometry constants shared between the editor and the compositor
//! - Page compositing using tiny-skia (redactions, paths, images)
//! - Glyph rendering and text measurement using ab_glyph

pub mod geometry;
pub mod image;
pub mod text;

pub use text::FontBook;
