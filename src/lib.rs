//! Page annotation engine
//!
//! Overlays (strokes, text, images, redactions) are edited per page on top of
//! rasterized document pages and flattened into a new document on export.

pub mod annotations;
pub mod assist;
pub mod cli;
pub mod config;
pub mod domain;
pub mod export;
pub mod render;
pub mod services;
pub mod session;
pub mod workbench;
