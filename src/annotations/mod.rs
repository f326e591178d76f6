//! Overlay editing behavior
//!
//! This module provides:
//! - Message dispatch for EditorMsg
//! - Pointer interaction (strokes, hit-testing, drag, resize, alignment)
//! - One-shot placement tools (text, image, stamp, edit-text)

pub mod handlers;
pub mod interaction;
pub mod placement;

pub use handlers::handle_editor_msg;
pub use interaction::Gesture;
