//! Editing session management module
//!
//! This module contains:
//! - Per-page overlay state and stroke history
//! - The tool state machine
//! - Message types for editor interactions
//! - The editor that owns all of the above for one loaded document

pub mod editor;
pub mod history;
pub mod messages;
pub mod state;
pub mod tool;

pub use editor::{Editor, PenSettings};
pub use messages::{EditorMsg, Effect, KeyCommand, ObjectMsg, PointerAction, StyleMsg};
pub use state::{OverlayStore, PageOverlay, PageSnapshot};
pub use tool::Tool;
