//! Message types for an editing session
//!
//! Every user action reaches the editor as one [`EditorMsg`]. Pointer
//! positions are in client (display) coordinates and are mapped onto the
//! active page by the editor.

use crate::config::StampPreset;
use crate::domain::{
    Alignment, Color, ImagePatch, ImageSource, ObjectId, ObjectKind, Point, Selection, TextPatch,
};

use super::tool::Tool;

// ============================================================================
// Pointer and keyboard
// ============================================================================

/// One phase of a pointer-down-move-up gesture
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerAction {
    Down(Point),
    Move(Point),
    Up(Point),
}

/// Keyboard commands understood by the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// Delete or Backspace
    Delete,
    /// Clear selection and return to the select tool
    Escape,
    Undo,
    Redo,
}

// ============================================================================
// Object and style messages
// ============================================================================

/// Mutations of individual objects on the active page
#[derive(Debug, Clone)]
pub enum ObjectMsg {
    Select(Option<Selection>),
    UpdateText(ObjectId, TextPatch),
    UpdateImage(ObjectId, ImagePatch),
    Remove(ObjectId, ObjectKind),
    ToFront(ObjectId, ObjectKind),
    ToBack(ObjectId, ObjectKind),
    ToggleLock(ObjectId, ObjectKind),
    Duplicate(ObjectId, ObjectKind),
    /// Align the current selection horizontally on the page
    Align(Alignment),
}

/// Changes to the style used for new objects
///
/// Text style changes also apply to the selected text object.
#[derive(Debug, Clone)]
pub enum StyleMsg {
    PenColor(Color),
    PenWidth(f32),
    Opacity(f32),
    FontFamily(String),
    FontSize(f32),
    Background(Color),
    Bold(bool),
    Italic(bool),
    Underline(bool),
}

/// All editor messages
#[derive(Debug, Clone)]
pub enum EditorMsg {
    SetTool(Tool),
    SetPage(usize),
    Pointer(PointerAction),
    Key(KeyCommand),
    Object(ObjectMsg),
    Style(StyleMsg),
    /// Place a stamp with a fixed label/color pair
    Stamp(StampPreset),
    /// Place an image chosen through an external picker
    PlaceImage(ImageSource),
    /// Remove every overlay from the active page
    ClearPage,
}

/// Follow-up work a message needs from an asynchronous collaborator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    None,
    /// The edit-text tool was clicked; text runs of `page` must be fetched
    /// and hit-tested against `point` (page coordinates)
    QueryTextLayout { page: usize, point: Point },
}
