//! Editor message handlers
//!
//! Routes every [`EditorMsg`] onto the editor. Handlers are synchronous; the
//! returned [`Effect`] tells the caller when an asynchronous collaborator
//! has to be consulted.

use crate::domain::{Selection, TextPatch, clamp_font_size};
use crate::session::messages::{EditorMsg, Effect, KeyCommand, ObjectMsg, PointerAction, StyleMsg};
use crate::session::{Editor, Tool};

/// Handle an EditorMsg, modifying editor state
pub fn handle_editor_msg(editor: &mut Editor, msg: EditorMsg) -> Effect {
    match msg {
        EditorMsg::SetTool(tool) => editor.set_tool(tool),
        EditorMsg::SetPage(index) => editor.set_page(index),
        EditorMsg::Pointer(action) => return handle_pointer(editor, action),
        EditorMsg::Key(key) => handle_key(editor, key),
        EditorMsg::Object(msg) => handle_object(editor, msg),
        EditorMsg::Style(msg) => handle_style(editor, msg),
        EditorMsg::Stamp(preset) => {
            editor.place_stamp(preset);
        }
        EditorMsg::PlaceImage(source) => {
            editor.place_image(source);
        }
        EditorMsg::ClearPage => editor.clear_page(),
    }
    Effect::None
}

// ============================================================================
// Pointer and keyboard
// ============================================================================

fn handle_pointer(editor: &mut Editor, action: PointerAction) -> Effect {
    match action {
        PointerAction::Down(p) => return editor.pointer_down(p),
        PointerAction::Move(p) => editor.pointer_move(p),
        PointerAction::Up(p) => editor.pointer_up(p),
    }
    Effect::None
}

fn handle_key(editor: &mut Editor, key: KeyCommand) {
    match key {
        KeyCommand::Delete => {
            if let Some(Selection { id, kind }) = editor.selection() {
                if !editor.remove(id, kind) {
                    log::debug!("Selected object {} is locked, not deleting", id);
                }
            }
        }
        KeyCommand::Escape => {
            editor.select(None);
            editor.set_tool(Tool::Select);
        }
        KeyCommand::Undo => {
            editor.undo();
        }
        KeyCommand::Redo => {
            editor.redo();
        }
    }
}

// ============================================================================
// Object handlers
// ============================================================================

fn handle_object(editor: &mut Editor, msg: ObjectMsg) {
    match msg {
        ObjectMsg::Select(selection) => editor.select(selection),
        ObjectMsg::UpdateText(id, patch) => {
            editor.update_text(id, &patch);
        }
        ObjectMsg::UpdateImage(id, patch) => {
            editor.update_image(id, &patch);
        }
        ObjectMsg::Remove(id, kind) => {
            editor.remove(id, kind);
        }
        ObjectMsg::ToFront(id, kind) => {
            editor.reorder_to_front(id, kind);
        }
        ObjectMsg::ToBack(id, kind) => {
            editor.reorder_to_back(id, kind);
        }
        ObjectMsg::ToggleLock(id, kind) => {
            editor.toggle_lock(id, kind);
        }
        ObjectMsg::Duplicate(id, kind) => {
            editor.duplicate(id, kind);
        }
        ObjectMsg::Align(alignment) => {
            editor.align_selection(alignment);
        }
    }
}

// ============================================================================
// Style handlers
// ============================================================================

fn handle_style(editor: &mut Editor, msg: StyleMsg) {
    match msg {
        StyleMsg::PenColor(color) => {
            editor.set_pen_color(color);
            editor.set_text_style(|style| {
                style.color = color;
                TextPatch {
                    color: Some(color),
                    ..Default::default()
                }
            });
        }
        StyleMsg::PenWidth(width) => editor.set_pen_width(width),
        StyleMsg::Opacity(opacity) => editor.set_opacity(opacity),
        StyleMsg::FontFamily(family) => editor.set_text_style(|style| {
            style.font_family = family.clone();
            TextPatch {
                font_family: Some(family),
                ..Default::default()
            }
        }),
        StyleMsg::FontSize(size) => editor.set_text_style(|style| {
            style.font_size = clamp_font_size(size);
            TextPatch {
                font_size: Some(size),
                ..Default::default()
            }
        }),
        StyleMsg::Background(color) => editor.set_text_style(|style| {
            style.background = color;
            TextPatch {
                background: Some(color),
                ..Default::default()
            }
        }),
        StyleMsg::Bold(on) => editor.set_text_style(|style| {
            style.bold = on;
            TextPatch {
                bold: Some(on),
                ..Default::default()
            }
        }),
        StyleMsg::Italic(on) => editor.set_text_style(|style| {
            style.italic = on;
            TextPatch {
                italic: Some(on),
                ..Default::default()
            }
        }),
        StyleMsg::Underline(on) => editor.set_text_style(|style| {
            style.underline = on;
            TextPatch {
                underline: Some(on),
                ..Default::default()
            }
        }),
    }
}
