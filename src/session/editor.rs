//! Editor state for one loaded document
//!
//! The editor owns the overlay store, the active page and tool, the current
//! style settings, the selection and the in-progress gesture. Every overlay
//! mutation here is scoped to the active page. Pointer handling lives in
//! `annotations::interaction`, placement in `annotations::placement`.

use crate::annotations::interaction::Gesture;
use crate::config::EditorConfig;
use crate::domain::{
    Color, DrawingPath, ImageObject, ImagePatch, ObjectId, ObjectKind, Point, Rect,
    RedactionObject, Selection, TextObject, TextPatch, TextStyle, ViewTransform,
};

use super::state::{OverlayStore, PageOverlay};
use super::tool::Tool;

/// Offset applied to duplicated objects
const DUPLICATE_OFFSET: f32 = 20.0;

/// Stroke settings chosen by the user
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenSettings {
    pub color: Color,
    pub width: f32,
    /// Global opacity control
    pub opacity: f32,
}

#[derive(Debug)]
pub struct Editor {
    store: OverlayStore,
    page_sizes: Vec<(u32, u32)>,
    views: Vec<ViewTransform>,
    active_page: usize,
    tool: Tool,
    pen: PenSettings,
    text_style: TextStyle,
    pub(crate) config: EditorConfig,
    selection: Option<Selection>,
    pub(crate) gesture: Gesture,
    next_id: ObjectId,
}

impl Editor {
    /// Fresh editor for a document whose pages have the given pixel sizes
    pub fn new(page_sizes: Vec<(u32, u32)>, config: &EditorConfig) -> Self {
        let views = page_sizes
            .iter()
            .map(|&(w, h)| ViewTransform::identity(w, h))
            .collect();
        Self {
            store: OverlayStore::new(page_sizes.len()),
            page_sizes,
            views,
            active_page: 0,
            tool: Tool::Select,
            pen: PenSettings {
                color: config.pen_color,
                width: config.pen_width,
                opacity: config.opacity.clamp(0.0, 1.0),
            },
            text_style: config.text_style.clone(),
            config: config.clone(),
            selection: None,
            gesture: Gesture::Idle,
            next_id: 1,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn store(&self) -> &OverlayStore {
        &self.store
    }

    pub fn page_count(&self) -> usize {
        self.page_sizes.len()
    }

    pub fn active_page(&self) -> usize {
        self.active_page
    }

    /// Pixel size of the active page
    pub fn page_size(&self) -> (u32, u32) {
        self.page_sizes
            .get(self.active_page)
            .copied()
            .unwrap_or((0, 0))
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn pen(&self) -> PenSettings {
        self.pen
    }

    pub fn text_style(&self) -> &TextStyle {
        &self.text_style
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn is_gesture_active(&self) -> bool {
        !matches!(self.gesture, Gesture::Idle)
    }

    /// Overlay of the active page
    pub fn current(&self) -> &PageOverlay {
        self.store
            .page(self.active_page)
            .unwrap_or_else(|| empty_page())
    }

    pub(crate) fn current_mut(&mut self) -> Option<&mut PageOverlay> {
        self.store.page_mut(self.active_page)
    }

    pub fn view(&self) -> ViewTransform {
        self.views
            .get(self.active_page)
            .copied()
            .unwrap_or_else(|| ViewTransform::identity(0, 0))
    }

    /// Set how the active page is displayed, for pointer mapping
    pub fn set_view(&mut self, view: ViewTransform) {
        if let Some(slot) = self.views.get_mut(self.active_page) {
            *slot = view;
        }
    }

    pub(crate) fn allocate_id(&mut self) -> ObjectId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // ------------------------------------------------------------------
    // Tool, page and selection
    // ------------------------------------------------------------------

    /// Switch tools. Any in-progress gesture is discarded.
    pub fn set_tool(&mut self, tool: Tool) {
        if self.is_gesture_active() {
            log::debug!("Discarding in-progress gesture on tool change");
        }
        self.gesture = Gesture::Idle;
        if tool != Tool::Select {
            self.selection = None;
        }
        self.tool = tool;
    }

    pub(crate) fn revert_tool_after_gesture(&mut self) {
        self.tool = self.tool.after_gesture();
    }

    /// Switch the active page. Out-of-range indices are ignored.
    pub fn set_page(&mut self, index: usize) {
        if index >= self.page_count() {
            log::debug!("Ignoring switch to missing page {}", index);
            return;
        }
        self.gesture = Gesture::Idle;
        self.selection = None;
        self.active_page = index;
    }

    pub fn select(&mut self, selection: Option<Selection>) {
        self.selection = selection.filter(|s| self.current().is_locked(s.id, s.kind).is_some());
    }

    // ------------------------------------------------------------------
    // Style
    // ------------------------------------------------------------------

    pub fn set_pen_color(&mut self, color: Color) {
        self.pen.color = color;
    }

    /// Color for newly placed text; existing objects are left alone
    pub fn set_text_color(&mut self, color: Color) {
        self.text_style.color = color;
    }

    pub fn set_pen_width(&mut self, width: f32) {
        self.pen.width = width.clamp(0.5, 200.0);
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        let opacity = opacity.clamp(0.0, 1.0);
        self.pen.opacity = opacity;
        self.text_style.opacity = opacity;
        self.patch_selected_text(TextPatch {
            opacity: Some(opacity),
            ..Default::default()
        });
    }

    /// Change the style for new text and apply the same change to the
    /// selected text object, if any
    pub fn set_text_style(&mut self, update: impl FnOnce(&mut TextStyle) -> TextPatch) {
        let patch = update(&mut self.text_style);
        self.patch_selected_text(patch);
    }

    fn patch_selected_text(&mut self, patch: TextPatch) {
        if let Some(Selection {
            id,
            kind: ObjectKind::Text,
        }) = self.selection
        {
            self.update_text(id, &patch);
        }
    }

    // ------------------------------------------------------------------
    // Overlay object model (active page)
    // ------------------------------------------------------------------

    /// Commit a finished stroke, recording history
    pub fn add_path(&mut self, path: DrawingPath) {
        if let Some(page) = self.current_mut() {
            page.commit_stroke(path);
        }
    }

    pub fn add_text(&mut self, obj: TextObject) {
        if let Some(page) = self.current_mut() {
            page.add_text(obj);
        }
    }

    pub fn add_image(&mut self, obj: ImageObject) {
        if let Some(page) = self.current_mut() {
            page.add_image(obj);
        }
    }

    pub fn add_redaction(&mut self, rect: Rect) -> ObjectId {
        let id = self.allocate_id();
        if let Some(page) = self.current_mut() {
            page.add_redaction(RedactionObject { id, rect });
        }
        id
    }

    pub fn update_text(&mut self, id: ObjectId, patch: &TextPatch) -> bool {
        self.current_mut()
            .is_some_and(|page| page.update_text(id, patch))
    }

    pub fn update_image(&mut self, id: ObjectId, patch: &ImagePatch) -> bool {
        self.current_mut()
            .is_some_and(|page| page.update_image(id, patch))
    }

    /// Delete an object. Locked objects stay (and stay selectable).
    pub fn remove(&mut self, id: ObjectId, kind: ObjectKind) -> bool {
        let removed = self
            .current_mut()
            .is_some_and(|page| page.remove(id, kind));
        if removed && self.selection == Some(Selection { id, kind }) {
            self.selection = None;
        }
        removed
    }

    pub fn reorder_to_front(&mut self, id: ObjectId, kind: ObjectKind) -> bool {
        self.current_mut()
            .is_some_and(|page| page.reorder_to_front(id, kind))
    }

    pub fn reorder_to_back(&mut self, id: ObjectId, kind: ObjectKind) -> bool {
        self.current_mut()
            .is_some_and(|page| page.reorder_to_back(id, kind))
    }

    pub fn toggle_lock(&mut self, id: ObjectId, kind: ObjectKind) -> bool {
        let Some(locked) = self.current().is_locked(id, kind) else {
            return false;
        };
        match kind {
            ObjectKind::Text => self.update_text(
                id,
                &TextPatch {
                    locked: Some(!locked),
                    ..Default::default()
                },
            ),
            ObjectKind::Image => self.update_image(
                id,
                &ImagePatch {
                    locked: Some(!locked),
                    ..Default::default()
                },
            ),
        }
    }

    /// Copy an object to the front, offset slightly, and select the copy
    pub fn duplicate(&mut self, id: ObjectId, kind: ObjectKind) -> Option<ObjectId> {
        let new_id = match kind {
            ObjectKind::Text => {
                let mut copy = self.current().text(id)?.clone();
                copy.id = self.allocate_id();
                copy.x += DUPLICATE_OFFSET;
                copy.y += DUPLICATE_OFFSET;
                copy.locked = false;
                let new_id = copy.id;
                self.add_text(copy);
                new_id
            }
            ObjectKind::Image => {
                let mut copy = self.current().image(id)?.clone();
                copy.id = self.allocate_id();
                copy.x += DUPLICATE_OFFSET;
                copy.y += DUPLICATE_OFFSET;
                copy.locked = false;
                let new_id = copy.id;
                self.add_image(copy);
                new_id
            }
        };
        self.selection = Some(Selection { id: new_id, kind });
        Some(new_id)
    }

    /// Remove every overlay on the active page, including its stroke history
    pub fn clear_page(&mut self) {
        self.gesture = Gesture::Idle;
        self.selection = None;
        if let Some(page) = self.current_mut() {
            page.clear();
        }
    }

    // ------------------------------------------------------------------
    // History (active page, strokes only)
    // ------------------------------------------------------------------

    pub fn undo(&mut self) -> bool {
        self.current_mut().is_some_and(|page| page.undo())
    }

    pub fn redo(&mut self) -> bool {
        self.current_mut().is_some_and(|page| page.redo())
    }

    /// Direct access to any page, used by the edit-text tool whose result
    /// arrives for the page it was started on
    pub(crate) fn page_mut(&mut self, index: usize) -> Option<&mut PageOverlay> {
        self.store.page_mut(index)
    }

    pub(crate) fn set_selection_unchecked(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    pub(crate) fn map_pointer(&self, client: Point) -> Point {
        self.view().to_page(client)
    }
}

fn empty_page() -> &'static PageOverlay {
    static EMPTY: std::sync::OnceLock<PageOverlay> = std::sync::OnceLock::new();
    EMPTY.get_or_init(PageOverlay::default)
}
