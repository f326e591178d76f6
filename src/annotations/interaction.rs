//! Pointer interaction: strokes, hit-testing, drag and resize sessions
//!
//! At most one gesture is active at a time. Gestures end on pointer-up and
//! leave no history checkpoint except for committed strokes.

use crate::domain::{
    Alignment, Color, DrawingPath, ImagePatch, ObjectId, ObjectKind, PathTool, Point, Rect, ResizeHandle,
    Selection, TextPatch,
};
use crate::render::geometry::{align, handle, stroke};
use crate::session::{Editor, Effect, Tool};

/// The in-progress pointer gesture
#[derive(Debug, Clone, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// A stroke being drawn with a path tool
    Stroke(DrawingPath),
    /// Moving an object; `offset` is pointer minus anchor at drag start
    Drag {
        target: Selection,
        offset: (f32, f32),
    },
    /// Resizing an image by one of its eight handles
    ResizeImage {
        id: ObjectId,
        handle: ResizeHandle,
        start: Point,
        origin: Rect,
    },
    /// Scaling a text object's font by one of its corner handles
    ResizeText {
        id: ObjectId,
        handle: ResizeHandle,
        start: Point,
        start_size: f32,
    },
}

/// New image rectangle after dragging `handle` by `(dx, dy)`
///
/// North/west edges move the anchor so the opposite edge stays put.
pub fn resize_rect(origin: Rect, handle: ResizeHandle, dx: f32, dy: f32) -> Rect {
    let mut width = origin.width;
    let mut height = origin.height;
    if handle.has_east() {
        width += dx;
    } else if handle.has_west() {
        width -= dx;
    }
    if handle.has_south() {
        height += dy;
    } else if handle.has_north() {
        height -= dy;
    }
    width = width.max(handle::MIN_IMAGE_SIZE);
    height = height.max(handle::MIN_IMAGE_SIZE);

    let x = if handle.has_west() {
        origin.right() - width
    } else {
        origin.x
    };
    let y = if handle.has_north() {
        origin.bottom() - height
    } else {
        origin.y
    };
    Rect::new(x, y, width, height)
}

/// New font size after dragging a text corner `handle` by `(dx, dy)`
pub fn scaled_font_size(start_size: f32, handle: ResizeHandle, dx: f32, dy: f32) -> f32 {
    let delta = match handle {
        ResizeHandle::SE => dx + dy,
        ResizeHandle::SW => -dx + dy,
        ResizeHandle::NE => dx - dy,
        ResizeHandle::NW => -dx - dy,
        _ => 0.0,
    };
    let scale = (1.0 + delta / handle::TEXT_SCALE_DISTANCE).max(handle::TEXT_MIN_SCALE);
    (start_size * scale).clamp(handle::TEXT_RESIZE_MIN, handle::TEXT_RESIZE_MAX)
}

impl Editor {
    /// Pointer pressed at a client position
    pub fn pointer_down(&mut self, client: Point) -> Effect {
        let point = self.map_pointer(client);
        match self.tool() {
            Tool::Select => {
                self.begin_select_gesture(client, point);
                Effect::None
            }
            Tool::Draw | Tool::Highlight | Tool::Whiteout => {
                if let Some(path) = self.new_stroke(point) {
                    self.gesture = Gesture::Stroke(path);
                }
                Effect::None
            }
            Tool::Text => {
                self.place_text(point);
                Effect::None
            }
            Tool::EditText => Effect::QueryTextLayout {
                page: self.active_page(),
                point,
            },
            // Driven by the file picker and stamp buttons, not the canvas
            Tool::Image | Tool::Stamp => Effect::None,
        }
    }

    /// Pointer moved while pressed
    pub fn pointer_move(&mut self, client: Point) {
        let point = self.map_pointer(client);
        match &mut self.gesture {
            Gesture::Idle => {}
            Gesture::Stroke(path) => path.push(point),
            Gesture::Drag { target, offset } => {
                let anchor = Point::new(point.x - offset.0, point.y - offset.1);
                let target = *target;
                match target.kind {
                    ObjectKind::Text => {
                        self.update_text(target.id, &TextPatch::position(anchor));
                    }
                    ObjectKind::Image => {
                        self.update_image(target.id, &ImagePatch::position(anchor));
                    }
                }
            }
            Gesture::ResizeImage {
                id,
                handle,
                start,
                origin,
            } => {
                let (dx, dy) = start.delta_to(point);
                let rect = resize_rect(*origin, *handle, dx, dy);
                let id = *id;
                self.update_image(
                    id,
                    &ImagePatch {
                        x: Some(rect.x),
                        y: Some(rect.y),
                        width: Some(rect.width),
                        height: Some(rect.height),
                        ..Default::default()
                    },
                );
            }
            Gesture::ResizeText {
                id,
                handle,
                start,
                start_size,
            } => {
                let (dx, dy) = start.delta_to(point);
                let size = scaled_font_size(*start_size, *handle, dx, dy);
                let id = *id;
                self.update_text(
                    id,
                    &TextPatch {
                        font_size: Some(size),
                        ..Default::default()
                    },
                );
            }
        }
    }

    /// Pointer released; completes the active gesture
    pub fn pointer_up(&mut self, client: Point) {
        let point = self.map_pointer(client);
        match std::mem::take(&mut self.gesture) {
            Gesture::Stroke(mut path) => {
                if path.points().last() != Some(&point) {
                    path.push(point);
                }
                log::debug!(
                    "Committing {:?} stroke with {} points on page {}",
                    path.tool,
                    path.points().len(),
                    self.active_page()
                );
                self.add_path(path);
            }
            Gesture::Idle
            | Gesture::Drag { .. }
            | Gesture::ResizeImage { .. }
            | Gesture::ResizeText { .. } => {}
        }
    }

    fn new_stroke(&self, start: Point) -> Option<DrawingPath> {
        let tool = self.tool().path_tool()?;
        let pen = self.pen();
        let path = match tool {
            PathTool::Freehand => DrawingPath::new(
                start,
                tool,
                pen.color,
                pen.width,
                pen.opacity,
                tool.paint_mode(),
            ),
            PathTool::Highlight => DrawingPath::new(
                start,
                tool,
                pen.color,
                stroke::HIGHLIGHT_WIDTH,
                stroke::HIGHLIGHT_OPACITY,
                tool.paint_mode(),
            ),
            PathTool::Whiteout => DrawingPath::new(
                start,
                tool,
                Color::WHITE,
                stroke::WHITEOUT_WIDTH,
                pen.opacity,
                tool.paint_mode(),
            ),
        };
        Some(path)
    }

    fn begin_select_gesture(&mut self, client: Point, point: Point) {
        if let Some((selection, handle)) = self.handle_at(client) {
            self.begin_resize(selection, handle, point);
            return;
        }

        let Some(target) = self.object_at(point) else {
            self.set_selection_unchecked(None);
            return;
        };
        self.set_selection_unchecked(Some(target));

        let page = self.current();
        let anchor = match target.kind {
            ObjectKind::Text => page.text(target.id).filter(|t| !t.locked).map(|t| t.anchor()),
            ObjectKind::Image => page
                .image(target.id)
                .filter(|i| !i.locked)
                .map(|i| Point::new(i.x, i.y)),
        };
        // Locked objects are selected but never dragged
        if let Some(anchor) = anchor {
            self.gesture = Gesture::Drag {
                target,
                offset: anchor.delta_to(point),
            };
        }
    }

    fn begin_resize(&mut self, selection: Selection, handle: ResizeHandle, point: Point) {
        let page = self.current();
        let gesture = match selection.kind {
            ObjectKind::Text => page
                .text(selection.id)
                .filter(|t| !t.locked)
                .map(|t| Gesture::ResizeText {
                    id: t.id,
                    handle,
                    start: point,
                    start_size: t.font_size(),
                }),
            ObjectKind::Image => page
                .image(selection.id)
                .filter(|i| !i.locked)
                .map(|i| Gesture::ResizeImage {
                    id: i.id,
                    handle,
                    start: point,
                    origin: i.bounds(),
                }),
        };
        if let Some(gesture) = gesture {
            self.gesture = gesture;
        }
    }

    /// Resize handle of the selected object under a client position
    pub fn handle_at(&self, client: Point) -> Option<(Selection, ResizeHandle)> {
        let selection = self.selection()?;
        let page = self.current();
        let (bounds, handles): (Rect, &[ResizeHandle]) = match selection.kind {
            ObjectKind::Text => (page.text(selection.id)?.bounds(), &ResizeHandle::CORNERS),
            ObjectKind::Image => (page.image(selection.id)?.bounds(), &ResizeHandle::ALL),
        };
        let view = self.view();
        handles
            .iter()
            .copied()
            .find(|h| {
                let at = view.to_display(h.position(&bounds));
                at.distance_to(client) <= handle::HIT_RADIUS
            })
            .map(|h| (selection, h))
    }

    /// Front-most selectable object at a page position
    ///
    /// Text paints above images, so text is tested first; within a list the
    /// last element is front-most.
    pub fn object_at(&self, point: Point) -> Option<Selection> {
        let page = self.current();
        if let Some(text) = page.texts.iter().rev().find(|t| t.bounds().contains(point)) {
            return Some(Selection::text(text.id));
        }
        page.images
            .iter()
            .rev()
            .find(|i| i.bounds().contains(point))
            .map(|i| Selection::image(i.id))
    }

    /// Align the selected object horizontally on the active page
    pub fn align_selection(&mut self, alignment: Alignment) -> bool {
        let Some(selection) = self.selection() else {
            return false;
        };
        let page_width = self.page_size().0 as f32;
        let page = self.current();
        let width = match selection.kind {
            ObjectKind::Text => page.text(selection.id).map(|t| t.estimated_width()),
            ObjectKind::Image => page.image(selection.id).map(|i| i.width),
        };
        let Some(width) = width else {
            return false;
        };
        let x = match alignment {
            Alignment::Left => align::MARGIN,
            Alignment::Center => (page_width - width) / 2.0,
            Alignment::Right => page_width - width - align::MARGIN,
        };
        match selection.kind {
            ObjectKind::Text => self.update_text(
                selection.id,
                &TextPatch {
                    x: Some(x),
                    ..Default::default()
                },
            ),
            ObjectKind::Image => self.update_image(
                selection.id,
                &ImagePatch {
                    x: Some(x),
                    ..Default::default()
                },
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::domain::{ImageObject, ImageSource, TextObject, TextStyle};

    fn editor() -> Editor {
        Editor::new(vec![(1000, 1200)], &EditorConfig::default())
    }

    fn add_text(editor: &mut Editor, at: Point, size: f32) -> ObjectId {
        let id = editor.allocate_id();
        let style = TextStyle {
            font_size: size,
            ..Default::default()
        };
        editor.add_text(TextObject::new(id, at, "hello world", &style));
        id
    }

    fn add_image(editor: &mut Editor, rect: Rect) -> ObjectId {
        let id = editor.allocate_id();
        let source = ImageSource {
            bytes: Vec::new().into(),
            natural_width: 10,
            natural_height: 10,
        };
        editor.add_image(ImageObject::new(
            id,
            Point::new(rect.x, rect.y),
            rect.width,
            rect.height,
            source,
        ));
        id
    }

    #[test]
    fn test_drag_moves_by_pointer_minus_offset() {
        let mut editor = editor();
        let id = add_text(&mut editor, Point::new(100.0, 100.0), 20.0);
        editor.pointer_down(Point::new(110.0, 95.0));
        assert_eq!(editor.selection(), Some(Selection::text(id)));
        editor.pointer_move(Point::new(160.0, 145.0));
        editor.pointer_up(Point::new(160.0, 145.0));
        let t = editor.current().text(id).unwrap();
        assert_eq!((t.x, t.y), (150.0, 150.0));
        assert!(!editor.is_gesture_active());
    }

    #[test]
    fn test_locked_text_is_selected_but_not_dragged() {
        let mut editor = editor();
        let id = add_text(&mut editor, Point::new(100.0, 100.0), 20.0);
        editor.toggle_lock(id, ObjectKind::Text);
        editor.pointer_down(Point::new(110.0, 95.0));
        editor.pointer_move(Point::new(300.0, 300.0));
        editor.pointer_up(Point::new(300.0, 300.0));
        let t = editor.current().text(id).unwrap();
        assert_eq!((t.x, t.y), (100.0, 100.0));
        assert_eq!(editor.selection(), Some(Selection::text(id)));
    }

    #[test]
    fn test_click_on_empty_canvas_clears_selection() {
        let mut editor = editor();
        let id = add_text(&mut editor, Point::new(100.0, 100.0), 20.0);
        editor.select(Some(Selection::text(id)));
        editor.pointer_down(Point::new(900.0, 900.0));
        assert_eq!(editor.selection(), None);
    }

    #[test]
    fn test_text_resize_direction_depends_on_corner() {
        let mut editor = editor();
        let id = add_text(&mut editor, Point::new(100.0, 100.0), 24.0);
        editor.select(Some(Selection::text(id)));
        let bounds = editor.current().text(id).unwrap().bounds();

        let se = ResizeHandle::SE.position(&bounds);
        editor.pointer_down(se);
        editor.pointer_move(Point::new(se.x + 100.0, se.y + 100.0));
        editor.pointer_up(Point::new(se.x + 100.0, se.y + 100.0));
        let grown = editor.current().text(id).unwrap().font_size();
        assert!(grown > 24.0);

        let bounds = editor.current().text(id).unwrap().bounds();
        let nw = ResizeHandle::NW.position(&bounds);
        editor.pointer_down(nw);
        editor.pointer_move(Point::new(nw.x + 100.0, nw.y + 100.0));
        editor.pointer_up(Point::new(nw.x + 100.0, nw.y + 100.0));
        assert!(editor.current().text(id).unwrap().font_size() < grown);
    }

    #[test]
    fn test_scaled_font_size_bounds() {
        assert_eq!(scaled_font_size(24.0, ResizeHandle::SE, 100.0, 100.0), 48.0);
        assert_eq!(scaled_font_size(24.0, ResizeHandle::NW, 100.0, 100.0), 8.0);
        assert_eq!(scaled_font_size(150.0, ResizeHandle::SE, 100.0, 100.0), 200.0);
        assert_eq!(scaled_font_size(30.0, ResizeHandle::NE, 50.0, 50.0), 30.0);
    }

    #[test]
    fn test_image_resize_from_west_keeps_right_edge() {
        let origin = Rect::new(100.0, 100.0, 200.0, 100.0);
        let r = resize_rect(origin, ResizeHandle::W, 50.0, 999.0);
        assert_eq!(r, Rect::new(150.0, 100.0, 150.0, 100.0));

        let r = resize_rect(origin, ResizeHandle::NW, 500.0, 500.0);
        assert_eq!(r.width, handle::MIN_IMAGE_SIZE);
        assert_eq!(r.height, handle::MIN_IMAGE_SIZE);
        assert_eq!(r.right(), origin.right());
        assert_eq!(r.bottom(), origin.bottom());

        let r = resize_rect(origin, ResizeHandle::SE, 10.0, 20.0);
        assert_eq!(r, Rect::new(100.0, 100.0, 210.0, 120.0));
    }

    #[test]
    fn test_image_resize_through_handle() {
        let mut editor = editor();
        let id = add_image(&mut editor, Rect::new(100.0, 100.0, 200.0, 100.0));
        editor.select(Some(Selection::image(id)));
        editor.pointer_down(Point::new(300.0, 150.0));
        editor.pointer_move(Point::new(340.0, 150.0));
        editor.pointer_up(Point::new(340.0, 150.0));
        let img = editor.current().image(id).unwrap();
        assert_eq!((img.x, img.width, img.height), (100.0, 240.0, 100.0));
    }

    #[test]
    fn test_text_is_hit_before_image() {
        let mut editor = editor();
        add_image(&mut editor, Rect::new(0.0, 0.0, 500.0, 500.0));
        let text = add_text(&mut editor, Point::new(100.0, 100.0), 20.0);
        assert_eq!(
            editor.object_at(Point::new(105.0, 95.0)),
            Some(Selection::text(text))
        );
    }

    #[test]
    fn test_strokes_stay_on_stroke_tool_and_use_forced_style() {
        let mut editor = editor();
        editor.set_tool(Tool::Highlight);
        for x in [10.0, 50.0] {
            editor.pointer_down(Point::new(x, 10.0));
            editor.pointer_move(Point::new(x + 5.0, 20.0));
            editor.pointer_up(Point::new(x + 10.0, 30.0));
        }
        assert_eq!(editor.tool(), Tool::Highlight);
        let paths = &editor.current().paths;
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].points().len(), 3);
        assert_eq!(paths[0].width, stroke::HIGHLIGHT_WIDTH);
        assert_eq!(paths[0].opacity, stroke::HIGHLIGHT_OPACITY);
        assert!(paths[0].square_caps());

        editor.set_tool(Tool::Whiteout);
        editor.pointer_down(Point::new(1.0, 1.0));
        editor.pointer_up(Point::new(1.0, 1.0));
        let whiteout = editor.current().paths.last().unwrap();
        assert_eq!(whiteout.color, Color::WHITE);
        assert_eq!(whiteout.width, stroke::WHITEOUT_WIDTH);
        assert_eq!(whiteout.points().len(), 1);
    }

    #[test]
    fn test_pointer_is_mapped_through_view() {
        let mut editor = editor();
        editor.set_view(crate::domain::ViewTransform {
            origin: Point::new(0.0, 0.0),
            display_size: (500.0, 600.0),
            page_size: (1000.0, 1200.0),
        });
        editor.set_tool(Tool::Draw);
        editor.pointer_down(Point::new(10.0, 10.0));
        editor.pointer_up(Point::new(10.0, 10.0));
        assert_eq!(editor.current().paths[0].points()[0], Point::new(20.0, 20.0));
    }

    #[test]
    fn test_align_text_and_image() {
        let mut editor = editor();
        let text = add_text(&mut editor, Point::new(300.0, 100.0), 20.0);
        editor.select(Some(Selection::text(text)));
        editor.align_selection(Alignment::Right);
        // "hello world" = 11 chars * 20 * 0.6 = 132
        assert_eq!(editor.current().text(text).unwrap().x, 1000.0 - 132.0 - 50.0);

        let image = add_image(&mut editor, Rect::new(10.0, 10.0, 200.0, 50.0));
        editor.select(Some(Selection::image(image)));
        editor.align_selection(Alignment::Center);
        assert_eq!(editor.current().image(image).unwrap().x, 400.0);
        editor.align_selection(Alignment::Left);
        assert_eq!(editor.current().image(image).unwrap().x, 50.0);
    }
}
