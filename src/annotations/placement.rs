//! One-shot placement tools: text, image, stamp and edit-text
//!
//! Each placement creates its object(s), selects the new object and reverts
//! the tool to select.

use crate::config::StampPreset;
use crate::domain::{
    ImageObject, ImageSource, ObjectId, Point, Rect, RedactionObject, Selection, TextObject,
    TextStyle,
};
use crate::render::geometry::edit_text;
use crate::services::TextRun;
use crate::session::{Editor, Tool};

/// Size an image is placed at, scaled so neither side exceeds `max_dim`
pub fn fit_within(natural_width: u32, natural_height: u32, max_dim: f32) -> (f32, f32) {
    let w = natural_width.max(1) as f32;
    let h = natural_height.max(1) as f32;
    let scale = (max_dim / w.max(h)).min(1.0);
    (w * scale, h * scale)
}

/// Text run under `point`, if any
///
/// A run matches when the point lies within its horizontal extent and no
/// more than 1.5x the run height above or below its center. Of several
/// matches the run whose center is vertically closest wins.
pub fn hit_text_run(runs: &[TextRun], point: Point) -> Option<&TextRun> {
    runs.iter()
        .filter(|run| {
            let center_y = run.y + run.height / 2.0;
            point.x >= run.x
                && point.x <= run.x + run.width
                && (point.y - center_y).abs() <= run.height * edit_text::VERTICAL_TOLERANCE
        })
        .min_by(|a, b| {
            let da = (point.y - (a.y + a.height / 2.0)).abs();
            let db = (point.y - (b.y + b.height / 2.0)).abs();
            da.total_cmp(&db)
        })
}

impl Editor {
    /// Place placeholder text at a page position using the current style
    pub fn place_text(&mut self, at: Point) -> ObjectId {
        let id = self.allocate_id();
        let obj = TextObject::new(id, at, self.config.placeholder_text.clone(), self.text_style());
        self.add_text(obj);
        self.finish_placement(Selection::text(id));
        id
    }

    /// Place a picked image at the default anchor, downscaled to fit
    pub fn place_image(&mut self, source: ImageSource) -> ObjectId {
        let (width, height) = fit_within(
            source.natural_width,
            source.natural_height,
            self.config.max_image_dimension,
        );
        let id = self.allocate_id();
        let mut obj = ImageObject::new(id, self.config.image_anchor, width, height, source);
        obj.set_opacity(self.pen().opacity);
        log::debug!("Placing image {} at {}x{}", id, width, height);
        self.add_image(obj);
        self.finish_placement(Selection::image(id));
        id
    }

    /// Place a stamp preset at the default stamp anchor
    pub fn place_stamp(&mut self, preset: StampPreset) -> ObjectId {
        let style = TextStyle {
            font_size: self.config.stamp_font_size,
            color: preset.color(),
            bold: true,
            italic: false,
            underline: false,
            ..self.text_style().clone()
        };
        let id = self.allocate_id();
        let obj = TextObject::new(id, self.config.stamp_anchor, preset.label(), &style);
        self.add_text(obj);
        self.finish_placement(Selection::text(id));
        id
    }

    /// Resolve an edit-text click against the runs of `page`
    ///
    /// On a hit the run is covered by a redaction and an editable copy of
    /// its text is placed over it. The result lands on `page` even if the
    /// user has since switched pages; it is only selected when `page` is
    /// still active.
    pub fn apply_text_layout(&mut self, page: usize, point: Point, runs: &[TextRun]) -> Option<ObjectId> {
        let Some(run) = hit_text_run(runs, point) else {
            log::debug!("No text run at ({}, {}) on page {}", point.x, point.y, page);
            return None;
        };

        let cover = Rect::new(
            run.x,
            run.y,
            run.width,
            run.height.max(run.font_size * edit_text::REDACTION_HEIGHT_FACTOR),
        );
        let style = TextStyle {
            font_size: run.font_size * edit_text::RASTER_SCALE,
            ..self.text_style().clone()
        };
        let redaction_id = self.allocate_id();
        let text_id = self.allocate_id();
        let anchor = Point::new(run.x, run.y + run.height * edit_text::BASELINE_FACTOR);
        let text = TextObject::new(text_id, anchor, run.text.clone(), &style);

        let overlay = self.page_mut(page)?;
        overlay.add_redaction(RedactionObject {
            id: redaction_id,
            rect: cover,
        });
        overlay.add_text(text);

        if page == self.active_page() {
            self.finish_placement(Selection::text(text_id));
        } else {
            self.revert_tool_after_gesture();
        }
        Some(text_id)
    }

    fn finish_placement(&mut self, selection: Selection) {
        self.set_tool(Tool::Select);
        self.set_selection_unchecked(Some(selection));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::domain::Color;
    use crate::session::Effect;

    fn editor() -> Editor {
        Editor::new(vec![(1000, 1400), (1000, 1400)], &EditorConfig::default())
    }

    fn run(text: &str, x: f32, y: f32, width: f32, height: f32, font_size: f32) -> TextRun {
        TextRun {
            text: text.to_string(),
            x,
            y,
            width,
            height,
            font_size,
        }
    }

    #[test]
    fn test_fit_within_preserves_aspect() {
        assert_eq!(fit_within(600, 300, 300.0), (300.0, 150.0));
        assert_eq!(fit_within(100, 50, 300.0), (100.0, 50.0));
        let (w, h) = fit_within(200, 900, 300.0);
        assert!((w - 200.0 / 3.0).abs() < 1e-3);
        assert_eq!(h, 300.0);
    }

    #[test]
    fn test_text_tool_places_and_reverts() {
        let mut editor = editor();
        editor.set_tool(Tool::Text);
        assert_eq!(editor.pointer_down(Point::new(40.0, 60.0)), Effect::None);

        let text = &editor.current().texts[0];
        assert_eq!(text.text, "New Text");
        assert_eq!((text.x, text.y), (40.0, 60.0));
        assert_eq!(editor.tool(), Tool::Select);
        assert_eq!(editor.selection(), Some(Selection::text(text.id)));
    }

    #[test]
    fn test_place_image_downscales_and_selects() {
        let mut editor = editor();
        editor.set_tool(Tool::Image);
        let source = ImageSource::from_rgba(&image::RgbaImage::new(800, 400)).unwrap();
        let id = editor.place_image(source);

        let obj = editor.current().image(id).unwrap();
        assert_eq!((obj.width, obj.height), (300.0, 150.0));
        assert_eq!((obj.x, obj.y), (100.0, 100.0));
        assert_eq!(editor.selection(), Some(Selection::image(id)));
        assert_eq!(editor.tool(), Tool::Select);
    }

    #[test]
    fn test_stamp_is_bold_preset() {
        let mut editor = editor();
        editor.set_tool(Tool::Stamp);
        let id = editor.place_stamp(StampPreset::Confidential);

        let obj = editor.current().text(id).unwrap();
        assert_eq!(obj.text, "CONFIDENTIAL");
        assert_eq!(obj.color, Color::rgb(0xdc, 0x26, 0x26));
        assert!(obj.bold);
        assert_eq!(obj.font_size(), 48.0);
        assert_eq!((obj.x, obj.y), (100.0, 150.0));
        assert_eq!(editor.tool(), Tool::Select);
    }

    #[test]
    fn test_hit_text_run_uses_vertical_tolerance() {
        let runs = [run("Total", 100.0, 200.0, 80.0, 20.0, 10.0)];
        // center is y=210, tolerance is 30 either way
        assert!(hit_text_run(&runs, Point::new(120.0, 226.0)).is_some());
        assert!(hit_text_run(&runs, Point::new(120.0, 182.0)).is_some());
        assert!(hit_text_run(&runs, Point::new(120.0, 241.0)).is_none());
        assert!(hit_text_run(&runs, Point::new(181.0, 210.0)).is_none());
    }

    #[test]
    fn test_hit_text_run_prefers_nearest() {
        let runs = [
            run("upper", 0.0, 100.0, 100.0, 20.0, 10.0),
            run("lower", 0.0, 115.0, 100.0, 20.0, 10.0),
        ];
        let hit = hit_text_run(&runs, Point::new(50.0, 122.0)).unwrap();
        assert_eq!(hit.text, "lower");
    }

    #[test]
    fn test_edit_text_covers_run_and_places_copy() {
        let mut editor = editor();
        editor.set_tool(Tool::EditText);
        let effect = editor.pointer_down(Point::new(120.0, 205.0));
        let Effect::QueryTextLayout { page, point } = effect else {
            panic!("expected a layout query");
        };

        let runs = [run("Invoice 42", 100.0, 200.0, 90.0, 12.0, 10.0)];
        let id = editor.apply_text_layout(page, point, &runs).unwrap();

        let page = editor.current();
        assert_eq!(page.redactions.len(), 1);
        assert_eq!(page.redactions[0].rect, Rect::new(100.0, 200.0, 90.0, 20.0));
        let text = page.text(id).unwrap();
        assert_eq!(text.text, "Invoice 42");
        assert_eq!(text.font_size(), 20.0);
        assert!((text.y - 209.6).abs() < 1e-4);
        assert_eq!(editor.selection(), Some(Selection::text(id)));
        assert_eq!(editor.tool(), Tool::Select);
    }

    #[test]
    fn test_edit_text_miss_is_noop() {
        let mut editor = editor();
        editor.set_tool(Tool::EditText);
        let runs = [run("Invoice", 100.0, 200.0, 90.0, 12.0, 10.0)];
        assert_eq!(editor.apply_text_layout(0, Point::new(5.0, 5.0), &runs), None);
        assert!(!editor.current().has_content());
        assert_eq!(editor.tool(), Tool::EditText);
    }

    #[test]
    fn test_edit_text_result_lands_on_origin_page() {
        let mut editor = editor();
        editor.set_tool(Tool::EditText);
        editor.set_page(1);
        let runs = [run("Invoice", 100.0, 200.0, 90.0, 12.0, 10.0)];
        editor
            .apply_text_layout(0, Point::new(120.0, 205.0), &runs)
            .unwrap();

        assert!(editor.store().page(0).unwrap().has_content());
        assert!(!editor.current().has_content());
        assert_eq!(editor.selection(), None);
    }
}
