//! Page compositing using tiny-skia
//!
//! These functions burn overlay objects into a page bitmap. Shapes and images
//! go through a premultiplied tiny-skia pixmap; text is drawn afterwards on
//! the converted `RgbaImage`.

use anyhow::{Context, Result};
use image::RgbaImage;
use tiny_skia::{
    BlendMode, FillRule, FilterQuality, IntSize, LineCap, LineJoin, Paint, PathBuilder, Pixmap,
    PixmapPaint, Stroke, Transform,
};

use crate::domain::{DrawingPath, ImageObject, PaintMode, RedactionObject, TextObject};

use super::text::{FontBook, draw_text};

/// Premultiplied pixmap from a straight-alpha bitmap
pub fn pixmap_from_rgba(img: &RgbaImage) -> Result<Pixmap> {
    let size = IntSize::from_wh(img.width(), img.height()).context("empty page bitmap")?;
    let mut data = img.as_raw().clone();
    for px in data.chunks_exact_mut(4) {
        let a = px[3] as u32;
        if a < 255 {
            for c in &mut px[..3] {
                *c = ((*c as u32 * a + 127) / 255) as u8;
            }
        }
    }
    Pixmap::from_vec(data, size).context("cannot allocate page pixmap")
}

/// Straight-alpha bitmap from a premultiplied pixmap
pub fn rgba_from_pixmap(pixmap: &Pixmap) -> RgbaImage {
    let mut out = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        dst.0 = [c.red(), c.green(), c.blue(), c.alpha()];
    }
    out
}

/// Fill redaction rectangles with opaque white
pub fn fill_redactions(pixmap: &mut Pixmap, redactions: &[RedactionObject]) {
    if redactions.is_empty() {
        return;
    }
    let mut paint = Paint::default();
    paint.set_color(tiny_skia::Color::WHITE);
    paint.anti_alias = false;

    for redaction in redactions {
        let r = redaction.rect;
        if let Some(rect) = tiny_skia::Rect::from_xywh(r.x, r.y, r.width, r.height) {
            pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }
    }
}

fn path_paint(path: &DrawingPath) -> Paint<'static> {
    let [r, g, b, a] = path.color.with_opacity(path.opacity).to_rgba_u8();
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint.blend_mode = match path.paint_mode {
        PaintMode::Normal => BlendMode::SourceOver,
        PaintMode::Multiply => BlendMode::Multiply,
    };
    paint
}

/// Paint a stroke that never left its first point as a dot
fn fill_dot(pixmap: &mut Pixmap, path: &DrawingPath, paint: &Paint) {
    let Some(&at) = path.points().first() else {
        return;
    };
    let half = path.width / 2.0;
    if path.square_caps() {
        if let Some(rect) = tiny_skia::Rect::from_xywh(at.x - half, at.y - half, path.width, path.width) {
            pixmap.fill_rect(rect, paint, Transform::identity(), None);
        }
    } else if let Some(circle) = PathBuilder::from_circle(at.x, at.y, half) {
        pixmap.fill_path(&circle, paint, FillRule::Winding, Transform::identity(), None);
    }
}

/// Stroke drawing paths in commit order
///
/// Highlighter paths multiply with square caps; every other path uses
/// normal blending with round caps and joins. Each path gets a fresh paint,
/// so opacity and blend mode never leak into the next one.
pub fn stroke_paths(pixmap: &mut Pixmap, paths: &[DrawingPath]) {
    for path in paths {
        let paint = path_paint(path);
        let points = path.points();
        let Some((first, rest)) = points.split_first() else {
            continue;
        };
        if rest.iter().all(|p| p == first) {
            fill_dot(pixmap, path, &paint);
            continue;
        }

        let mut pb = PathBuilder::new();
        pb.move_to(first.x, first.y);
        for p in rest {
            pb.line_to(p.x, p.y);
        }
        let Some(skia_path) = pb.finish() else {
            continue;
        };

        let (line_cap, line_join) = if path.square_caps() {
            (LineCap::Square, LineJoin::Miter)
        } else {
            (LineCap::Round, LineJoin::Round)
        };
        let stroke = Stroke {
            width: path.width,
            line_cap,
            line_join,
            ..Default::default()
        };
        pixmap.stroke_path(&skia_path, &paint, &stroke, Transform::identity(), None);
    }
}

/// Draw a decoded image at the object's rectangle with its opacity
pub fn draw_image(pixmap: &mut Pixmap, obj: &ImageObject, decoded: &RgbaImage) -> Result<()> {
    if decoded.width() == 0 || decoded.height() == 0 {
        return Ok(());
    }
    let source = pixmap_from_rgba(decoded)?;
    let sx = obj.width / decoded.width() as f32;
    let sy = obj.height / decoded.height() as f32;
    let paint = PixmapPaint {
        opacity: obj.opacity(),
        blend_mode: BlendMode::SourceOver,
        quality: FilterQuality::Bilinear,
    };
    let transform = Transform::from_row(sx, 0.0, 0.0, sy, obj.x, obj.y);
    pixmap.draw_pixmap(0, 0, source.as_ref(), &paint, transform, None);
    Ok(())
}

/// Draw text objects in z-order onto the straight-alpha page
pub fn draw_texts(page: &mut RgbaImage, fonts: &FontBook, texts: &[TextObject]) {
    for obj in texts {
        draw_text(page, fonts, obj);
    }
}

/// Opaque white page, used when a background is missing
pub fn blank_page(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width.max(1), height.max(1), image::Rgba([255, 255, 255, 255]))
}
