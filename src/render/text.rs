//! Text pass of the page compositor
//!
//! Text is drawn with imageproc onto the straight-alpha page after the
//! tiny-skia shape pass. Fonts are resolved by family name from the
//! configured font table, falling back to the first loadable well-known
//! system font. Bold and italic are synthesized from the regular face.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::{Rgba, RgbaImage, imageops};
use imageproc::drawing::{draw_text_mut, text_size};
use imageproc::geometric_transformations::{Interpolation, Projection, warp};

use super::geometry::text;
use crate::domain::{ASCENT_FACTOR, Color, TextObject, estimate_text_width};

/// Transparent margin around a glyph layer
const LAYER_PAD: f32 = 2.0;

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Helvetica.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

fn load_font(path: &Path) -> Option<FontArc> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::debug!("Cannot read font {}: {}", path.display(), e);
            return None;
        }
    };
    match FontArc::try_from_vec(bytes) {
        Ok(font) => Some(font),
        Err(e) => {
            log::warn!("Invalid font {}: {}", path.display(), e);
            None
        }
    }
}

/// Fonts available to the compositor
#[derive(Clone, Default)]
pub struct FontBook {
    families: HashMap<String, FontArc>,
    fallback: Option<FontArc>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("families", &self.families.keys().collect::<Vec<_>>())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl FontBook {
    /// A book with no fonts; text renders as decorations only
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the configured families plus a system fallback
    pub fn load(table: &BTreeMap<String, PathBuf>) -> Self {
        let families: HashMap<String, FontArc> = table
            .iter()
            .filter_map(|(family, path)| Some((family.to_lowercase(), load_font(path)?)))
            .collect();
        let fallback = SYSTEM_FONTS.iter().find_map(|path| load_font(Path::new(path)));
        if fallback.is_none() && families.is_empty() {
            log::warn!("No usable font found; text will be exported without glyphs");
        }
        Self { families, fallback }
    }

    pub fn font_for(&self, family: &str) -> Option<&FontArc> {
        self.families
            .get(&family.to_lowercase())
            .or(self.fallback.as_ref())
    }

    /// Advance width of `obj`'s text, or the character estimate without a font
    pub fn measure(&self, obj: &TextObject) -> f32 {
        match self.font_for(&obj.font_family) {
            Some(font) => text_size(PxScale::from(obj.font_size()), font, &obj.text).0 as f32,
            None => estimate_text_width(&obj.text, obj.font_size()),
        }
    }
}

/// Draw a straight-alpha layer onto the page
fn fill_rect(page: &mut RgbaImage, x: f32, y: f32, width: f32, height: f32, color: Color) {
    let (x0, y0) = (x.round(), y.round());
    let w = (x + width).round() - x0;
    let h = (y + height).round() - y0;
    if w < 1.0 || h < 1.0 {
        return;
    }
    let layer = RgbaImage::from_pixel(w as u32, h as u32, Rgba(color.to_rgba_u8()));
    imageops::overlay(page, &layer, x0 as i64, y0 as i64);
}

/// Glyphs of `obj` on a transparent layer whose baseline sits at
/// `ascent + pad`, sheared when the object is italic
fn glyph_layer(font: &FontArc, obj: &TextObject) -> Option<(RgbaImage, f32, f32)> {
    let size = obj.font_size();
    let scale = PxScale::from(size);
    let ascent = font.as_scaled(scale).ascent();
    let (text_w, text_h) = text_size(scale, font, &obj.text);
    if text_w == 0 || text_h == 0 {
        return None;
    }
    let bold_offset = if obj.bold { bold_offset(size) } else { 0.0 };
    let shear = if obj.italic { text::ITALIC_SHEAR } else { 0.0 };
    let pad = (shear * text_h as f32).ceil() + LAYER_PAD;

    let [r, g, b, a] = obj.color.with_opacity(obj.opacity()).to_rgba_u8();
    let width = text_w + (2.0 * pad + bold_offset.ceil()) as u32;
    let height = text_h + (2.0 * LAYER_PAD) as u32;
    let mut layer = RgbaImage::from_pixel(width, height, Rgba([r, g, b, 0]));
    let ink = Rgba([r, g, b, a]);
    let top = LAYER_PAD as i32;
    draw_text_mut(&mut layer, ink, pad as i32, top, scale, font, &obj.text);
    if obj.bold {
        let x = (pad + bold_offset).round() as i32;
        draw_text_mut(&mut layer, ink, x, top, scale, font, &obj.text);
    }

    let baseline = LAYER_PAD + ascent;
    if shear != 0.0 {
        let projection = Projection::from_matrix([
            1.0,
            -shear,
            shear * baseline,
            0.0,
            1.0,
            0.0,
            0.0,
            0.0,
            1.0,
        ])?;
        layer = warp(&layer, &projection, Interpolation::Bilinear, Rgba([r, g, b, 0]));
    }
    Some((layer, pad, baseline))
}

fn bold_offset(size: f32) -> f32 {
    (size / 24.0).max(1.0)
}

/// Paint one text object: background highlight, glyphs, then underline
pub fn draw_text(page: &mut RgbaImage, fonts: &FontBook, obj: &TextObject) {
    let size = obj.font_size();
    let width = fonts.measure(obj);

    if !obj.background.is_transparent() {
        let background = obj.background.with_opacity(obj.opacity());
        fill_rect(page, obj.x, obj.y - ASCENT_FACTOR * size, width, size, background);
    }

    match fonts.font_for(&obj.font_family) {
        Some(font) => {
            if let Some((layer, pad, baseline)) = glyph_layer(font, obj) {
                let x = (obj.x - pad).round() as i64;
                let y = (obj.y - baseline).round() as i64;
                imageops::overlay(page, &layer, x, y);
            }
        }
        None => log::debug!("No font for {:?}; skipping glyphs", obj.font_family),
    }

    if obj.underline {
        let thickness = (size * text::UNDERLINE_RATIO).round().max(1.0);
        let center = obj.y + text::UNDERLINE_OFFSET;
        let color = obj.color.with_opacity(obj.opacity());
        fill_rect(page, obj.x, center - thickness / 2.0, width, thickness, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Point, TextStyle};

    fn text_object(style: TextStyle) -> TextObject {
        TextObject::new(1, Point::new(10.0, 40.0), "Hello", &style)
    }

    fn white(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]))
    }

    #[test]
    fn test_measure_without_font_uses_estimate() {
        let obj = text_object(TextStyle {
            font_size: 20.0,
            ..Default::default()
        });
        assert_eq!(FontBook::empty().measure(&obj), 5.0 * 20.0 * 0.6);
    }

    #[test]
    fn test_background_and_underline_paint_without_font() {
        let obj = text_object(TextStyle {
            font_size: 20.0,
            background: Color::rgb(255, 255, 0),
            underline: true,
            ..Default::default()
        });
        let mut page = white(100, 60);
        draw_text(&mut page, &FontBook::empty(), &obj);

        // highlight band covers rows 24..44
        assert_eq!(page.get_pixel(20, 30).0, [255, 255, 0, 255]);
        // one pixel underline centered two pixels below the baseline
        assert_eq!(page.get_pixel(20, 42).0, [0, 0, 0, 255]);
        assert_eq!(page.get_pixel(20, 41).0, [255, 255, 0, 255]);
        assert_eq!(page.get_pixel(20, 43).0, [255, 255, 0, 255]);
        // past the estimated width nothing is painted
        assert_eq!(page.get_pixel(80, 30).0, [255, 255, 255, 255]);
        assert_eq!(page.get_pixel(80, 42).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_translucent_background_blends() {
        let obj = text_object(TextStyle {
            font_size: 20.0,
            background: Color::BLACK,
            opacity: 0.5,
            ..Default::default()
        });
        let mut page = white(100, 60);
        draw_text(&mut page, &FontBook::empty(), &obj);
        let px = page.get_pixel(20, 30).0;
        assert_eq!(px[3], 255);
        assert!((126..=129).contains(&px[0]), "{:?}", px);
    }

    #[test]
    fn test_unknown_family_falls_back() {
        let book = FontBook::empty();
        assert!(book.font_for("Times").is_none());
    }
}
