//! Flatten & export pipeline
//!
//! Every page with overlay content is composited onto its background in a
//! fixed order: background, redactions, paths, images, text. Pages are
//! processed one at a time; each page's overlays are snapshotted before any
//! image decode is awaited.

use std::sync::Arc;

use anyhow::{Context, Result};
use image::RgbaImage;

use crate::render::FontBook;
use crate::render::image::{
    draw_image, draw_texts, fill_redactions, pixmap_from_rgba, rgba_from_pixmap, stroke_paths,
};
use crate::services::{DocumentEncoder, DocumentSource, FlattenedPage};
use crate::session::{OverlayStore, PageSnapshot};

/// Result of a successful export
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// Pages that were flattened, ascending
    pub changed_pages: Vec<usize>,
    /// Encoded output document
    pub bytes: Vec<u8>,
}

/// Burn one page's overlays into a copy of its background
pub async fn flatten_page(
    background: &RgbaImage,
    snapshot: &PageSnapshot,
    fonts: &FontBook,
) -> Result<RgbaImage> {
    let mut pixmap = pixmap_from_rgba(background)?;

    fill_redactions(&mut pixmap, &snapshot.redactions);
    stroke_paths(&mut pixmap, &snapshot.paths);

    for obj in snapshot.images.iter() {
        let source = obj.source.clone();
        let decoded = tokio::task::spawn_blocking(move || source.decode())
            .await
            .context("image decode task failed")?;
        match decoded {
            Ok(decoded) => draw_image(&mut pixmap, obj, &decoded)?,
            Err(e) => log::warn!(
                "Skipping image {} on page {}: {:#}",
                obj.id,
                snapshot.page_index,
                e
            ),
        }
    }

    let mut page = rgba_from_pixmap(&pixmap);
    draw_texts(&mut page, fonts, &snapshot.texts);
    Ok(page)
}

/// Flatten every page that has overlay content, in ascending page order
pub async fn flatten_changed(
    store: &OverlayStore,
    backgrounds: &[Arc<RgbaImage>],
    fonts: &FontBook,
) -> Result<Vec<FlattenedPage>> {
    let mut flattened = Vec::new();
    for page_index in store.changed_pages() {
        let snapshot = store
            .snapshot(page_index)
            .with_context(|| format!("page {} vanished during export", page_index))?;
        let background = backgrounds
            .get(page_index)
            .with_context(|| format!("no background for page {}", page_index))?;
        log::debug!("Flattening page {}", page_index);
        let bitmap = flatten_page(background, &snapshot, fonts).await?;
        flattened.push(FlattenedPage { page_index, bitmap });
    }
    Ok(flattened)
}

/// Flatten the changed pages and hand them to the encoder
pub async fn export_document<E: DocumentEncoder>(
    store: &OverlayStore,
    backgrounds: &[Arc<RgbaImage>],
    fonts: &FontBook,
    source: &DocumentSource,
    encoder: &E,
) -> Result<ExportReport> {
    let pages = flatten_changed(store, backgrounds, fonts).await?;
    let changed_pages: Vec<usize> = pages.iter().map(|p| p.page_index).collect();
    log::info!(
        "Exporting {} with {} changed pages",
        source.name(),
        changed_pages.len()
    );
    let bytes = encoder
        .encode(source, pages)
        .await
        .context("cannot encode document")?;
    Ok(ExportReport {
        changed_pages,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Color, DrawingPath, ImageObject, ImageSource, ObjectKind, PaintMode, PathTool, Point,
        Rect, RedactionObject, TextObject, TextStyle,
    };
    use crate::render::image::blank_page;

    fn background() -> RgbaImage {
        RgbaImage::from_pixel(100, 100, image::Rgba([30, 30, 30, 255]))
    }

    #[tokio::test]
    async fn test_empty_pages_are_not_flattened() {
        let mut store = OverlayStore::new(3);
        store.page_mut(1).unwrap().add_redaction(RedactionObject {
            id: 1,
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
        });
        let backgrounds: Vec<_> = (0..3).map(|_| Arc::new(background())).collect();

        let pages = flatten_changed(&store, &backgrounds, &FontBook::empty())
            .await
            .unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page_index, 1);
    }

    #[tokio::test]
    async fn test_paint_order_paths_over_redactions() {
        let mut store = OverlayStore::new(1);
        let page = store.page_mut(0).unwrap();
        page.add_redaction(RedactionObject {
            id: 1,
            rect: Rect::new(0.0, 0.0, 50.0, 100.0),
        });
        let mut path = DrawingPath::new(
            Point::new(25.0, 10.0),
            PathTool::Freehand,
            Color::rgb(0, 0, 255),
            6.0,
            1.0,
            PaintMode::Normal,
        );
        path.push(Point::new(25.0, 90.0));
        page.commit_stroke(path);

        let snapshot = store.snapshot(0).unwrap();
        let out = flatten_page(&background(), &snapshot, &FontBook::empty())
            .await
            .unwrap();
        assert_eq!(out.get_pixel(25, 50).0, [0, 0, 255, 255]);
        assert_eq!(out.get_pixel(10, 50).0, [255, 255, 255, 255]);
        assert_eq!(out.get_pixel(75, 50).0, [30, 30, 30, 255]);
    }

    #[tokio::test]
    async fn test_text_highlight_paints_over_images() {
        let mut store = OverlayStore::new(1);
        let page = store.page_mut(0).unwrap();
        let red = RgbaImage::from_pixel(4, 4, image::Rgba([255, 0, 0, 255]));
        let source = ImageSource::from_rgba(&red).unwrap();
        page.add_image(ImageObject::new(1, Point::new(0.0, 0.0), 100.0, 100.0, source));
        let style = TextStyle {
            font_size: 20.0,
            background: Color::rgb(0, 255, 0),
            ..Default::default()
        };
        page.add_text(TextObject::new(2, Point::new(10.0, 50.0), "abc", &style));

        let snapshot = store.snapshot(0).unwrap();
        let out = flatten_page(&blank_page(100, 100), &snapshot, &FontBook::empty())
            .await
            .unwrap();
        // highlight spans y 34..54 and 36px wide
        assert_eq!(out.get_pixel(12, 36).0, [0, 255, 0, 255]);
        assert_eq!(out.get_pixel(80, 80).0, [255, 0, 0, 255]);
    }

    #[tokio::test]
    async fn test_images_paint_in_list_order() {
        let solid = |rgba: [u8; 4]| {
            ImageSource::from_rgba(&RgbaImage::from_pixel(4, 4, image::Rgba(rgba))).unwrap()
        };
        let mut store = OverlayStore::new(1);
        let page = store.page_mut(0).unwrap();
        let red = solid([255, 0, 0, 255]);
        let blue = solid([0, 0, 255, 255]);
        page.add_image(ImageObject::new(1, Point::new(0.0, 0.0), 60.0, 60.0, red));
        page.add_image(ImageObject::new(2, Point::new(40.0, 40.0), 60.0, 60.0, blue));
        let fonts = FontBook::empty();

        let snapshot = store.snapshot(0).unwrap();
        let out = flatten_page(&background(), &snapshot, &fonts).await.unwrap();
        assert_eq!(out.get_pixel(50, 50).0, [0, 0, 255, 255]);
        assert_eq!(out.get_pixel(20, 20).0, [255, 0, 0, 255]);

        assert!(store.page_mut(0).unwrap().reorder_to_back(2, ObjectKind::Image));
        let snapshot = store.snapshot(0).unwrap();
        let out = flatten_page(&background(), &snapshot, &fonts).await.unwrap();
        assert_eq!(out.get_pixel(50, 50).0, [255, 0, 0, 255]);
        assert_eq!(out.get_pixel(80, 80).0, [0, 0, 255, 255]);
        assert_eq!(out.get_pixel(90, 10).0, [30, 30, 30, 255]);
    }

    #[tokio::test]
    async fn test_undecodable_image_is_skipped() {
        let mut store = OverlayStore::new(1);
        let source = ImageSource {
            bytes: b"junk".to_vec().into(),
            natural_width: 1,
            natural_height: 1,
        };
        store
            .page_mut(0)
            .unwrap()
            .add_image(ImageObject::new(1, Point::new(0.0, 0.0), 50.0, 50.0, source));
        let snapshot = store.snapshot(0).unwrap();
        let out = flatten_page(&background(), &snapshot, &FontBook::empty())
            .await
            .unwrap();
        assert_eq!(out.get_pixel(10, 10).0, [30, 30, 30, 255]);
    }
}
