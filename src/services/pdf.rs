//! PDF output where every page is a single image
//!
//! Unchanged pages are re-rasterized from the source document so the output
//! always has the source's page count and order.

use std::io::Write;

use anyhow::{Context, Result, bail};
use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::RgbaImage;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};

use super::{DocumentEncoder, DocumentSource, FlattenedPage, PageRasterizer};

/// Rasterized pixels per PDF point
pub const PIXELS_PER_POINT: f32 = 2.0;

#[derive(Debug, Clone)]
pub struct PdfImageEncoder<R> {
    rasterizer: R,
}

impl<R: PageRasterizer> PdfImageEncoder<R> {
    pub fn new(rasterizer: R) -> Self {
        Self { rasterizer }
    }
}

impl<R: PageRasterizer> DocumentEncoder for PdfImageEncoder<R> {
    async fn encode(&self, source: &DocumentSource, pages: Vec<FlattenedPage>) -> Result<Vec<u8>> {
        let mut bitmaps = self
            .rasterizer
            .rasterize(source)
            .await
            .context("cannot rasterize original pages")?;
        for page in pages {
            let Some(slot) = bitmaps.get_mut(page.page_index) else {
                bail!(
                    "flattened page {} is outside a {} page document",
                    page.page_index,
                    bitmaps.len()
                );
            };
            *slot = page.bitmap;
        }
        tokio::task::spawn_blocking(move || build_pdf(&bitmaps)).await?
    }
}

/// Zlib-compressed RGB samples, composited over white
fn rgb_samples(bitmap: &RgbaImage) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    let mut row = Vec::with_capacity(bitmap.width() as usize * 3);
    for pixels in bitmap.rows() {
        row.clear();
        for px in pixels {
            let [r, g, b, a] = px.0;
            let a = a as u32;
            for c in [r, g, b] {
                row.push(((c as u32 * a + 255 * (255 - a)) / 255) as u8);
            }
        }
        encoder.write_all(&row)?;
    }
    Ok(encoder.finish()?)
}

pub fn build_pdf(bitmaps: &[RgbaImage]) -> Result<Vec<u8>> {
    if bitmaps.is_empty() {
        bail!("document has no pages");
    }
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(bitmaps.len());

    for bitmap in bitmaps {
        let width_pt = bitmap.width() as f32 / PIXELS_PER_POINT;
        let height_pt = bitmap.height() as f32 / PIXELS_PER_POINT;

        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => bitmap.width() as i64,
                "Height" => bitmap.height() as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            rgb_samples(bitmap)?,
        )
        .with_compression(false);
        let image_id = doc.add_object(image);

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        width_pt.into(),
                        0.into(),
                        0.into(),
                        height_pt.into(),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            content.encode().context("cannot encode page content")?,
        ));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width_pt.into(), height_pt.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "Im0" => image_id,
                },
            },
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).context("cannot write PDF")?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    struct FixedPages(Vec<RgbaImage>);

    impl PageRasterizer for FixedPages {
        async fn rasterize(&self, _source: &DocumentSource) -> Result<Vec<RgbaImage>> {
            Ok(self.0.clone())
        }
    }

    fn source() -> DocumentSource {
        DocumentSource::Bytes {
            name: "test".into(),
            bytes: Vec::new().into(),
        }
    }

    #[test]
    fn test_page_size_is_half_the_pixels() {
        let pdf = build_pdf(&[RgbaImage::new(400, 600)]).unwrap();
        let doc = Document::load_mem(&pdf).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
        let page = doc.get_dictionary(page_id).unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        assert_eq!(media_box[2].as_float().unwrap(), 200.0);
        assert_eq!(media_box[3].as_float().unwrap(), 300.0);
    }

    #[test]
    fn test_transparent_pixels_become_white() {
        let mut bitmap = RgbaImage::new(1, 1);
        bitmap.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        let compressed = rgb_samples(&bitmap).unwrap();
        let mut decoder = flate2::read::ZlibDecoder::new(&compressed[..]);
        let mut raw = Vec::new();
        std::io::Read::read_to_end(&mut decoder, &mut raw).unwrap();
        assert_eq!(raw, vec![255, 255, 255]);
    }

    #[tokio::test]
    async fn test_unchanged_pages_are_kept() {
        let encoder = PdfImageEncoder::new(FixedPages(vec![
            RgbaImage::new(100, 100),
            RgbaImage::new(100, 100),
            RgbaImage::new(100, 100),
        ]));
        let changed = vec![FlattenedPage {
            page_index: 1,
            bitmap: RgbaImage::new(200, 100),
        }];
        let pdf = encoder.encode(&source(), changed).await.unwrap();
        let doc = Document::load_mem(&pdf).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[tokio::test]
    async fn test_out_of_range_page_is_rejected() {
        let encoder = PdfImageEncoder::new(FixedPages(vec![RgbaImage::new(10, 10)]));
        let changed = vec![FlattenedPage {
            page_index: 4,
            bitmap: RgbaImage::new(10, 10),
        }];
        assert!(encoder.encode(&source(), changed).await.is_err());
    }
}
