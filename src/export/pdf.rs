//! Page assembly stage: one raster, one fixed-width PDF page.
//!
//! The page is always 210 units (mm) wide; its height follows the raster's
//! aspect ratio. Overflowing content therefore extends the single page
//! rather than paginating.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::error::{Error, Result};
use crate::export::raster::Raster;

/// Standard page width in millimetres (A4 portrait).
pub const PAGE_WIDTH_MM: f32 = 210.0;

/// Standard single-page height in millimetres. Informational: content
/// taller than this stretches the page instead of breaking.
pub const PAGE_HEIGHT_MM: f32 = 297.0;

const PT_PER_MM: f32 = 72.0 / 25.4;

/// Output page height for a raster, preserving its aspect ratio at the
/// fixed page width.
pub fn page_height_mm(raster_width: u32, raster_height: u32) -> f32 {
    raster_height as f32 * PAGE_WIDTH_MM / raster_width as f32
}

/// Assemble a single-page PDF embedding the raster at the page origin.
pub fn assemble_single_page(raster: &Raster) -> Result<Vec<u8>> {
    if raster.width == 0 || raster.height == 0 {
        return Err(Error::EncodingFailure("empty raster".to_string()));
    }

    let page_w_pt = PAGE_WIDTH_MM * PT_PER_MM;
    let page_h_pt = page_height_mm(raster.width, raster.height) * PT_PER_MM;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => raster.width as i64,
            "Height" => raster.height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        raster.rgb.clone(),
    );
    let image_id = doc.add_object(image_stream);

    // Scale the unit image square to the full page, origin bottom-left.
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    page_w_pt.into(),
                    0f32.into(),
                    0f32.into(),
                    page_h_pt.into(),
                    0f32.into(),
                    0f32.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content
        .encode()
        .map_err(|e| Error::EncodingFailure(format!("content stream: {}", e)))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0f32.into(), 0f32.into(), page_w_pt.into(), page_h_pt.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| Error::EncodingFailure(format!("document write: {}", e)))?;
    log::debug!(
        "assembled {}x{:.1}mm page ({} bytes)",
        PAGE_WIDTH_MM,
        page_height_mm(raster.width, raster.height),
        out.len()
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white_raster(width: u32, height: u32) -> Raster {
        Raster {
            width,
            height,
            rgb: vec![0xff; (width * height * 3) as usize],
        }
    }

    #[test]
    fn height_follows_aspect_ratio() {
        // A4-shaped raster comes out at the standard height.
        let h = page_height_mm(1588, 2246);
        assert!((h - PAGE_HEIGHT_MM).abs() < 1.0, "got {}", h);
        // Twice as tall a raster, twice as tall a page.
        assert!((page_height_mm(1588, 4492) - 2.0 * h).abs() < 0.5);
    }

    #[test]
    fn produces_a_parsable_single_page_document() {
        let bytes = assemble_single_page(&white_raster(794, 1123)).expect("assemble");
        assert!(bytes.starts_with(b"%PDF-"));
        let doc = Document::load_mem(&bytes).expect("reparse");
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn media_box_width_is_fixed() {
        let narrow = assemble_single_page(&white_raster(794, 1123)).expect("assemble");
        let tall = assemble_single_page(&white_raster(794, 3000)).expect("assemble");
        for bytes in [narrow, tall] {
            let doc = Document::load_mem(&bytes).expect("reparse");
            let (_, page_id) = doc.get_pages().into_iter().next().expect("page");
            let page = doc.get_dictionary(page_id).expect("page dict");
            let media_box = page.get(b"MediaBox").expect("media box");
            let Object::Array(values) = media_box else {
                panic!("MediaBox is not an array");
            };
            let width = match &values[2] {
                Object::Real(v) => *v as f32,
                Object::Integer(v) => *v as f32,
                other => panic!("unexpected width object {:?}", other),
            };
            assert!((width - 595.27).abs() < 0.1, "got {}", width);
        }
    }

    #[test]
    fn empty_raster_is_an_encoding_failure() {
        let raster = Raster { width: 0, height: 0, rgb: Vec::new() };
        assert!(matches!(
            assemble_single_page(&raster),
            Err(Error::EncodingFailure(_))
        ));
    }
}
