//! Rasterization stage: settled clone markup into print-quality pixels.
//!
//! The clone is laid out at the fixed logical page width, painted into an
//! SVG scene, and rendered at a fixed device-pixel multiplier over an
//! opaque white background, independent of any screen state.

use std::sync::Arc;

use resvg::tiny_skia::{self, Pixmap};
use resvg::usvg::{self, fontdb};

use crate::error::{Error, Result};
use crate::surface::{layout, scene};

/// Fixed device-pixel multiplier for print-quality sharpness.
pub const CAPTURE_SCALE: f32 = 2.0;

/// A captured page raster: tightly packed 8-bit RGB rows.
#[derive(Debug, Clone)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

/// A font database with the system fonts loaded, shared across runs.
pub fn system_fonts() -> Arc<fontdb::Database> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    Arc::new(db)
}

/// Reject remote image references unless the capability was granted.
fn check_remote_images(html: &str, allow_remote_images: bool) -> Result<()> {
    if allow_remote_images {
        return Ok(());
    }
    for marker in ["src=\"http://", "src=\"https://"] {
        if html.contains(marker) {
            return Err(Error::CaptureFailure(
                "surface references a remote image but remote images are disabled".to_string(),
            ));
        }
    }
    Ok(())
}

/// Lay out and rasterize sanitized surface markup.
pub fn rasterize_markup(
    html: &str,
    logical_width: f32,
    scale: f32,
    allow_remote_images: bool,
    fonts: Arc<fontdb::Database>,
) -> Result<Raster> {
    check_remote_images(html, allow_remote_images)?;
    let page = layout::layout_surface(html, logical_width)?;
    let svg = scene::paint_scene(&page);
    rasterize_scene(&svg, scale, fonts)
}

/// Render an SVG scene into an opaque RGB raster at the given scale.
pub fn rasterize_scene(svg: &str, scale: f32, fonts: Arc<fontdb::Database>) -> Result<Raster> {
    let mut options = usvg::Options::default();
    options.fontdb = fonts;
    let tree = usvg::Tree::from_str(svg, &options)
        .map_err(|e| Error::CaptureFailure(format!("scene parse: {}", e)))?;

    let size = tree.size();
    let width = (size.width() * scale).round() as u32;
    let height = (size.height() * scale).round() as u32;
    if width == 0 || height == 0 {
        return Err(Error::CaptureFailure(format!(
            "degenerate raster size {}x{}",
            width, height
        )));
    }

    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| Error::CaptureFailure(format!("pixmap allocation {}x{}", width, height)))?;
    // The document has no transparent regions; force the background so the
    // output never inherits canvas transparency.
    pixmap.fill(tiny_skia::Color::WHITE);
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        rgb.extend_from_slice(&[c.red(), c.green(), c.blue()]);
    }
    log::debug!("rasterized scene at {}x{} (scale {})", width, height, scale);
    Ok(Raster { width, height, rgb })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InvoiceData;
    use crate::surface::template::render_invoice;
    use crate::surface::PAGE_WIDTH_PX;

    #[test]
    fn raster_doubles_logical_dimensions() {
        let html = render_invoice(&InvoiceData::sample());
        let raster =
            rasterize_markup(&html, PAGE_WIDTH_PX, CAPTURE_SCALE, true, system_fonts())
                .expect("raster");
        assert_eq!(raster.width, (PAGE_WIDTH_PX * CAPTURE_SCALE).round() as u32);
        assert!(raster.height as f32 >= 1123.0 * CAPTURE_SCALE);
        assert_eq!(raster.rgb.len(), (raster.width * raster.height * 3) as usize);
    }

    #[test]
    fn background_is_opaque_white() {
        let html = render_invoice(&InvoiceData::sample());
        let raster =
            rasterize_markup(&html, PAGE_WIDTH_PX, CAPTURE_SCALE, true, system_fonts())
                .expect("raster");
        // The top-left corner sits inside the page padding.
        assert_eq!(&raster.rgb[0..3], &[255, 255, 255]);
    }

    #[test]
    fn empty_clone_is_a_capture_failure() {
        let err = rasterize_markup(
            "<div id=\"invoice-preview-area\"></div>",
            PAGE_WIDTH_PX,
            CAPTURE_SCALE,
            true,
            system_fonts(),
        )
        .expect_err("degenerate page");
        assert!(matches!(err, Error::CaptureFailure(_)));
    }

    #[test]
    fn remote_images_require_the_capability() {
        let html = "<div class=\"invoice-paper\"><img src=\"https://example.com/logo.png\" height=\"64\"/></div>";
        let err = rasterize_markup(html, PAGE_WIDTH_PX, CAPTURE_SCALE, false, system_fonts())
            .expect_err("remote image blocked");
        assert!(matches!(err, Error::CaptureFailure(_)));
        // With the capability granted the raster proceeds (unresolvable
        // references are tolerated, not fatal).
        assert!(
            rasterize_markup(html, PAGE_WIDTH_PX, CAPTURE_SCALE, true, system_fonts()).is_ok()
        );
    }
}
