//! Scene painting: positioned layout nodes into an SVG scene.
//!
//! The scene is the paint-command list of the pipeline, expressed as SVG so
//! the rasterizer can consume it directly. Painting is deterministic: the
//! same page produces the same scene string byte for byte, which is what
//! the content-addressed golden tests hash.

use crate::surface::layout::{LayoutNode, Page, Rect, TextAlign, TextStyle};
use crate::surface::template::escape;

const FONT_STACK: &str = "Helvetica, Arial, sans-serif";

fn push_text(svg: &mut String, rect: &Rect, lines: &[String], style: &TextStyle) {
    let line_height = style.size * 1.5;
    for (i, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let (x, anchor) = match style.align {
            TextAlign::Left => (rect.x, "start"),
            TextAlign::Center => (rect.x + rect.width / 2.0, "middle"),
            TextAlign::Right => (rect.x + rect.width, "end"),
        };
        // Baseline sits at roughly 80% of the line box.
        let y = rect.y + i as f32 * line_height + style.size * 1.2;
        svg.push_str(&format!(
            "<text x=\"{x}\" y=\"{y}\" font-family=\"{font}\" font-size=\"{size}\" \
             font-weight=\"{weight}\" fill=\"{fill}\" text-anchor=\"{anchor}\"",
            x = x,
            y = y,
            font = FONT_STACK,
            size = style.size,
            weight = style.weight,
            fill = style.color,
            anchor = anchor,
        ));
        if style.letter_spacing != 0.0 {
            svg.push_str(&format!(" letter-spacing=\"{}\"", style.letter_spacing));
        }
        svg.push('>');
        svg.push_str(&escape(line));
        svg.push_str("</text>");
    }
}

/// Paint a laid-out page into an SVG scene over a solid white background.
///
/// The invoice has no transparent regions; forcing the background here
/// keeps the raster correct on viewers that do not assume white.
pub fn paint_scene(page: &Page) -> String {
    let mut svg = String::with_capacity(16 * 1024);
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" \
         viewBox=\"0 0 {w} {h}\">",
        w = page.width,
        h = page.height,
    ));
    svg.push_str(&format!(
        "<rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"#ffffff\"/>",
        page.width, page.height
    ));

    for node in &page.nodes {
        match node {
            LayoutNode::Fill { rect, color, radius } => {
                svg.push_str(&format!(
                    "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{}\" fill=\"{}\"/>",
                    rect.x, rect.y, rect.width, rect.height, radius, color
                ));
            }
            LayoutNode::Image { rect, href } => {
                svg.push_str(&format!(
                    "<image x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" \
                     preserveAspectRatio=\"xMidYMid meet\" href=\"{}\"/>",
                    rect.x,
                    rect.y,
                    rect.width,
                    rect.height,
                    escape(href)
                ));
            }
            LayoutNode::Text { rect, lines, style } => {
                push_text(&mut svg, rect, lines, style);
            }
        }
    }

    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InvoiceData;
    use crate::surface::layout::layout_surface;
    use crate::surface::template::render_invoice;
    use crate::surface::PAGE_WIDTH_PX;

    fn sample_scene() -> String {
        let html = render_invoice(&InvoiceData::sample());
        let page = layout_surface(&html, PAGE_WIDTH_PX).expect("layout");
        paint_scene(&page)
    }

    #[test]
    fn scene_has_white_background_first() {
        let svg = sample_scene();
        let bg = svg.find("fill=\"#ffffff\"").expect("white background");
        let first_text = svg.find("<text").expect("text nodes");
        assert!(bg < first_text);
    }

    #[test]
    fn scene_contains_invoice_content() {
        let svg = sample_scene();
        assert!(svg.contains("INVOICE"));
        assert!(svg.contains("BILL TO"));
        assert!(svg.contains("AMOUNT DUE"));
    }

    #[test]
    fn scene_is_deterministic() {
        assert_eq!(sample_scene(), sample_scene());
    }

    #[test]
    fn logo_data_uri_is_painted_as_image() {
        let mut data = InvoiceData::sample();
        data.logo_url = Some("data:image/png;base64,AAAA".to_string());
        let html = render_invoice(&data);
        let page = layout_surface(&html, PAGE_WIDTH_PX).expect("layout");
        let svg = paint_scene(&page);
        assert!(svg.contains("<image"));
        assert!(svg.contains("data:image/png;base64,AAAA"));
    }
}
