//! Block layout of surface markup at a fixed logical width.
//!
//! The engine understands exactly the element and class vocabulary the
//! invoice template emits: vertical block stacking, `row` containers with
//! percentage columns, tables with per-column widths, images, rules, and a
//! small set of typographic utility classes. Text is wrapped by estimated
//! glyph advance; the estimate only has to be stable, not font-exact,
//! because the same estimate drives both the live surface and the capture
//! path.

use scraper::{ElementRef, Html, Selector};

use crate::error::{Error, Result};
use crate::surface::PAGE_MIN_HEIGHT_PX;

/// Inner padding of the page root (the template's `invoice-paper` class).
const PAGE_PADDING: f32 = 64.0;

const COLOR_BODY: &str = "#1f2937";
const COLOR_DARK: &str = "#111827";
const COLOR_MUTED: &str = "#6b7280";
const COLOR_FAINT: &str = "#9ca3af";
const COLOR_RULE: &str = "#e5e7eb";
const COLOR_RULE_SOFT: &str = "#f3f4f6";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Resolved typography for one text block.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub weight: u16,
    pub color: &'static str,
    pub align: TextAlign,
    pub letter_spacing: f32,
}

/// One positioned primitive of the laid-out page.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutNode {
    /// Wrapped text lines sharing one style inside one box.
    Text {
        rect: Rect,
        lines: Vec<String>,
        style: TextStyle,
    },
    /// A solid fill (horizontal rules, the placeholder logo mark).
    Fill {
        rect: Rect,
        color: &'static str,
        radius: f32,
    },
    /// An embedded image, scaled to fit its box.
    Image { rect: Rect, href: String },
}

/// The laid-out page: fixed width, content-driven height, paint-ready nodes.
#[derive(Debug, Clone)]
pub struct Page {
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<LayoutNode>,
}

/// Style properties accumulated from tag defaults and utility classes.
#[derive(Debug, Clone, Copy)]
struct Props {
    size: f32,
    weight: u16,
    color: &'static str,
    align: TextAlign,
    letter_spacing: f32,
    uppercase: bool,
    mt: f32,
    mb: f32,
    pt: f32,
    pb: f32,
    width_pct: Option<f32>,
}

impl Default for Props {
    fn default() -> Self {
        Self {
            size: 14.0,
            weight: 400,
            color: COLOR_BODY,
            align: TextAlign::Left,
            letter_spacing: 0.0,
            uppercase: false,
            mt: 0.0,
            mb: 0.0,
            pt: 0.0,
            pb: 0.0,
            width_pct: None,
        }
    }
}

fn classes(el: ElementRef) -> Vec<String> {
    el.value()
        .attr("class")
        .unwrap_or("")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn has_class(el: ElementRef, name: &str) -> bool {
    classes(el).iter().any(|c| c == name)
}

/// Numeric suffix of a `prefix-N` utility token, scaled by the 4px unit.
fn spacing_token(token: &str, prefix: &str) -> Option<f32> {
    token
        .strip_prefix(prefix)
        .and_then(|n| n.parse::<f32>().ok())
        .map(|n| n * 4.0)
}

fn resolve_props(el: ElementRef, inherited: &Props) -> Props {
    let mut p = Props {
        // Box spacing and widths are per-element, never inherited.
        mt: 0.0,
        mb: 0.0,
        pt: 0.0,
        pb: 0.0,
        width_pct: None,
        ..*inherited
    };

    // Tag defaults, then classes override.
    if el.value().name() == "h1" {
        p.size = 36.0;
        p.weight = 700;
        p.color = COLOR_DARK;
    }

    for token in classes(el) {
        match token.as_str() {
            "label" => {
                p.size = 10.0;
                p.weight = 700;
                p.color = COLOR_FAINT;
                p.uppercase = true;
                p.letter_spacing = 1.5;
            }
            "text-xs" => p.size = 12.0,
            "text-sm" => p.size = 14.0,
            "text-base" => p.size = 16.0,
            "text-lg" => p.size = 18.0,
            "text-3xl" => p.size = 30.0,
            "text-4xl" => p.size = 36.0,
            "bold" => p.weight = 700,
            "semibold" => p.weight = 600,
            "muted" => p.color = COLOR_MUTED,
            "faint" => p.color = COLOR_FAINT,
            "dark" => p.color = COLOR_DARK,
            "right" => p.align = TextAlign::Right,
            "center" => p.align = TextAlign::Center,
            "upper" => p.uppercase = true,
            _ => {
                if let Some(v) = spacing_token(&token, "mt-") {
                    p.mt = v;
                } else if let Some(v) = spacing_token(&token, "mb-") {
                    p.mb = v;
                } else if let Some(v) = spacing_token(&token, "pt-") {
                    p.pt = v;
                } else if let Some(v) = spacing_token(&token, "pb-") {
                    p.pb = v;
                } else if let Some(v) = token.strip_prefix("w-").and_then(|n| n.parse::<f32>().ok())
                {
                    p.width_pct = Some(v / 100.0);
                }
            }
        }
    }
    p
}

/// Estimated average glyph advance for the metric-free wrap below.
fn avg_char_width(size: f32, weight: u16) -> f32 {
    let factor = if weight >= 600 { 0.53 } else { 0.50 };
    size * factor
}

fn line_height(size: f32) -> f32 {
    size * 1.5
}

/// Greedy word wrap against an estimated characters-per-line limit.
fn wrap_text(text: &str, width: f32, size: f32, weight: u16, letter_spacing: f32) -> Vec<String> {
    let char_w = avg_char_width(size, weight) + letter_spacing;
    let chars_per_line = ((width / char_w) as usize).max(1);

    let mut lines = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        if !cur.is_empty() && cur.chars().count() + 1 + word.chars().count() > chars_per_line {
            lines.push(std::mem::take(&mut cur));
        }
        if !cur.is_empty() {
            cur.push(' ');
        }
        cur.push_str(word);
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines
}

fn collected_text(el: ElementRef) -> String {
    let raw: String = el.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_children(el: ElementRef) -> Vec<ElementRef> {
    el.children().filter_map(ElementRef::wrap).collect()
}

struct Layouter {
    nodes: Vec<LayoutNode>,
}

impl Layouter {
    /// Lay out one block element at (`x`, `y`) within `width`. Returns the
    /// vertical advance it consumes, including its own margins.
    fn layout_block(&mut self, el: ElementRef, x: f32, y: f32, width: f32, inherited: &Props) -> f32 {
        let props = resolve_props(el, inherited);
        let tag = el.value().name();

        let content_height = match tag {
            "h1" | "h2" | "h3" | "h4" | "p" | "span" => {
                self.layout_text(el, x, y + props.mt, width, &props)
            }
            "hr" => {
                let color = if has_class(el, "dark") { COLOR_DARK } else { COLOR_RULE };
                self.nodes.push(LayoutNode::Fill {
                    rect: Rect { x, y: y + props.mt, width, height: 1.0 },
                    color,
                    radius: 0.0,
                });
                1.0
            }
            "img" => self.layout_image(el, x, y + props.mt, width, &props),
            "table" => self.layout_table(el, x, y + props.mt, width, &props),
            "div" | "section" => {
                if has_class(el, "logo-mark") {
                    self.layout_logo_mark(el, x, y + props.mt, width, &props)
                } else if has_class(el, "row") {
                    self.layout_row(el, x, y + props.mt, width, &props)
                } else {
                    self.layout_stack(el, x, y + props.mt, width, &props)
                }
            }
            // Unknown tags lay out as plain stacks so the engine degrades
            // instead of dropping content.
            _ => self.layout_stack(el, x, y + props.mt, width, &props),
        };

        props.mt + content_height + props.mb
    }

    /// Vertical stack of child blocks.
    fn layout_stack(&mut self, el: ElementRef, x: f32, y: f32, width: f32, props: &Props) -> f32 {
        let mut cursor = y + props.pt;
        for child in element_children(el) {
            cursor += self.layout_block(child, x, cursor, width, props);
        }
        (cursor - y) + props.pb
    }

    /// Horizontal row: children become columns sized by their `w-N` class
    /// (equal split otherwise); row height is the tallest column.
    fn layout_row(&mut self, el: ElementRef, x: f32, y: f32, width: f32, props: &Props) -> f32 {
        let children = element_children(el);
        if children.is_empty() {
            return 0.0;
        }
        let equal = 1.0 / children.len() as f32;
        let mut cx = x;
        let mut tallest: f32 = 0.0;
        for child in &children {
            let child_props = resolve_props(*child, props);
            let frac = child_props.width_pct.unwrap_or(equal);
            let cw = width * frac;
            let h = self.layout_block(*child, cx, y, cw, props);
            tallest = tallest.max(h);
            cx += cw;
        }
        tallest
    }

    fn layout_text(&mut self, el: ElementRef, x: f32, y: f32, width: f32, props: &Props) -> f32 {
        let mut text = collected_text(el);
        if text.is_empty() {
            return 0.0;
        }
        if props.uppercase {
            text = text.to_uppercase();
        }
        let lines = wrap_text(&text, width, props.size, props.weight, props.letter_spacing);
        let height = lines.len() as f32 * line_height(props.size);
        self.nodes.push(LayoutNode::Text {
            rect: Rect { x, y: y + props.pt, width, height },
            lines,
            style: TextStyle {
                size: props.size,
                weight: props.weight,
                color: props.color,
                align: props.align,
                letter_spacing: props.letter_spacing,
            },
        });
        props.pt + height + props.pb
    }

    fn layout_image(&mut self, el: ElementRef, x: f32, y: f32, width: f32, props: &Props) -> f32 {
        let height = el
            .value()
            .attr("height")
            .and_then(|h| h.parse::<f32>().ok())
            .unwrap_or(64.0);
        // Fit box; the painter preserves the aspect ratio inside it.
        let box_width = (height * 2.5).min(width);
        let bx = match props.align {
            TextAlign::Right => x + width - box_width,
            TextAlign::Center => x + (width - box_width) / 2.0,
            TextAlign::Left => x,
        };
        if let Some(src) = el.value().attr("src") {
            self.nodes.push(LayoutNode::Image {
                rect: Rect { x: bx, y, width: box_width, height },
                href: src.to_string(),
            });
        }
        height
    }

    /// The placeholder logo mark: a dark rounded tile with a centered glyph.
    fn layout_logo_mark(&mut self, el: ElementRef, x: f32, y: f32, width: f32, props: &Props) -> f32 {
        const SIDE: f32 = 56.0;
        let bx = match props.align {
            TextAlign::Right => x + width - SIDE,
            TextAlign::Center => x + (width - SIDE) / 2.0,
            TextAlign::Left => x,
        };
        let rect = Rect { x: bx, y, width: SIDE, height: SIDE };
        self.nodes.push(LayoutNode::Fill { rect, color: COLOR_DARK, radius: 12.0 });
        let glyph = collected_text(el);
        if !glyph.is_empty() {
            self.nodes.push(LayoutNode::Text {
                rect: Rect { x: bx, y: y + SIDE / 2.0 - 14.0, width: SIDE, height: 28.0 },
                lines: vec![glyph],
                style: TextStyle {
                    size: 24.0,
                    weight: 700,
                    color: "#ffffff",
                    align: TextAlign::Center,
                    letter_spacing: 0.0,
                },
            });
        }
        SIDE
    }

    fn layout_table(&mut self, el: ElementRef, x: f32, y: f32, width: f32, props: &Props) -> f32 {
        let row_sel = Selector::parse("tr").expect("static selector");
        let cell_sel = Selector::parse("th, td").expect("static selector");

        let rows: Vec<ElementRef> = el.select(&row_sel).collect();
        if rows.is_empty() {
            return 0.0;
        }

        // Column fractions come from the header row's `w-N` classes.
        let header_cells: Vec<ElementRef> = rows[0].select(&cell_sel).collect();
        let equal = 1.0 / header_cells.len().max(1) as f32;
        let fractions: Vec<f32> = header_cells
            .iter()
            .map(|c| resolve_props(*c, props).width_pct.unwrap_or(equal))
            .collect();

        let mut cursor = y;
        for row in rows {
            let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
            let mut cx = x;
            let mut tallest: f32 = 0.0;
            for (i, cell) in cells.iter().enumerate() {
                let frac = fractions.get(i).copied().unwrap_or(equal);
                let cw = width * frac;
                let h = self.layout_text(*cell, cx, cursor, cw, &resolve_props(*cell, props));
                tallest = tallest.max(h);
                cx += cw;
            }
            cursor += tallest;
            // Row separators.
            let border = if has_class(row, "border-b-dark") {
                Some(COLOR_DARK)
            } else if has_class(row, "border-b") {
                Some(COLOR_RULE_SOFT)
            } else {
                None
            };
            if let Some(color) = border {
                self.nodes.push(LayoutNode::Fill {
                    rect: Rect { x, y: cursor, width, height: 1.0 },
                    color,
                    radius: 0.0,
                });
                cursor += 1.0;
            }
        }
        cursor - y
    }
}

/// Lay out (already sanitized) surface markup at the given logical width.
///
/// The page box is content-driven: an `invoice-paper` root gets the page
/// padding and the A4 minimum height; any other root is laid out tightly,
/// and an empty document yields a zero-height page (rejected downstream).
pub fn layout_surface(html: &str, width: f32) -> Result<Page> {
    let doc = Html::parse_fragment(html);
    let root = element_children(doc.root_element())
        .into_iter()
        .next()
        .ok_or_else(|| Error::CaptureFailure("surface markup has no root element".to_string()))?;

    let is_paper = has_class(root, "invoice-paper");
    let padding = if is_paper { PAGE_PADDING } else { 0.0 };

    let mut layouter = Layouter { nodes: Vec::new() };
    let props = Props::default();
    let mut content_height = 0.0;
    let mut cursor = padding;
    for child in element_children(root) {
        let advance = layouter.layout_block(child, padding, cursor, width - 2.0 * padding, &props);
        cursor += advance;
        content_height += advance;
    }

    let mut height = content_height + 2.0 * padding;
    if is_paper {
        height = height.max(PAGE_MIN_HEIGHT_PX);
    }

    Ok(Page { width, height, nodes: layouter.nodes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InvoiceData;
    use crate::surface::template::render_invoice;
    use crate::surface::PAGE_WIDTH_PX;

    fn sample_page() -> Page {
        let html = render_invoice(&InvoiceData::sample());
        layout_surface(&html, PAGE_WIDTH_PX).expect("layout")
    }

    #[test]
    fn page_width_is_fixed_and_height_at_least_a4() {
        let page = sample_page();
        assert_eq!(page.width, PAGE_WIDTH_PX);
        assert!(page.height >= PAGE_MIN_HEIGHT_PX);
    }

    #[test]
    fn more_items_grow_the_page_monotonically() {
        let mut data = InvoiceData::sample();
        for i in 0..60 {
            data.items.push(crate::model::LineItem::new(
                format!("Filler line item number {}", i),
                1.0,
                10.0,
            ));
        }
        let short = sample_page();
        let long = layout_surface(&render_invoice(&data), PAGE_WIDTH_PX).expect("layout");
        assert!(long.height > short.height);
        assert_eq!(long.width, short.width);
    }

    #[test]
    fn empty_root_lays_out_to_zero_height() {
        let page = layout_surface("<div id=\"invoice-preview-area\"></div>", PAGE_WIDTH_PX)
            .expect("layout");
        assert_eq!(page.height, 0.0);
        assert!(page.nodes.is_empty());
    }

    #[test]
    fn missing_root_is_a_capture_failure() {
        assert!(layout_surface("   ", PAGE_WIDTH_PX).is_err());
    }

    #[test]
    fn wrap_splits_long_text() {
        let lines = wrap_text(
            "one two three four five six seven eight nine ten",
            80.0,
            14.0,
            400,
            0.0,
        );
        assert!(lines.len() > 1);
        // No wrapped line comes back empty.
        for line in &lines {
            assert!(!line.is_empty());
        }
    }

    #[test]
    fn label_class_uppercases_and_shrinks() {
        let html = "<div class=\"invoice-paper\"><p class=\"label\">Bill To</p></div>";
        let page = layout_surface(html, PAGE_WIDTH_PX).expect("layout");
        match &page.nodes[0] {
            LayoutNode::Text { lines, style, .. } => {
                assert_eq!(lines[0], "BILL TO");
                assert_eq!(style.size, 10.0);
                assert_eq!(style.weight, 700);
            }
            other => panic!("expected text node, got {:?}", other),
        }
    }

    #[test]
    fn table_emits_rules_between_rows() {
        let page = sample_page();
        let rules = page
            .nodes
            .iter()
            .filter(|n| matches!(n, LayoutNode::Fill { .. }))
            .count();
        // Header underline + one per body row + totals rule + footer rule
        // + placeholder mark tile.
        assert!(rules >= 4, "expected row rules, found {}", rules);
    }
}
