//! Isolation stage: a clean, off-screen copy of the live surface.
//!
//! Capturing the live surface directly is unreliable: it may be scrolled,
//! hidden behind the narrow-viewport tab switcher, or carrying the
//! responsive preview transform. The pipeline therefore deep-copies the
//! subtree into an off-screen container and strips the display-only
//! styling from the copy; the live surface is never touched.

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use crate::error::{Error, Result};
use crate::surface::template::escape;
use crate::surface::{SurfaceHost, ViewState};

/// Inline style properties that belong to the live view, not the document:
/// responsive preview transforms, centering margins, and drop shadows.
const STRIPPED_STYLE_PROPS: [&str; 3] = ["transform", "margin", "box-shadow"];

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: [&str; 3] = ["img", "hr", "br"];

/// Unmounts the off-screen container when dropped, so cleanup runs on
/// every exit path of a pipeline run.
pub(crate) struct MountGuard<'a> {
    host: &'a SurfaceHost,
    id: String,
}

impl std::fmt::Debug for MountGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountGuard").field("id", &self.id).finish()
    }
}

impl<'a> MountGuard<'a> {
    pub(crate) fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for MountGuard<'_> {
    fn drop(&mut self) {
        self.host.unmount(&self.id);
    }
}

/// Drop style declarations whose property is (or is a longhand of) one of
/// the stripped presentation properties.
fn sanitize_style(style: &str) -> String {
    style
        .split(';')
        .map(str::trim)
        .filter(|decl| !decl.is_empty())
        .filter(|decl| {
            let prop = decl
                .split(':')
                .next()
                .unwrap_or("")
                .trim()
                .to_ascii_lowercase();
            !STRIPPED_STYLE_PROPS
                .iter()
                .any(|s| prop == *s || prop.starts_with(&format!("{}-", s)))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Re-serialize an element subtree, sanitizing style attributes on the way.
fn serialize_sanitized(el: ElementRef, out: &mut String) {
    let element = el.value();
    out.push('<');
    out.push_str(element.name());
    for (name, value) in element.attrs() {
        if name == "style" {
            let kept = sanitize_style(value);
            if kept.is_empty() {
                continue;
            }
            out.push_str(&format!(" style=\"{}\"", escape(&kept)));
        } else {
            out.push_str(&format!(" {}=\"{}\"", name, escape(value)));
        }
    }
    if VOID_ELEMENTS.contains(&element.name()) {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&escape(&text.text)),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    serialize_sanitized(child_el, out);
                }
            }
            _ => {}
        }
    }
    out.push_str(&format!("</{}>", element.name()));
}

/// Locate the live surface root by its stable id and mount a sanitized
/// deep copy off-screen under a run-local container id.
///
/// Fails fast with [`Error::ElementNotFound`] when the surface is not
/// mounted or its markup does not contain the root element.
pub(crate) fn clone_into_offscreen<'a>(
    host: &'a SurfaceHost,
    surface_id: &str,
    container_id: String,
) -> Result<MountGuard<'a>> {
    let live = host
        .get(surface_id)
        .ok_or_else(|| Error::ElementNotFound(surface_id.to_string()))?;

    let doc = Html::parse_fragment(&live.html);
    let selector = Selector::parse(&format!("#{}", surface_id))
        .map_err(|e| Error::CaptureFailure(format!("bad root selector: {:?}", e)))?;
    let root = doc
        .select(&selector)
        .next()
        .ok_or_else(|| Error::ElementNotFound(surface_id.to_string()))?;

    let mut clone = String::with_capacity(live.html.len());
    serialize_sanitized(root, &mut clone);

    log::debug!(
        "isolated surface '{}' into '{}' ({} bytes)",
        surface_id,
        container_id,
        clone.len()
    );
    host.mount(&container_id, clone, ViewState::offscreen());
    Ok(MountGuard { host, id: container_id })
}
