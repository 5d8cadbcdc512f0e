//! Render surface host: mounted, data-bound invoice documents.
//!
//! The host is the crate's stand-in for a live document tree. A surface is
//! mounted under a stable root identifier together with its display-only
//! [`ViewState`]; the export pipeline addresses the live surface by that
//! identifier and never mutates it. Rendering the markup itself is a pure
//! function of the invoice record (see [`template`]).

use std::collections::HashMap;
use std::sync::Mutex;

pub mod layout;
pub mod scene;
pub mod template;

/// Stable identifier of the live invoice surface root element. The export
/// pipeline locates the surface through this id irrespective of where else
/// it is mounted.
pub const INVOICE_SURFACE_ID: &str = "invoice-preview-area";

/// Fixed logical page width of the surface: A4 portrait at 96 dpi.
pub const PAGE_WIDTH_PX: f32 = 794.0;

/// Logical height of one standard A4 page at 96 dpi. Content may exceed
/// this; the surface grows rather than paginating.
pub const PAGE_MIN_HEIGHT_PX: f32 = 1123.0;

/// Display-only presentation state of a mounted surface.
///
/// Everything here belongs to the *live* view, not to the document:
/// responsive preview scaling, centering margin, drop shadow, scroll
/// position, and the narrow-viewport tab visibility. The capture pipeline
/// strips all of it from its off-screen copy.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    /// Current vertical scroll offset of the enclosing container.
    pub scroll_y: f32,
    /// Responsive preview zoom applied for on-screen display.
    pub preview_scale: f32,
    /// Horizontal translation; off-screen containers sit far outside the
    /// viewport.
    pub offset_x: f32,
    /// Stacking order; off-screen containers use a negative value so they
    /// can never become visible or interactive.
    pub z_index: i32,
    /// Whether the surface is currently behind a tab switcher (narrow
    /// viewports show either the editor or the preview, not both).
    pub hidden: bool,
}

impl ViewState {
    /// The live preview's state: centered, slightly scaled down, visible.
    pub fn on_screen() -> Self {
        Self {
            scroll_y: 0.0,
            preview_scale: 0.95,
            offset_x: 0.0,
            z_index: 0,
            hidden: false,
        }
    }

    /// State for a capture container: untransformed, translated outside
    /// the viewport, negative stacking order.
    pub fn offscreen() -> Self {
        Self {
            scroll_y: 0.0,
            preview_scale: 1.0,
            offset_x: -10_000.0,
            z_index: -1,
            hidden: false,
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::on_screen()
    }
}

/// A mounted surface: serialized markup plus its view state.
#[derive(Debug, Clone)]
pub struct MountedSurface {
    pub html: String,
    pub view: ViewState,
}

/// Registry of mounted surfaces keyed by root id.
///
/// Interior mutability so the editing session can remount while an export
/// holds a shared reference; an in-flight export reads whatever was
/// mounted at its rasterization time.
#[derive(Default)]
pub struct SurfaceHost {
    mounts: Mutex<HashMap<String, MountedSurface>>,
}

impl SurfaceHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount (or replace) a surface under `id`.
    pub fn mount(&self, id: &str, html: String, view: ViewState) {
        if let Ok(mut mounts) = self.mounts.lock() {
            log::debug!("mounting surface '{}' ({} bytes)", id, html.len());
            mounts.insert(id.to_string(), MountedSurface { html, view });
        }
    }

    /// Unmount a surface. Returns whether anything was removed.
    pub fn unmount(&self, id: &str) -> bool {
        match self.mounts.lock() {
            Ok(mut mounts) => {
                let removed = mounts.remove(id).is_some();
                if removed {
                    log::debug!("unmounted surface '{}'", id);
                }
                removed
            }
            Err(_) => false,
        }
    }

    /// Snapshot of a mounted surface, if present.
    pub fn get(&self, id: &str) -> Option<MountedSurface> {
        self.mounts.lock().ok()?.get(id).cloned()
    }

    pub fn is_mounted(&self, id: &str) -> bool {
        self.mounts
            .lock()
            .map(|m| m.contains_key(id))
            .unwrap_or(false)
    }

    /// Ids of everything currently mounted, in no particular order.
    pub fn mount_ids(&self) -> Vec<String> {
        self.mounts
            .lock()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Replace the view state of a mounted surface, leaving its markup
    /// untouched. No-op when the id is not mounted.
    pub fn set_view(&self, id: &str, view: ViewState) {
        if let Ok(mut mounts) = self.mounts.lock() {
            if let Some(surface) = mounts.get_mut(id) {
                surface.view = view;
            }
        }
    }

    /// Toggle the narrow-viewport tab visibility of a mounted surface.
    pub fn set_hidden(&self, id: &str, hidden: bool) {
        if let Ok(mut mounts) = self.mounts.lock() {
            if let Some(surface) = mounts.get_mut(id) {
                surface.view.hidden = hidden;
            }
        }
    }
}
