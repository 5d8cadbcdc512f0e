//! The capture-and-export pipeline.
//!
//! Converts the current Render Surface into a downloadable fixed-page PDF,
//! independent of the live view's scroll position, container size, preview
//! transform, or visibility. Four strictly sequential stages (isolate,
//! settle, rasterize, cleanup + assemble) followed by delivery; all but
//! assembly and delivery are asynchronous.
//!
//! The pipeline is not reentrant: an atomic in-progress flag is the sole
//! mutual exclusion, and a second trigger while it is set is rejected
//! rather than queued. Cleanup of the off-screen container is guaranteed
//! on every exit path.

pub mod deliver;
mod isolate;
pub mod pdf;
pub mod raster;

pub use deliver::{derive_filename, ArtifactSink, DirectorySink, MemorySink};
pub use pdf::{PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
pub use raster::{Raster, CAPTURE_SCALE};

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use resvg::usvg::fontdb;

use crate::error::{Error, Result};
use crate::model::InvoiceData;
use crate::surface::{SurfaceHost, INVOICE_SURFACE_ID, PAGE_WIDTH_PX};

/// Tunables of a pipeline instance.
///
/// The defaults are the ones the editor ships with; tests shorten the
/// settle delay.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Bounded wait for pending layout of the freshly mounted clone,
    /// roughly one rendering frame.
    pub settle_delay: Duration,
    /// Device-pixel multiplier of the capture raster.
    pub scale: f32,
    /// Whether images hosted on other origins may be rasterized.
    pub allow_remote_images: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(16),
            scale: CAPTURE_SCALE,
            allow_remote_images: true,
        }
    }
}

/// What a successful export produced.
#[derive(Debug, Clone)]
pub struct ExportReceipt {
    pub filename: String,
    /// Size of the assembled document in bytes.
    pub bytes: usize,
    /// Output page height; width is always [`PAGE_WIDTH_MM`].
    pub page_height_mm: f32,
    /// Where the sink put the artifact, when it has a location.
    pub path: Option<PathBuf>,
}

/// Clears the in-progress flag when dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The capture-and-export pipeline. One instance is shared by every
/// trigger call site so they all observe the same in-progress state.
pub struct ExportPipeline {
    options: ExportOptions,
    sink: Arc<dyn ArtifactSink>,
    fonts: Arc<fontdb::Database>,
    in_progress: AtomicBool,
    run_seq: AtomicU64,
}

impl ExportPipeline {
    pub fn new(sink: Arc<dyn ArtifactSink>, options: ExportOptions) -> Self {
        Self {
            options,
            sink,
            fonts: raster::system_fonts(),
            in_progress: AtomicBool::new(false),
            run_seq: AtomicU64::new(0),
        }
    }

    /// Whether an export run is currently in flight. Trigger call sites
    /// disable their controls while this is set.
    pub fn is_in_progress(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }

    /// Export the invoice currently shown by the surface mounted in
    /// `host`.
    ///
    /// `data` is only consulted for the output filename; the document
    /// content is whatever the surface shows at rasterization time. A
    /// second trigger while a run is in flight returns
    /// [`Error::ExportInProgress`] and has no other effect.
    pub async fn export(&self, host: &SurfaceHost, data: &InvoiceData) -> Result<ExportReceipt> {
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::debug!("export trigger rejected: run already in progress");
            return Err(Error::ExportInProgress);
        }
        let _busy = BusyGuard(&self.in_progress);

        let result = self.run(host, data).await;
        match &result {
            Ok(receipt) => log::info!(
                "export complete: {} ({} bytes, {:.0}x{:.0}mm)",
                receipt.filename,
                receipt.bytes,
                PAGE_WIDTH_MM,
                receipt.page_height_mm
            ),
            Err(err) => log::warn!("export failed: {}", err),
        }
        result
    }

    async fn run(&self, host: &SurfaceHost, data: &InvoiceData) -> Result<ExportReceipt> {
        let run = self.run_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let container_id = format!("export-capture-{}", run);

        // Stage 1: isolate a sanitized copy off-screen. The guard removes
        // the container again on every path out of this function.
        let mount = isolate::clone_into_offscreen(host, INVOICE_SURFACE_ID, container_id)?;

        // Stage 2: settle. The clone was just mounted; give pending
        // layout work one bounded delay.
        tokio::time::sleep(self.options.settle_delay).await;

        // Stage 3: rasterize the settled clone on a blocking worker.
        let html = host
            .get(mount.id())
            .ok_or_else(|| Error::CaptureFailure("capture container disappeared".to_string()))?
            .html;
        let scale = self.options.scale;
        let allow_remote_images = self.options.allow_remote_images;
        let fonts = self.fonts.clone();
        let raster = tokio::task::spawn_blocking(move || {
            raster::rasterize_markup(&html, PAGE_WIDTH_PX, scale, allow_remote_images, fonts)
        })
        .await
        .map_err(|e| Error::CaptureFailure(format!("raster task: {}", e)))??;

        // Stage 4: cleanup, then assemble. The container is gone before
        // any artifact exists.
        drop(mount);
        let document = pdf::assemble_single_page(&raster)?;

        // Stage 5: deliver. Last action; only reached with a complete
        // document in hand.
        let filename = deliver::derive_filename(data);
        let path = self.sink.deliver(&filename, &document)?;

        Ok(ExportReceipt {
            filename,
            bytes: document.len(),
            page_height_mm: pdf::page_height_mm(raster.width, raster.height),
            path,
        })
    }
}

/// The single user-visible notification for a failed export; carries the
/// underlying error text.
pub fn failure_notice(err: &Error) -> String {
    format!("Failed to generate PDF: {}. Please try again.", err)
}
