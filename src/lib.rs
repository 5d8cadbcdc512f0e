//! Invoicepress
//!
//! A data-bound invoice editor with a fixed-page PDF export pipeline.
//!
//! # Features
//!
//! - **Editing session**: whole-record replacement over one invoice, with
//!   the live surface re-rendered after every edit
//! - **Render surface**: a deterministic A4-width document derived purely
//!   from the invoice record, addressable by one stable root id
//! - **Capture-and-export pipeline**: isolates a sanitized off-screen copy
//!   of the surface, rasterizes it at a fixed 2x multiplier, and delivers
//!   a single-page 210mm-wide PDF with a derived filename
//! - **Extraction adapter** (feature `extract`): auto-fills recipient
//!   fields from free-form pasted text via a hosted language model
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use invoicepress::export::{DirectorySink, ExportOptions};
//! use invoicepress::{EditorSession, ExportPipeline, SurfaceHost};
//!
//! # #[tokio::main]
//! # async fn main() -> invoicepress::Result<()> {
//! let host = Arc::new(SurfaceHost::new());
//! let pipeline = Arc::new(ExportPipeline::new(
//!     Arc::new(DirectorySink::new("downloads")),
//!     ExportOptions::default(),
//! ));
//! let mut session = EditorSession::new(host, pipeline);
//! session.set_notes("Net 30.");
//! let receipt = session.export().await?;
//! println!("saved {}", receipt.filename);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod editor;
pub mod export;
pub mod model;
pub mod surface;

// Extraction service adapter (feature-gated; the pipeline never calls it)
#[cfg(feature = "extract")]
pub mod extract;

// Re-export the session-facing types at the crate root for ergonomic use
pub use editor::EditorSession;
pub use export::{ExportOptions, ExportPipeline, ExportReceipt};
pub use model::{InvoiceData, LineItem, LogoAlignment, PartyInfo};
pub use surface::{SurfaceHost, ViewState, INVOICE_SURFACE_ID};
