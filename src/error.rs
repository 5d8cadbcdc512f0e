//! Error types for the invoice editor and export pipeline

use thiserror::Error;

/// Result type alias for editor and pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while editing, capturing, or exporting an invoice
#[derive(Error, Debug)]
pub enum Error {
    /// The export root element was not mounted at trigger time
    #[error("Export root '{0}' not found in the surface host")]
    ElementNotFound(String),

    /// Layout or rasterization of the captured surface failed
    #[error("Capture failed: {0}")]
    CaptureFailure(String),

    /// Encoding the raster into the output document failed
    #[error("Encoding failed: {0}")]
    EncodingFailure(String),

    /// An export run is already in flight; the trigger is rejected, not queued
    #[error("An export is already in progress")]
    ExportInProgress,

    /// The assembled artifact could not be handed to the sink
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// The extraction service has no endpoint or credentials configured
    #[cfg(feature = "extract")]
    #[error("Extraction service is not configured: {0}")]
    ExtractionNotConfigured(String),

    /// The extraction service call failed or returned an unusable response
    #[cfg(feature = "extract")]
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "extract")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::ExtractionFailed(err.to_string())
    }
}
