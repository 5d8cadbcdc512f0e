//! Delivery stage: filename derivation and the artifact sink seam.
//!
//! Delivery is the pipeline's final action; a sink is only ever handed a
//! fully assembled document, so no partial artifact can escape.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::InvoiceData;

/// Fallback token used when the recipient email is absent or sanitizes to
/// nothing.
const FALLBACK_TOKEN: &str = "invoice";

/// Keep only filesystem-safe characters.
fn sanitize_token(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// Derive the output filename: `{token}_invoice_{number}.pdf`, where the
/// token is the sanitized local part of the recipient email.
pub fn derive_filename(data: &InvoiceData) -> String {
    let email = data.recipient.email.trim();
    let token = if email.is_empty() {
        FALLBACK_TOKEN.to_string()
    } else {
        let local = email.split('@').next().unwrap_or("");
        let sanitized = sanitize_token(local);
        if sanitized.is_empty() {
            FALLBACK_TOKEN.to_string()
        } else {
            sanitized
        }
    };
    format!(
        "{}_invoice_{}.pdf",
        token,
        sanitize_token(&data.invoice_number)
    )
}

/// Where finished artifacts go: the host environment's "save generated
/// file" mechanism.
pub trait ArtifactSink: Send + Sync {
    /// Persist a fully assembled document under `filename`. Returns the
    /// location the artifact ended up at, when the sink has one.
    fn deliver(&self, filename: &str, bytes: &[u8]) -> Result<Option<PathBuf>>;
}

/// Writes artifacts into a directory (the CLI's download folder).
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }
}

impl ArtifactSink for DirectorySink {
    fn deliver(&self, filename: &str, bytes: &[u8]) -> Result<Option<PathBuf>> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| Error::DeliveryFailed(format!("{}: {}", self.dir.display(), e)))?;
        let path = self.dir.join(filename);
        std::fs::write(&path, bytes)
            .map_err(|e| Error::DeliveryFailed(format!("{}: {}", path.display(), e)))?;
        log::info!("saved {} ({} bytes)", path.display(), bytes.len());
        Ok(Some(path))
    }
}

/// Collects deliveries in memory; the test double for the sink seam.
#[derive(Default)]
pub struct MemorySink {
    deliveries: std::sync::Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(filename, bytes)` of every delivery so far.
    pub fn deliveries(&self) -> Vec<(String, Vec<u8>)> {
        self.deliveries
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

impl ArtifactSink for MemorySink {
    fn deliver(&self, filename: &str, bytes: &[u8]) -> Result<Option<PathBuf>> {
        if let Ok(mut deliveries) = self.deliveries.lock() {
            deliveries.push((filename.to_string(), bytes.to_vec()));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_with(email: &str, number: &str) -> InvoiceData {
        let mut data = InvoiceData::sample();
        data.recipient.email = email.to_string();
        data.invoice_number = number.to_string();
        data
    }

    #[test]
    fn local_part_is_stripped_case_preserved() {
        let name = derive_filename(&data_with("jane.doe@example.com", "A1-22"));
        assert_eq!(name, "janedoe_invoice_A1-22.pdf");
    }

    #[test]
    fn hyphen_and_underscore_survive() {
        let name = derive_filename(&data_with("jane_d-o-e@example.com", "7"));
        assert_eq!(name, "jane_d-o-e_invoice_7.pdf");
    }

    #[test]
    fn empty_email_falls_back_to_token() {
        let name = derive_filename(&data_with("", "X9"));
        assert_eq!(name, "invoice_invoice_X9.pdf");
    }

    #[test]
    fn punctuation_only_local_part_falls_back() {
        let name = derive_filename(&data_with("...@x.com", "X9"));
        assert_eq!(name, "invoice_invoice_X9.pdf");
    }

    #[test]
    fn directory_sink_writes_the_file() {
        let dir = std::env::temp_dir().join(format!("invoicepress-test-{}", uuid::Uuid::new_v4()));
        let sink = DirectorySink::new(&dir);
        let path = sink
            .deliver("a_invoice_1.pdf", b"%PDF-stub")
            .expect("deliver")
            .expect("path");
        assert_eq!(std::fs::read(&path).expect("read back"), b"%PDF-stub");
        std::fs::remove_dir_all(&dir).ok();
    }
}
