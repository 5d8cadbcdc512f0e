//! The editing session: whole-record replacement over one invoice.
//!
//! The session owns the record for its lifetime; every edit builds a new
//! complete value and swaps it in, then re-renders the surface into the
//! host so the live view and any later export read the latest state. The
//! record disappears with the session; nothing is persisted.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rand::Rng;

use crate::error::Result;
use crate::export::{ExportPipeline, ExportReceipt};
use crate::model::{InvoiceData, LineItem, LogoAlignment, PartyInfo};
use crate::surface::{template, SurfaceHost, ViewState, INVOICE_SURFACE_ID};

const INVOICE_NUMBER_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub struct EditorSession {
    data: InvoiceData,
    host: Arc<SurfaceHost>,
    pipeline: Arc<ExportPipeline>,
}

impl EditorSession {
    /// Start a session from the fixed default record.
    pub fn new(host: Arc<SurfaceHost>, pipeline: Arc<ExportPipeline>) -> Self {
        Self::with_data(InvoiceData::sample(), host, pipeline)
    }

    pub fn with_data(
        data: InvoiceData,
        host: Arc<SurfaceHost>,
        pipeline: Arc<ExportPipeline>,
    ) -> Self {
        let session = Self { data, host, pipeline };
        session.remount();
        session
    }

    pub fn data(&self) -> &InvoiceData {
        &self.data
    }

    pub fn host(&self) -> &Arc<SurfaceHost> {
        &self.host
    }

    fn remount(&self) {
        self.host.mount(
            INVOICE_SURFACE_ID,
            template::render_invoice(&self.data),
            ViewState::on_screen(),
        );
    }

    /// Replace the whole record and re-render the surface.
    pub fn replace(&mut self, data: InvoiceData) {
        self.data = data;
        self.remount();
    }

    fn update(&mut self, edit: impl FnOnce(&mut InvoiceData)) {
        let mut next = self.data.clone();
        edit(&mut next);
        self.replace(next);
    }

    pub fn set_invoice_number(&mut self, number: impl Into<String>) {
        let number = number.into();
        self.update(|d| d.invoice_number = number);
    }

    /// Fresh `XXXXXXX-NNNN` number over `[A-Z0-9]`.
    pub fn regenerate_invoice_number(&mut self) {
        let mut rng = rand::rng();
        let head: String = (0..7)
            .map(|_| INVOICE_NUMBER_CHARSET[rng.random_range(0..INVOICE_NUMBER_CHARSET.len())] as char)
            .collect();
        let tail = rng.random_range(1000..10_000);
        self.set_invoice_number(format!("{}-{}", head, tail));
    }

    pub fn set_dates(&mut self, issue: impl Into<String>, due: impl Into<String>) {
        let (issue, due) = (issue.into(), due.into());
        self.update(|d| {
            d.date_issue = issue;
            d.date_due = due;
        });
    }

    pub fn set_currency(&mut self, currency: impl Into<String>) {
        let currency = currency.into();
        self.update(|d| d.currency = currency);
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        let notes = notes.into();
        self.update(|d| d.notes = notes);
    }

    pub fn set_sender(&mut self, sender: PartyInfo) {
        self.update(|d| d.sender = sender);
    }

    pub fn set_recipient(&mut self, recipient: PartyInfo) {
        self.update(|d| d.recipient = recipient);
    }

    /// Append a new line item; returns its identity token.
    pub fn add_item(&mut self, description: impl Into<String>, quantity: f64, amount: f64) -> String {
        let item = LineItem::new(description, quantity, amount);
        let id = item.id.clone();
        self.update(|d| d.items.push(item));
        id
    }

    /// Edit a line item in place, addressed by its id. Returns whether the
    /// id matched.
    pub fn update_item(&mut self, id: &str, edit: impl FnOnce(&mut LineItem)) -> bool {
        let mut next = self.data.clone();
        let Some(item) = next.items.iter_mut().find(|i| i.id == id) else {
            return false;
        };
        edit(item);
        self.replace(next);
        true
    }

    /// Remove a line item by id. Returns whether anything was removed.
    pub fn remove_item(&mut self, id: &str) -> bool {
        let before = self.data.items.len();
        let mut next = self.data.clone();
        next.items.retain(|i| i.id != id);
        let removed = next.items.len() != before;
        if removed {
            self.replace(next);
        }
        removed
    }

    /// Logo input boundary: image bytes become a data URI on the record.
    pub fn set_logo_from_bytes(&mut self, bytes: &[u8], mime: &str) {
        let uri = format!("data:{};base64,{}", mime, BASE64.encode(bytes));
        self.update(|d| d.logo_url = Some(uri));
    }

    pub fn remove_logo(&mut self) {
        self.update(|d| d.logo_url = None);
    }

    pub fn set_logo_alignment(&mut self, alignment: LogoAlignment) {
        self.update(|d| d.logo_alignment = alignment);
    }

    /// Merge an extraction result into the recipient: extracted display
    /// fields overwrite (even when empty, mirroring the form's behavior);
    /// the VAT number only lands when the service produced one.
    pub fn apply_extraction(&mut self, extracted: PartyInfo) {
        self.update(|d| {
            d.recipient.company_name = extracted.company_name;
            d.recipient.address_line1 = extracted.address_line1;
            d.recipient.address_line2 = extracted.address_line2;
            d.recipient.email = extracted.email;
            if let Some(vat) = extracted.vat_number {
                d.recipient.vat_number = Some(vat);
            }
        });
    }

    /// Primary export trigger. The compact trigger resolves to the same
    /// pipeline instance, so both share one in-progress state.
    pub async fn export(&self) -> Result<ExportReceipt> {
        self.pipeline.export(&self.host, &self.data).await
    }

    /// Whether an export run is in flight; call sites disable their
    /// triggers while this holds.
    pub fn is_exporting(&self) -> bool {
        self.pipeline.is_in_progress()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{ExportOptions, MemorySink};

    fn session() -> EditorSession {
        let host = Arc::new(SurfaceHost::new());
        let pipeline = Arc::new(ExportPipeline::new(
            Arc::new(MemorySink::new()),
            ExportOptions::default(),
        ));
        EditorSession::new(host, pipeline)
    }

    #[test]
    fn session_mounts_the_surface_on_start() {
        let s = session();
        assert!(s.host().is_mounted(INVOICE_SURFACE_ID));
    }

    #[test]
    fn edits_remount_the_surface() {
        let mut s = session();
        s.set_notes("Net 30.");
        let html = s.host().get(INVOICE_SURFACE_ID).expect("mounted").html;
        assert!(html.contains("Net 30."));
    }

    #[test]
    fn alignment_flip_is_an_isolated_mutation() {
        let mut s = session();
        let before = s.data().clone();
        s.set_logo_alignment(LogoAlignment::Left);
        let after = s.data();
        assert_eq!(after.logo_alignment, LogoAlignment::Left);
        assert_eq!(after.items, before.items);
        assert_eq!(after.sender, before.sender);
        assert_eq!(after.recipient, before.recipient);
        assert_eq!(after.invoice_number, before.invoice_number);
    }

    #[test]
    fn items_are_addressed_by_id() {
        let mut s = session();
        let id = s.add_item("Design work", 3.0, 80.0);
        assert!(s.update_item(&id, |i| i.quantity = 4.0));
        let item = s
            .data()
            .items
            .iter()
            .find(|i| i.id == id)
            .expect("item present");
        assert_eq!(item.quantity, 4.0);
        assert!(s.remove_item(&id));
        assert!(!s.remove_item(&id));
        assert!(!s.update_item(&id, |_| {}));
    }

    #[test]
    fn regenerated_number_matches_the_shape() {
        let mut s = session();
        s.regenerate_invoice_number();
        let number = &s.data().invoice_number;
        let (head, tail) = number.split_once('-').expect("dash separator");
        assert_eq!(head.len(), 7);
        assert!(head.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        assert_eq!(tail.len(), 4);
        assert!(tail.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn logo_bytes_become_a_data_uri() {
        let mut s = session();
        s.set_logo_from_bytes(&[1, 2, 3], "image/png");
        assert_eq!(
            s.data().logo_url.as_deref(),
            Some("data:image/png;base64,AQID")
        );
        s.remove_logo();
        assert!(s.data().logo_url.is_none());
    }

    #[test]
    fn extraction_overwrites_recipient_fields() {
        let mut s = session();
        s.apply_extraction(PartyInfo {
            company_name: "New Co".to_string(),
            address_line1: "1 Way".to_string(),
            address_line2: "".to_string(),
            email: "new@co.example".to_string(),
            vat_number: None,
        });
        let r = &s.data().recipient;
        assert_eq!(r.company_name, "New Co");
        assert_eq!(r.address_line2, "");
        assert_eq!(r.email, "new@co.example");
        // VAT untouched when the service produced none.
        assert_eq!(r.vat_number.as_deref(), Some("DE123456789"));
    }
}
