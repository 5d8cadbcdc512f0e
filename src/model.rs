//! Invoice data model: pure data, no rendering or export knowledge.
//!
//! The record is owned by the editing session and mutated only by
//! whole-record replacement; everything derived (line totals, subtotal,
//! total) is computed on demand and never stored.

use serde::{Deserialize, Serialize};

/// Which side of the header the logo sits on. The title block takes the
/// opposite side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogoAlignment {
    Left,
    #[default]
    Right,
}

/// A billing party's display identity (name, address, email, optional tax id).
///
/// All fields are display strings and may be empty; `vat_number` is only
/// rendered when present and non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PartyInfo {
    pub company_name: String,
    pub address_line1: String,
    pub address_line2: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat_number: Option<String>,
}

/// One billable row. `id` is an opaque unique token, stable across
/// reorders, and is the sole identity used for in-place edits and removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    pub description: String,
    pub quantity: f64,
    pub amount: f64,
}

impl LineItem {
    /// Create a line item with a freshly generated identity token.
    pub fn new(description: impl Into<String>, quantity: f64, amount: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            description: description.into(),
            quantity,
            amount,
        }
    }

    /// `quantity * amount`; derived, never stored.
    pub fn line_total(&self) -> f64 {
        self.quantity * self.amount
    }
}

/// The structured record describing an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceData {
    pub invoice_number: String,
    /// Calendar date in `YYYY-MM-DD` form. Free-form; not validated.
    pub date_issue: String,
    /// Calendar date in `YYYY-MM-DD` form. May precede `date_issue`; the
    /// editor does not enforce an ordering.
    pub date_due: String,
    pub sender: PartyInfo,
    pub recipient: PartyInfo,
    pub items: Vec<LineItem>,
    pub notes: String,
    /// Short symbol prefixed verbatim to every money value at render time.
    pub currency: String,
    /// Data URI or remote URL; absence means the placeholder mark is shown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub logo_alignment: LogoAlignment,
}

impl InvoiceData {
    /// Sum of all line totals. Empty item list yields 0.
    pub fn subtotal(&self) -> f64 {
        self.items.iter().map(LineItem::line_total).sum()
    }

    /// Grand total. There is no tax or discount model, so this restates
    /// the subtotal.
    pub fn total(&self) -> f64 {
        self.subtotal()
    }

    /// The fixed default record a fresh editing session starts from.
    pub fn sample() -> Self {
        Self {
            invoice_number: "Q7MKP2R-8391".to_string(),
            date_issue: "2026-08-01".to_string(),
            date_due: "2026-08-15".to_string(),
            currency: "$".to_string(),
            logo_url: None,
            logo_alignment: LogoAlignment::Right,
            sender: PartyInfo {
                company_name: "Northlight Studio LLC".to_string(),
                address_line1: "4410 Harbor Mill Road".to_string(),
                address_line2: "Portland, OR 97201 United States".to_string(),
                email: "billing@northlight.studio".to_string(),
                vat_number: None,
            },
            recipient: PartyInfo {
                company_name: "Tech Corp GmbH".to_string(),
                address_line1: "Musterstra\u{df}e 12".to_string(),
                address_line2: "10115 Berlin, Germany".to_string(),
                email: "accounts@techcorp.de".to_string(),
                vat_number: Some("DE123456789".to_string()),
            },
            items: vec![
                LineItem {
                    id: "1".to_string(),
                    description: "Pro Plan Subscription (Monthly)".to_string(),
                    quantity: 1.0,
                    amount: 49.90,
                },
                LineItem {
                    id: "2".to_string(),
                    description: "Consulting Services - API Integration".to_string(),
                    quantity: 5.0,
                    amount: 150.00,
                },
            ],
            notes: "Payment received in full. Thank you for your business!".to_string(),
        }
    }
}

/// Render a money value the way the surface shows it: currency symbol
/// prefixed verbatim, two decimal places.
pub fn format_amount(currency: &str, value: f64) -> String {
    format!("{}{:.2}", currency, value)
}
