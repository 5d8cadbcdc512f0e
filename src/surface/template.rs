//! The invoice page template.
//!
//! [`render_invoice`] is a pure function from the invoice record to the
//! surface markup: same data, same markup. The class vocabulary is the
//! small utility set understood by [`super::layout`]; the root element
//! carries the stable surface id plus the display-only inline styles of
//! the live view (centering margin, drop shadow), which the capture
//! pipeline strips from its copy.

use crate::model::{format_amount, InvoiceData, LogoAlignment, PartyInfo};
use crate::surface::INVOICE_SURFACE_ID;

/// Escape text for embedding into markup (also used by the scene painter).
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn party_block(label: &str, party: &PartyInfo) -> String {
    let mut s = String::new();
    s.push_str(&format!("<p class=\"label mb-2\">{}</p>", escape(label)));
    s.push_str(&format!(
        "<p class=\"text-base bold dark mb-1\">{}</p>",
        escape(&party.company_name)
    ));
    s.push_str(&format!(
        "<p class=\"text-sm muted\">{}</p>",
        escape(&party.address_line1)
    ));
    s.push_str(&format!(
        "<p class=\"text-sm muted\">{}</p>",
        escape(&party.address_line2)
    ));
    if let Some(vat) = party.vat_number.as_deref() {
        if !vat.is_empty() {
            s.push_str(&format!("<p class=\"text-sm muted\">VAT: {}</p>", escape(vat)));
        }
    }
    s.push_str(&format!(
        "<p class=\"text-sm faint mt-1\">{}</p>",
        escape(&party.email)
    ));
    s
}

fn header(data: &InvoiceData) -> String {
    let title_block = format!(
        "<div class=\"w-70{}\"><h1 class=\"text-4xl bold dark upper mb-2\">Invoice</h1>\
         <p class=\"text-lg muted\">#{}</p></div>",
        if data.logo_alignment == LogoAlignment::Left { " right" } else { "" },
        escape(&data.invoice_number)
    );
    let logo_cell = match data.logo_url.as_deref() {
        Some(url) if !url.is_empty() => {
            format!("<img class=\"logo\" src=\"{}\" height=\"64\"/>", escape(url))
        }
        _ => "<div class=\"logo-mark\">\u{2726}</div>".to_string(),
    };
    let logo_block = format!(
        "<div class=\"w-30{}\">{}</div>",
        if data.logo_alignment == LogoAlignment::Right { " right" } else { "" },
        logo_cell
    );
    // Logo sits on its aligned side; the title block takes the other.
    let inner = match data.logo_alignment {
        LogoAlignment::Right => format!("{}{}", title_block, logo_block),
        LogoAlignment::Left => format!("{}{}", logo_block, title_block),
    };
    format!("<div class=\"row mb-14\">{}</div>", inner)
}

fn meta_and_parties(data: &InvoiceData) -> String {
    let addresses = format!(
        "<div class=\"w-60\"><div class=\"mb-8\">{}</div><div>{}</div></div>",
        party_block("From", &data.sender),
        party_block("Bill To", &data.recipient)
    );
    let dates = format!(
        "<div class=\"w-40 right\">\
         <p class=\"label mb-1\">Date Issued</p>\
         <p class=\"text-base semibold dark mb-6\">{}</p>\
         <p class=\"label mb-1\">Date Due</p>\
         <p class=\"text-base semibold dark\">{}</p>\
         </div>",
        escape(&data.date_issue),
        escape(&data.date_due)
    );
    format!("<div class=\"row mb-12\">{}{}</div>", addresses, dates)
}

fn items_table(data: &InvoiceData) -> String {
    let mut s = String::new();
    s.push_str("<table class=\"mb-8\"><thead><tr class=\"border-b-dark\">");
    s.push_str("<th class=\"w-50 label pb-4\">Description</th>");
    s.push_str("<th class=\"w-20 center label pb-4\">Qty</th>");
    s.push_str("<th class=\"w-30 right label pb-4\">Amount</th>");
    s.push_str("</tr></thead><tbody>");
    for item in &data.items {
        s.push_str("<tr class=\"border-b\">");
        s.push_str(&format!(
            "<td class=\"text-sm bold dark pt-5 pb-5\">{}</td>",
            escape(&item.description)
        ));
        s.push_str(&format!(
            "<td class=\"text-sm center muted pt-5 pb-5\">{}</td>",
            item.quantity
        ));
        s.push_str(&format!(
            "<td class=\"text-sm right semibold dark pt-5 pb-5\">{}</td>",
            escape(&format_amount(&data.currency, item.amount))
        ));
        s.push_str("</tr>");
    }
    s.push_str("</tbody></table>");
    s
}

fn totals(data: &InvoiceData) -> String {
    let subtotal = format_amount(&data.currency, data.subtotal());
    let total = format_amount(&data.currency, data.total());
    format!(
        "<div class=\"row mb-20\"><div class=\"w-55\"></div><div class=\"w-45\">\
         <div class=\"row mb-2\"><div class=\"w-50 text-sm muted\">Subtotal</div>\
         <div class=\"w-50 right text-sm dark\">{subtotal}</div></div>\
         <div class=\"row mb-2\"><div class=\"w-50 text-sm muted\">Total</div>\
         <div class=\"w-50 right text-sm dark\">{total}</div></div>\
         <hr class=\"dark mt-2 mb-4\"/>\
         <div class=\"row\"><div class=\"w-50 text-sm bold dark upper\">Amount Due</div>\
         <div class=\"w-50 right text-3xl bold dark\">{total}</div></div>\
         </div></div>",
        subtotal = escape(&subtotal),
        total = escape(&total),
    )
}

fn notes_footer(data: &InvoiceData) -> String {
    format!(
        "<hr class=\"mb-8\"/><p class=\"label mb-3\">Notes</p>\
         <p class=\"text-sm muted\">{}</p>",
        escape(&data.notes)
    )
}

/// Render the invoice record into its surface markup.
pub fn render_invoice(data: &InvoiceData) -> String {
    format!(
        "<div id=\"{id}\" class=\"invoice-paper\" \
         style=\"margin: 0 auto; box-shadow: 0 10px 25px rgba(0,0,0,0.08)\">\
         {header}{meta}{items}{totals}{notes}</div>",
        id = INVOICE_SURFACE_ID,
        header = header(data),
        meta = meta_and_parties(data),
        items = items_table(data),
        totals = totals(data),
        notes = notes_footer(data),
    )
}
