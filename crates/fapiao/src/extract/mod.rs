//! Best-effort field extraction from OCR text.
//!
//! Every field falls back to an empty string; nothing here reconciles item
//! amounts against the total.

pub mod fields;
pub mod items;

use serde::Serialize;

pub use items::LineItem;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedInvoice {
    pub invoice_number: String,
    pub total: String,
    pub tax: String,
    pub items: Vec<LineItem>,
}

pub fn parse_invoice(text: &str) -> ParsedInvoice {
    ParsedInvoice {
        invoice_number: fields::invoice_number(text),
        total: fields::total(text),
        tax: fields::tax(text),
        items: items::line_items(text),
    }
}
