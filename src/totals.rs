use serde::Serialize;

use crate::model::{InvoiceDocument, LineItem};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Totals {
    pub subtotal: f64,
    pub tax_amount: f64,
    pub grand_total: f64,
}

impl Totals {
    pub fn of(doc: &InvoiceDocument) -> Self {
        let subtotal = subtotal(&doc.items);
        Self {
            subtotal,
            tax_amount: tax_amount(subtotal, doc.tax_rate),
            grand_total: grand_total(subtotal, doc.tax_rate),
        }
    }
}

pub fn subtotal(items: &[LineItem]) -> f64 {
    items.iter().map(LineItem::line_total).sum()
}

/// `tax_rate` is a percentage.
pub fn tax_amount(subtotal: f64, tax_rate: f64) -> f64 {
    subtotal * tax_rate / 100.0
}

pub fn grand_total(subtotal: f64, tax_rate: f64) -> f64 {
    subtotal + tax_amount(subtotal, tax_rate)
}

pub fn format_money(amount: f64) -> String {
    format!("${:.2}", amount)
}
