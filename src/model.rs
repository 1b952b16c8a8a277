use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AddressBlock {
    pub name: String,
    pub address: String,
    pub city_state_zip: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressField {
    Name,
    Address,
    CityStateZip,
    Email,
}

impl AddressBlock {
    pub fn field(&self, field: AddressField) -> &str {
        match field {
            AddressField::Name => &self.name,
            AddressField::Address => &self.address,
            AddressField::CityStateZip => &self.city_state_zip,
            AddressField::Email => &self.email,
        }
    }

    fn field_mut(&mut self, field: AddressField) -> &mut String {
        match field {
            AddressField::Name => &mut self.name,
            AddressField::Address => &mut self.address,
            AddressField::CityStateZip => &mut self.city_state_zip,
            AddressField::Email => &mut self.email,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LineItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub qty: f64,
}

impl LineItem {
    pub fn line_total(&self) -> f64 {
        self.price * self.qty
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InvoiceDocument {
    pub invoice_no: String,
    pub date: String,
    pub company_name: String,
    /// `data:` URL of the uploaded logo.
    pub logo: Option<String>,
    pub client: AddressBlock,
    pub payor: AddressBlock,
    pub items: Vec<LineItem>,
    pub payment_method: String,
    /// Percent, e.g. `10.0` for 10%.
    pub tax_rate: f64,
    pub terms: Vec<String>,
}

/// A single committed field edit.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentEdit {
    InvoiceNo(String),
    Date(String),
    CompanyName(String),
    Client(AddressField, String),
    Payor(AddressField, String),
    ItemName { id: String, value: String },
    ItemDescription { id: String, value: String },
    ItemPrice { id: String, value: f64 },
    ItemQty { id: String, value: f64 },
    PaymentMethod(String),
    TaxRate(f64),
    Term { index: usize, value: String },
}

fn address(name: &str, address: &str, city_state_zip: &str, email: &str) -> AddressBlock {
    AddressBlock {
        name: name.into(),
        address: address.into(),
        city_state_zip: city_state_zip.into(),
        email: email.into(),
    }
}

fn item(id: &str, name: &str, description: &str, price: f64, qty: f64) -> LineItem {
    LineItem {
        id: id.into(),
        name: name.into(),
        description: description.into(),
        price,
        qty,
    }
}

impl Default for InvoiceDocument {
    fn default() -> Self {
        Self {
            invoice_no: "#LL93784".into(),
            date: "17-0-2026".into(),
            company_name: "INVOMA LTD".into(),
            logo: None,
            client: address(
                "Lowell H. Dominguez 84",
                "Spilman Street, London",
                "England EC2A 4NE",
                "demo@gmail.com",
            ),
            payor: address(
                "Laralink Ltd",
                "86-90 Paul Street, London",
                "England EC2A 4NE",
                "demo@gmail.com",
            ),
            items: vec![
                item(
                    "1",
                    "Website Design",
                    "Six web page designs and three times revision",
                    400.0,
                    5.0,
                ),
                item(
                    "2",
                    "Web Development",
                    "Convert pixel-perfect frontend and make it dynamic",
                    400.0,
                    4.0,
                ),
                item(
                    "3",
                    "App Development",
                    "Android And Ios Application Development",
                    450.0,
                    3.0,
                ),
                item(
                    "4",
                    "Digital Marketing",
                    "Facebook, Youtube and Google Marketing",
                    500.0,
                    1.0,
                ),
            ],
            payment_method: "Cradit Card - 236***********928".into(),
            tax_rate: 10.0,
            terms: vec![
                "All claims relating to quantity or shipping errors shall be waived by Buyer unless made in writing to Seller within thirty (30) days after delivery of goods to the address stated.".into(),
                "Delivery dates are not guaranteed and Seller has no liability for damages that may be incurred due to any delay in shipment of goods hereunder. Taxes are excluded unless otherwise stated.".into(),
            ],
        }
    }
}

impl InvoiceDocument {
    pub fn apply(&mut self, edit: DocumentEdit) {
        tracing::debug!(?edit, "applying edit");
        match edit {
            DocumentEdit::InvoiceNo(v) => self.invoice_no = v,
            DocumentEdit::Date(v) => self.date = v,
            DocumentEdit::CompanyName(v) => self.company_name = v,
            DocumentEdit::Client(field, v) => *self.client.field_mut(field) = v,
            DocumentEdit::Payor(field, v) => *self.payor.field_mut(field) = v,
            DocumentEdit::ItemName { id, value } => {
                if let Some(item) = self.item_mut(&id) {
                    item.name = value;
                }
            }
            DocumentEdit::ItemDescription { id, value } => {
                if let Some(item) = self.item_mut(&id) {
                    item.description = value;
                }
            }
            DocumentEdit::ItemPrice { id, value } => {
                if let Some(item) = self.item_mut(&id) {
                    item.price = value;
                }
            }
            DocumentEdit::ItemQty { id, value } => {
                if let Some(item) = self.item_mut(&id) {
                    item.qty = value;
                }
            }
            DocumentEdit::PaymentMethod(v) => self.payment_method = v,
            DocumentEdit::TaxRate(v) => self.tax_rate = v,
            DocumentEdit::Term { index, value } => {
                if let Some(term) = self.terms.get_mut(index) {
                    *term = value;
                }
            }
        }
    }

    pub fn item(&self, id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id == id)
    }

    fn item_mut(&mut self, id: &str) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    /// Appends a blank "New Item" row and returns its id.
    pub fn add_item(&mut self) -> String {
        let id = self.fresh_item_id(Utc::now().timestamp_millis());
        self.items.push(LineItem {
            id: id.clone(),
            name: "New Item".into(),
            description: "Item description".into(),
            price: 0.0,
            qty: 1.0,
        });
        tracing::debug!(%id, "item added");
        id
    }

    // Millisecond timestamps collide when items are added in a burst.
    fn fresh_item_id(&self, mut stamp: i64) -> String {
        loop {
            let candidate = stamp.to_string();
            if self.item(&candidate).is_none() {
                return candidate;
            }
            stamp += 1;
        }
    }

    pub fn remove_item(&mut self, id: &str) -> Option<LineItem> {
        let pos = self.items.iter().position(|i| i.id == id)?;
        tracing::debug!(%id, "item removed");
        Some(self.items.remove(pos))
    }

    pub fn set_logo(&mut self, data_url: String) {
        self.logo = Some(data_url);
    }

    pub fn clear_logo(&mut self) {
        self.logo = None;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
        tracing::info!("document reset to defaults");
    }

    /// Invoice number as used in export file names: first `#` stripped,
    /// characters the filesystem rejects replaced with `-`.
    pub fn file_stem(&self) -> String {
        let number: String = self
            .invoice_no
            .replacen('#', "", 1)
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
                c if c.is_control() => '-',
                c => c,
            })
            .collect();
        format!("invoice-{}", number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn add_item_appends_one_default_row() {
        let mut doc = InvoiceDocument::default();
        let before = doc.items.clone();

        let id = doc.add_item();

        assert_eq!(doc.items.len(), before.len() + 1);
        assert_eq!(&doc.items[..before.len()], &before[..]);
        let added = doc.items.last().unwrap();
        assert_eq!(added.id, id);
        assert_eq!(added.name, "New Item");
        assert_eq!(added.description, "Item description");
        assert_eq!(added.price, 0.0);
        assert_eq!(added.qty, 1.0);
    }

    #[test]
    fn burst_of_added_items_gets_unique_ids() {
        let mut doc = InvoiceDocument::default();
        let ids: Vec<String> = (0..20).map(|_| doc.add_item()).collect();

        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn fresh_item_id_skips_taken_stamps() {
        let mut doc = InvoiceDocument::default();
        doc.items.push(item("100", "a", "", 0.0, 1.0));
        doc.items.push(item("101", "b", "", 0.0, 1.0));

        assert_eq!(doc.fresh_item_id(100), "102");
    }

    #[test]
    fn remove_unknown_item_is_noop() {
        let mut doc = InvoiceDocument::default();
        assert!(doc.remove_item("nope").is_none());
        assert_eq!(doc, InvoiceDocument::default());
    }

    #[test]
    fn edits_target_the_named_item_only() {
        let mut doc = InvoiceDocument::default();
        doc.apply(DocumentEdit::ItemPrice { id: "2".into(), value: 12.5 });
        doc.apply(DocumentEdit::ItemName { id: "2".into(), value: "Hosting".into() });

        let defaults = InvoiceDocument::default();
        assert_eq!(doc.items[1].price, 12.5);
        assert_eq!(doc.items[1].name, "Hosting");
        assert_eq!(doc.items[0], defaults.items[0]);
        assert_eq!(doc.items[2], defaults.items[2]);
    }

    #[test]
    fn edits_for_missing_targets_are_ignored() {
        let mut doc = InvoiceDocument::default();
        doc.apply(DocumentEdit::ItemQty { id: "missing".into(), value: 3.0 });
        doc.apply(DocumentEdit::Term { index: 9, value: "x".into() });
        assert_eq!(doc, InvoiceDocument::default());
    }

    #[test]
    fn address_edits_touch_one_block() {
        let mut doc = InvoiceDocument::default();
        doc.apply(DocumentEdit::Client(AddressField::Email, "a@b.c".into()));

        assert_eq!(doc.client.field(AddressField::Email), "a@b.c");
        assert_eq!(doc.payor, InvoiceDocument::default().payor);
    }

    #[test]
    fn reset_restores_defaults_and_clears_logo() {
        let mut doc = InvoiceDocument::default();
        doc.set_logo("data:image/png;base64,AAAA".into());
        doc.apply(DocumentEdit::InvoiceNo("#X1".into()));
        doc.apply(DocumentEdit::TaxRate(21.0));
        doc.apply(DocumentEdit::Term { index: 0, value: "changed".into() });
        doc.apply(DocumentEdit::Payor(AddressField::Name, "Someone".into()));
        doc.add_item();
        doc.remove_item("1");

        doc.reset();

        assert_eq!(doc, InvoiceDocument::default());
        assert!(doc.logo.is_none());
        assert_eq!(doc.invoice_no, "#LL93784");
        assert_eq!(doc.items.len(), 4);
        assert_eq!(doc.tax_rate, 10.0);
    }

    #[test]
    fn file_stem_strips_hash() {
        let doc = InvoiceDocument::default();
        assert_eq!(doc.file_stem(), "invoice-LL93784");
    }

    #[test]
    fn file_stem_strips_only_first_hash() {
        let mut doc = InvoiceDocument::default();
        doc.apply(DocumentEdit::InvoiceNo("#A#1".into()));
        assert_eq!(doc.file_stem(), "invoice-A#1");
    }

    #[test]
    fn file_stem_replaces_path_separators() {
        let mut doc = InvoiceDocument::default();
        doc.apply(DocumentEdit::InvoiceNo("INV/2026\\01:a*b?\"c\"<d>|e".into()));
        assert_eq!(doc.file_stem(), "invoice-INV-2026-01-a-b--c--d--e");

        doc.apply(DocumentEdit::InvoiceNo("../../escape".into()));
        assert_eq!(doc.file_stem(), "invoice-..-..-escape");
    }

    proptest! {
        /// Removing by id drops exactly that item and keeps the order of the rest.
        #[test]
        fn remove_item_removes_exactly_one(extra in 0usize..8, pick in 0usize..12) {
            let mut doc = InvoiceDocument::default();
            for _ in 0..extra {
                doc.add_item();
            }
            let pick = pick % doc.items.len();
            let target = doc.items[pick].id.clone();
            let mut expected = doc.items.clone();
            expected.remove(pick);

            let removed = doc.remove_item(&target);

            prop_assert_eq!(removed.map(|i| i.id), Some(target));
            prop_assert_eq!(doc.items, expected);
        }
    }
}
