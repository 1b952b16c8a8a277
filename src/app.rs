use std::sync::Arc;

use eframe::egui::{
    self, Align, Color32, CursorIcon, Layout, RichText, ScrollArea, Sense, Stroke, Ui,
};
use rfd::{MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};

use crate::editable::{self, Mode};
use crate::export::{Exporter, PDF_FAILURE_MESSAGE};
use crate::logo;
use crate::model::{AddressBlock, AddressField, DocumentEdit, InvoiceDocument};
use crate::totals::{Totals, format_money};

const INK: Color32 = Color32::from_rgb(30, 41, 59);
const MUTED: Color32 = Color32::from_rgb(148, 163, 184);

/// Everything the user can trigger. Collected while drawing, applied after.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Edit(DocumentEdit),
    AddItem,
    RemoveItem(String),
    ChooseLogo,
    ClearLogo,
    Print,
    DownloadPdf,
    Reset,
}

#[derive(Clone, Copy)]
enum Party {
    Client,
    Payor,
}

struct LogoImage {
    uri: String,
    bytes: Arc<[u8]>,
}

pub struct InvoiceApp {
    doc: InvoiceDocument,
    exporter: Exporter,
    // Bumped whenever the logo changes so egui reloads the image.
    logo_generation: u64,
    logo_image: Option<(u64, Option<LogoImage>)>,
}

impl InvoiceApp {
    pub fn new(cc: &eframe::CreationContext<'_>, exporter: Exporter) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);
        cc.egui_ctx.set_visuals(egui::Visuals::light());
        Self {
            doc: InvoiceDocument::default(),
            exporter,
            logo_generation: 0,
            logo_image: None,
        }
    }

    fn dispatch(&mut self, action: Action) {
        match action {
            Action::Edit(edit) => self.doc.apply(edit),
            Action::AddItem => {
                self.doc.add_item();
            }
            Action::RemoveItem(id) => {
                self.doc.remove_item(&id);
            }
            Action::ChooseLogo => self.choose_logo(),
            Action::ClearLogo => {
                self.doc.clear_logo();
                self.logo_generation += 1;
            }
            Action::Print => {
                if let Err(e) = self.exporter.print(&self.doc) {
                    tracing::warn!(error = %e, "print failed");
                }
            }
            Action::DownloadPdf => match self.exporter.export_pdf(&self.doc) {
                Ok(path) => tracing::info!(path = %path.display(), "invoice exported"),
                Err(e) => {
                    tracing::error!(error = %e, "PDF generation failed");
                    alert(PDF_FAILURE_MESSAGE);
                }
            },
            Action::Reset => {
                if confirm("Are you sure you want to reset all data?") {
                    self.doc.reset();
                    self.logo_generation += 1;
                }
            }
        }
    }

    fn choose_logo(&mut self) {
        let picked = rfd::FileDialog::new()
            .set_title("Upload brand logo or banner")
            .add_filter("Image", logo::IMAGE_EXTENSIONS)
            .pick_file();
        let Some(path) = picked else { return };

        match logo::read_data_url(&path) {
            Ok(url) => {
                self.doc.set_logo(url);
                self.logo_generation += 1;
            }
            Err(e) => tracing::warn!(error = %e, "could not load logo"),
        }
    }

    fn logo_image(&mut self) -> Option<(String, Arc<[u8]>)> {
        let generation = self.logo_generation;
        let stale = !matches!(&self.logo_image, Some((cached, _)) if *cached == generation);
        if stale {
            let image = self
                .doc
                .logo
                .as_deref()
                .and_then(logo::decode_data_url)
                .map(|(mime, bytes)| LogoImage {
                    uri: format!("bytes://logo-{}.{}", generation, logo::extension_for_mime(mime)),
                    bytes: bytes.into(),
                });
            self.logo_image = Some((self.logo_generation, image));
        }
        match &self.logo_image {
            Some((_, Some(image))) => Some((image.uri.clone(), image.bytes.clone())),
            _ => None,
        }
    }
}

impl eframe::App for InvoiceApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut actions = Vec::new();

        egui::SidePanel::right("actions")
            .resizable(false)
            .exact_width(72.0)
            .show(ctx, |ui| action_menu(ui, &mut actions));

        let logo = self.logo_image();
        let doc = &self.doc;
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(Color32::from_rgb(241, 245, 249)))
            .show(ctx, |ui| {
                ScrollArea::vertical().show(ui, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.set_max_width(850.0);
                        egui::Frame::new()
                            .fill(Color32::WHITE)
                            .inner_margin(egui::Margin::same(48))
                            .outer_margin(egui::Margin::same(24))
                            .show(ui, |ui| {
                                ui.with_layout(Layout::top_down(Align::Min), |ui| {
                                    invoice_page(ui, doc, logo, &mut actions);
                                });
                            });
                    });
                });
            });

        for action in actions {
            self.dispatch(action);
        }
    }
}

fn action_menu(ui: &mut Ui, actions: &mut Vec<Action>) {
    ui.add_space(16.0);
    ui.vertical_centered(|ui| {
        if ui.button(RichText::new("🖨").size(22.0)).on_hover_text("Print Invoice").clicked() {
            actions.push(Action::Print);
        }
        ui.add_space(8.0);
        let download = egui::Button::new(RichText::new("⬇").size(22.0).color(Color32::WHITE))
            .fill(Color32::from_rgb(34, 197, 94));
        if ui.add(download).on_hover_text("Download PDF").clicked() {
            actions.push(Action::DownloadPdf);
        }
        ui.add_space(8.0);
        ui.separator();
        if ui.button(RichText::new("⟳").size(22.0)).on_hover_text("Reset").clicked() {
            actions.push(Action::Reset);
        }
    });
}

fn heading(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).strong().color(INK));
}

fn invoice_page(
    ui: &mut Ui,
    doc: &InvoiceDocument,
    logo: Option<(String, Arc<[u8]>)>,
    actions: &mut Vec<Action>,
) {
    let totals = Totals::of(doc);

    ui.horizontal(|ui| {
        branding(ui, doc, logo, actions);
        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            ui.label(RichText::new("INVOICE").size(56.0).color(INK));
        });
    });

    ui.horizontal(|ui| {
        ui.label(RichText::new("Invoice No:").color(MUTED));
        if let Some(v) = editable::text(ui, "invoice_no", &doc.invoice_no, Mode::SingleLine) {
            actions.push(Action::Edit(DocumentEdit::InvoiceNo(v)));
        }
        ui.add_space(24.0);
        ui.label(RichText::new("Date:").color(MUTED));
        if let Some(v) = editable::text(ui, "date", &doc.date, Mode::SingleLine) {
            actions.push(Action::Edit(DocumentEdit::Date(v)));
        }
    });
    ui.add_space(12.0);

    ui.columns(2, |cols| {
        address_block(&mut cols[0], "Invoice To:", &doc.client, Party::Client, actions);
        cols[1].with_layout(Layout::top_down(Align::Max), |ui| {
            address_block(ui, "Pay To:", &doc.payor, Party::Payor, actions);
        });
    });
    ui.add_space(16.0);

    item_table(ui, doc, actions);
    if ui.link("➕ Add New Item").clicked() {
        actions.push(Action::AddItem);
    }
    ui.add_space(16.0);

    ui.columns(2, |cols| {
        let ui = &mut cols[0];
        heading(ui, "Payment Info:");
        let method = editable::text(ui, "payment_method", &doc.payment_method, Mode::SingleLine);
        if let Some(v) = method {
            actions.push(Action::Edit(DocumentEdit::PaymentMethod(v)));
        }
        ui.horizontal(|ui| {
            ui.label("Amount:");
            ui.label(RichText::new(format_money(totals.grand_total)).strong().color(INK));
        });

        let ui = &mut cols[1];
        egui::Grid::new("totals").num_columns(2).spacing([24.0, 6.0]).show(ui, |ui| {
            heading(ui, "SubTotal");
            ui.label(RichText::new(format_money(totals.subtotal)).strong());
            ui.end_row();

            ui.horizontal(|ui| {
                ui.label(RichText::new("Tax (").color(MUTED));
                if let Some(v) = editable::float(ui, "tax_rate", doc.tax_rate) {
                    actions.push(Action::Edit(DocumentEdit::TaxRate(v)));
                }
                ui.label(RichText::new("%)").color(MUTED));
            });
            ui.label(format!("+ {}", format_money(totals.tax_amount)));
            ui.end_row();

            ui.label(RichText::new("Grand Total").size(18.0).strong().color(INK));
            let grand_total = RichText::new(format_money(totals.grand_total))
                .size(24.0)
                .strong()
                .color(INK);
            ui.label(grand_total);
            ui.end_row();
        });
    });
    ui.add_space(16.0);

    egui::Frame::new()
        .fill(Color32::from_rgb(248, 250, 252))
        .stroke(Stroke::new(1.0, Color32::from_rgb(241, 245, 249)))
        .inner_margin(egui::Margin::same(16))
        .show(ui, |ui| {
            heading(ui, "Terms & Conditions:");
            for (index, term) in doc.terms.iter().enumerate() {
                ui.horizontal_top(|ui| {
                    ui.label("•");
                    let edited = editable::text(ui, ("term", index), term, Mode::MultiLine);
                    if let Some(value) = edited {
                        actions.push(Action::Edit(DocumentEdit::Term { index, value }));
                    }
                });
            }
        });
}

fn branding(
    ui: &mut Ui,
    doc: &InvoiceDocument,
    logo: Option<(String, Arc<[u8]>)>,
    actions: &mut Vec<Action>,
) {
    let response = match logo {
        Some((uri, bytes)) => {
            let image = egui::Image::from_bytes(uri, bytes).max_height(64.0).max_width(300.0);
            let response = ui.add(image.sense(Sense::click()));
            if ui.small_button("✖").on_hover_text("Remove logo").clicked() {
                actions.push(Action::ClearLogo);
            }
            response
        }
        None => {
            let response = default_mark(ui);
            let name = editable::text(ui, "company_name", &doc.company_name, Mode::SingleLine);
            if let Some(v) = name {
                actions.push(Action::Edit(DocumentEdit::CompanyName(v)));
            }
            response
        }
    };
    if response
        .on_hover_cursor(CursorIcon::PointingHand)
        .on_hover_text("Click to upload brand logo or banner")
        .clicked()
    {
        actions.push(Action::ChooseLogo);
    }
}

fn default_mark(ui: &mut Ui) -> egui::Response {
    let (rect, response) = ui.allocate_exact_size(egui::vec2(48.0, 48.0), Sense::click());
    let scale = rect.width() / 100.0;
    let at = |x: f32, y: f32| rect.min + egui::vec2(x, y) * scale;
    let stroke = Stroke::new(6.0 * scale, Color32::BLACK);
    let painter = ui.painter();
    painter.line(vec![at(20.0, 80.0), at(50.0, 20.0), at(80.0, 80.0)], stroke);
    painter.line(vec![at(40.0, 80.0), at(65.0, 35.0), at(90.0, 80.0)], stroke);
    response
}

const ADDRESS_FIELDS: [AddressField; 4] = [
    AddressField::Name,
    AddressField::Address,
    AddressField::CityStateZip,
    AddressField::Email,
];

fn address_block(
    ui: &mut Ui,
    title: &str,
    block: &AddressBlock,
    party: Party,
    actions: &mut Vec<Action>,
) {
    heading(ui, title);
    for field in ADDRESS_FIELDS {
        let salt = (title, field);
        if let Some(v) = editable::text(ui, salt, block.field(field), Mode::SingleLine) {
            let edit = match party {
                Party::Client => DocumentEdit::Client(field, v),
                Party::Payor => DocumentEdit::Payor(field, v),
            };
            actions.push(Action::Edit(edit));
        }
    }
}

fn item_table(ui: &mut Ui, doc: &InvoiceDocument, actions: &mut Vec<Action>) {
    egui::Grid::new("items")
        .num_columns(6)
        .striped(true)
        .spacing([16.0, 10.0])
        .min_col_width(48.0)
        .show(ui, |ui| {
            for title in ["Item", "Description", "Price", "Qty", "Total", ""] {
                heading(ui, title);
            }
            ui.end_row();

            for (i, item) in doc.items.iter().enumerate() {
                let id = item.id.as_str();
                ui.horizontal_top(|ui| {
                    ui.label(RichText::new(format!("{}.", i + 1)).color(MUTED));
                    let salt = ("item", id, "name");
                    if let Some(value) = editable::text(ui, salt, &item.name, Mode::SingleLine) {
                        actions.push(Action::Edit(DocumentEdit::ItemName { id: id.into(), value }));
                    }
                });
                let salt = ("item", id, "description");
                if let Some(value) = editable::text(ui, salt, &item.description, Mode::MultiLine) {
                    let edit = DocumentEdit::ItemDescription { id: id.into(), value };
                    actions.push(Action::Edit(edit));
                }
                ui.horizontal_top(|ui| {
                    ui.label("$");
                    if let Some(value) = editable::float(ui, ("item", id, "price"), item.price) {
                        let edit = DocumentEdit::ItemPrice { id: id.into(), value };
                        actions.push(Action::Edit(edit));
                    }
                });
                if let Some(value) = editable::int(ui, ("item", id, "qty"), item.qty) {
                    actions.push(Action::Edit(DocumentEdit::ItemQty { id: id.into(), value }));
                }
                ui.label(RichText::new(format_money(item.line_total())).strong().color(INK));
                let remove_icon = RichText::new("⊖").color(Color32::from_rgb(248, 113, 113));
                let remove = egui::Button::new(remove_icon).frame(false);
                if ui.add(remove).on_hover_text("Remove Item").clicked() {
                    actions.push(Action::RemoveItem(id.into()));
                }
                ui.end_row();
            }
        });
}

fn alert(message: &str) {
    MessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title("Invoice Maker")
        .set_description(message)
        .set_buttons(MessageButtons::Ok)
        .show();
}

fn confirm(message: &str) -> bool {
    let answer = MessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title("Invoice Maker")
        .set_description(message)
        .set_buttons(MessageButtons::YesNo)
        .show();
    answer == MessageDialogResult::Yes
}
