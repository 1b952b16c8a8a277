mod app;
mod coerce;
mod editable;
mod export;
mod logo;
mod model;
mod settings;
mod totals;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use comfy_table::{Attribute, Cell, CellAlignment, Table};
use tracing_subscriber::EnvFilter;

use crate::app::InvoiceApp;
use crate::export::Exporter;
use crate::model::InvoiceDocument;
use crate::totals::{Totals, format_money};

// ==========================================
// CLI
// ==========================================

#[derive(Parser)]
#[command(name = "invoice-maker", version, about = "Edit an invoice and export it as PDF or print")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the invoice editor (default)
    Edit,
    /// Configure output directory and PDF renderer
    Config,
    /// Print the default invoice and its totals
    Show,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Edit) {
        Commands::Edit => run_editor(),
        Commands::Config => {
            settings::setup_config_wizard()?;
            Ok(())
        }
        Commands::Show => {
            show_invoice(&InvoiceDocument::default());
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn run_editor() -> anyhow::Result<()> {
    let path = settings::config_path();
    let settings = settings::load_from(&path)
        .with_context(|| format!("loading settings from {}", path.display()))?;
    tracing::info!(output_dir = %settings.output_path().display(), "starting editor");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("Invoice Maker")
            .with_inner_size([1040.0, 900.0]),
        ..Default::default()
    };
    let exporter = Exporter::new(settings);
    eframe::run_native(
        "invoice-maker",
        options,
        Box::new(move |cc| Ok(Box::new(InvoiceApp::new(cc, exporter)))),
    )
    .map_err(|e| anyhow::anyhow!("editor failed: {e}"))
}

// ==========================================
// Show
// ==========================================

fn show_invoice(doc: &InvoiceDocument) {
    println!("\n--- Invoice {} ({}) ---", doc.invoice_no, doc.date);
    println!("From: {}  |  To: {}", doc.payor.name, doc.client.name);

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("#"),
        Cell::new("Item"),
        Cell::new("Price"),
        Cell::new("Qty"),
        Cell::new("Total"),
    ]);
    for (i, item) in doc.items.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&item.name),
            Cell::new(format_money(item.price)).set_alignment(CellAlignment::Right),
            Cell::new(item.qty).set_alignment(CellAlignment::Right),
            Cell::new(format_money(item.line_total())).set_alignment(CellAlignment::Right),
        ]);
    }

    let totals = Totals::of(doc);
    let summary = [
        ("SubTotal".to_string(), totals.subtotal),
        (format!("Tax ({}%)", doc.tax_rate), totals.tax_amount),
        ("Grand Total".to_string(), totals.grand_total),
    ];
    for (label, amount) in summary {
        table.add_row(vec![
            Cell::new(""),
            Cell::new(label).add_attribute(Attribute::Bold),
            Cell::new(""),
            Cell::new(""),
            Cell::new(format_money(amount))
                .add_attribute(Attribute::Bold)
                .set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{table}");
    println!("Payment: {}", doc.payment_method);
}
