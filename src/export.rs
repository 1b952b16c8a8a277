use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use serde::Serialize;
use serde_json::Value;
use tera::{Context, Tera};
use thiserror::Error;

use crate::logo;
use crate::model::InvoiceDocument;
use crate::settings::AppSettings;
use crate::totals::{Totals, format_money};

pub const PDF_FAILURE_MESSAGE: &str =
    "Failed to generate PDF. Please use the Print option instead.";

const PDF_TEMPLATE: &str = "invoice.typ.tera";
const PRINT_TEMPLATE: &str = "print.html.tera";

// Seeded into the output directory on first use so they can be customised.
const DEFAULT_PDF_TEMPLATE: &str = include_str!("../templates/invoice.typ.tera");
const DEFAULT_PRINT_TEMPLATE: &str = include_str!("../templates/print.html.tera");

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("template error: {0}")]
    Template(#[from] tera::Error),
    #[error("'{0}' is not installed")]
    RendererMissing(String),
    #[error("PDF compilation failed: {0}")]
    CompileFailed(ExitStatus),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ExportError + '_ {
    move |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Fixed rendering options handed to the PDF renderer.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PdfOptions {
    pub paper: &'static str,
    pub flipped: bool,
    pub margin_in: f64,
    pub image_quality: f64,
    pub scale: f64,
}

pub const PDF_OPTIONS: PdfOptions = PdfOptions {
    paper: "a4",
    flipped: false,
    margin_in: 0.0,
    image_quality: 0.98,
    scale: 2.0,
};

#[derive(Serialize)]
struct ItemRow<'a> {
    index: String,
    name: &'a str,
    description: &'a str,
    price: String,
    qty: String,
    total: String,
}

#[derive(Serialize)]
struct ExportContext<'a> {
    doc: &'a InvoiceDocument,
    items: Vec<ItemRow<'a>>,
    tax_rate: String,
    subtotal: String,
    tax_amount: String,
    grand_total: String,
    logo_file: Option<String>,
    options: PdfOptions,
}

impl<'a> ExportContext<'a> {
    fn new(doc: &'a InvoiceDocument, logo_file: Option<String>) -> Self {
        let totals = Totals::of(doc);
        let items = doc
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| ItemRow {
                index: format!("{}.", i + 1),
                name: &item.name,
                description: &item.description,
                price: format_money(item.price),
                qty: item.qty.to_string(),
                total: format_money(item.line_total()),
            })
            .collect();
        Self {
            doc,
            items,
            tax_rate: doc.tax_rate.to_string(),
            subtotal: format_money(totals.subtotal),
            tax_amount: format_money(totals.tax_amount),
            grand_total: format_money(totals.grand_total),
            logo_file,
            options: PDF_OPTIONS,
        }
    }
}

/// Escapes a value for use inside a typst string literal.
fn typst_str(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let escaped = s
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\r', "")
        .replace('\n', "\\n");
    Ok(Value::String(escaped))
}

pub struct Exporter {
    settings: AppSettings,
}

impl Exporter {
    pub fn new(settings: AppSettings) -> Self {
        Self { settings }
    }

    fn templates(&self) -> Result<Tera, ExportError> {
        let template_dir = self.settings.output_path().join("templates");
        fs::create_dir_all(&template_dir).map_err(io_error(&template_dir))?;
        let defaults = [
            (PDF_TEMPLATE, DEFAULT_PDF_TEMPLATE),
            (PRINT_TEMPLATE, DEFAULT_PRINT_TEMPLATE),
        ];
        for (name, body) in defaults {
            let path = template_dir.join(name);
            if !path.exists() {
                tracing::info!(path = %path.display(), "initializing default template");
                fs::write(&path, body).map_err(io_error(&path))?;
            }
        }

        let mut tera = Tera::default();
        tera.autoescape_on(vec![".html.tera"]);
        tera.register_filter("typst_str", typst_str);
        tera.add_template_files(vec![
            (template_dir.join(PDF_TEMPLATE), Some(PDF_TEMPLATE)),
            (template_dir.join(PRINT_TEMPLATE), Some(PRINT_TEMPLATE)),
        ])?;
        Ok(tera)
    }

    /// Writes `<stem>.typ` (and the decoded logo, if any) to the output directory.
    pub fn write_pdf_source(&self, doc: &InvoiceDocument) -> Result<PathBuf, ExportError> {
        let tera = self.templates()?;
        let output_dir = self.settings.output_path();
        let stem = doc.file_stem();

        let logo_file = match doc.logo.as_deref().map(logo::decode_data_url) {
            Some(Some((mime, bytes))) => {
                let name = format!("{}-logo.{}", stem, logo::extension_for_mime(mime));
                let path = output_dir.join(&name);
                fs::write(&path, bytes).map_err(io_error(&path))?;
                Some(name)
            }
            Some(None) => {
                tracing::warn!("logo is not a base64 data URL, leaving it out of the PDF");
                None
            }
            None => None,
        };

        let context = Context::from_serialize(ExportContext::new(doc, logo_file))?;
        let rendered = tera.render(PDF_TEMPLATE, &context)?;
        let typ_path = output_dir.join(format!("{}.typ", stem));
        fs::write(&typ_path, rendered).map_err(io_error(&typ_path))?;
        Ok(typ_path)
    }

    pub fn export_pdf(&self, doc: &InvoiceDocument) -> Result<PathBuf, ExportError> {
        let typst = &self.settings.typst_bin;
        if Command::new(typst).arg("--version").output().is_err() {
            return Err(ExportError::RendererMissing(typst.clone()));
        }

        let typ_path = self.write_pdf_source(doc)?;
        let pdf_path = typ_path.with_extension("pdf");

        tracing::info!(source = %typ_path.display(), "compiling PDF");
        let status = Command::new(typst)
            .arg("compile")
            .arg(&typ_path)
            .arg(&pdf_path)
            .status()
            .map_err(io_error(&typ_path))?;
        if !status.success() {
            return Err(ExportError::CompileFailed(status));
        }

        tracing::info!(pdf = %pdf_path.display(), "PDF generated");
        if self.settings.open_after_export {
            open_and_reveal(&pdf_path);
        }
        Ok(pdf_path)
    }

    /// Renders the print page into `dir`.
    pub fn write_print_page(
        &self,
        doc: &InvoiceDocument,
        dir: &Path,
    ) -> Result<PathBuf, ExportError> {
        let tera = self.templates()?;
        let context = Context::from_serialize(ExportContext::new(doc, None))?;
        let rendered = tera.render(PRINT_TEMPLATE, &context)?;

        fs::create_dir_all(dir).map_err(io_error(dir))?;
        let path = dir.join(format!("{}-print.html", doc.file_stem()));
        fs::write(&path, rendered).map_err(io_error(&path))?;
        Ok(path)
    }

    /// Opens the print page in the host viewer, which raises its print dialog.
    pub fn print(&self, doc: &InvoiceDocument) -> Result<PathBuf, ExportError> {
        let dir = std::env::temp_dir().join("invoice-maker");
        let path = self.write_print_page(doc, &dir)?;
        open_path(&path).map_err(io_error(&path))?;
        Ok(path)
    }
}

fn open_path(path: &Path) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    Command::new("open").arg(path).spawn()?;

    #[cfg(target_os = "windows")]
    Command::new("explorer").arg(path).spawn()?;

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    Command::new("xdg-open").arg(path).spawn()?;

    Ok(())
}

// Reveal in Finder/Explorer, then open.
fn open_and_reveal(path: &Path) {
    #[cfg(target_os = "macos")]
    Command::new("open").arg("-R").arg(path).spawn().ok();

    #[cfg(target_os = "windows")]
    Command::new("explorer")
        .arg(format!("/select,{}", path.to_string_lossy()))
        .spawn()
        .ok();

    if let Err(e) = open_path(path) {
        tracing::warn!(error = %e, path = %path.display(), "could not open exported file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocumentEdit;

    fn exporter_in(dir: &Path) -> Exporter {
        Exporter::new(AppSettings {
            output_dir: dir.to_string_lossy().to_string(),
            typst_bin: "invoice-maker-test-no-such-typst".into(),
            open_after_export: false,
        })
    }

    #[test]
    fn typst_source_carries_document_and_totals() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = exporter_in(dir.path());
        let doc = InvoiceDocument::default();

        let path = exporter.write_pdf_source(&doc).unwrap();

        assert_eq!(path, dir.path().join("invoice-LL93784.typ"));
        let source = fs::read_to_string(&path).unwrap();
        assert!(source.contains("invoice_no: \"#LL93784\""));
        assert!(source.contains("grand_total: \"$5995.00\""));
        assert!(source.contains("subtotal: \"$5450.00\""));
        assert!(source.contains("paper: \"a4\""));
        assert!(source.contains("Website Design"));
        assert!(!source.contains("image(\""));
    }

    #[test]
    fn typst_source_escapes_user_text() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = exporter_in(dir.path());
        let mut doc = InvoiceDocument::default();
        doc.apply(DocumentEdit::CompanyName("Quote \"Co\" \\ #1\nLtd".into()));

        let source = fs::read_to_string(exporter.write_pdf_source(&doc).unwrap()).unwrap();

        assert!(source.contains(r#"company_name: "Quote \"Co\" \\ #1\nLtd""#));
    }

    #[test]
    fn logo_is_written_beside_source() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = exporter_in(dir.path());
        let mut doc = InvoiceDocument::default();
        doc.set_logo(logo::to_data_url("image/jpeg", b"jpegbytes"));

        let source = fs::read_to_string(exporter.write_pdf_source(&doc).unwrap()).unwrap();

        let logo_path = dir.path().join("invoice-LL93784-logo.jpg");
        assert_eq!(fs::read(logo_path).unwrap(), b"jpegbytes");
        assert!(source.contains("image(\"invoice-LL93784-logo.jpg\""));
    }

    #[test]
    fn invoice_number_with_separators_stays_in_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = exporter_in(dir.path());
        let mut doc = InvoiceDocument::default();
        doc.apply(DocumentEdit::InvoiceNo("#2026/01".into()));

        let path = exporter.write_pdf_source(&doc).unwrap();
        assert_eq!(path, dir.path().join("invoice-2026-01.typ"));
        assert!(path.exists());

        let print = exporter.write_print_page(&doc, &dir.path().join("print")).unwrap();
        assert_eq!(print, dir.path().join("print").join("invoice-2026-01-print.html"));
    }

    #[test]
    fn templates_are_seeded_once() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = exporter_in(dir.path());
        let custom = dir.path().join("templates").join(PDF_TEMPLATE);

        exporter.write_pdf_source(&InvoiceDocument::default()).unwrap();
        assert!(custom.exists());

        fs::write(&custom, "custom {{ doc.invoice_no }}").unwrap();
        let path = exporter.write_pdf_source(&InvoiceDocument::default()).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "custom #LL93784");
    }

    #[test]
    fn missing_renderer_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = exporter_in(dir.path());

        let err = exporter.export_pdf(&InvoiceDocument::default()).unwrap_err();

        assert!(matches!(
            err,
            ExportError::RendererMissing(ref bin) if bin == "invoice-maker-test-no-such-typst"
        ));
        assert!(!dir.path().join("invoice-LL93784.pdf").exists());
    }

    #[test]
    fn print_page_is_html_escaped() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = exporter_in(dir.path());
        let mut doc = InvoiceDocument::default();
        doc.apply(DocumentEdit::PaymentMethod("<script>alert(1)</script>".into()));

        let path = exporter.write_print_page(&doc, &dir.path().join("print")).unwrap();

        let html = fs::read_to_string(path).unwrap();
        assert!(html.contains("window.print()"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;&#x2F;script&gt;"));
        assert!(html.contains("$5995.00"));
    }
}
