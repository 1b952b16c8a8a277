use std::fs;
use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};
use inquire::{Confirm, Text};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to encode settings: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("prompt cancelled: {0}")]
    Prompt(#[from] inquire::InquireError),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    /// Where PDFs and their typst sources are written.
    pub output_dir: String,
    pub typst_bin: String,
    pub open_after_export: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            output_dir: "~/Documents/Invoices".into(),
            typst_bin: "typst".into(),
            open_after_export: true,
        }
    }
}

impl AppSettings {
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(expand_home_dir(&self.output_dir))
    }
}

pub fn config_path() -> PathBuf {
    match ProjectDirs::from("com", "invoice-maker", "app") {
        Some(dirs) => dirs.config_dir().join("settings.toml"),
        None => PathBuf::from("settings.toml"),
    }
}

/// Missing file means defaults.
pub fn load_from(path: &Path) -> Result<AppSettings, SettingsError> {
    if !path.exists() {
        return Ok(AppSettings::default());
    }
    let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save_to(path: &Path, settings: &AppSettings) -> Result<(), SettingsError> {
    let io_err = |source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let toml_str = toml::to_string_pretty(settings)?;
    fs::write(path, toml_str).map_err(io_err)
}

pub fn load() -> Result<AppSettings, SettingsError> {
    load_from(&config_path())
}

pub fn setup_config_wizard() -> Result<AppSettings, SettingsError> {
    println!("\n⚙️  --- Configuration Setup ---");
    let current = load()?;

    println!("📂 Opening folder picker...");
    let picked = rfd::FileDialog::new()
        .set_title("Select Invoice Output Directory")
        .pick_folder();

    let output_dir = match picked {
        Some(path) => path.to_string_lossy().to_string(),
        None => {
            println!("❌ No folder selected. Falling back to manual input.");
            Text::new("Output Directory:").with_default(&current.output_dir).prompt()?
        }
    };
    let typst_bin = Text::new("typst executable:").with_default(&current.typst_bin).prompt()?;
    let open_after_export = Confirm::new("Open PDFs after export?")
        .with_default(current.open_after_export)
        .prompt()?;

    let settings = AppSettings { output_dir, typst_bin, open_after_export };
    let path = config_path();
    save_to(&path, &settings)?;
    tracing::info!(path = %path.display(), "settings saved");
    println!("✅ Settings saved.");
    Ok(settings)
}

pub fn expand_home_dir(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(base_dirs) = BaseDirs::new() {
            let home = base_dirs.home_dir().to_string_lossy();
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}
