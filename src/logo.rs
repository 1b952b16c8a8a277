use std::fs;
use std::path::Path;

use base64::{Engine as _, engine::general_purpose};
use thiserror::Error;

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg"];

#[derive(Debug, Error)]
pub enum LogoError {
    #[error("failed to read logo {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("not an image file: {0}")]
    NotAnImage(String),
}

pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => return None,
    };
    Some(mime)
}

pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        _ => "png",
    }
}

pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(bytes))
}

/// Reads an image file into a `data:` URL.
pub fn read_data_url(path: &Path) -> Result<String, LogoError> {
    let mime = mime_for_path(path)
        .ok_or_else(|| LogoError::NotAnImage(path.display().to_string()))?;
    let bytes = fs::read(path).map_err(|source| LogoError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(to_data_url(mime, &bytes))
}

/// Splits a base64 `data:` URL into its mime type and payload.
pub fn decode_data_url(url: &str) -> Option<(&str, Vec<u8>)> {
    let rest = url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let mime = meta.strip_suffix(";base64")?;
    let bytes = general_purpose::STANDARD.decode(payload.trim()).ok()?;
    Some((mime, bytes))
}
