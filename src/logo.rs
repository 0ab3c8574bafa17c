//src/logo.rs
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read logo file {0:?}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("Not a supported image file: {0:?}")]
    UnsupportedType(PathBuf),
    #[error("Logo file is empty: {0:?}")]
    Empty(PathBuf),
}

fn mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// Encodes raw image bytes as a `data:` URI.
#[must_use]
pub fn to_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Reads an image file and returns it as a `data:` URI.
pub fn load_data_uri(path: &Path) -> Result<String, Error> {
    let mime = mime_type(path).ok_or_else(|| Error::UnsupportedType(path.to_path_buf()))?;
    let bytes = fs::read(path).map_err(|e| Error::Read(path.to_path_buf(), e))?;
    if bytes.is_empty() {
        return Err(Error::Empty(path.to_path_buf()));
    }
    Ok(to_data_uri(mime, &bytes))
}
