//! Document selection and type validation.
//!
//! The service accepts PDF, DOC, DOCX, and TXT uploads. Acceptance is by
//! extension OR MIME type: either match is sufficient, because MIME types
//! reported for local files vary across platforms.

use anyhow::{Context, Result};
use std::path::Path;

const ALLOWED_EXTENSIONS: [&str; 4] = ["pdf", "doc", "docx", "txt"];

const ALLOWED_MIME_TYPES: [&str; 4] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
];

/// The one active document. Last selection wins; an invalid selection
/// leaves no document behind.
#[derive(Debug, Clone)]
pub struct SelectedDocument {
    pub file_name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl SelectedDocument {
    /// Validate and accept a document from raw parts.
    pub fn from_parts(file_name: &str, mime: Option<&str>, bytes: Vec<u8>) -> Result<Self> {
        if !is_allowed_type(file_name, mime) {
            return Err(anyhow::anyhow!(
                "File type not allowed. Please upload PDF, DOC, DOCX, or TXT files."
            ));
        }
        Ok(Self {
            file_name: file_name.to_string(),
            mime: mime.map(str::to_string).or_else(|| guess_mime(file_name)),
            bytes,
        })
    }

    /// Read a document from disk and validate its type.
    pub async fn load(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .with_context(|| format!("invalid document path: {}", path.display()))?;
        if !is_allowed_type(&file_name, None) {
            return Err(anyhow::anyhow!(
                "File type not allowed. Please upload PDF, DOC, DOCX, or TXT files."
            ));
        }
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("read document {}", path.display()))?;
        Self::from_parts(&file_name, None, bytes)
    }

    pub fn size_mib(&self) -> f64 {
        self.bytes.len() as f64 / 1024.0 / 1024.0
    }

    /// Human-readable size with two decimal places, e.g. "1.50 MiB".
    pub fn size_display(&self) -> String {
        format!("{:.2} MiB", self.size_mib())
    }
}

fn extension_of(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Extension-or-MIME allowlist check. Either match passes.
pub fn is_allowed_type(file_name: &str, mime: Option<&str>) -> bool {
    let ext_ok = extension_of(file_name)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false);
    let mime_ok = mime
        .map(|m| ALLOWED_MIME_TYPES.contains(&m))
        .unwrap_or(false);
    ext_ok || mime_ok
}

/// Best-effort MIME guess from the file extension, for the multipart part.
pub fn guess_mime(file_name: &str) -> Option<String> {
    let ext = extension_of(file_name)?;
    let mime = match ext.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        _ => return None,
    };
    Some(mime.to_string())
}
