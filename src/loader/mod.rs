//! Loading of user uploads.
//!
//! Uploads arrive as in-memory blobs. PDFs are materialized to temporary
//! files for text extraction; CSVs are parsed into a [`CsvTable`] and kept on
//! disk for the code-execution tool.

mod csv;
mod pdf;

pub use self::csv::CsvTable;
pub use pdf::{load_pdf, load_pdfs};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// A file uploaded by the user.
#[derive(Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Original file name.
    pub name: String,
    /// Raw file contents.
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Create a new upload from a name and its contents.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read an upload from a local path.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }

    /// SHA-256 of the contents, hex encoded.
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the upload has no content.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Combined fingerprint of an ordered upload set.
///
/// Identical uploads in the same order always produce the same value, so it
/// can key caches of anything derived from the uploads.
pub fn fingerprint_all(files: &[UploadedFile]) -> String {
    let mut hasher = Sha256::new();
    for file in files {
        hasher.update(file.name.as_bytes());
        hasher.update([0u8]);
        hasher.update(file.fingerprint().as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

/// A page of text extracted from an uploaded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Extracted text.
    pub content: String,
    /// File name the text came from.
    pub source: String,
    /// Zero-based page number.
    pub page: usize,
}

impl SourceDocument {
    /// Create a new source document.
    pub fn new(content: impl Into<String>, source: impl Into<String>, page: usize) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
            page,
        }
    }
}

/// Write an upload to a named temporary file in `dir`.
///
/// The file is removed when the returned handle is dropped.
pub fn persist_upload(file: &UploadedFile, dir: &Path, suffix: &str) -> Result<NamedTempFile> {
    use std::io::Write;

    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(suffix)
        .tempfile_in(dir)?;
    tmp.write_all(&file.bytes)?;
    tmp.flush()?;

    debug!("Persisted {} ({} bytes) to {}", file.name, file.len(), tmp.path().display());
    Ok(tmp)
}
