//! Upload candidates and the checks run on them before anything is sent.

use std::path::Path;

use crate::error::{DocDashError, Result, ValidationError};

/// Largest accepted upload (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

const ACCEPTED_EXACT_TYPES: &[&str] = &["application/pdf", "text/plain"];

/// A file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Creates an upload, guessing the content type from the file name.
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let content_type = mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            filename,
            content_type,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Reads a file from disk. Oversized files are rejected before their
    /// contents are read.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let read_err = |source| DocDashError::ReadFile {
            path: path.to_path_buf(),
            source,
        };

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let metadata = tokio::fs::metadata(path).await.map_err(read_err)?;
        if metadata.len() > MAX_UPLOAD_BYTES {
            return Err(ValidationError::TooLarge {
                filename,
                size: metadata.len(),
                max: MAX_UPLOAD_BYTES,
            }
            .into());
        }

        let bytes = tokio::fs::read(path).await.map_err(read_err)?;
        Ok(Self::new(filename, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Checks size and content type.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.size() > MAX_UPLOAD_BYTES {
            return Err(ValidationError::TooLarge {
                filename: self.filename.clone(),
                size: self.size(),
                max: MAX_UPLOAD_BYTES,
            });
        }

        if !is_accepted_type(&self.content_type) {
            return Err(ValidationError::UnsupportedType {
                filename: self.filename.clone(),
                content_type: self.content_type.clone(),
            });
        }

        Ok(())
    }
}

/// Accepts images, PDF and plain text. Parameters such as `; charset=utf-8` are ignored.
pub fn is_accepted_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence.starts_with("image/") || ACCEPTED_EXACT_TYPES.contains(&essence.as_str())
}

/// Exactly one file may be uploaded per request.
pub fn single_file(mut files: Vec<UploadFile>) -> std::result::Result<UploadFile, ValidationError> {
    match files.len() {
        0 => Err(ValidationError::NoFile),
        1 => Ok(files.remove(0)),
        n => Err(ValidationError::TooManyFiles(n)),
    }
}
