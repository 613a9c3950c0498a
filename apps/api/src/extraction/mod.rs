//! Document text extraction: file-type gate plus PDF, DOCX and plain-text readers.
//!
//! The type gate runs before any extraction or LLM work; a rejected file never
//! reaches a parser.

pub mod docx;
pub mod pdf;

use std::collections::HashMap;

use axum::extract::multipart::{Multipart, MultipartError};
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::errors::AppError;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const TEXT_MIME: &str = "text/plain";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("could not read PDF '{file_name}': {reason}")]
    Pdf { file_name: String, reason: String },

    #[error("could not read DOCX '{file_name}': {reason}")]
    Docx { file_name: String, reason: String },

    #[error("'{file_name}' is not valid UTF-8 text")]
    NotUtf8 { file_name: String },

    #[error("no text could be extracted from '{file_name}'")]
    Empty { file_name: String },

    #[error("extraction worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Docx,
    Text,
}

/// Which file kinds an intake accepts. PDF and DOCX always; plain text only when enabled.
#[derive(Debug, Clone, Copy)]
pub struct AcceptPolicy {
    pub allow_plain_text: bool,
}

impl AcceptPolicy {
    pub fn describe(&self) -> &'static str {
        if self.allow_plain_text {
            "Please select a PDF, DOCX or TXT file"
        } else {
            "Please select a PDF or DOCX file"
        }
    }

    /// Resolves the file kind from the declared MIME type, falling back to the
    /// extension only when the client sent no specific type.
    pub fn detect(&self, file_name: &str, content_type: Option<&str>) -> Result<FileKind, AppError> {
        let declared = content_type
            .map(|ct| ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
            .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");

        let kind = match declared.as_deref() {
            Some(PDF_MIME) => Some(FileKind::Pdf),
            Some(DOCX_MIME) => Some(FileKind::Docx),
            Some(TEXT_MIME) => Some(FileKind::Text),
            Some(_) => None,
            None => kind_from_extension(file_name),
        };

        match kind {
            Some(FileKind::Text) if !self.allow_plain_text => Err(self.reject(file_name)),
            Some(kind) => Ok(kind),
            None => Err(self.reject(file_name)),
        }
    }

    fn reject(&self, file_name: &str) -> AppError {
        AppError::UnsupportedFileType(format!("'{file_name}': {}", self.describe()))
    }
}

fn kind_from_extension(file_name: &str) -> Option<FileKind> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some(FileKind::Pdf),
        "docx" => Some(FileKind::Docx),
        "txt" => Some(FileKind::Text),
        _ => None,
    }
}

/// A file received over multipart, already checked by the type gate.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub kind: FileKind,
    pub bytes: Bytes,
}

/// Files and plain fields of a multipart form. Every file has passed the type gate.
#[derive(Debug, Default)]
pub struct MultipartUpload {
    pub files: Vec<UploadedFile>,
    pub fields: HashMap<String, String>,
}

fn multipart_error(e: MultipartError) -> AppError {
    AppError::Validation(format!("Invalid upload: {}", e.body_text()))
}

/// Reads a multipart form, running each file part through `policy`.
/// The first disallowed file rejects the whole form.
pub async fn read_multipart(
    mut multipart: Multipart,
    policy: AcceptPolicy,
) -> Result<MultipartUpload, AppError> {
    let mut upload = MultipartUpload::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            // Browsers send an unnamed empty part for an untouched file input.
            Some(file_name) if file_name.is_empty() => continue,
            Some(file_name) => {
                let kind = policy.detect(&file_name, field.content_type())?;
                let bytes = field.bytes().await.map_err(multipart_error)?;
                upload.files.push(UploadedFile {
                    file_name,
                    kind,
                    bytes,
                });
            }
            None => {
                let value = field.text().await.map_err(multipart_error)?;
                upload.fields.insert(name, value);
            }
        }
    }
    Ok(upload)
}

/// Extracts text synchronously. CPU-bound; see [`extract`] for async callers.
pub fn extract_text(file: &UploadedFile) -> Result<String, ExtractionError> {
    let text = match file.kind {
        FileKind::Pdf => pdf::extract_pdf_text(&file.file_name, &file.bytes)?,
        FileKind::Docx => docx::extract_docx_text(&file.file_name, &file.bytes)?,
        FileKind::Text => String::from_utf8(file.bytes.to_vec()).map_err(|_| {
            ExtractionError::NotUtf8 {
                file_name: file.file_name.clone(),
            }
        })?,
    };

    if text.trim().is_empty() {
        return Err(ExtractionError::Empty {
            file_name: file.file_name.clone(),
        });
    }

    debug!(
        "Extracted {} chars from '{}' ({:?})",
        text.len(),
        file.file_name,
        file.kind
    );
    Ok(text)
}

/// Runs [`extract_text`] on the blocking pool.
pub async fn extract(file: UploadedFile) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || extract_text(&file))
        .await
        .map_err(|e| ExtractionError::Worker(e.to_string()))?
}
