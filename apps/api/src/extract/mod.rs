//! Text extraction for uploaded resumes and job descriptions.
//!
//! Dispatch is by file extension. Plain text and PDF are decoded in-process;
//! Word documents and images go through external converters (`tools`).
//! The optimize handler never fails a request on extraction: see
//! [`extract_or_describe`].

mod tools;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, warn};

/// Extensions accepted by the upload form, in display order.
pub const SUPPORTED_EXTENSIONS: [&str; 7] = [".pdf", ".doc", ".docx", ".png", ".jpg", ".jpeg", ".txt"];

/// A file received in one multipart part, held in memory.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub file_name: String,
    pub content: Bytes,
}

impl UploadedDocument {
    pub fn new(file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }

    /// Lowercased extension including the leading dot, or "" when there is none.
    pub fn extension(&self) -> String {
        match self.file_name.rfind('.') {
            // a leading dot alone (".bashrc") is a hidden file, not an extension
            Some(idx) if idx > 0 => self.file_name[idx..].to_lowercase(),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Pdf,
    Docx,
    Doc,
    Image,
}

impl DocumentKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            ".txt" => Some(DocumentKind::PlainText),
            ".pdf" => Some(DocumentKind::Pdf),
            ".docx" => Some(DocumentKind::Docx),
            ".doc" => Some(DocumentKind::Doc),
            ".png" | ".jpg" | ".jpeg" => Some(DocumentKind::Image),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file extension: {0}")]
    UnsupportedExtension(String),

    #[error("file is not valid UTF-8 text: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("{tool} is not installed")]
    ToolMissing { tool: &'static str },

    #[error("{tool} failed: {message}")]
    Tool { tool: &'static str, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Extracts the text of `document`, dispatching on its extension.
pub async fn extract_text(document: &UploadedDocument) -> Result<String, ExtractError> {
    let ext = document.extension();
    let kind = DocumentKind::from_extension(&ext)
        .ok_or_else(|| ExtractError::UnsupportedExtension(ext.clone()))?;

    debug!(file = %document.file_name, ?kind, bytes = document.content.len(), "Extracting text");

    match kind {
        DocumentKind::PlainText => Ok(String::from_utf8(document.content.to_vec())?),
        DocumentKind::Pdf => extract_pdf(document.content.clone()).await,
        DocumentKind::Docx => tools::pandoc_plain(document.content.clone()).await,
        DocumentKind::Doc => tools::antiword(document.content.clone()).await,
        DocumentKind::Image => tools::tesseract(document.content.clone(), &ext).await,
    }
}

/// Like [`extract_text`], but folds failures into text the LLM still receives.
pub async fn extract_or_describe(document: &UploadedDocument) -> String {
    match extract_text(document).await {
        Ok(text) => text,
        Err(ExtractError::UnsupportedExtension(ext)) => {
            warn!(file = %document.file_name, "Unsupported upload extension");
            format!("Unsupported file extension: {ext}")
        }
        Err(e) => {
            warn!(file = %document.file_name, "Text extraction failed: {e}");
            format!(
                "Error extracting text from file {}: {e}",
                document.file_name
            )
        }
    }
}

async fn extract_pdf(content: Bytes) -> Result<String, ExtractError> {
    // pdf-extract is CPU-bound and may panic on malformed input
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&content))
        .await
        .map_err(|e| ExtractError::Pdf(format!("extractor aborted: {e}")))?
        .map_err(|e| ExtractError::Pdf(e.to_string()))
}
