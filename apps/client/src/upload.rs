//! File selections held by the form.

use std::path::Path;

use anyhow::{Context, Result};
use bytes::Bytes;

/// Accept filter offered by the file pickers. Advisory only: files outside
/// it are still stored and submitted.
pub const ACCEPT_FILTER: &str = ".pdf,.doc,.docx,.png,.jpg,.jpeg,.txt";

/// A user-selected file: its display name and contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub file_name: String,
    pub content: Bytes,
}

impl SelectedFile {
    pub fn new(file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }

    /// Reads `path` into memory, keeping only its final component as the name.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let content = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(file_name, content))
    }

    fn extension(&self) -> Option<String> {
        self.file_name
            .rfind('.')
            .filter(|&idx| idx > 0)
            .map(|idx| self.file_name[idx..].to_lowercase())
    }

    /// Whether the name matches [`ACCEPT_FILTER`].
    pub fn matches_accept_filter(&self) -> bool {
        self.extension()
            .is_some_and(|ext| ACCEPT_FILTER.split(',').any(|accepted| accepted == ext))
    }

    /// MIME type sent with the multipart part.
    pub fn mime_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some(".pdf") => "application/pdf",
            Some(".doc") => "application/msword",
            Some(".docx") => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Some(".png") => "image/png",
            Some(".jpg") | Some(".jpeg") => "image/jpeg",
            Some(".txt") => "text/plain",
            _ => "application/octet-stream",
        }
    }
}
