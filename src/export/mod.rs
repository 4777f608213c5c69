//! Export of assistant replies to TXT, DOCX, and PDF

mod docx;
mod html_pdf;
mod pdf;

pub use docx::render_docx;
pub use html_pdf::{HtmlPdfRenderer, render_html};
pub use pdf::render_pdf;

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Downloadable export format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Word,
    Pdf,
}

impl ExportFormat {
    /// Parse a file extension (`txt`, `docx`, `pdf`)
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" => Some(Self::Text),
            "docx" => Some(Self::Word),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Word => "docx",
            Self::Pdf => "pdf",
        }
    }

    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Text => "text/plain",
            Self::Word => crate::extract::DOCX_MIME,
            Self::Pdf => "application/pdf",
        }
    }

    /// Download filename used by the chat page
    #[must_use]
    pub fn file_name(self) -> String {
        format!("assistant_response.{}", self.extension())
    }
}

/// Render `content` in the given format
///
/// PDF output is laid out directly from paragraphs.
///
/// # Errors
///
/// Returns error if encoding fails
pub fn export(content: &str, format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Text => Ok(content.as_bytes().to_vec()),
        ExportFormat::Word => render_docx(content),
        ExportFormat::Pdf => render_pdf(content),
    }
}

/// Write a Word document to `{dir}/{stem}.docx` and return its path
///
/// # Errors
///
/// Returns error if rendering or writing fails
pub fn save_word(content: &str, dir: &Path, stem: &str) -> Result<PathBuf> {
    let path = dir.join(format!("{stem}.docx"));
    let bytes = render_docx(content)?;
    std::fs::write(&path, bytes)
        .map_err(|e| Error::Export(format!("failed to write {}: {e}", path.display())))?;
    tracing::info!(path = %path.display(), "word document saved");
    Ok(path)
}
