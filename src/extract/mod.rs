//! Text extraction from uploaded documents and fetched articles

mod article;
mod docx;
mod pdf;

pub use article::{ARTICLE_APOLOGY, ArticleFetcher, ArticleSource, article_url, paragraph_text};
pub use docx::extract_docx;
pub use pdf::extract_pdf;

use crate::{Error, Result};

/// MIME type of Word documents
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Word,
    PlainText,
}

impl DocumentKind {
    /// Map a declared MIME type to a document kind
    ///
    /// Returns `None` for anything unsupported.
    #[must_use]
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence {
            "application/pdf" => Some(Self::Pdf),
            DOCX_MIME => Some(Self::Word),
            "text/plain" => Some(Self::PlainText),
            _ => None,
        }
    }
}

/// Extract a single text blob from document bytes
///
/// # Errors
///
/// Returns error if the document cannot be parsed
pub fn extract_document(kind: DocumentKind, bytes: &[u8]) -> Result<String> {
    let text = match kind {
        DocumentKind::Pdf => extract_pdf(bytes)?,
        DocumentKind::Word => extract_docx(bytes)?,
        DocumentKind::PlainText => String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::Extraction(format!("text is not valid UTF-8: {e}")))?,
    };

    tracing::debug!(?kind, bytes = bytes.len(), chars = text.len(), "document extracted");
    Ok(text)
}

/// Extract text if `mime` is supported
///
/// # Errors
///
/// Returns error if the document is supported but cannot be parsed
pub fn extract_upload(mime: &str, bytes: &[u8]) -> Result<Option<String>> {
    let Some(kind) = DocumentKind::from_mime(mime) else {
        tracing::debug!(mime, "ignoring unsupported upload");
        return Ok(None);
    };
    extract_document(kind, bytes).map(Some)
}
