//! PDF text extraction

use lopdf::Document;

use crate::{Error, Result};

/// Concatenate the text of every page, in page order
///
/// # Errors
///
/// Returns error if the bytes are not a readable PDF
pub fn extract_pdf(bytes: &[u8]) -> Result<String> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| Error::Extraction(format!("failed to read PDF: {e}")))?;

    // BTreeMap keys are page numbers, so iteration is already in page order
    let mut text = String::new();
    for page_number in doc.get_pages().keys() {
        let page_text = doc.extract_text(&[*page_number]).map_err(|e| {
            Error::Extraction(format!("failed to extract page {page_number}: {e}"))
        })?;
        text.push_str(&page_text);
    }

    Ok(text)
}
