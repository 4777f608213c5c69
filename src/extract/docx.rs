//! Word (DOCX) paragraph extraction
//!
//! A DOCX file is a zip package; body text lives in `word/document.xml` as
//! `<w:p>` paragraphs made of `<w:t>` runs.

use std::io::{Cursor, Read};
use std::sync::LazyLock;

use regex::Regex;
use zip::ZipArchive;

use crate::{Error, Result};

const DOCUMENT_PART: &str = "word/document.xml";

static PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:p(?:\s[^>]*?)?(?:/>|>(.*?)</w:p>)").expect("valid paragraph regex")
});

static RUN_CONTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:t(?:\s[^>]*[^/])?>(.*?)</w:t>|<w:tab/>|<w:br(?:\s[^>]*)?/>|<w:cr/>")
        .expect("valid run regex")
});

/// Concatenate paragraph text, each paragraph followed by a line break
///
/// # Errors
///
/// Returns error if the package or its document part cannot be read
pub fn extract_docx(bytes: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::Extraction(format!("failed to open DOCX package: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| Error::Extraction(format!("missing {DOCUMENT_PART}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| Error::Extraction(format!("failed to read {DOCUMENT_PART}: {e}")))?;

    Ok(paragraphs_from_xml(&xml))
}

fn paragraphs_from_xml(xml: &str) -> String {
    let mut text = String::new();
    for paragraph in PARAGRAPH.captures_iter(xml) {
        if let Some(body) = paragraph.get(1) {
            text.push_str(&paragraph_text(body.as_str()));
        }
        text.push('\n');
    }
    text
}

fn paragraph_text(body: &str) -> String {
    let mut text = String::new();
    for run in RUN_CONTENT.captures_iter(body) {
        match run.get(1) {
            Some(t) => text.push_str(&decode_xml_entities(t.as_str())),
            None if run[0].starts_with("<w:tab") => text.push('\t'),
            None => text.push('\n'),
        }
    }
    text
}

fn decode_xml_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
