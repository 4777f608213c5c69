//! Paragraph-based PDF layout
//!
//! Each non-empty line of the content becomes a paragraph, word-wrapped on
//! US-Letter pages with one-inch margins.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

use crate::{Error, Result};

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 72.0;
const FONT_SIZE: f32 = 10.0;
const LEADING: f32 = 12.0;
const PARAGRAPH_SPACING: f32 = 6.0;

/// Approximate Helvetica advance width as a fraction of the font size
const AVERAGE_GLYPH_WIDTH: f32 = 0.5;

/// A line of text placed at a baseline
#[derive(Debug, Clone, PartialEq)]
struct PlacedLine {
    y: f32,
    text: String,
}

/// Render `content` as a paginated PDF
///
/// # Errors
///
/// Returns error if the document cannot be encoded
pub fn render_pdf(content: &str) -> Result<Vec<u8>> {
    let pages = layout(content, max_line_chars());

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in &pages {
        let page_id = add_page(&mut doc, pages_id, resources_id, page)?;
        kids.push(page_id.into());
    }

    let count = i64::try_from(kids.len())
        .map_err(|_| Error::Export("too many pages".to_string()))?;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| Error::Export(format!("failed to write PDF: {e}")))?;
    Ok(out)
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    resources_id: ObjectId,
    lines: &[PlacedLine],
) -> Result<ObjectId> {
    let mut operations = Vec::with_capacity(lines.len() * 5);
    for line in lines {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]));
        operations.push(Operation::new("Td", vec![MARGIN.into(), line.y.into()]));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(win_ansi_bytes(&line.text))],
        ));
        operations.push(Operation::new("ET", vec![]));
    }

    let encoded = Content { operations }
        .encode()
        .map_err(|e| Error::Export(format!("failed to encode page content: {e}")))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
    }))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn max_line_chars() -> usize {
    ((PAGE_WIDTH - 2.0 * MARGIN) / (FONT_SIZE * AVERAGE_GLYPH_WIDTH)) as usize
}

/// Place wrapped paragraph lines on pages, top to bottom
fn layout(content: &str, max_chars: usize) -> Vec<Vec<PlacedLine>> {
    let top = PAGE_HEIGHT - MARGIN - FONT_SIZE;
    let mut pages: Vec<Vec<PlacedLine>> = vec![Vec::new()];
    let mut y = top;

    for paragraph in content.lines().map(str::trim).filter(|p| !p.is_empty()) {
        for text in wrap(paragraph, max_chars) {
            if y < MARGIN {
                pages.push(Vec::new());
                y = top;
            }
            if let Some(page) = pages.last_mut() {
                page.push(PlacedLine { y, text });
            }
            y -= LEADING;
        }
        y -= PARAGRAPH_SPACING;
    }

    pages
}

/// Greedy word wrap; words longer than a line are split
fn wrap(paragraph: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in paragraph.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let needed = if current.is_empty() { word.len() } else { word.len() + 1 };
        if current_len + needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word.iter());
        current_len += word.len();
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Encode text for a WinAnsi Type1 font, replacing unmappable characters
fn win_ansi_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{2026}' => 0x85,
            '\u{2022}' => 0x95,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{20AC}' => 0x80,
            c if c.is_ascii() || ('\u{A0}'..='\u{FF}').contains(&c) => {
                u8::try_from(u32::from(c)).unwrap_or(b'?')
            }
            _ => b'?',
        })
        .collect()
}
