//! Text extraction from uploaded `.txt` and `.docx` files.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::io::{Cursor, Read};
use std::path::Path;

use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Docx,
}

impl DocumentKind {
    /// Decided by extension only, the way clients name their uploads.
    pub fn from_file_name(file_name: &str) -> AppResult<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("txt") => Ok(DocumentKind::PlainText),
            Some("docx") => Ok(DocumentKind::Docx),
            _ => Err(AppError::bad_request("Invalid file format.")),
        }
    }
}

pub fn extract_text(kind: DocumentKind, bytes: &[u8]) -> AppResult<String> {
    match kind {
        DocumentKind::PlainText => String::from_utf8(bytes.to_vec())
            .map_err(|_| AppError::bad_request("Text file is not valid UTF-8")),
        DocumentKind::Docx => docx_text(bytes),
    }
}

// Абзацы таблиц и надписей не входят в основной текст документа
static TABLE_TAGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<w:tbl(?:\s[^>]*)?>|</w:tbl>").expect("valid regex"));
static TEXT_BOX_TAGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<w:txbxContent(?:\s[^>]*)?>|</w:txbxContent>").expect("valid regex"));
static PARAGRAPH_PROPS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<w:pPr>.*?</w:pPr>").expect("valid regex"));
static PARAGRAPH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<w:p(?:\s[^>]*?)?(?:/>|>(.*?)</w:p>)").expect("valid regex"));
static RUN_CONTENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>|<w:tab\b[^>]*/>|<w:(?:br|cr)\b[^>]*/>").expect("valid regex")
});
static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#x[0-9A-Fa-f]+|#[0-9]+|lt|gt|amp|quot|apos);").expect("valid regex"));

/// Paragraph texts of `word/document.xml`, joined by newlines.
fn docx_text(bytes: &[u8]) -> AppResult<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| AppError::bad_request(format!("Not a valid .docx file: {}", e)))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|_| AppError::bad_request("Not a valid .docx file: word/document.xml is missing"))?
        .read_to_string(&mut xml)?;

    let xml = strip_blocks(&xml, &TEXT_BOX_TAGS);
    let xml = strip_blocks(&xml, &TABLE_TAGS);
    let xml = PARAGRAPH_PROPS.replace_all(&xml, "");
    let paragraphs: Vec<String> = PARAGRAPH
        .captures_iter(&xml)
        .map(|caps| caps.get(1).map(|body| paragraph_text(body.as_str())).unwrap_or_default())
        .collect();

    Ok(paragraphs.join("\n"))
}

/// Remove outermost open/close tag pairs matched by `tags` with everything
/// between them. Nesting is tracked; an unclosed element runs to the end.
fn strip_blocks(xml: &str, tags: &Regex) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut depth = 0usize;
    let mut kept_from = 0;

    for tag in tags.find_iter(xml) {
        if tag.as_str().starts_with("</") {
            if depth == 0 {
                continue;
            }
            depth -= 1;
            if depth == 0 {
                kept_from = tag.end();
            }
        } else {
            if depth == 0 {
                out.push_str(&xml[kept_from..tag.start()]);
            }
            depth += 1;
        }
    }

    if depth == 0 {
        out.push_str(&xml[kept_from..]);
    }
    out
}

fn paragraph_text(body: &str) -> String {
    let mut text = String::new();
    for caps in RUN_CONTENT.captures_iter(body) {
        match caps.get(1) {
            Some(run) => text.push_str(&unescape(run.as_str())),
            None if caps[0].starts_with("<w:tab") => text.push('\t'),
            None => text.push('\n'),
        }
    }
    text
}

fn unescape(value: &str) -> String {
    ENTITY
        .replace_all(value, |caps: &Captures| match &caps[1] {
            "lt" => "<".to_string(),
            "gt" => ">".to_string(),
            "amp" => "&".to_string(),
            "quot" => "\"".to_string(),
            "apos" => "'".to_string(),
            code => {
                let parsed = match code.strip_prefix("#x") {
                    Some(hex) => u32::from_str_radix(hex, 16).ok(),
                    None => code[1..].parse().ok(),
                };
                parsed
                    .and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_else(|| caps[0].to_string())
            }
        })
        .into_owned()
}
