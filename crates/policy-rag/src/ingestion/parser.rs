//! File parser for the supported formats

use crate::error::{Error, Result};
use crate::types::FileType;

/// Replace glyphs that PDF extraction commonly leaves behind with plain text
fn cleanup_pdf_text(text: &str) -> String {
    text.replace('\u{00A0}', " ")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .replace('\u{2010}', "-")
        .replace('\u{2011}', "-")
        .replace('\u{2018}', "'")
        .replace('\u{2019}', "'")
        .replace('\u{201C}', "\"")
        .replace('\u{201D}', "\"")
}

/// Parsed document with extracted text
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// File type
    pub file_type: FileType,
    /// Extracted text content
    pub content: String,
    /// Total pages (PDF only)
    pub total_pages: Option<u32>,
}

/// Multi-format file parser
pub struct FileParser;

impl FileParser {
    /// Parse a file based on its extension
    pub fn parse(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or("");

        let file_type = FileType::from_extension(extension).ok_or_else(|| {
            Error::UnsupportedFormat(format!(
                "{} (supported: {})",
                if extension.is_empty() { filename } else { extension },
                FileType::SUPPORTED_EXTENSIONS.join(", ")
            ))
        })?;

        match file_type {
            FileType::Txt | FileType::Markdown => Self::parse_text(filename, data, file_type),
            FileType::Pdf => Self::parse_pdf(filename, data),
        }
    }

    /// Parse UTF-8 text or markdown
    fn parse_text(filename: &str, data: &[u8], file_type: FileType) -> Result<ParsedDocument> {
        let content = std::str::from_utf8(data)
            .map_err(|e| Error::file_parse(filename, format!("not valid UTF-8: {}", e)))?;
        let content = content.strip_prefix('\u{FEFF}').unwrap_or(content);

        Ok(ParsedDocument {
            file_type,
            content: content.to_string(),
            total_pages: None,
        })
    }

    /// Parse a PDF page by page.
    ///
    /// Pages whose text cannot be extracted contribute an empty string; only a
    /// document that cannot be opened at all is an error.
    fn parse_pdf(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::file_parse(filename, format!("cannot open PDF: {}", e)))?;

        let pages = doc.get_pages();
        let mut texts = Vec::with_capacity(pages.len());

        for page_number in pages.keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(text) => texts.push(cleanup_pdf_text(&text)),
                Err(e) => {
                    tracing::debug!(
                        "No extractable text on page {} of {}: {}",
                        page_number,
                        filename,
                        e
                    );
                    texts.push(String::new());
                }
            }
        }

        Ok(ParsedDocument {
            file_type: FileType::Pdf,
            content: texts.join("\n"),
            total_pages: Some(pages.len() as u32),
        })
    }
}
