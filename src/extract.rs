use std::path::Path;

use scraper::{Html, Node};
use thiserror::Error;

/// File extensions accepted for upload.
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["txt", "md", "html", "htm", "pdf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum DocumentFormat {
    #[strum(serialize = "plain text")]
    PlainText,
    Markdown,
    #[strum(serialize = "HTML")]
    Html,
    #[strum(serialize = "PDF")]
    Pdf,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" => Some(Self::PlainText),
            "md" => Some(Self::Markdown),
            "html" | "htm" => Some(Self::Html),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::from_extension(ext).ok_or_else(|| ExtractError::UnsupportedFormat(ext.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported format {0:?}; supported formats: txt, md, html, htm, pdf")]
    UnsupportedFormat(String),
    #[error("could not read file: {0}")]
    Read(#[from] std::io::Error),
    #[error("could not parse {format} document: {message}")]
    Parse {
        format: DocumentFormat,
        message: String,
    },
}

/// Turns document bytes into the plain text to practice on.
pub trait TextExtractor: Send + Sync {
    fn extract_plain_text(&self, bytes: &[u8], format: DocumentFormat) -> Result<String, ExtractError>;
}

/// Extractor for every [`DocumentFormat`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentExtractor;

impl TextExtractor for DocumentExtractor {
    fn extract_plain_text(&self, bytes: &[u8], format: DocumentFormat) -> Result<String, ExtractError> {
        match format {
            DocumentFormat::PlainText | DocumentFormat::Markdown => decode_utf8(bytes, format),
            DocumentFormat::Html => Ok(html_to_text(&decode_utf8(bytes, format)?)),
            DocumentFormat::Pdf => pdf_to_text(bytes),
        }
    }
}

/// UTF-8 text with Windows line endings turned into `\n`, the only line
/// break the typing surface can produce.
fn decode_utf8(bytes: &[u8], format: DocumentFormat) -> Result<String, ExtractError> {
    let text = String::from_utf8(bytes.to_vec()).map_err(|err| ExtractError::Parse {
        format,
        message: err.to_string(),
    })?;

    Ok(normalize_line_endings(text))
}

fn normalize_line_endings(text: String) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text
    }
}

/// Text content of an HTML document with `<script>` and `<style>` dropped.
pub fn html_to_text(source: &str) -> String {
    let document = Html::parse_document(source);

    document
        .tree
        .nodes()
        .filter_map(|node| match node.value() {
            Node::Text(text) => {
                let hidden = node.ancestors().any(|ancestor| {
                    ancestor
                        .value()
                        .as_element()
                        .is_some_and(|el| matches!(el.name(), "script" | "style"))
                });
                (!hidden).then(|| String::from(&**text))
            }
            _ => None,
        })
        .collect()
}

fn pdf_to_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|err| ExtractError::Parse {
        format: DocumentFormat::Pdf,
        message: err.to_string(),
    })?;

    Ok(normalize_line_endings(join_pages(&pages)))
}

/// Page texts, each followed by a blank line.
fn join_pages(pages: &[String]) -> String {
    pages.iter().map(|page| format!("{page}\n\n")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_extension("txt"), Some(DocumentFormat::PlainText));
        assert_eq!(DocumentFormat::from_extension("MD"), Some(DocumentFormat::Markdown));
        assert_eq!(DocumentFormat::from_extension("htm"), Some(DocumentFormat::Html));
        assert_eq!(DocumentFormat::from_extension("Html"), Some(DocumentFormat::Html));
        assert_eq!(DocumentFormat::from_extension("pdf"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_extension("docx"), None);
        assert!(SUPPORTED_EXTENSIONS
            .iter()
            .all(|ext| DocumentFormat::from_extension(ext).is_some()));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("/tmp/notes.md")).unwrap(),
            DocumentFormat::Markdown
        );
        assert_matches!(
            DocumentFormat::from_path(Path::new("report.docx")),
            Err(ExtractError::UnsupportedFormat(ext)) if ext == "docx"
        );
        assert_matches!(
            DocumentFormat::from_path(Path::new("Makefile")),
            Err(ExtractError::UnsupportedFormat(_))
        );
    }

    #[test]
    fn test_plain_text_passes_through() {
        let text = DocumentExtractor
            .extract_plain_text(b"# Title\n\nbody *text*", DocumentFormat::Markdown)
            .unwrap();
        assert_eq!(text, "# Title\n\nbody *text*");
    }

    #[test]
    fn test_crlf_line_endings_are_normalized() {
        let text = DocumentExtractor
            .extract_plain_text(b"first line\r\nsecond line\r\n\r\nlast\rold mac", DocumentFormat::PlainText)
            .unwrap();
        assert_eq!(text, "first line\nsecond line\n\nlast\nold mac");

        let markdown = DocumentExtractor
            .extract_plain_text(b"# Title\r\nbody", DocumentFormat::Markdown)
            .unwrap();
        assert!(!markdown.contains('\r'));
    }

    #[test]
    fn test_invalid_utf8_is_a_parse_error() {
        assert_matches!(
            DocumentExtractor.extract_plain_text(&[0xff, 0xfe, 0x00], DocumentFormat::PlainText),
            Err(ExtractError::Parse { format: DocumentFormat::PlainText, .. })
        );
    }

    #[test]
    fn test_html_drops_script_and_style() {
        let html = r#"<html><head><style>p { color: red; }</style></head>
<body><p>Hello <b>world</b></p><script>alert("x");</script><p>again</p></body></html>"#;

        let text = html_to_text(html);
        assert!(text.contains("Hello world"));
        assert!(text.contains("again"));
        assert!(!text.contains("alert"));
        assert!(!text.contains("color"));
    }

    #[test]
    fn test_html_fragment() {
        assert_eq!(html_to_text("<p>one</p><p>two</p>"), "onetwo");
    }

    #[test]
    fn test_html_through_extractor() {
        let text = DocumentExtractor
            .extract_plain_text(b"<div>typed <i>text</i></div>", DocumentFormat::Html)
            .unwrap();
        assert_eq!(text, "typed text");
    }

    const TWO_PAGES_PDF: &[u8] = include_bytes!("../tests/fixtures/two_pages.pdf");

    #[test]
    fn test_join_pages_adds_blank_line_after_each_page() {
        let pages = vec!["First page".to_string(), "Second page".to_string()];
        assert_eq!(join_pages(&pages), "First page\n\nSecond page\n\n");
        assert_eq!(join_pages(&[]), "");
    }

    #[test]
    fn test_pdf_pages_are_joined_in_order() {
        let text = DocumentExtractor
            .extract_plain_text(TWO_PAGES_PDF, DocumentFormat::Pdf)
            .unwrap();

        let pages = pdf_extract::extract_text_from_mem_by_pages(TWO_PAGES_PDF).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(text, normalize_line_endings(join_pages(&pages)));

        let first = text.find("First page").unwrap();
        let second = text.find("Second page").unwrap();
        assert!(first < second);
        assert!(text[first..second].contains("\n\n"));
        assert!(text.ends_with("\n\n"));
    }

    #[test]
    fn test_corrupt_pdf_is_a_parse_error() {
        assert_matches!(
            DocumentExtractor.extract_plain_text(b"definitely not a pdf", DocumentFormat::Pdf),
            Err(ExtractError::Parse { format: DocumentFormat::Pdf, .. })
        );
    }
}
