//! Content classification and text extraction
//!
//! This module decides how a fetched body becomes plain text:
//! - HTML: decoded per its charset, then paragraph text, falling back to
//!   all visible text
//! - PDF: text of the first pages
//! - Anything else: no text; the caller substitutes the link

use crate::extraction::clean::clean_text;
use encoding_rs::{Encoding, UTF_8};
use scraper::{Html, Node, Selector};

/// Pages read from a PDF before giving up on the rest
pub const MAX_PDF_PAGES: usize = 10;

/// Elements whose text is never shown to a reader
const INVISIBLE_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Content categories, decided from the declared Content-Type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Html,
    Pdf,
    Other,
}

impl ContentKind {
    /// Classifies a Content-Type header value
    ///
    /// Matching is a case-insensitive substring test, so parameters such as
    /// `; charset=utf-8` do not matter.
    ///
    /// # Examples
    ///
    /// ```
    /// use link_digest::extraction::ContentKind;
    ///
    /// assert_eq!(ContentKind::classify("text/html; charset=UTF-8"), ContentKind::Html);
    /// assert_eq!(ContentKind::classify("Application/PDF"), ContentKind::Pdf);
    /// assert_eq!(ContentKind::classify("image/png"), ContentKind::Other);
    /// assert_eq!(ContentKind::classify(""), ContentKind::Other);
    /// ```
    pub fn classify(content_type: &str) -> Self {
        let content_type = content_type.to_ascii_lowercase();
        if content_type.contains("text/html") {
            Self::Html
        } else if content_type.contains("application/pdf") {
            Self::Pdf
        } else {
            Self::Other
        }
    }
}

/// Decodes an HTML body to a string
///
/// The encoding comes from a byte-order mark, then the `charset` parameter
/// of `content_type`, then defaults to UTF-8. Undecodable bytes become
/// U+FFFD.
///
/// # Example
///
/// ```
/// use link_digest::extraction::decode_html;
///
/// let body = b"<p>Caf\xe9</p>";
/// assert_eq!(decode_html(body, "text/html; charset=iso-8859-1"), "<p>Café</p>");
/// ```
pub fn decode_html(body: &[u8], content_type: &str) -> String {
    let encoding = Encoding::for_bom(body)
        .map(|(encoding, _)| encoding)
        .or_else(|| charset_label(content_type).and_then(|l| Encoding::for_label(l.as_bytes())))
        .unwrap_or(UTF_8);
    let (text, _, _) = encoding.decode(body);
    text.into_owned()
}

/// The `charset` parameter of a Content-Type value, if any
fn charset_label(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(|c| c == '"' || c == '\''))
    })
}

/// Extracts cleaned text from an HTML document
///
/// Text of every `<p>` element is joined with single spaces. If that is
/// blank, all visible text nodes of the document are used instead.
///
/// # Example
///
/// ```
/// use link_digest::extraction::extract_html_text;
///
/// assert_eq!(extract_html_text("<p>Hello</p><p>World</p>"), "Hello World");
/// ```
pub fn extract_html_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let paragraphs = extract_paragraphs(&document);
    let text = if paragraphs.trim().is_empty() {
        extract_visible_text(&document)
    } else {
        paragraphs
    };

    clean_text(&text)
}

/// Joins the text of all paragraph elements
fn extract_paragraphs(document: &Html) -> String {
    let Ok(selector) = Selector::parse("p") else {
        return String::new();
    };

    document
        .select(&selector)
        .map(|p| p.text().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collects every text node that is not inside an invisible element
fn extract_visible_text(document: &Html) -> String {
    document
        .root_element()
        .descendants()
        .filter_map(|node| {
            let Node::Text(text) = node.value() else {
                return None;
            };
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| INVISIBLE_ELEMENTS.contains(&el.name()))
            });
            let trimmed = text.trim();
            (!hidden && !trimmed.is_empty()).then_some(trimmed)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extracts cleaned text from the first `max_pages` pages of a PDF
///
/// # Returns
///
/// * `Ok(String)` - Cleaned text (possibly empty for image-only PDFs)
/// * `Err(lopdf::Error)` - The document could not be parsed
pub fn extract_pdf_text(bytes: &[u8], max_pages: usize) -> Result<String, lopdf::Error> {
    let document = lopdf::Document::load_mem(bytes)?;
    let pages: Vec<u32> = document
        .get_pages()
        .keys()
        .take(max_pages)
        .copied()
        .collect();
    if pages.is_empty() {
        return Ok(String::new());
    }

    let text = document.extract_text(&pages)?;
    Ok(clean_text(&text))
}

/// Placeholder text for a PDF that could not be parsed
pub fn pdf_placeholder(link: &str) -> String {
    format!("PDF content from {} (extraction failed)", link)
}
