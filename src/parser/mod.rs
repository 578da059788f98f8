//! Tolerant single-pass XML parser.
//!
//! Parsing happens in two cooperating layers over the decoded text:
//!
//! 1. [`scanner`] finds each `<...>` label and the character data before it,
//!    honoring quotes, comments and CDATA sections.
//! 2. [`label`] classifies each label and grows the tree, keeping a cursor on
//!    the current element.
//!
//! Malformed input is never fatal. Mismatched close tags, stray close tags,
//! malformed attributes, unterminated labels and ignored `<!...>` constructs
//! are recovered from and recorded in [`Document::diagnostics`]. Only an
//! empty buffer or a buffer with no label at all fails to parse.

mod label;
mod scanner;

use crate::encoding::{self, Encode};
use crate::error::{ParseError, SourceLocation};
use crate::tree::Document;

use label::TreeBuilder;
use scanner::LabelScanner;

/// Options controlling how text is turned into a tree.
///
/// Use the builder pattern to configure options:
///
/// ```
/// use slimxml::parser::ParseOptions;
///
/// let opts = ParseOptions::default()
///     .transfer_characters(false)
///     .trim_values(true);
/// assert!(opts.trim_values);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Decode `&lt;`, `&gt;`, `&amp;`, `&quot;`, `&apos;` and numeric
    /// character references in attribute values and element text.
    pub transfer_characters: bool,
    /// Trim leading and trailing whitespace from element text.
    pub trim_values: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            transfer_characters: true,
            trim_values: false,
        }
    }
}

impl ParseOptions {
    /// Enables or disables character reference decoding.
    #[must_use]
    pub fn transfer_characters(mut self, yes: bool) -> Self {
        self.transfer_characters = yes;
        self
    }

    /// Enables or disables trimming of element text.
    #[must_use]
    pub fn trim_values(mut self, yes: bool) -> Self {
        self.trim_values = yes;
        self
    }
}

/// Parses an XML string with default options.
///
/// # Errors
///
/// Returns `ParseError` if the input is empty or contains no label.
///
/// # Examples
///
/// ```
/// use slimxml::parser::parse_str;
///
/// let doc = parse_str(r#"<a x=">"/>"#).unwrap();
/// let a = doc.find_child(doc.root(), "a").unwrap();
/// assert_eq!(doc.attribute(a, "x"), Some(">"));
/// ```
pub fn parse_str(input: &str) -> Result<Document, ParseError> {
    parse_str_with_options(input, &ParseOptions::default())
}

/// Parses an XML string with the given options.
///
/// # Errors
///
/// Returns `ParseError` if the input is empty or contains no label.
pub fn parse_str_with_options(input: &str, options: &ParseOptions) -> Result<Document, ParseError> {
    if input.is_empty() {
        return Err(ParseError::new("empty document"));
    }

    let mut builder = TreeBuilder::new(input, options);
    let mut scanner = LabelScanner::new(input);
    let mut labels = 0usize;
    for scanned in scanner.by_ref() {
        builder.character_data(scanned.text);
        builder.label(scanned.label, scanned.offset);
        labels += 1;
    }
    let trailing = scanner.trailing_text();
    let truncated_at = scanner.truncated_at();
    let doc = builder.finish(trailing, truncated_at);

    if labels == 0 {
        let mut error = ParseError::new("no markup found");
        error.location = SourceLocation::from_offset(input, truncated_at.unwrap_or(0));
        error.diagnostics = doc.diagnostics;
        return Err(error);
    }
    log::debug!(
        "parsed {labels} labels into {} nodes with {} diagnostics",
        doc.node_count(),
        doc.diagnostics.len()
    );
    Ok(doc)
}

/// Decodes and parses a raw buffer.
///
/// With `encode` set to `None` the encoding is detected from the buffer;
/// otherwise the buffer is decoded as `encode`. The encoding used is
/// recorded in [`Document::source_encode`].
///
/// # Errors
///
/// Returns `ParseError` if the buffer is empty, decodes to nothing, or
/// contains no label.
pub fn parse_bytes_with_options(
    bytes: &[u8],
    encode: Option<Encode>,
    options: &ParseOptions,
) -> Result<Document, ParseError> {
    if bytes.is_empty() {
        return Err(ParseError::new("empty buffer"));
    }
    let (text, encode) = match encode {
        Some(encode) => (encoding::decode_as(bytes, encode), encode),
        None => {
            let (text, detected) = encoding::decode(bytes);
            (text, detected.encode)
        }
    };
    let mut doc = parse_str_with_options(&text, options)?;
    doc.source_encode = Some(encode);
    Ok(doc)
}
