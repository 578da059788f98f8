//! XML serializer.
//!
//! Writes a `Document` tree back to XML text and, through [`to_bytes`], to
//! the bytes of a target encoding.

use std::borrow::Cow;

use crate::encoding::{self, Encode};
use crate::tree::{Document, NodeId, NodeKind};

/// Options controlling XML serialization output.
///
/// # Examples
///
/// ```
/// use slimxml::Document;
/// use slimxml::serial::{serialize_with_options, SerializeOptions};
///
/// let doc = Document::parse_str("<root><child>Hello</child></root>").unwrap();
/// let xml = serialize_with_options(&doc, &SerializeOptions::default().indent_str("  "));
/// assert!(xml.contains("  <child>Hello</child>"));
///
/// let xml = serialize_with_options(&doc, &SerializeOptions::default().indent(false));
/// assert_eq!(xml, "<root><child>Hello</child></root>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Whether to put each node on its own line, indented by depth.
    /// Defaults to `true`.
    pub indent: bool,
    /// The indentation string used for each level when `indent` is `true`.
    /// Defaults to a tab.
    pub indent_str: String,
    /// Whether to escape `& < > " '` in attribute values and element text.
    /// Defaults to `true`.
    pub transfer_characters: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            indent: true,
            indent_str: "\t".to_string(),
            transfer_characters: true,
        }
    }
}

impl SerializeOptions {
    /// Enables or disables indented output.
    ///
    /// Elements that carry text as well as children are never indented
    /// inside, so the text reads back unchanged.
    #[must_use]
    pub fn indent(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }

    /// Sets the indentation string used for each nesting level.
    #[must_use]
    pub fn indent_str(mut self, s: &str) -> Self {
        self.indent_str = s.to_string();
        self
    }

    /// Enables or disables entity escaping.
    #[must_use]
    pub fn transfer_characters(mut self, yes: bool) -> Self {
        self.transfer_characters = yes;
        self
    }
}

/// Serializes a document to an XML string with default options.
///
/// # Examples
///
/// ```
/// use slimxml::Document;
/// use slimxml::serial::serialize;
///
/// let doc = Document::parse_str("<a><b x=\"1\"/></a>").unwrap();
/// assert_eq!(serialize(&doc), "<a>\n\t<b x=\"1\"/>\n</a>\n");
/// ```
#[must_use]
pub fn serialize(doc: &Document) -> String {
    serialize_with_options(doc, &SerializeOptions::default())
}

/// Serializes a document to an XML string with the given options.
#[must_use]
pub fn serialize_with_options(doc: &Document, options: &SerializeOptions) -> String {
    let mut output = String::new();
    for child in doc.children(doc.root()) {
        serialize_node(doc, child, &mut output, options, 0, options.indent);
    }
    output
}

/// Serializes a document into the bytes of `encode`, byte order mark
/// included.
///
/// # Examples
///
/// ```
/// use slimxml::{Document, Encode};
/// use slimxml::serial::{to_bytes, SerializeOptions};
///
/// let doc = Document::parse_str("<a/>").unwrap();
/// let bytes = to_bytes(&doc, Encode::Utf8, &SerializeOptions::default());
/// assert_eq!(bytes, b"\xEF\xBB\xBF<a/>\n");
/// ```
#[must_use]
pub fn to_bytes(doc: &Document, encode: Encode, options: &SerializeOptions) -> Vec<u8> {
    let text = serialize_with_options(doc, options);
    let bytes = encoding::encode(&text, encode);
    log::debug!(
        "serialized {} nodes into {} bytes of {encode}",
        doc.node_count(),
        bytes.len()
    );
    bytes
}

fn write_indent(out: &mut String, options: &SerializeOptions, depth: usize) {
    for _ in 0..depth {
        out.push_str(&options.indent_str);
    }
}

fn serialize_node(
    doc: &Document,
    id: NodeId,
    out: &mut String,
    options: &SerializeOptions,
    depth: usize,
    pretty: bool,
) {
    let node = doc.node(id);
    if pretty {
        write_indent(out, options, depth);
    }
    match node.kind() {
        NodeKind::Element => {
            out.push('<');
            out.push_str(doc.name(id));
            for attr in node.attributes() {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                write_escaped(out, &attr.value, options);
                out.push('"');
            }

            if node.is_empty() {
                out.push_str("/>");
            } else {
                out.push('>');
                write_escaped(out, doc.value(id), options);
                if node.has_children() {
                    // Mixed content stays on one line.
                    let children_pretty = pretty && doc.value(id).is_empty();
                    if children_pretty {
                        out.push('\n');
                    }
                    for child in doc.children(id) {
                        serialize_node(doc, child, out, options, depth + 1, children_pretty);
                    }
                    if children_pretty {
                        write_indent(out, options, depth);
                    }
                }
                out.push_str("</");
                out.push_str(doc.name(id));
                out.push('>');
            }
        }
        NodeKind::Comment => {
            out.push_str("<!--");
            out.push_str(doc.value(id));
            out.push_str("-->");
        }
        NodeKind::Declaration => {
            out.push_str("<?");
            let (target, body) = (doc.name(id), doc.value(id));
            let names_target = body
                .strip_prefix(target)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace));
            if target.is_empty() || names_target {
                out.push_str(body);
            } else {
                // The value was set without its target.
                out.push_str(target);
                if !body.is_empty() {
                    out.push(' ');
                    out.push_str(body);
                }
            }
            out.push_str("?>");
        }
        NodeKind::Document => {
            // Should not appear as a child node
        }
    }
    if pretty {
        out.push('\n');
    }
}

fn write_escaped(out: &mut String, text: &str, options: &SerializeOptions) {
    if options.transfer_characters {
        out.push_str(&escape(text));
    } else {
        out.push_str(text);
    }
}

/// Escapes `&`, `<`, `>`, `"` and `'` with their named entities.
///
/// # Examples
///
/// ```
/// use slimxml::serial::escape;
///
/// assert_eq!(escape("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
/// assert_eq!(escape("plain"), "plain");
/// ```
#[must_use]
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}
