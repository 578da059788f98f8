//! Label classification and tree construction.
//!
//! [`TreeBuilder`] receives the output of the scanner one label at a time and
//! grows the document: open labels push a new current element, close labels
//! pop back to its parent, and everything else becomes a leaf under the
//! current element. Problems are recovered from on the spot and recorded as
//! diagnostics.

use std::borrow::Cow;

use crate::error::{ErrorSeverity, ParseDiagnostic, SourceLocation};
use crate::tree::{Document, NameValue, NodeId, NodeKind};

use super::ParseOptions;

/// A label sorted by what it does to the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Label<'a> {
    /// `<?target body?>`; `body` includes the target.
    Declaration { target: &'a str, body: &'a str },
    /// `<!--body-->`.
    Comment(&'a str),
    /// `<![CDATA[body]]>`.
    CData(&'a str),
    /// Any other `<!...>` label, e.g. `<!DOCTYPE ...>`.
    Ignored,
    /// `</name>`.
    Close(&'a str),
    /// `<name attributes>` or `<name attributes/>`.
    Open {
        name: &'a str,
        attributes: &'a str,
        self_closing: bool,
    },
}

/// Classifies a label produced by the scanner, `<` and `>` included.
pub(crate) fn classify(label: &str) -> Label<'_> {
    if let Some(body) = label
        .strip_prefix("<!--")
        .and_then(|rest| rest.strip_suffix("-->"))
    {
        return Label::Comment(body);
    }
    if let Some(body) = label
        .strip_prefix("<![CDATA[")
        .and_then(|rest| rest.strip_suffix("]]>"))
    {
        return Label::CData(body);
    }

    let inner = label
        .strip_prefix('<')
        .and_then(|rest| rest.strip_suffix('>'))
        .unwrap_or(label);

    if inner.starts_with('!') {
        return Label::Ignored;
    }
    if let Some(rest) = inner.strip_prefix('?') {
        let body = rest.strip_suffix('?').unwrap_or(rest);
        let target = body.split_whitespace().next().unwrap_or("");
        return Label::Declaration { target, body };
    }
    if let Some(rest) = inner.strip_prefix('/') {
        return Label::Close(rest.trim());
    }

    let trimmed = inner.trim();
    let (content, self_closing) = match trimmed.strip_suffix('/') {
        Some(content) => (content, true),
        None => (trimmed, false),
    };
    let name_end = content
        .find(|c: char| c.is_whitespace() || c == '/')
        .unwrap_or(content.len());
    Label::Open {
        name: &content[..name_end],
        attributes: &content[name_end..],
        self_closing,
    }
}

/// Decodes the five named entities and numeric character references.
///
/// Anything that is not a recognized reference, including a bare `&`, is
/// kept verbatim.
pub(crate) fn unescape(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        if let Some((ch, len)) = decode_reference(tail) {
            out.push(ch);
            rest = &tail[len..];
        } else {
            out.push('&');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Longest reference body worth looking at, `#x10FFFF` plus slack.
const MAX_REFERENCE_LEN: usize = 10;

/// Decodes the reference at the start of `tail` (which begins with `&`).
/// Returns the character and the length of the reference including `;`.
fn decode_reference(tail: &str) -> Option<(char, usize)> {
    let semi = tail.find(';')?;
    if semi > MAX_REFERENCE_LEN + 1 {
        return None;
    }
    let body = &tail[1..semi];
    let ch = match body {
        "lt" => '<',
        "gt" => '>',
        "amp" => '&',
        "quot" => '"',
        "apos" => '\'',
        _ => {
            let number = body.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) if hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
                    u32::from_str_radix(hex, 16).ok()?
                }
                Some(_) => return None,
                None if number.bytes().all(|b| b.is_ascii_digit()) => number.parse().ok()?,
                None => return None,
            };
            char::from_u32(code).filter(|&c| c != '\0')?
        }
    };
    Some((ch, semi + 1))
}

/// Builds a [`Document`] from a stream of labels.
pub(crate) struct TreeBuilder<'a> {
    source: &'a str,
    options: &'a ParseOptions,
    doc: Document,
    current: NodeId,
    /// Character data of the current run; CDATA sections join the run.
    pending: String,
    diagnostics: Vec<ParseDiagnostic>,
    /// Location of the last diagnostic; offsets only grow.
    cursor: SourceLocation,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(source: &'a str, options: &'a ParseOptions) -> Self {
        let doc = Document::new();
        let current = doc.root();
        Self {
            source,
            options,
            doc,
            current,
            pending: String::new(),
            diagnostics: Vec::new(),
            cursor: SourceLocation::default(),
        }
    }

    /// Handles the character data that preceded a label.
    pub fn character_data(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.options.transfer_characters {
            self.pending.push_str(&unescape(text));
        } else {
            self.pending.push_str(text);
        }
    }

    /// Applies one label to the tree.
    pub fn label(&mut self, label: &str, offset: usize) {
        match classify(label) {
            Label::CData(body) => self.pending.push_str(body),
            Label::Comment(body) => {
                self.flush_text();
                let id = self.doc.add_child(self.current, "", NodeKind::Comment);
                self.doc.node_mut(id).set_value(body);
            }
            Label::Declaration { target, body } => {
                self.flush_text();
                let id = self.doc.add_child(self.current, target, NodeKind::Declaration);
                self.doc.node_mut(id).set_value(body);
            }
            Label::Ignored => {
                self.flush_text();
                self.diagnostic(
                    ErrorSeverity::Warning,
                    format!("ignored markup declaration `{}`", preview(label)),
                    offset,
                );
            }
            Label::Close(name) => {
                self.flush_text();
                self.close(name, offset);
            }
            Label::Open {
                name,
                attributes,
                self_closing,
            } => {
                self.flush_text();
                self.open(name, attributes, self_closing, offset);
            }
        }
    }

    fn open(&mut self, name: &str, attributes: &str, self_closing: bool, offset: usize) {
        if name.is_empty() {
            self.diagnostic(ErrorSeverity::Error, "label without a name".to_string(), offset);
            return;
        }
        let id = self.doc.add_element(self.current, name);
        self.parse_attributes(id, attributes, offset);
        if !self_closing {
            self.current = id;
        }
    }

    fn close(&mut self, name: &str, offset: usize) {
        let Some(parent) = self.doc.parent(self.current) else {
            self.diagnostic(
                ErrorSeverity::Error,
                format!("closing tag </{name}> without an open element"),
                offset,
            );
            return;
        };
        let open = self.doc.name(self.current);
        if open != name {
            let message = format!("mismatched closing tag: expected </{open}>, found </{name}>");
            self.diagnostic(ErrorSeverity::Error, message, offset);
        }
        self.current = parent;
    }

    /// Parses `name="value"` pairs onto the element `id`.
    fn parse_attributes(&mut self, id: NodeId, text: &str, offset: usize) {
        let mut rest = text;
        loop {
            rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '/');
            if rest.is_empty() {
                break;
            }

            let name_end = rest
                .find(|c: char| c.is_whitespace() || matches!(c, '=' | '/' | '"' | '\''))
                .unwrap_or(rest.len());
            if name_end == 0 {
                // A stray quote or `=`; step over it.
                let skipped = rest.chars().next().map_or(1, char::len_utf8);
                self.diagnostic(
                    ErrorSeverity::Error,
                    format!("unexpected `{}` in attribute list", &rest[..skipped]),
                    offset,
                );
                rest = &rest[skipped..];
                continue;
            }
            let name = &rest[..name_end];
            rest = rest[name_end..].trim_start();

            let Some(after_eq) = rest.strip_prefix('=') else {
                self.diagnostic(
                    ErrorSeverity::Warning,
                    format!("attribute `{name}` has no value, skipped"),
                    offset,
                );
                continue;
            };
            rest = after_eq.trim_start();

            let quote = rest.chars().next().filter(|c| matches!(*c, '"' | '\''));
            let raw = if let Some(quote) = quote {
                let body = &rest[1..];
                if let Some(close) = body.find(quote) {
                    rest = &body[close + 1..];
                    &body[..close]
                } else {
                    self.diagnostic(
                        ErrorSeverity::Error,
                        format!("unterminated value for attribute `{name}`"),
                        offset,
                    );
                    rest = "";
                    body
                }
            } else {
                let end = rest
                    .find(|c: char| c.is_whitespace() || c == '/')
                    .unwrap_or(rest.len());
                let value = &rest[..end];
                rest = &rest[end..];
                value
            };

            let value = if self.options.transfer_characters {
                unescape(raw)
            } else {
                Cow::Borrowed(raw)
            };
            self.doc.node_mut(id).add_attribute(name, value.into_owned());
        }
    }

    /// Assigns the pending run to the current element if it is not blank.
    fn flush_text(&mut self) {
        let text = std::mem::take(&mut self.pending);
        if text.trim().is_empty() || self.current == self.doc.root() {
            return;
        }
        let node = self.doc.node_mut(self.current);
        if self.options.trim_values {
            node.set_value(text.trim());
        } else {
            node.set_value(text);
        }
    }

    fn diagnostic(&mut self, severity: ErrorSeverity, message: String, offset: usize) {
        self.cursor = self.cursor.advance(self.source, offset);
        let diagnostic = ParseDiagnostic {
            severity,
            message,
            location: self.cursor,
        };
        log::warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    /// Finishes the tree, reporting elements still open at end of input.
    pub fn finish(mut self, trailing: &str, truncated_at: Option<usize>) -> Document {
        self.character_data(trailing);
        self.flush_text();
        if let Some(offset) = truncated_at {
            let message = format!(
                "unterminated label `{}` dropped",
                preview(&self.source[offset..])
            );
            self.diagnostic(ErrorSeverity::Error, message, offset);
        }
        if self.current != self.doc.root() {
            let message = format!("element <{}> not closed", self.doc.name(self.current));
            self.diagnostic(ErrorSeverity::Warning, message, self.source.len());
        }
        self.doc.diagnostics = self.diagnostics;
        self.doc
    }
}

/// Shortens a label for a diagnostic message.
fn preview(label: &str) -> &str {
    const MAX: usize = 32;
    match label.char_indices().nth(MAX) {
        Some((end, _)) => &label[..end],
        None => label,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parser::scanner::LabelScanner;
    use pretty_assertions::assert_eq;

    fn build(input: &str) -> Document {
        build_with(input, &ParseOptions::default())
    }

    fn build_with(input: &str, options: &ParseOptions) -> Document {
        let mut builder = TreeBuilder::new(input, options);
        let mut scanner = LabelScanner::new(input);
        for scanned in scanner.by_ref() {
            builder.character_data(scanned.text);
            builder.label(scanned.label, scanned.offset);
        }
        builder.finish(scanner.trailing_text(), scanner.truncated_at())
    }

    #[test]
    fn test_classify_kinds() {
        assert_eq!(classify("<!-- c -->"), Label::Comment(" c "));
        assert_eq!(classify("<![CDATA[<x>]]>"), Label::CData("<x>"));
        assert_eq!(classify("<!DOCTYPE html>"), Label::Ignored);
        assert_eq!(classify("</a >"), Label::Close("a"));
        assert_eq!(
            classify("<?xml version=\"1.0\"?>"),
            Label::Declaration {
                target: "xml",
                body: "xml version=\"1.0\""
            }
        );
        assert_eq!(
            classify("<a x=\"1\"/>"),
            Label::Open {
                name: "a",
                attributes: " x=\"1\"",
                self_closing: true
            }
        );
        assert_eq!(
            classify("<a>"),
            Label::Open {
                name: "a",
                attributes: "",
                self_closing: false
            }
        );
        assert_eq!(
            classify("<br/>"),
            Label::Open {
                name: "br",
                attributes: "",
                self_closing: true
            }
        );
    }

    #[test]
    fn test_unescape_named_and_numeric() {
        assert_eq!(unescape("a &lt;b&gt; &amp; &quot;c&quot; &apos;"), "a <b> & \"c\" '");
        assert_eq!(unescape("&#65;&#x42;&#X43;&#20013;"), "ABC\u{4E2D}");
    }

    #[test]
    fn test_unescape_passes_unknown_through() {
        assert_eq!(unescape("&nbsp; & &#; &#xZZ; &#0; AT&T"), "&nbsp; & &#; &#xZZ; &#0; AT&T");
        assert!(matches!(unescape("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn test_nested_elements_and_values() {
        let doc = build("<a><b>one</b><c>two</c></a>");
        let a = doc.find_child(doc.root(), "a").unwrap();
        let b = doc.find_child(a, "b").unwrap();
        let c = doc.find_child(a, "c").unwrap();
        assert_eq!(doc.value(b), "one");
        assert_eq!(doc.value(c), "two");
        assert_eq!(doc.value(a), "");
        assert!(doc.diagnostics.is_empty());
    }

    #[test]
    fn test_last_non_blank_run_wins() {
        let doc = build("<a>first<b/>  \n  <c/>last<d/>\n</a>");
        let a = doc.find_child(doc.root(), "a").unwrap();
        assert_eq!(doc.value(a), "last");
    }

    #[test]
    fn test_text_is_unescaped() {
        let doc = build("<a>x &lt; y &amp;&amp; z</a>");
        let a = doc.find_child(doc.root(), "a").unwrap();
        assert_eq!(doc.value(a), "x < y && z");
    }

    #[test]
    fn test_cdata_joins_text_verbatim() {
        let doc = build("<a>x <![CDATA[<y> &amp;]]> z</a>");
        let a = doc.find_child(doc.root(), "a").unwrap();
        assert_eq!(doc.value(a), "x <y> &amp; z");
    }

    #[test]
    fn test_text_outside_elements_is_ignored() {
        let doc = build("before<a/>after");
        assert_eq!(doc.child_count(doc.root()), 1);
        assert_eq!(doc.value(doc.root()), "");
    }

    #[test]
    fn test_attributes_in_source_order() {
        let doc = build(r#"<a z="1" y='two' x = "&lt;3&gt;"/>"#);
        let a = doc.node(doc.find_child(doc.root(), "a").unwrap());
        let pairs: Vec<(&str, &str)> = a
            .attributes()
            .iter()
            .map(|attr| (attr.name.as_str(), attr.value.as_str()))
            .collect();
        assert_eq!(pairs, vec![("z", "1"), ("y", "two"), ("x", "<3>")]);
    }

    #[test]
    fn test_attribute_recovery() {
        let doc = build(r"<a flag v=1 w=2/>");
        let a = doc.node(doc.find_child(doc.root(), "a").unwrap());
        assert_eq!(a.attribute("flag"), None);
        assert_eq!(a.attribute("v"), Some("1"));
        assert_eq!(a.attribute("w"), Some("2"));
        assert_eq!(doc.diagnostics.len(), 1);
        assert_eq!(doc.diagnostics[0].severity, ErrorSeverity::Warning);
    }

    #[test]
    fn test_transfer_characters_off_keeps_references() {
        let options = ParseOptions::default().transfer_characters(false);
        let doc = build_with(r#"<a v="&amp;">&lt;</a>"#, &options);
        let a = doc.find_child(doc.root(), "a").unwrap();
        assert_eq!(doc.attribute(a, "v"), Some("&amp;"));
        assert_eq!(doc.value(a), "&lt;");
    }

    #[test]
    fn test_trim_values() {
        let options = ParseOptions::default().trim_values(true);
        let doc = build_with("<a>  padded  </a>", &options);
        let a = doc.find_child(doc.root(), "a").unwrap();
        assert_eq!(doc.value(a), "padded");

        let doc = build("<a>  padded  </a>");
        let a = doc.find_child(doc.root(), "a").unwrap();
        assert_eq!(doc.value(a), "  padded  ");
    }

    #[test]
    fn test_declaration_and_comment_nodes() {
        let doc = build("<?xml version=\"1.0\"?><!-- a > b --><r/>");
        let kinds: Vec<NodeKind> = doc.children(doc.root()).map(|id| doc.kind(id)).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Declaration, NodeKind::Comment, NodeKind::Element]
        );
        let decl = doc.first_child(doc.root()).unwrap();
        assert_eq!(doc.name(decl), "xml");
        assert_eq!(doc.value(decl), "xml version=\"1.0\"");
        let comment = doc.children(doc.root()).nth(1).unwrap();
        assert_eq!(doc.value(comment), " a > b ");
    }

    #[test]
    fn test_mismatched_close_still_closes() {
        let doc = build("<a><b></c><d/></a>");
        let a = doc.find_child(doc.root(), "a").unwrap();
        assert!(doc.find_child(a, "d").is_some());
        assert_eq!(doc.diagnostics.len(), 1);
        assert_eq!(doc.diagnostics[0].severity, ErrorSeverity::Error);
        assert!(doc.diagnostics[0].message.contains("</b>"));
    }

    #[test]
    fn test_stray_close_at_document_level() {
        let doc = build("</x><a/>");
        assert_eq!(doc.child_count(doc.root()), 1);
        assert_eq!(doc.diagnostics.len(), 1);
        assert_eq!(doc.diagnostics[0].location.column, 1);
    }

    #[test]
    fn test_doctype_is_ignored_with_warning() {
        let doc = build("<!DOCTYPE r><r/>");
        assert_eq!(doc.child_count(doc.root()), 1);
        assert_eq!(doc.diagnostics[0].severity, ErrorSeverity::Warning);
    }

    #[test]
    fn test_many_diagnostics_on_a_large_document() {
        let count = 20_000;
        let mut input = String::from("<r>\n");
        for _ in 0..count {
            input.push_str("<a x y z/>\n");
        }
        input.push_str("</r>");
        let doc = build(&input);

        let r = doc.find_child(doc.root(), "r").unwrap();
        assert_eq!(doc.child_count(r), count);
        assert_eq!(doc.diagnostics.len(), count * 3);
        for (i, diagnostic) in doc.diagnostics.iter().enumerate().step_by(997) {
            let expected = SourceLocation::from_offset(&input, diagnostic.location.byte_offset);
            assert_eq!(diagnostic.location, expected);
            assert_eq!(diagnostic.location.line as usize, i / 3 + 2);
            assert_eq!(diagnostic.location.column, 1);
        }
    }

    #[test]
    fn test_unclosed_and_truncated_input() {
        let doc = build("<a><b x=\"1");
        let a = doc.find_child(doc.root(), "a").unwrap();
        assert!(!doc.has_children(a));
        let messages: Vec<&str> = doc.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("unterminated label"));
        assert!(messages[1].contains("<a> not closed"));
    }
}
