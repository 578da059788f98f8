//! Location of `<...>` labels in decoded text.
//!
//! [`LabelScanner`] walks the text once, left to right, with four states:
//! outside markup, inside a tag, inside a quoted attribute value within a
//! tag, and inside a comment. A `>` ends a tag only outside quotes, and a
//! comment ends only at `-->`, so neither `<a x=">"/>` nor `<!-- a > b -->`
//! is cut short. `<![CDATA[` sections behave like comments and end at `]]>`.
//!
//! The scanner never interprets a label; that is the job of
//! [`label`](super::label).

/// One label and the character data that preceded it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Scanned<'a> {
    /// Text between the previous label (or the start) and this one.
    pub text: &'a str,
    /// The label, including its `<` and `>`.
    pub label: &'a str,
    /// Byte offset of the label's `<` in the input.
    pub offset: usize,
}

/// Iterator over the labels of a text.
#[derive(Debug)]
pub(crate) struct LabelScanner<'a> {
    input: &'a str,
    pos: usize,
    /// End of the text still to be handed out; shrinks to the start of an
    /// unterminated label.
    end: usize,
    truncated: Option<usize>,
}

impl<'a> LabelScanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            end: input.len(),
            truncated: None,
        }
    }

    /// Returns the text after the last complete label.
    ///
    /// Only meaningful once the iterator is exhausted.
    pub fn trailing_text(&self) -> &'a str {
        &self.input[self.pos..self.end]
    }

    /// Returns the offset of a label that ran to the end of the input
    /// without being closed, if there was one. Such a label is dropped.
    pub fn truncated_at(&self) -> Option<usize> {
        self.truncated
    }

    /// Finds the end (exclusive) of the label starting at `start`.
    fn label_end(&self, start: usize) -> Option<usize> {
        let rest = &self.input[start..];
        if rest.starts_with("<!--") {
            return find_from(self.input, start + 4, "-->").map(|i| i + 3);
        }
        if rest.starts_with("<![CDATA[") {
            return find_from(self.input, start + 9, "]]>").map(|i| i + 3);
        }

        let mut quote = None;
        for (i, b) in self.input.bytes().enumerate().skip(start + 1) {
            match quote {
                Some(q) if b == q => quote = None,
                Some(_) => {}
                None => match b {
                    b'"' | b'\'' => quote = Some(b),
                    b'>' => return Some(i + 1),
                    _ => {}
                },
            }
        }
        None
    }
}

fn find_from(haystack: &str, from: usize, needle: &str) -> Option<usize> {
    haystack.get(from..)?.find(needle).map(|i| from + i)
}

impl<'a> Iterator for LabelScanner<'a> {
    type Item = Scanned<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.truncated.is_some() {
            return None;
        }
        let start = self.pos + self.input[self.pos..].find('<')?;
        let Some(end) = self.label_end(start) else {
            log::trace!(target: "slimxml::scanner", "unterminated label at byte {start}");
            self.truncated = Some(start);
            self.end = start;
            return None;
        };

        let scanned = Scanned {
            text: &self.input[self.pos..start],
            label: &self.input[start..end],
            offset: start,
        };
        log::trace!(
            target: "slimxml::scanner",
            "label at byte {start}: {} bytes after {} bytes of text",
            end - start,
            scanned.text.len()
        );
        self.pos = end;
        Some(scanned)
    }
}
