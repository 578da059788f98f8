//! Error types and diagnostics.
//!
//! Parsing is tolerant: almost every problem in the input is recovered from
//! locally and recorded as a [`ParseDiagnostic`] on the resulting document.
//! Only input that cannot be parsed at all (an empty buffer, or a buffer with
//! no markup in it) produces a [`ParseError`].
//!
//! The file and stream entry points wrap both I/O failures and parse failures
//! in [`Error`].

use std::fmt;
use std::io;

/// Severity level for a parse diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorSeverity {
    /// Something was ignored (e.g. a `<!DOCTYPE>` label).
    Warning,
    /// The input was malformed and the parser recovered from it.
    Error,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source location within the decoded document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based byte offset into the decoded (UTF-8) text.
    pub byte_offset: usize,
}

impl SourceLocation {
    /// Computes the line and column of `byte_offset` within `text`.
    ///
    /// Offsets past the end of `text` are clamped to its length.
    #[must_use]
    pub fn from_offset(text: &str, byte_offset: usize) -> Self {
        let mut offset = byte_offset.min(text.len());
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &text[..offset];
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let line = before.matches('\n').count() + 1;
        let column = before[line_start..].chars().count() + 1;
        Self {
            line: u32::try_from(line).unwrap_or(u32::MAX),
            column: u32::try_from(column).unwrap_or(u32::MAX),
            byte_offset: offset,
        }
    }

    /// Computes the location of a later `byte_offset`, scanning only the
    /// text between `self` and the new offset.
    ///
    /// `self` must have been computed over the same `text`. An earlier
    /// offset, or a default location, falls back to [`from_offset`].
    ///
    /// [`from_offset`]: Self::from_offset
    #[must_use]
    pub fn advance(self, text: &str, byte_offset: usize) -> Self {
        let mut offset = byte_offset.min(text.len());
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }
        if self.line == 0 || offset < self.byte_offset || !text.is_char_boundary(self.byte_offset)
        {
            return Self::from_offset(text, offset);
        }
        let span = &text[self.byte_offset..offset];
        let (line, column) = match span.rfind('\n') {
            Some(last) => {
                let lines = u32::try_from(span.matches('\n').count()).unwrap_or(u32::MAX);
                let column = u32::try_from(span[last + 1..].chars().count()).unwrap_or(u32::MAX);
                (self.line.saturating_add(lines), column.saturating_add(1))
            }
            None => {
                let column = u32::try_from(span.chars().count()).unwrap_or(u32::MAX);
                (self.line, self.column.saturating_add(column))
            }
        };
        Self {
            line,
            column,
            byte_offset: offset,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A problem the parser recovered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiagnostic {
    /// The severity of this diagnostic.
    pub severity: ErrorSeverity,
    /// Human-readable message.
    pub message: String,
    /// Where in the decoded text the problem was found.
    pub location: SourceLocation,
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} at {}", self.severity, self.message, self.location)
    }
}

/// The error returned when a buffer could not be parsed at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The primary error message.
    pub message: String,
    /// Where parsing gave up.
    pub location: SourceLocation,
    /// Diagnostics collected before giving up.
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: SourceLocation::default(),
            diagnostics: Vec::new(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at {}: {}", self.location, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Errors from the loading and saving entry points.
#[derive(Debug)]
pub enum Error {
    /// Reading or writing the underlying file or stream failed.
    Io(io::Error),
    /// The buffer was read but could not be parsed.
    Parse(ParseError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "i/o error: {e}"),
            Self::Parse(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}
