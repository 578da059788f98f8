//! Typed views of node and attribute text.
//!
//! Every name and value in the tree is stored as text. [`Value`] is the sum
//! type used to convert to and from the typed forms, with fixed formatting
//! rules (booleans as `true`/`false`, integers in base 10, floats in the C
//! `%g` general form) and permissive parsing (unparsable numbers read as 0).

use std::fmt;

/// The kind of a [`Value`], used to choose how text is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Text, returned verbatim.
    Text,
    /// `true` only for `"true"` or `"TRUE"`.
    Bool,
    /// Leading decimal digits with an optional sign, like C `atoi`.
    Int,
    /// Leading decimal float, like C `atof`.
    Float,
}

/// A typed value read from or written to node and attribute text.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Plain text.
    Text(String),
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
}

impl Value {
    /// Parses `text` as a value of the given kind. Never fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use slimxml::tree::{Value, ValueKind};
    ///
    /// assert_eq!(Value::parse("42px", ValueKind::Int), Value::Int(42));
    /// assert_eq!(Value::parse("abc", ValueKind::Float), Value::Float(0.0));
    /// assert_eq!(Value::parse("TRUE", ValueKind::Bool), Value::Bool(true));
    /// ```
    #[must_use]
    pub fn parse(text: &str, kind: ValueKind) -> Self {
        match kind {
            ValueKind::Text => Self::Text(text.to_owned()),
            ValueKind::Bool => Self::Bool(parse_bool(text)),
            ValueKind::Int => Self::Int(parse_int(text)),
            ValueKind::Float => Self::Float(parse_float(text)),
        }
    }

    /// Returns the kind of this value.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Text(_) => ValueKind::Text,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
        }
    }

    /// Returns the value as a boolean, parsing text permissively.
    #[must_use]
    pub fn as_bool(&self) -> bool {
        match self {
            Self::Text(s) => parse_bool(s),
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
        }
    }

    /// Returns the value as an integer. Floats are truncated toward zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_int(&self) -> i64 {
        match self {
            Self::Text(s) => parse_int(s),
            Self::Bool(b) => i64::from(*b),
            Self::Int(i) => *i,
            Self::Float(f) => *f as i64,
        }
    }

    /// Returns the value as a float.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(&self) -> f64 {
        match self {
            Self::Text(s) => parse_float(s),
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Int(i) => *i as f64,
            Self::Float(f) => *f,
        }
    }

    /// Converts the value into its text form, reusing the buffer for text.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Text(s) => s,
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Bool(b) => f.write_str(if *b { "true" } else { "false" }),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => f.write_str(&format_float(*v)),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Self::Text(s.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

macro_rules! int_into_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Self::Int(i64::from(v))
                }
            }
        )*
    };
}

int_into_value!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

/// Shared name/value accessors of nodes and attributes.
///
/// Implementors only expose their two text fields; the typed getters and
/// setters are provided.
pub trait NameValue {
    /// Returns the name, `""` when unset.
    fn name(&self) -> &str;
    /// Returns the value text, `""` when unset.
    fn value(&self) -> &str;
    /// Returns the name buffer for in-place edits.
    fn name_mut(&mut self) -> &mut String;
    /// Returns the value buffer for in-place edits.
    fn value_mut(&mut self) -> &mut String;

    /// Replaces the name.
    fn set_name(&mut self, name: impl Into<String>) {
        *self.name_mut() = name.into();
    }

    /// Replaces the value with the text form of `value`.
    ///
    /// # Examples
    ///
    /// ```
    /// use slimxml::tree::{Attribute, NameValue};
    ///
    /// let mut attr = Attribute::new("scale", "");
    /// attr.set_value(1.5_f32);
    /// assert_eq!(attr.value(), "1.5");
    /// attr.set_value(true);
    /// assert_eq!(attr.value(), "true");
    /// ```
    fn set_value(&mut self, value: impl Into<Value>) {
        *self.value_mut() = value.into().into_text();
    }

    /// Parses the value as the given kind.
    fn value_as(&self, kind: ValueKind) -> Value {
        Value::parse(self.value(), kind)
    }

    /// Parses the value as a boolean.
    fn bool_value(&self) -> bool {
        parse_bool(self.value())
    }

    /// Parses the value as an integer.
    fn int_value(&self) -> i64 {
        parse_int(self.value())
    }

    /// Parses the value as a float.
    fn float_value(&self) -> f64 {
        parse_float(self.value())
    }

    /// Parses the value as hexadecimal; see [`parse_hex`].
    fn hex_value(&self) -> u64 {
        parse_hex(self.value())
    }

    /// Replaces the value with `value` in uppercase hexadecimal.
    fn set_hex(&mut self, value: u64) {
        *self.value_mut() = format!("{value:X}");
    }
}

/// Returns `true` for `"true"` and `"TRUE"` only.
#[must_use]
pub fn parse_bool(text: &str) -> bool {
    text == "true" || text == "TRUE"
}

/// Parses leading decimal digits like C `atoi`.
///
/// Leading whitespace and one sign are accepted; parsing stops at the first
/// non-digit. Text without digits yields 0. Overflow saturates.
#[must_use]
pub fn parse_int(text: &str) -> i64 {
    let s = text.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        let digit = i64::from(b - b'0');
        value = value.saturating_mul(10);
        value = if negative {
            value.saturating_sub(digit)
        } else {
            value.saturating_add(digit)
        };
    }
    value
}

/// Parses a leading decimal float like C `atof`.
///
/// Accepts `[+-]digits[.digits][(e|E)[+-]digits]` after leading whitespace
/// and ignores whatever follows. Text without a number yields 0.0.
#[must_use]
pub fn parse_float(text: &str) -> f64 {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let count_digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_digits = count_digits(end);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(end + 1);
        end += 1 + frac_digits;
    }
    if int_digits + frac_digits == 0 {
        return 0.0;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = count_digits(exp);
        if exp_digits > 0 {
            end = exp + exp_digits;
        }
    }
    s[..end].parse().unwrap_or(0.0)
}

/// Scans hexadecimal digits of one letter case after an optional `0x`.
fn scan_hex(text: &str, uppercase: bool) -> u64 {
    let s = text.trim_start();
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    let mut value: u64 = 0;
    for c in s.chars() {
        let digit = match c {
            '0'..='9' => u64::from(c) - u64::from('0'),
            'A'..='F' if uppercase => u64::from(c) - u64::from('A') + 10,
            'a'..='f' if !uppercase => u64::from(c) - u64::from('a') + 10,
            _ => break,
        };
        value = value.wrapping_mul(16).wrapping_add(digit);
    }
    value
}

/// Parses hexadecimal text in two attempts.
///
/// The first attempt accepts only uppercase digits `A-F`; if it yields 0 the
/// text is scanned again accepting only lowercase digits `a-f`.
///
/// # Examples
///
/// ```
/// use slimxml::tree::parse_hex;
///
/// assert_eq!(parse_hex("FF"), 255);
/// assert_eq!(parse_hex("ff"), 255);
/// // The uppercase scan stops at the lowercase digit and is kept.
/// assert_eq!(parse_hex("Ff"), 15);
/// ```
#[must_use]
pub fn parse_hex(text: &str) -> u64 {
    match scan_hex(text, true) {
        0 => scan_hex(text, false),
        value => value,
    }
}

/// Formats a float like C's `%g`: six significant digits, trailing zeros
/// removed, exponent form only for very large or very small magnitudes.
///
/// # Examples
///
/// ```
/// use slimxml::tree::format_float;
///
/// assert_eq!(format_float(1.5), "1.5");
/// assert_eq!(format_float(100000.0), "100000");
/// assert_eq!(format_float(1e6), "1e+06");
/// assert_eq!(format_float(0.00001), "1e-05");
/// ```
#[must_use]
pub fn format_float(value: f64) -> String {
    const PRECISION: i32 = 6;

    if value.is_nan() {
        return "nan".to_owned();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_owned();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_owned();
    }

    let sci = format!("{:.*e}", (PRECISION - 1).unsigned_abs() as usize, value);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);

    if exp < -4 || exp >= PRECISION {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_fraction(mantissa), exp.unsigned_abs())
    } else {
        let decimals = (PRECISION - 1 - exp).unsigned_abs() as usize;
        trim_fraction(&format!("{value:.decimals$}")).to_owned()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
