//! Encoding detection and transcoding.
//!
//! Documents are always held in memory as UTF-8 `String`s. Conversion happens
//! only at the I/O boundary: [`decode`] turns a raw buffer into text and
//! [`encode`] turns serialized text into the bytes of a target [`Encode`].
//!
//! # Detection strategy
//!
//! 1. A byte order mark at the very start is authoritative.
//! 2. Without a mark, any well-formed multi-byte UTF-8 sequence in the sample
//!    selects UTF-8.
//! 3. Everything else is treated as ANSI (the Windows-1252 code page).

pub mod utf;

use std::fmt;

use encoding_rs::WINDOWS_1252;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16BE_BOM: &[u8] = &[0xFE, 0xFF];

/// A text encoding for loading and saving documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encode {
    /// Single-byte Windows-1252 text.
    Ansi,
    /// UTF-8 preceded by the `EF BB BF` byte order mark.
    #[default]
    Utf8,
    /// UTF-8 without a byte order mark.
    Utf8NoMark,
    /// UTF-16 little-endian, preceded by `FF FE`.
    Utf16,
    /// UTF-16 big-endian, preceded by `FE FF`.
    Utf16BigEndian,
}

impl Encode {
    /// Returns the byte order mark written before text in this encoding.
    #[must_use]
    pub fn bom(self) -> &'static [u8] {
        match self {
            Self::Utf8 => UTF8_BOM,
            Self::Utf16 => UTF16LE_BOM,
            Self::Utf16BigEndian => UTF16BE_BOM,
            Self::Ansi | Self::Utf8NoMark => &[],
        }
    }

    /// Returns `true` for the UTF-16 variants.
    #[must_use]
    pub fn is_utf16(self) -> bool {
        matches!(self, Self::Utf16 | Self::Utf16BigEndian)
    }
}

impl fmt::Display for Encode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ansi => "ANSI",
            Self::Utf8 => "UTF-8",
            Self::Utf8NoMark => "UTF-8 (no mark)",
            Self::Utf16 => "UTF-16LE",
            Self::Utf16BigEndian => "UTF-16BE",
        };
        f.write_str(name)
    }
}

/// The outcome of [`detect_encode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detected {
    /// The detected encoding.
    pub encode: Encode,
    /// Whether any non-ASCII data was seen in the sample.
    pub multi_bytes: bool,
    /// Length in bytes of the byte order mark, 0 if there is none.
    pub bom_len: usize,
}

/// Detects the encoding of a raw byte sample.
///
/// # Examples
///
/// ```
/// use slimxml::encoding::{detect_encode, Encode};
///
/// let detected = detect_encode("<a>é</a>".as_bytes());
/// assert_eq!(detected.encode, Encode::Utf8NoMark);
/// assert!(detected.multi_bytes);
///
/// let detected = detect_encode(b"<a>plain</a>");
/// assert_eq!(detected.encode, Encode::Ansi);
/// assert!(!detected.multi_bytes);
/// ```
#[must_use]
pub fn detect_encode(bytes: &[u8]) -> Detected {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        return Detected {
            encode: Encode::Utf8,
            multi_bytes: !rest.is_ascii(),
            bom_len: UTF8_BOM.len(),
        };
    }
    for (bom, encode, big_endian) in [
        (UTF16LE_BOM, Encode::Utf16, false),
        (UTF16BE_BOM, Encode::Utf16BigEndian, true),
    ] {
        if let Some(rest) = bytes.strip_prefix(bom) {
            return Detected {
                encode,
                multi_bytes: has_non_ascii_unit(rest, big_endian),
                bom_len: bom.len(),
            };
        }
    }

    let multi_bytes = has_utf8_sequence(bytes);
    Detected {
        encode: if multi_bytes {
            Encode::Utf8NoMark
        } else {
            Encode::Ansi
        },
        multi_bytes,
        bom_len: 0,
    }
}

/// Returns `true` if `bytes` contains at least one well-formed multi-byte
/// UTF-8 sequence.
fn has_utf8_sequence(bytes: &[u8]) -> bool {
    let mut i = 0;
    while i < bytes.len() {
        let lead = bytes[i];
        let len = match lead {
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => {
                i += 1;
                continue;
            }
        };
        let well_formed = bytes
            .get(i + 1..i + len)
            .is_some_and(|tail| tail.iter().all(|&b| b & 0xC0 == 0x80));
        if well_formed {
            return true;
        }
        i += 1;
    }
    false
}

fn has_non_ascii_unit(bytes: &[u8], big_endian: bool) -> bool {
    bytes.chunks_exact(2).any(|pair| {
        let unit = if big_endian {
            u16::from_be_bytes([pair[0], pair[1]])
        } else {
            u16::from_le_bytes([pair[0], pair[1]])
        };
        unit >= 0x80
    })
}

/// Decodes a raw buffer into text, detecting the encoding.
///
/// Returns the text (without any byte order mark) and what was detected.
#[must_use]
pub fn decode(bytes: &[u8]) -> (String, Detected) {
    let detected = detect_encode(bytes);
    log::debug!(
        "detected {} (multi-byte: {}) in {} bytes",
        detected.encode,
        detected.multi_bytes,
        bytes.len()
    );
    let text = decode_as(&bytes[detected.bom_len..], detected.encode);
    (text, detected)
}

/// Decodes a raw buffer as the given encoding.
///
/// A byte order mark matching `encode` is skipped if present. Malformed data
/// never fails; it is replaced per the policy in [`utf`].
#[must_use]
pub fn decode_as(bytes: &[u8], encode: Encode) -> String {
    let bytes = match encode {
        Encode::Utf8 | Encode::Utf8NoMark => bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes),
        Encode::Utf16 => bytes.strip_prefix(UTF16LE_BOM).unwrap_or(bytes),
        Encode::Utf16BigEndian => bytes.strip_prefix(UTF16BE_BOM).unwrap_or(bytes),
        Encode::Ansi => bytes,
    };
    match encode {
        Encode::Ansi => {
            let (text, _had_errors) = WINDOWS_1252.decode_without_bom_handling(bytes);
            text.into_owned()
        }
        Encode::Utf8 | Encode::Utf8NoMark => utf::decode_utf8_lossy(bytes),
        Encode::Utf16 => utf::decode_utf16(bytes, false),
        Encode::Utf16BigEndian => utf::decode_utf16(bytes, true),
    }
}

/// Encodes text into the bytes of `target`, including its byte order mark.
///
/// Characters that Windows-1252 cannot represent are written as decimal
/// character references (`&#NNNN;`) in ANSI output.
///
/// # Examples
///
/// ```
/// use slimxml::encoding::{encode, Encode};
///
/// assert_eq!(encode("<a/>", Encode::Utf8), b"\xEF\xBB\xBF<a/>");
/// assert_eq!(encode("<a/>", Encode::Utf16BigEndian)[..4], [0xFE, 0xFF, 0x00, b'<']);
/// assert_eq!(encode("\u{4E2D}", Encode::Ansi), b"&#20013;");
/// ```
#[must_use]
pub fn encode(text: &str, target: Encode) -> Vec<u8> {
    let mut out = target.bom().to_vec();
    match target {
        Encode::Ansi => {
            let (bytes, _, _had_unmappable) = WINDOWS_1252.encode(text);
            out.extend_from_slice(&bytes);
        }
        Encode::Utf8 | Encode::Utf8NoMark => out.extend_from_slice(text.as_bytes()),
        Encode::Utf16 => out.extend(utf::encode_utf16(text, false)),
        Encode::Utf16BigEndian => out.extend(utf::encode_utf16(text, true)),
    }
    out
}
