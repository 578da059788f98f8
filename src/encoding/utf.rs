//! UTF-8 ⇄ UTF-16 transcoding.
//!
//! Both primitives follow the two-pass sizing idiom: they never write past the
//! end of the destination slice and always return the number of units the
//! complete conversion needs, so a first call with an empty destination sizes
//! the output and a second call fills it.
//!
//! # Replacement policy
//!
//! - UTF-8 input: every malformed sequence (invalid lead byte, missing or
//!   out-of-range continuation byte, overlong form, encoded surrogate, code
//!   point above U+10FFFF) yields one U+FFFD, and decoding resumes at the byte
//!   right after the offending lead byte.
//! - UTF-16 input: every unpaired surrogate yields one U+FFFD.
//!
//! The policy depends only on the input, so both passes agree on the count.

use std::char::REPLACEMENT_CHARACTER;

/// Bounded writer that keeps counting once the destination is full.
struct Sink<'a, T> {
    dst: &'a mut [T],
    written: usize,
    required: usize,
    full: bool,
}

impl<'a, T: Copy> Sink<'a, T> {
    fn new(dst: &'a mut [T]) -> Self {
        Self {
            dst,
            written: 0,
            required: 0,
            full: false,
        }
    }

    /// Writes one code point's units, all or nothing.
    fn push(&mut self, units: &[T]) {
        self.required += units.len();
        if self.full {
            return;
        }
        let end = self.written + units.len();
        if end > self.dst.len() {
            self.full = true;
            return;
        }
        self.dst[self.written..end].copy_from_slice(units);
        self.written = end;
    }
}

/// Returns the total sequence length and the allowed range of the second byte
/// for a UTF-8 lead byte, or `None` if `lead` cannot start a sequence.
fn sequence_shape(lead: u8) -> Option<(usize, u8, u8)> {
    match lead {
        0xC2..=0xDF => Some((2, 0x80, 0xBF)),
        0xE0 => Some((3, 0xA0, 0xBF)),
        0xE1..=0xEC | 0xEE..=0xEF => Some((3, 0x80, 0xBF)),
        0xED => Some((3, 0x80, 0x9F)),
        0xF0 => Some((4, 0x90, 0xBF)),
        0xF1..=0xF3 => Some((4, 0x80, 0xBF)),
        0xF4 => Some((4, 0x80, 0x8F)),
        _ => None,
    }
}

/// Decodes the code point starting at `src[pos]`.
///
/// Returns the character and the number of bytes consumed.
fn decode_at(src: &[u8], pos: usize) -> (char, usize) {
    let lead = src[pos];
    if lead < 0x80 {
        return (char::from(lead), 1);
    }
    let Some((len, lo, hi)) = sequence_shape(lead) else {
        return (REPLACEMENT_CHARACTER, 1);
    };
    let Some(tail) = src.get(pos + 1..pos + len) else {
        return (REPLACEMENT_CHARACTER, 1);
    };
    if !(lo..=hi).contains(&tail[0]) || !tail[1..].iter().all(|&b| b & 0xC0 == 0x80) {
        return (REPLACEMENT_CHARACTER, 1);
    }

    let mut cp = u32::from(lead) & (0x7F >> len);
    for &b in tail {
        cp = (cp << 6) | u32::from(b & 0x3F);
    }
    // The shape table already excludes overlongs, surrogates and > U+10FFFF.
    (char::from_u32(cp).unwrap_or(REPLACEMENT_CHARACTER), len)
}

/// Converts UTF-8 bytes to UTF-16 code units.
///
/// Writes at most `dst.len()` units and returns the number of units the whole
/// conversion requires. Pass an empty slice to size the output.
///
/// # Examples
///
/// ```
/// use slimxml::encoding::utf::utf8_to_utf16;
///
/// let src = "a\u{1F600}".as_bytes();
/// let needed = utf8_to_utf16(src, &mut []);
/// assert_eq!(needed, 3);
///
/// let mut dst = vec![0u16; needed];
/// assert_eq!(utf8_to_utf16(src, &mut dst), 3);
/// assert_eq!(dst, [0x61, 0xD83D, 0xDE00]);
/// ```
pub fn utf8_to_utf16(src: &[u8], dst: &mut [u16]) -> usize {
    let mut sink = Sink::new(dst);
    let mut pos = 0;
    while pos < src.len() {
        let (ch, used) = decode_at(src, pos);
        pos += used;
        let mut buf = [0u16; 2];
        sink.push(ch.encode_utf16(&mut buf));
    }
    sink.required
}

/// Converts UTF-16 code units to UTF-8 bytes.
///
/// Writes at most `dst.len()` bytes and returns the number of bytes the whole
/// conversion requires. Pass an empty slice to size the output.
///
/// # Examples
///
/// ```
/// use slimxml::encoding::utf::utf16_to_utf8;
///
/// let src = [0x48, 0xE9];
/// let needed = utf16_to_utf8(&src, &mut []);
/// let mut dst = vec![0u8; needed];
/// utf16_to_utf8(&src, &mut dst);
/// assert_eq!(dst, "Hé".as_bytes());
/// ```
pub fn utf16_to_utf8(src: &[u16], dst: &mut [u8]) -> usize {
    let mut sink = Sink::new(dst);
    for ch in char::decode_utf16(src.iter().copied()) {
        let ch = ch.unwrap_or(REPLACEMENT_CHARACTER);
        let mut buf = [0u8; 4];
        sink.push(ch.encode_utf8(&mut buf).as_bytes());
    }
    sink.required
}

/// Converts UTF-8 bytes to a freshly allocated vector of UTF-16 code units.
#[must_use]
pub fn to_utf16(src: &[u8]) -> Vec<u16> {
    let required = utf8_to_utf16(src, &mut []);
    let mut units = vec![0u16; required];
    let written = utf8_to_utf16(src, &mut units);
    debug_assert_eq!(written, required);
    units
}

/// Converts UTF-16 code units to a freshly allocated UTF-8 string.
#[must_use]
pub fn to_utf8(src: &[u16]) -> String {
    let required = utf16_to_utf8(src, &mut []);
    let mut bytes = vec![0u8; required];
    utf16_to_utf8(src, &mut bytes);
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

/// Decodes possibly malformed UTF-8 using the replacement policy above.
#[must_use]
pub fn decode_utf8_lossy(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_owned(),
        Err(_) => to_utf8(&to_utf16(bytes)),
    }
}

/// Decodes UTF-16 bytes (without a byte order mark) into a string.
///
/// A trailing odd byte cannot form a code unit and becomes U+FFFD.
#[must_use]
pub fn decode_utf16(bytes: &[u8], big_endian: bool) -> String {
    let chunks = bytes.chunks_exact(2);
    let odd = !chunks.remainder().is_empty();
    let mut units: Vec<u16> = chunks
        .map(|pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        })
        .collect();
    if odd {
        units.push(0xFFFD);
    }
    to_utf8(&units)
}

/// Encodes a string as UTF-16 bytes in the given byte order, without a mark.
#[must_use]
pub fn encode_utf16(text: &str, big_endian: bool) -> Vec<u8> {
    let units = to_utf16(text.as_bytes());
    let mut out = Vec::with_capacity(units.len() * 2);
    for unit in units {
        if big_endian {
            out.extend_from_slice(&unit.to_be_bytes());
        } else {
            out.extend_from_slice(&unit.to_le_bytes());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_to_utf16() {
        assert_eq!(to_utf16(b"abc"), vec![0x61, 0x62, 0x63]);
    }

    #[test]
    fn test_multibyte_to_utf16() {
        let units = to_utf16("é中".as_bytes());
        assert_eq!(units, vec![0x00E9, 0x4E2D]);
    }

    #[test]
    fn test_supplementary_plane_becomes_surrogate_pair() {
        let units = to_utf16("\u{10437}".as_bytes());
        assert_eq!(units, vec![0xD801, 0xDC37]);
    }

    #[test]
    fn test_sizing_pass_matches_fill_pass() {
        let inputs: [&[u8]; 4] = [
            b"plain",
            "ünïcödé \u{1F600}".as_bytes(),
            &[0xE2, 0x82, b'x', 0xFF, 0xC0, 0xAF],
            &[],
        ];
        for src in inputs {
            let needed = utf8_to_utf16(src, &mut []);
            let mut dst = vec![0u16; needed];
            assert_eq!(utf8_to_utf16(src, &mut dst), needed);

            let back_needed = utf16_to_utf8(&dst, &mut []);
            let mut back = vec![0u8; back_needed];
            assert_eq!(utf16_to_utf8(&dst, &mut back), back_needed);
        }
    }

    #[test]
    fn test_never_writes_past_capacity() {
        let src = "abcdef".as_bytes();
        let mut dst = [0xAAAAu16; 4];
        let needed = utf8_to_utf16(src, &mut dst[..3]);
        assert_eq!(needed, 6);
        assert_eq!(dst, [0x61, 0x62, 0x63, 0xAAAA]);
    }

    #[test]
    fn test_surrogate_pair_is_all_or_nothing() {
        // 'a' fits, the pair for U+1F600 does not fit in the remaining slot.
        let src = "a\u{1F600}b".as_bytes();
        let mut dst = [0u16; 2];
        assert_eq!(utf8_to_utf16(src, &mut dst), 4);
        assert_eq!(dst, [0x61, 0]);
    }

    #[test]
    fn test_utf8_output_never_splits_a_char() {
        let src = [0x61, 0x4E2D];
        let mut dst = [0u8; 3];
        assert_eq!(utf16_to_utf8(&src, &mut dst), 4);
        assert_eq!(dst, [0x61, 0, 0]);
    }

    #[test]
    fn test_invalid_lead_byte_is_replaced() {
        assert_eq!(to_utf16(&[b'a', 0xFF, b'b']), vec![0x61, 0xFFFD, 0x62]);
    }

    #[test]
    fn test_truncated_sequence_resumes_after_lead() {
        // E2 82 is the start of a three-byte sequence missing its last byte.
        assert_eq!(to_utf16(&[0xE2, 0x82, b'x']), vec![0xFFFD, 0xFFFD, 0x78]);
    }

    #[test]
    fn test_overlong_encoding_is_replaced() {
        // C0 AF is an overlong '/'.
        assert_eq!(to_utf16(&[0xC0, 0xAF]), vec![0xFFFD, 0xFFFD]);
    }

    #[test]
    fn test_encoded_surrogate_is_replaced() {
        assert_eq!(to_utf16(&[0xED, 0xA0, 0x80]), vec![0xFFFD, 0xFFFD, 0xFFFD]);
    }

    #[test]
    fn test_unpaired_surrogate_is_replaced() {
        assert_eq!(to_utf8(&[0x61, 0xD800, 0x62]), "a\u{FFFD}b");
        assert_eq!(utf16_to_utf8(&[0xDC00], &mut []), 3);
    }

    #[test]
    fn test_decode_utf8_lossy_valid_passthrough() {
        assert_eq!(decode_utf8_lossy("<a>é</a>".as_bytes()), "<a>é</a>");
    }

    #[test]
    fn test_decode_utf8_lossy_replaces() {
        assert_eq!(decode_utf8_lossy(&[b'<', 0xFF, b'>']), "<\u{FFFD}>");
    }

    #[test]
    fn test_decode_utf16_both_orders() {
        assert_eq!(decode_utf16(&[b'<', 0, b'a', 0], false), "<a");
        assert_eq!(decode_utf16(&[0, b'<', 0, b'a'], true), "<a");
    }

    #[test]
    fn test_decode_utf16_odd_trailing_byte() {
        assert_eq!(decode_utf16(&[b'a', 0, b'b'], false), "a\u{FFFD}");
    }

    #[test]
    fn test_encode_utf16_both_orders() {
        assert_eq!(encode_utf16("é", false), vec![0xE9, 0x00]);
        assert_eq!(encode_utf16("é", true), vec![0x00, 0xE9]);
    }
}
