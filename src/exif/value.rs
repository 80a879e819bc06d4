//! EXIF tag value decoding
//!
//! Turns raw parser values into display values. Decoding is lossy on purpose:
//! a corrupt tag degrades to replacement characters or an empty string, it
//! never fails the read.

use crate::exif::ifd::{tags, ExifValue};
use encoding_rs::{SHIFT_JIS, UTF_16LE};
use std::fmt;

/// Length of the charset marker in front of a UserComment
const CHARSET_PREFIX_LEN: usize = 8;

/// UserComment charset marker for ASCII bodies
pub const ASCII_PREFIX: &[u8; 8] = b"ASCII\0\0\0";

/// UserComment charset marker for UTF-16 bodies
pub const UNICODE_PREFIX: &[u8; 8] = b"UNICODE\0";

/// UserComment charset marker for Shift-JIS bodies
pub const JIS_PREFIX: &[u8; 8] = b"JIS\0\0\0\0\0";

/// A tag value ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum DecodedValue {
    /// Decoded text
    Text(String),
    /// Integer values, unchanged
    Integer(Vec<i64>),
    /// Rational values, unchanged
    Rational(Vec<(i64, i64)>),
}

impl DecodedValue {
    /// Get the value as text, if it is text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DecodedValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::Text(s) => f.write_str(s),
            DecodedValue::Integer(values) => match values.as_slice() {
                [single] => write!(f, "{}", single),
                _ => write!(f, "{:?}", values),
            },
            DecodedValue::Rational(values) => {
                let parts: Vec<String> = values.iter().map(|(n, d)| format!("{n}/{d}")).collect();
                f.write_str(&parts.join(", "))
            }
        }
    }
}

/// Decode one tag value for display
pub fn decode_value(tag: u16, value: &ExifValue) -> DecodedValue {
    match value {
        ExifValue::Bytes(bytes) => DecodedValue::Text(decode_bytes(tag, bytes)),
        ExifValue::Ascii(s) => DecodedValue::Text(s.clone()),
        ExifValue::Integer(values) => DecodedValue::Integer(values.clone()),
        ExifValue::Rational(values) => DecodedValue::Rational(values.clone()),
    }
}

/// Decode a byte blob according to its tag
pub fn decode_bytes(tag: u16, bytes: &[u8]) -> String {
    match tag {
        tags::USER_COMMENT => decode_user_comment(bytes),
        tags::XP_TITLE..=tags::XP_SUBJECT => {
            let (text, _) = UTF_16LE.decode_without_bom_handling(bytes);
            strip_nul(&text)
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Decode a charset-prefixed UserComment
///
/// The first 8 bytes select the body encoding: `ASCII`, `UNICODE` (UTF-16,
/// BOM-sniffed, little-endian otherwise) or `JIS` (Shift-JIS). Anything else,
/// including blobs shorter than the prefix, is read as UTF-8.
pub fn decode_user_comment(bytes: &[u8]) -> String {
    if bytes.len() >= CHARSET_PREFIX_LEN {
        let (prefix, body) = bytes.split_at(CHARSET_PREFIX_LEN);
        if prefix.starts_with(b"ASCII") {
            return strip_nul(&decode_ascii_lossy(body));
        }
        if prefix.starts_with(b"UNICODE") {
            let (text, _, _) = UTF_16LE.decode(body);
            return strip_nul(&text);
        }
        if prefix.starts_with(b"JIS") {
            let (text, _) = SHIFT_JIS.decode_without_bom_handling(body);
            return strip_nul(&text);
        }
    }
    strip_nul(&String::from_utf8_lossy(bytes))
}

/// ASCII decode replacing every non-ASCII byte with U+FFFD
fn decode_ascii_lossy(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { char::REPLACEMENT_CHARACTER })
        .collect()
}

fn strip_nul(text: &str) -> String {
    text.trim_end_matches('\0').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le(s: &str) -> Vec<u8> {
        s.encode_utf16().flat_map(|c| c.to_le_bytes()).collect()
    }

    #[test]
    fn test_user_comment_ascii() {
        assert_eq!(decode_user_comment(b"ASCII\x00\x00\x00Hello"), "Hello");
        assert_eq!(decode_user_comment(b"ASCII\x00\x00\x00Hi\x00\x00"), "Hi");
    }

    #[test]
    fn test_user_comment_ascii_replaces_high_bytes() {
        assert_eq!(decode_user_comment(b"ASCII\x00\x00\x00a\xFFb"), "a\u{FFFD}b");
    }

    #[test]
    fn test_user_comment_unicode() {
        let mut blob = b"UNICODE\x00".to_vec();
        blob.extend(utf16le("Hi"));
        blob.extend([0, 0]);
        assert_eq!(decode_user_comment(&blob), "Hi");
    }

    #[test]
    fn test_user_comment_unicode_with_bom() {
        let mut blob = b"UNICODE\x00".to_vec();
        blob.extend([0xFE, 0xFF, 0x00, b'O', 0x00, b'K']);
        assert_eq!(decode_user_comment(&blob), "OK");
    }

    #[test]
    fn test_user_comment_jis() {
        let mut blob = JIS_PREFIX.to_vec();
        // "日本" in Shift-JIS
        blob.extend([0x93, 0xFA, 0x96, 0x7B]);
        assert_eq!(decode_user_comment(&blob), "日本");
    }

    #[test]
    fn test_user_comment_fallbacks() {
        assert_eq!(decode_user_comment(b"short\0"), "short");
        assert_eq!(decode_user_comment(b"UNDEFINED-ish text"), "UNDEFINED-ish text");
        assert_eq!(decode_user_comment(b""), "");
        assert_eq!(decode_user_comment(&[0xC3, 0x28]), "\u{FFFD}(");
    }

    #[test]
    fn test_xp_tags_are_utf16le() {
        let mut blob = utf16le("Sunset über");
        blob.extend([0, 0]);
        for tag in tags::XP_TITLE..=tags::XP_SUBJECT {
            assert_eq!(decode_bytes(tag, &blob), "Sunset über");
        }
    }

    #[test]
    fn test_other_bytes_are_utf8_lossy() {
        assert_eq!(decode_bytes(tags::MAKE, b"Canon"), "Canon");
        assert_eq!(decode_bytes(41728, &[0x03]), "\u{3}");
    }

    #[test]
    fn test_non_byte_values_pass_through() {
        assert_eq!(
            decode_value(tags::ORIENTATION, &ExifValue::Integer(vec![1])),
            DecodedValue::Integer(vec![1])
        );
        assert_eq!(
            decode_value(tags::ARTIST, &ExifValue::Ascii("Ann".into())),
            DecodedValue::Text("Ann".into())
        );
        let rational = ExifValue::Rational(vec![(72, 1)]);
        assert_eq!(decode_value(tags::X_RESOLUTION, &rational).to_string(), "72/1");
    }
}
