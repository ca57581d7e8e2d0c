//! MIME decoding utilities.
//!
//! Supports Base64, Quoted-Printable, RFC 2047 encoded words, and charset
//! transcoding for every label the WHATWG Encoding Standard knows.
//!
//! Decoders work on bytes and never insist on UTF-8 output: text that
//! cannot be represented is left for the caller to sanitize.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use encoding_rs::{Encoding, UTF_8};

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD.decode(data).map_err(Into::into)
}

/// Decodes Base64 data, ignoring embedded whitespace and line breaks.
///
/// # Errors
///
/// Returns an error if the remaining input is not valid Base64.
pub fn decode_base64_lenient(data: &[u8]) -> Result<Vec<u8>> {
    let cleaned: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Decodes Quoted-Printable data (RFC 2045).
///
/// Soft line breaks (`=\r\n` and `=\n`) are removed.
///
/// # Errors
///
/// Returns an error if the input contains an incomplete or non-hex escape.
pub fn decode_quoted_printable(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        if byte != b'=' {
            result.push(byte);
            i += 1;
            continue;
        }

        match data.get(i + 1..i + 3) {
            Some([b'\r', b'\n']) => i += 3,
            Some([b'\n', _]) => i += 2,
            None if data.get(i + 1) == Some(&b'\n') => i += 2,
            Some(&[hi, lo]) => {
                let (Some(hi), Some(lo)) = (hex_value(hi), hex_value(lo)) else {
                    return Err(Error::InvalidEncoding(format!(
                        "Invalid quoted-printable escape at offset {i}"
                    )));
                };
                result.push((hi << 4) | lo);
                i += 3;
            }
            _ => {
                return Err(Error::InvalidEncoding(
                    "Incomplete escape sequence".to_string(),
                ));
            }
        }
    }

    Ok(result)
}

/// Transcodes `bytes` in `charset` to UTF-8.
///
/// UTF-8 input, a missing charset and labels `encoding_rs` does not know are
/// passed through untouched so the scrubber can show the raw bytes.
/// Unmappable sequences in a known charset become U+FFFD.
#[must_use]
pub fn to_utf8(bytes: &[u8], charset: Option<&str>) -> Vec<u8> {
    let Some(encoding) = charset.and_then(|label| Encoding::for_label(label.trim().as_bytes()))
    else {
        return bytes.to_vec();
    };
    if encoding == UTF_8 {
        return bytes.to_vec();
    }

    let (text, _) = encoding.decode_without_bom_handling(bytes);
    text.into_owned().into_bytes()
}

/// Decodes one `charset?encoding?text` body of an encoded word.
fn decode_encoded_word(inner: &[u8]) -> Option<Vec<u8>> {
    let mut fields = inner.splitn(3, |&b| b == b'?');
    let charset = std::str::from_utf8(fields.next()?).ok()?;
    let encoding = fields.next()?;
    let text = fields.next()?;

    // RFC 2231 language suffix: charset*lang
    let charset = charset.split('*').next().unwrap_or(charset);

    let decoded = match encoding {
        [b'B' | b'b'] => decode_base64_lenient(text).ok()?,
        [b'Q' | b'q'] => {
            let spaced: Vec<u8> = text
                .iter()
                .map(|&b| if b == b'_' { b' ' } else { b })
                .collect();
            decode_quoted_printable(&spaced).ok()?
        }
        _ => return None,
    };

    Some(to_utf8(&decoded, Some(charset)))
}

/// Decodes every RFC 2047 encoded word (`=?charset?B|Q?text?=`) in a header
/// value.
///
/// Whitespace between adjacent encoded words is dropped as RFC 2047 §6.2
/// requires. Malformed words are kept verbatim.
#[must_use]
pub fn decode_rfc2047(value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    let mut pending_space: Vec<u8> = Vec::new();
    let mut last_was_word = false;
    let mut i = 0;

    while i < value.len() {
        if value[i..].starts_with(b"=?")
            && let Some(end) = find_word_end(&value[i + 2..])
        {
            let inner = &value[i + 2..i + 2 + end];
            if let Some(decoded) = decode_encoded_word(inner) {
                if !last_was_word {
                    out.extend_from_slice(&pending_space);
                }
                pending_space.clear();
                out.extend_from_slice(&decoded);
                last_was_word = true;
                i += end + 4;
                continue;
            }
        }

        let byte = value[i];
        if byte == b' ' || byte == b'\t' {
            pending_space.push(byte);
        } else {
            out.append(&mut pending_space);
            out.push(byte);
            last_was_word = false;
        }
        i += 1;
    }

    out.extend_from_slice(&pending_space);
    out
}

/// Finds the offset of the closing `?=` of an encoded word, skipping the two
/// `?` separators inside it.
fn find_word_end(rest: &[u8]) -> Option<usize> {
    let first = rest.iter().position(|&b| b == b'?')?;
    let second = first + 1 + rest[first + 1..].iter().position(|&b| b == b'?')?;
    let close = rest[second + 1..].windows(2).position(|w| w == b"?=")?;
    Some(second + 1 + close)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_roundtrip() {
        let encoded = encode_base64(b"Hello, World!");
        assert_eq!(encoded, "SGVsbG8sIFdvcmxkIQ==");
        assert_eq!(decode_base64(&encoded).unwrap(), b"Hello, World!");
    }

    #[test]
    fn test_base64_lenient_skips_line_breaks() {
        let decoded = decode_base64_lenient(b"SGVsbG8s\r\nIFdvcmxkIQ==\r\n").unwrap();
        assert_eq!(decoded, b"Hello, World!");
    }

    #[test]
    fn test_quoted_printable_decode() {
        assert_eq!(
            decode_quoted_printable(b"H=C3=A9llo").unwrap(),
            "Héllo".as_bytes()
        );
        assert_eq!(
            decode_quoted_printable(b"Hello=\r\nWorld").unwrap(),
            b"HelloWorld"
        );
        assert_eq!(decode_quoted_printable(b"soft=\nbreak").unwrap(), b"softbreak");
    }

    #[test]
    fn test_quoted_printable_keeps_invalid_utf8_bytes() {
        assert_eq!(decode_quoted_printable(b"=FF=FE").unwrap(), vec![0xff, 0xfe]);
    }

    #[test]
    fn test_quoted_printable_rejects_bad_escape() {
        assert!(decode_quoted_printable(b"=ZZ").is_err());
        assert!(decode_quoted_printable(b"abc=4").is_err());
    }

    #[test]
    fn test_to_utf8_latin1() {
        assert_eq!(to_utf8(&[0x63, 0x61, 0x66, 0xe9], Some("ISO-8859-1")), "café".as_bytes());
        assert_eq!(to_utf8(&[0xe9], Some("utf-8")), vec![0xe9]);
        assert_eq!(to_utf8(&[0xe9], None), vec![0xe9]);
    }

    #[test]
    fn test_to_utf8_legacy_charsets() {
        assert_eq!(
            to_utf8(b"Caf\xe9 \x80 5", Some("windows-1252")),
            "Café € 5".as_bytes()
        );
        assert_eq!(to_utf8(b"\xa4", Some(" ISO-8859-15 ")), "€".as_bytes());
        assert_eq!(to_utf8(b"\xf0\xd2\xc9\xd7\xc5\xd4", Some("koi8-r")), "Привет".as_bytes());
        assert_eq!(to_utf8(b"\x93\xfa\x96\x7b", Some("Shift_JIS")), "日本".as_bytes());
        assert_eq!(to_utf8(b"\xc4\xe3\xba\xc3", Some("gb2312")), "你好".as_bytes());
        assert_eq!(
            to_utf8(b"\x1b$BF|K\\\x1b(B", Some("iso-2022-jp")),
            "日本".as_bytes()
        );
    }

    #[test]
    fn test_to_utf8_unknown_label_keeps_bytes() {
        assert_eq!(to_utf8(b"caf\xe9", Some("x-no-such-charset")), b"caf\xe9");
    }

    #[test]
    fn test_rfc2047_windows_1252_word() {
        assert_eq!(decode_rfc2047(b"=?windows-1252?Q?Caf=E9?="), "Café".as_bytes());
        assert_eq!(
            decode_rfc2047(b"Re: =?windows-1252?B?gCA1?="),
            "Re: € 5".as_bytes()
        );
    }

    #[test]
    fn test_rfc2047_plain_passthrough() {
        assert_eq!(decode_rfc2047(b"Hello there"), b"Hello there");
    }

    #[test]
    fn test_rfc2047_base64_word() {
        assert_eq!(decode_rfc2047(b"=?utf-8?B?SMOpbGxv?="), "Héllo".as_bytes());
    }

    #[test]
    fn test_rfc2047_q_word_with_underscores() {
        assert_eq!(
            decode_rfc2047(b"=?iso-8859-1?Q?caf=E9_cr=E8me?="),
            "café crème".as_bytes()
        );
    }

    #[test]
    fn test_rfc2047_mixed_text_and_adjacent_words() {
        let decoded = decode_rfc2047(b"Re: =?utf-8?Q?a?= =?utf-8?Q?b?= end");
        assert_eq!(decoded, b"Re: ab end");
    }

    #[test]
    fn test_rfc2047_malformed_word_kept() {
        assert_eq!(decode_rfc2047(b"=?utf-8?X?abc?="), b"=?utf-8?X?abc?=");
        assert_eq!(decode_rfc2047(b"=?broken"), b"=?broken");
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn base64_survives_line_wrapping(data in proptest::collection::vec(any::<u8>(), 0..512)) {
                let encoded = encode_base64(&data);
                let wrapped: Vec<u8> = encoded
                    .as_bytes()
                    .chunks(76)
                    .flat_map(|line| line.iter().copied().chain(*b"\r\n"))
                    .collect();
                prop_assert_eq!(decode_base64_lenient(&wrapped).unwrap(), data);
            }

            #[test]
            fn text_without_escapes_is_untouched(
                data in proptest::collection::vec(any::<u8>().prop_filter("no '='", |b| *b != b'='), 0..256)
            ) {
                prop_assert_eq!(decode_rfc2047(&data), data.clone());
                prop_assert_eq!(decode_quoted_printable(&data).unwrap(), data);
            }
        }
    }
}
