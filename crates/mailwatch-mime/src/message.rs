//! MIME message structure and handling.

use chrono::{DateTime, FixedOffset};

use crate::address::{Address, parse_address_list};
use crate::content_type::{ContentType, split_parameters};
use crate::encoding::{decode_base64_lenient, decode_quoted_printable, decode_rfc2047, to_utf8};
use crate::error::{Error, Result};
use crate::header::Headers;
use std::fmt;

/// Nesting limit for multipart bodies; deeper structures are kept opaque.
const MAX_MULTIPART_DEPTH: usize = 16;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// A leaf MIME part (never multipart).
#[derive(Debug, Clone)]
pub struct Part {
    /// Part headers. For single-part messages these are the message headers.
    pub headers: Headers,
    /// Part body (still transfer-encoded).
    pub body: Vec<u8>,
}

impl Part {
    /// Creates a new part.
    #[must_use]
    pub const fn new(headers: Headers, body: Vec<u8>) -> Self {
        Self { headers, body }
    }

    /// Gets the content type, falling back to `text/plain` when the header is
    /// absent or unparsable.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        content_type_of(&self.headers)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get_str("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        match self.transfer_encoding() {
            TransferEncoding::Base64 => decode_base64_lenient(&self.body),
            TransferEncoding::QuotedPrintable => decode_quoted_printable(&self.body),
            _ => Ok(self.body.clone()),
        }
    }

    /// Gets the body as text bytes: transfer-decoded and, where possible,
    /// transcoded to UTF-8.
    ///
    /// A body whose transfer encoding is broken is returned as transmitted.
    #[must_use]
    pub fn text(&self) -> Vec<u8> {
        let decoded = self.decode_body().unwrap_or_else(|_| self.body.clone());
        to_utf8(&decoded, self.content_type().charset())
    }

    /// Returns the file name from `Content-Disposition` or the content type's
    /// `name` parameter.
    #[must_use]
    pub fn filename(&self) -> Option<String> {
        self.disposition_parameter("filename")
            .or_else(|| self.content_type().name().map(ToString::to_string))
    }

    /// Returns true if this part is an attachment: explicitly disposed as one,
    /// or carrying a file name.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        let explicit = self
            .headers
            .get_str("content-disposition")
            .is_some_and(|d| d.trim_start().to_ascii_lowercase().starts_with("attachment"));
        explicit || self.filename().is_some()
    }

    fn disposition_parameter(&self, key: &str) -> Option<String> {
        let disposition = self.headers.get_str("content-disposition")?;
        split_parameters(disposition).into_iter().skip(1).find_map(|param| {
            let (k, v) = param.split_once('=')?;
            k.trim()
                .eq_ignore_ascii_case(key)
                .then(|| v.trim().trim_matches('"').to_string())
        })
    }
}

/// A parsed message: top-level headers plus flattened leaf parts.
#[derive(Debug, Clone)]
pub struct Message {
    /// Message headers.
    pub headers: Headers,
    /// Leaf parts in document order; a single-part message has exactly one.
    pub parts: Vec<Part>,
}

impl Message {
    /// Parses a raw RFC 5322 message.
    ///
    /// Multipart bodies are flattened depth-first into leaf parts. Structural
    /// damage (missing boundary, no delimiter lines, excessive nesting) does
    /// not fail the parse: the affected entity is kept as one opaque part.
    /// Input without a header section yields a message with no header fields
    /// and a single `text/plain` part.
    #[must_use]
    pub fn parse(raw: &[u8]) -> Self {
        let (header_block, body) = split_header_body(raw);
        let headers = Headers::parse(header_block);

        let mut parts = Vec::new();
        collect_parts(headers.clone(), body, &mut parts, 0);

        Self { headers, parts }
    }

    /// Gets the content type of the message as a whole.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        content_type_of(&self.headers)
    }

    /// Gets the Message-ID without its angle brackets.
    #[must_use]
    pub fn message_id(&self) -> Option<String> {
        let raw = self.headers.get("message-id")?;
        let id = String::from_utf8_lossy(raw);
        let id = id.trim().trim_start_matches('<').trim_end_matches('>').trim();
        (!id.is_empty()).then(|| id.to_string())
    }

    /// Gets the Subject with encoded words decoded. The result may still hold
    /// bytes that are not valid UTF-8.
    #[must_use]
    pub fn subject(&self) -> Option<Vec<u8>> {
        self.headers.get("subject").map(decode_rfc2047)
    }

    /// Parses the Date header.
    ///
    /// Returns `None` when the header is missing or not an RFC 2822 date.
    #[must_use]
    pub fn date(&self) -> Option<DateTime<FixedOffset>> {
        let value = self.headers.get_str("date")?;
        // chrono rejects the trailing "(UTC)"-style comment some MTAs add
        let value = match value.find('(') {
            Some(i) => &value[..i],
            None => value,
        };
        DateTime::parse_from_rfc2822(value.trim()).ok()
    }

    /// Parses every occurrence of an address header (`from`, `to`, `cc`, …).
    ///
    /// A missing header yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is not valid UTF-8 or not a valid address
    /// list.
    pub fn addresses(&self, name: &str) -> Result<Vec<Address>> {
        let mut addresses = Vec::new();
        for raw in self.headers.get_all(name) {
            let text = std::str::from_utf8(raw)
                .map_err(|e| Error::InvalidAddress(format!("{name}: {e}")))?;
            for mut address in parse_address_list(text)? {
                address.name = address
                    .name
                    .map(|n| String::from_utf8_lossy(&decode_rfc2047(n.as_bytes())).into_owned());
                addresses.push(address);
            }
        }
        Ok(addresses)
    }

    /// Returns true if any part is an attachment.
    #[must_use]
    pub fn has_attachment(&self) -> bool {
        self.parts.iter().any(Part::is_attachment)
    }
}

fn content_type_of(headers: &Headers) -> ContentType {
    headers
        .get_str("content-type")
        .and_then(|ct| ContentType::parse(ct).ok())
        .unwrap_or_else(ContentType::text_plain)
}

/// Splits an entity at the first empty line.
fn split_header_body(raw: &[u8]) -> (&[u8], &[u8]) {
    if let Some(rest) = raw.strip_prefix(b"\r\n") {
        return (&raw[..0], rest);
    }
    if let Some(rest) = raw.strip_prefix(b"\n") {
        return (&raw[..0], rest);
    }

    let mut from = 0;
    while let Some(pos) = raw[from..].iter().position(|&b| b == b'\n') {
        let newline = from + pos;
        let after = &raw[newline + 1..];
        if after.starts_with(b"\r\n") {
            return (&raw[..=newline], &raw[newline + 3..]);
        }
        if after.starts_with(b"\n") {
            return (&raw[..=newline], &raw[newline + 2..]);
        }
        from = newline + 1;
    }

    (raw, &raw[raw.len()..])
}

fn collect_parts(headers: Headers, body: &[u8], parts: &mut Vec<Part>, depth: usize) {
    let content_type = content_type_of(&headers);
    if !content_type.is_multipart() || depth >= MAX_MULTIPART_DEPTH {
        parts.push(Part::new(headers, body.to_vec()));
        return;
    }

    let sections = content_type
        .boundary()
        .ok_or(Error::MissingBoundary)
        .and_then(|boundary| split_multipart(body, boundary));

    match sections {
        Ok(sections) => {
            for section in sections {
                let (header_block, section_body) = split_header_body(section);
                collect_parts(Headers::parse(header_block), section_body, parts, depth + 1);
            }
        }
        Err(_) => parts.push(Part::new(headers, body.to_vec())),
    }
}

/// Splits a multipart body into its sections, dropping preamble and
/// epilogue. A missing close delimiter is tolerated.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Result<Vec<&'a [u8]>> {
    let delimiter = format!("--{boundary}");
    let mut sections = Vec::new();
    let mut start: Option<usize> = None;
    let mut offset = 0;
    let mut closed = false;

    for line in body.split_inclusive(|&b| b == b'\n') {
        let content = line.trim_ascii_end();
        if let Some(rest) = content.strip_prefix(delimiter.as_bytes())
            && (rest.is_empty() || rest == b"--")
        {
            if let Some(begin) = start {
                sections.push(strip_trailing_newline(&body[begin..offset]));
            }
            if rest == b"--" {
                closed = true;
                break;
            }
            start = Some(offset + line.len());
        }
        offset += line.len();
    }

    match start {
        None => Err(Error::InvalidMultipart(format!(
            "No '{delimiter}' delimiter line found"
        ))),
        Some(begin) => {
            if !closed {
                sections.push(&body[begin..]);
            }
            Ok(sections)
        }
    }
}

/// The line break before a delimiter belongs to the delimiter.
fn strip_trailing_newline(section: &[u8]) -> &[u8] {
    section
        .strip_suffix(b"\r\n")
        .or_else(|| section.strip_suffix(b"\n"))
        .unwrap_or(section)
}
