//! RFC 5322 header handling.
//!
//! Field bodies are stored as raw bytes: mail in the wild carries 8-bit
//! headers in undeclared charsets, and deciding how to display them is the
//! caller's business.

use std::collections::HashMap;

use crate::encoding::decode_rfc2047;

/// Collection of header fields, keyed case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    fields: HashMap<String, Vec<Vec<u8>>>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header value, keeping any earlier values for the same name.
    pub fn add(&mut self, name: impl AsRef<str>, value: impl Into<Vec<u8>>) {
        let name = name.as_ref().trim().to_ascii_lowercase();
        self.fields.entry(name).or_default().push(value.into());
    }

    /// Gets the first raw value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.fields
            .get(&name.to_ascii_lowercase())
            .and_then(|v| v.first().map(Vec::as_slice))
    }

    /// Gets the first value for a header if it is valid UTF-8.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| std::str::from_utf8(v).ok())
    }

    /// Gets all raw values for a header, in message order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&[u8]> {
        self.fields
            .get(&name.to_ascii_lowercase())
            .map(|v| v.iter().map(Vec::as_slice).collect())
            .unwrap_or_default()
    }

    /// Gets all values for a header with RFC 2047 encoded words decoded.
    #[must_use]
    pub fn get_all_decoded(&self, name: &str) -> Vec<Vec<u8>> {
        self.get_all(name)
            .into_iter()
            .map(decode_rfc2047)
            .collect()
    }

    /// Returns true if the header is present at least once.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(&name.to_ascii_lowercase())
    }

    /// Returns the number of distinct header names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no header was parsed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parses a header block.
    ///
    /// Parsing stops at the first empty line. Continuation lines (starting
    /// with space or tab) are unfolded into the previous field; lines without
    /// a colon are ignored.
    #[must_use]
    pub fn parse(block: &[u8]) -> Self {
        let mut headers = Self::new();
        let mut current: Option<(String, Vec<u8>)> = None;

        for line in block.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);

            if line.is_empty() {
                break;
            }

            if line[0] == b' ' || line[0] == b'\t' {
                if let Some((_, value)) = current.as_mut() {
                    value.push(b' ');
                    value.extend_from_slice(line.trim_ascii());
                }
                continue;
            }

            if let Some((name, value)) = current.take() {
                headers.add(name, value);
            }

            if let Some(colon) = line.iter().position(|&b| b == b':') {
                let name = String::from_utf8_lossy(&line[..colon]).into_owned();
                current = Some((name, line[colon + 1..].trim_ascii().to_vec()));
            }
        }

        if let Some((name, value)) = current {
            headers.add(name, value);
        }

        headers
    }
}
