//! Read-only message views.
//!
//! The engine never touches a mail library directly. Anything implementing
//! [`CandidateMessage`] can be checked; [`ParsedMessage`] is the stock
//! implementation over raw RFC 5322 bytes.

use chrono::{DateTime, FixedOffset};
use mailwatch_mime::Message;
use thiserror::Error;

use crate::types::Uid;

/// Address-list header fields that conditions and events look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AddressField {
    /// `From`.
    From,
    /// `To`.
    To,
    /// `Cc`.
    Cc,
}

impl AddressField {
    /// Lowercase header name.
    #[must_use]
    pub const fn header_name(self) -> &'static str {
        match self {
            Self::From => "from",
            Self::To => "to",
            Self::Cc => "cc",
        }
    }
}

impl std::fmt::Display for AddressField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.header_name())
    }
}

/// An address header that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unparsable {field} header: {reason}")]
pub struct AddressError {
    /// Which header.
    pub field: AddressField,
    /// Parser diagnostics.
    pub reason: String,
}

/// A leaf body part: MIME type plus transfer-decoded content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyPart {
    /// Lowercase `type/subtype`.
    pub mime_type: String,
    /// Decoded content. Not guaranteed to be valid UTF-8.
    pub content: Vec<u8>,
}

/// What the engine needs to know about one message.
pub trait CandidateMessage {
    /// UID within the folder being checked.
    fn uid(&self) -> Uid;

    /// Message-ID without angle brackets, if the message has one.
    fn message_id(&self) -> Option<&str>;

    /// Addresses (`local@domain`) of an address header, in header order.
    ///
    /// An absent header is an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the header is present but cannot be parsed.
    fn addresses(&self, field: AddressField) -> Result<Vec<String>, AddressError>;

    /// Subject with encoded words decoded, as bytes.
    fn subject(&self) -> Option<&[u8]>;

    /// Parsed `Date` header.
    fn date(&self) -> Option<DateTime<FixedOffset>>;

    /// Whether any part is an attachment.
    fn has_attachment(&self) -> bool;

    /// Inline leaf parts in document order.
    fn body_parts(&self) -> &[BodyPart];

    /// Every value of a header, encoded words decoded. Empty if absent.
    fn header_values(&self, name: &str) -> Vec<Vec<u8>>;

    /// The message exactly as fetched.
    fn raw(&self) -> &[u8];
}

/// A message parsed from raw bytes.
#[derive(Debug, Clone)]
pub struct ParsedMessage {
    uid: Uid,
    raw: Vec<u8>,
    message: Message,
    message_id: Option<String>,
    subject: Option<Vec<u8>>,
    body_parts: Vec<BodyPart>,
}

impl ParsedMessage {
    /// Parses a fetched message.
    ///
    /// Never fails: damaged input yields a message whose missing fields
    /// simply fail the conditions that look at them.
    #[must_use]
    pub fn parse(uid: Uid, raw: impl Into<Vec<u8>>) -> Self {
        let raw = raw.into();
        let message = Message::parse(&raw);
        let body_parts = message
            .parts
            .iter()
            .filter(|part| !part.is_attachment())
            .map(|part| BodyPart {
                mime_type: part.content_type().mime_type(),
                content: part.text(),
            })
            .collect();

        Self {
            uid,
            message_id: message.message_id(),
            subject: message.subject(),
            body_parts,
            message,
            raw,
        }
    }

    /// The underlying MIME structure.
    #[must_use]
    pub const fn message(&self) -> &Message {
        &self.message
    }
}

impl CandidateMessage for ParsedMessage {
    fn uid(&self) -> Uid {
        self.uid
    }

    fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    fn addresses(&self, field: AddressField) -> Result<Vec<String>, AddressError> {
        self.message
            .addresses(field.header_name())
            .map(|list| list.into_iter().map(|address| address.email).collect())
            .map_err(|e| AddressError {
                field,
                reason: e.to_string(),
            })
    }

    fn subject(&self) -> Option<&[u8]> {
        self.subject.as_deref()
    }

    fn date(&self) -> Option<DateTime<FixedOffset>> {
        self.message.date()
    }

    fn has_attachment(&self) -> bool {
        self.message.has_attachment()
    }

    fn body_parts(&self) -> &[BodyPart] {
        &self.body_parts
    }

    fn header_values(&self, name: &str) -> Vec<Vec<u8>> {
        self.message.headers.get_all_decoded(name)
    }

    fn raw(&self) -> &[u8] {
        &self.raw
    }
}
