//! Validated agent configuration.

use serde::{Deserialize, Serialize};

use crate::condition::Conditions;

/// MIME types tried for the event body when none are configured, in
/// priority order.
pub const DEFAULT_MIME_TYPES: [&str; 3] = ["text/plain", "text/enriched", "text/html"];

/// Connection settings for the IMAP server.
///
/// The engine never connects on its own; these are handed to whatever
/// [`MailSource`](crate::MailSource) the embedder builds.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Connect over TLS.
    pub ssl: bool,
    /// Login name.
    pub username: String,
    /// Login password.
    pub password: String,
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("ssl", &self.ssl)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// How configured header names are rendered as keys of the event's
/// `headers` mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderStyle {
    /// `Content-Type`.
    #[default]
    Capitalized,
    /// `content-type`.
    Downcased,
    /// `content_type`.
    Snakecased,
    /// Exactly as configured.
    Raw,
}

impl HeaderStyle {
    /// Parses a style name, case-insensitively.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "capitalized" => Some(Self::Capitalized),
            "downcased" => Some(Self::Downcased),
            "snakecased" => Some(Self::Snakecased),
            "raw" => Some(Self::Raw),
            _ => None,
        }
    }

    /// Renders a header name in this style.
    #[must_use]
    pub fn apply(self, name: &str) -> String {
        match self {
            Self::Capitalized => name.split('-').map(capitalize).collect::<Vec<_>>().join("-"),
            Self::Downcased => name.to_ascii_lowercase(),
            Self::Snakecased => name.to_ascii_lowercase().replace('-', "_"),
            Self::Raw => name.to_string(),
        }
    }
}

fn capitalize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    let mut chars = lower.chars();
    chars.next().map_or_else(String::new, |first| {
        let mut out = first.to_ascii_uppercase().to_string();
        out.push_str(chars.as_str());
        out
    })
}

/// A validated agent configuration.
///
/// Built by [`AgentOptions::validate`](super::AgentOptions::validate);
/// immutable for the lifetime of a check pass.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// IMAP connection settings.
    pub connection: ConnectionConfig,
    /// Folders to watch, checked in this order.
    pub folders: Vec<String>,
    /// Conditions a message must satisfy to be emitted.
    pub conditions: Conditions,
    /// Acceptable body MIME types, in priority order.
    pub mime_types: Vec<String>,
    /// Header names copied into the event.
    pub include_headers: Vec<String>,
    /// Key style for copied headers.
    pub headers_style: HeaderStyle,
    /// Mark matched messages as read.
    pub mark_as_read: bool,
    /// Delete matched messages.
    pub delete: bool,
    /// Include the base64-encoded raw message in the event.
    pub include_raw_mail: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_styles() {
        assert_eq!(HeaderStyle::Capitalized.apply("content-TYPE"), "Content-Type");
        assert_eq!(HeaderStyle::Capitalized.apply("x-mailer"), "X-Mailer");
        assert_eq!(HeaderStyle::Downcased.apply("Content-Type"), "content-type");
        assert_eq!(HeaderStyle::Snakecased.apply("Content-Type"), "content_type");
        assert_eq!(HeaderStyle::Raw.apply("conTent-type"), "conTent-type");
    }

    #[test]
    fn header_style_names() {
        assert_eq!(HeaderStyle::parse("SnakeCased"), Some(HeaderStyle::Snakecased));
        assert_eq!(HeaderStyle::parse(" raw "), Some(HeaderStyle::Raw));
        assert_eq!(HeaderStyle::parse("kebab"), None);
        assert_eq!(HeaderStyle::default(), HeaderStyle::Capitalized);
    }

    #[test]
    fn password_is_not_debug_printed() {
        let connection = ConnectionConfig {
            host: "imap.example.com".into(),
            port: 993,
            ssl: true,
            username: "agent".into(),
            password: "hunter2".into(),
        };
        let printed = format!("{connection:?}");
        assert!(printed.contains("imap.example.com"));
        assert!(!printed.contains("hunter2"));
    }
}
