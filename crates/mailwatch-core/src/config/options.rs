//! Raw agent options as stored by the host application.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::model::{AgentConfig, ConnectionConfig, DEFAULT_MIME_TYPES, HeaderStyle};
use super::validation::{ConfigErrors, ValidationError};
use crate::condition::Conditions;
use crate::error::Result;

/// Agent options exactly as the host application hands them over.
///
/// Typing is loose, as in hand-edited option documents: booleans may be
/// strings and ports may be numeric strings. Every field is kept as a JSON
/// value so that a mistyped option is reported by `validate` alongside the
/// others instead of failing deserialization.
/// Call [`validate`](Self::validate) to get an [`AgentConfig`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentOptions {
    /// IMAP server hostname.
    pub host: Value,
    /// IMAP server port (number or numeric string).
    pub port: Value,
    /// Use TLS (default true).
    pub ssl: Value,
    /// Login name.
    pub username: Value,
    /// Login password.
    pub password: Value,
    /// Folders to watch.
    pub folders: Value,
    /// Condition mapping, keyed by field.
    pub conditions: Value,
    /// Acceptable body MIME types, in priority order.
    pub mime_types: Value,
    /// Header names to copy into events.
    pub include_headers: Value,
    /// Key style for copied headers.
    pub event_headers_style: Value,
    /// Mark matched messages as read.
    pub mark_as_read: Value,
    /// Delete matched messages.
    pub delete: Value,
    /// Include the raw message in events.
    pub include_raw_mail: Value,
}

impl AgentOptions {
    /// Parses options from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not a JSON object of the
    /// expected shape.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validates the options, collecting every problem found.
    ///
    /// # Errors
    ///
    /// Returns all validation errors if any option is invalid.
    pub fn validate(&self) -> std::result::Result<AgentConfig, ConfigErrors> {
        let mut errors = Vec::new();

        let host = self.host.as_str().map(str::trim).filter(|s| !s.is_empty());
        if host.is_none() {
            errors.push(ValidationError::EmptyHost);
        }
        let ssl = flag(&mut errors, "ssl", &self.ssl).unwrap_or(true);
        let port = match parse_port(&self.port) {
            Ok(port) => port.unwrap_or(if ssl { 993 } else { 143 }),
            Err(e) => {
                errors.push(e);
                0
            }
        };
        let username = self.username.as_str().map(str::trim).filter(|s| !s.is_empty());
        if username.is_none() {
            errors.push(ValidationError::EmptyUsername);
        }
        let password = self.password.as_str().filter(|s| !s.is_empty());
        if password.is_none() {
            errors.push(ValidationError::EmptyPassword);
        }

        let folders = match string_list(&self.folders) {
            Some(folders) if folders.is_empty() => {
                errors.push(ValidationError::NoFolders);
                folders
            }
            Some(folders) => folders,
            None if self.folders.is_null() => {
                errors.push(ValidationError::NoFolders);
                Vec::new()
            }
            None => {
                errors.push(ValidationError::InvalidFolders);
                Vec::new()
            }
        };

        let conditions = Conditions::from_value(&self.conditions).unwrap_or_else(|e| {
            errors.extend(e);
            Conditions::default()
        });

        let mime_types = match &self.mime_types {
            Value::Null => Vec::new(),
            value => string_list(value)
                .filter(|types| types.iter().all(|t| is_mime_type(t)))
                .unwrap_or_else(|| {
                    errors.push(ValidationError::InvalidMimeTypes);
                    Vec::new()
                }),
        };
        let mime_types = if mime_types.is_empty() {
            DEFAULT_MIME_TYPES.iter().map(ToString::to_string).collect()
        } else {
            mime_types.iter().map(|t| t.to_ascii_lowercase()).collect()
        };

        let include_headers = match &self.include_headers {
            Value::Null => Vec::new(),
            value => string_list(value)
                .filter(|names| names.iter().all(|n| is_header_name(n)))
                .unwrap_or_else(|| {
                    errors.push(ValidationError::InvalidHeaders);
                    Vec::new()
                }),
        };

        let headers_style = match &self.event_headers_style {
            Value::Null => HeaderStyle::default(),
            Value::String(s) if s.trim().is_empty() => HeaderStyle::default(),
            Value::String(s) => HeaderStyle::parse(s).unwrap_or_else(|| {
                errors.push(ValidationError::InvalidHeaderStyle(s.clone()));
                HeaderStyle::default()
            }),
            other => {
                errors.push(ValidationError::InvalidHeaderStyle(other.to_string()));
                HeaderStyle::default()
            }
        };

        let mark_as_read = flag(&mut errors, "mark_as_read", &self.mark_as_read).unwrap_or(false);
        let delete = flag(&mut errors, "delete", &self.delete).unwrap_or(false);
        let include_raw_mail =
            flag(&mut errors, "include_raw_mail", &self.include_raw_mail).unwrap_or(false);

        let (Some(host), Some(username), Some(password)) = (host, username, password) else {
            return Err(ConfigErrors(errors));
        };
        if !errors.is_empty() {
            return Err(ConfigErrors(errors));
        }

        Ok(AgentConfig {
            connection: ConnectionConfig {
                host: host.to_string(),
                port,
                ssl,
                username: username.to_string(),
                password: password.to_string(),
            },
            folders,
            conditions,
            mime_types,
            include_headers,
            headers_style,
            mark_as_read,
            delete,
            include_raw_mail,
        })
    }
}

/// Reads a loosely typed boolean.
///
/// `null` and `""` mean "not set".
pub(crate) fn loose_bool(value: &Value) -> std::result::Result<Option<bool>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(*b)),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                Ok(None)
            } else if s.eq_ignore_ascii_case("true") {
                Ok(Some(true))
            } else if s.eq_ignore_ascii_case("false") {
                Ok(Some(false))
            } else {
                Err(value.to_string())
            }
        }
        other => Err(other.to_string()),
    }
}

fn flag(errors: &mut Vec<ValidationError>, option: &'static str, value: &Value) -> Option<bool> {
    loose_bool(value).unwrap_or_else(|value| {
        errors.push(ValidationError::InvalidBoolean { option, value });
        None
    })
}

fn parse_port(value: &Value) -> std::result::Result<Option<u16>, ValidationError> {
    let number = match value {
        Value::Null => return Ok(None),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    };
    number
        .and_then(|n| u16::try_from(n).ok())
        .filter(|&port| port != 0)
        .map(Some)
        .ok_or_else(|| ValidationError::InvalidPort(value.to_string()))
}

/// A list of non-empty strings, or `None` if `value` is anything else.
fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
        })
        .collect()
}

fn is_mime_type(value: &str) -> bool {
    value
        .split_once('/')
        .is_some_and(|(main, sub)| !main.is_empty() && !sub.is_empty() && !sub.contains('/'))
}

fn is_header_name(value: &str) -> bool {
    value.bytes().all(|b| b.is_ascii_graphic() && b != b':')
}
