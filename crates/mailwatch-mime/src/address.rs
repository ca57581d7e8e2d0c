//! RFC 5322 address-list parsing.
//!
//! Handles display names (quoted or bare), angle-addr forms, comments and
//! groups. Anything that does not yield a plausible `local@domain` is an
//! error rather than a best guess.

use crate::error::{Error, Result};

/// A mailbox: optional display name plus address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// Display name, if one was given.
    pub name: Option<String>,
    /// The `local@domain` address.
    pub email: String,
}

impl Address {
    /// Creates an address without a display name.
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
        }
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} <{}>", self.email),
            None => write!(f, "{}", self.email),
        }
    }
}

/// Parses a comma-separated address list such as the body of a `To:` field.
///
/// Group syntax (`Team: a@example.com, b@example.com;`) is flattened into
/// its members. An empty list is not an error.
///
/// # Errors
///
/// Returns an error on unbalanced quotes, comments or angle brackets, and on
/// any entry that is not a valid address.
pub fn parse_address_list(input: &str) -> Result<Vec<Address>> {
    split_entries(input)?
        .iter()
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(parse_mailbox)
        .collect()
}

/// Splits an address list into mailbox entries, dropping comments and group
/// labels.
fn split_entries(input: &str) -> Result<Vec<String>> {
    let mut entries = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut in_angle = false;
    let mut comment_depth = 0_usize;
    let mut escaped = false;

    for ch in input.chars() {
        if escaped {
            if comment_depth == 0 {
                current.push(ch);
            }
            escaped = false;
            continue;
        }

        if comment_depth > 0 {
            match ch {
                '\\' => escaped = true,
                '(' => comment_depth += 1,
                ')' => comment_depth -= 1,
                _ => {}
            }
            continue;
        }

        match ch {
            '\\' if in_quotes => {
                current.push(ch);
                escaped = true;
            }
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            _ if in_quotes => current.push(ch),
            '(' => comment_depth = 1,
            '<' if !in_angle => {
                in_angle = true;
                current.push(ch);
            }
            '>' if in_angle => {
                in_angle = false;
                current.push(ch);
            }
            '<' | '>' => {
                return Err(Error::InvalidAddress(format!(
                    "Unbalanced angle brackets in '{input}'"
                )));
            }
            _ if in_angle => current.push(ch),
            ',' | ';' => entries.push(std::mem::take(&mut current)),
            ':' => current.clear(),
            _ => current.push(ch),
        }
    }

    if in_quotes || in_angle || comment_depth > 0 {
        return Err(Error::InvalidAddress(format!(
            "Unterminated quote, comment or angle bracket in '{input}'"
        )));
    }

    entries.push(current);
    Ok(entries)
}

fn parse_mailbox(entry: &str) -> Result<Address> {
    let Some(open) = find_unquoted(entry, '<') else {
        return Ok(Address::new(validate_addr_spec(entry)?));
    };

    let close = entry[open..]
        .find('>')
        .map(|i| open + i)
        .ok_or_else(|| Error::InvalidAddress(format!("Missing '>' in '{entry}'")))?;

    if !entry[close + 1..].trim().is_empty() {
        return Err(Error::InvalidAddress(format!(
            "Unexpected text after address in '{entry}'"
        )));
    }

    let mut spec = entry[open + 1..close].trim();
    // Obsolete source route: <@relay.example:user@example.com>
    if spec.starts_with('@')
        && let Some((_, rest)) = spec.split_once(':')
    {
        spec = rest;
    }

    let name = unquote(entry[..open].trim());
    Ok(Address {
        name: (!name.is_empty()).then_some(name),
        email: validate_addr_spec(spec)?,
    })
}

fn find_unquoted(s: &str, needle: char) -> Option<usize> {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, ch) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == '\\' && in_quotes {
            escaped = true;
        } else if ch == '"' {
            in_quotes = !in_quotes;
        } else if ch == needle && !in_quotes {
            return Some(i);
        }
    }
    None
}

fn unquote(s: &str) -> String {
    let inner = s
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(s);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

fn validate_addr_spec(spec: &str) -> Result<String> {
    let spec = spec.trim();

    let (local, domain) = spec
        .rsplit_once('@')
        .ok_or_else(|| Error::InvalidAddress(format!("Address must contain @: '{spec}'")))?;

    if local.is_empty() || domain.is_empty() {
        return Err(Error::InvalidAddress(format!(
            "Local and domain parts cannot be empty: '{spec}'"
        )));
    }

    let quoted_local = local.starts_with('"') && local.ends_with('"') && local.len() > 1;
    if (!quoted_local && local.contains(char::is_whitespace))
        || domain.contains(char::is_whitespace)
        || domain.contains('@')
    {
        return Err(Error::InvalidAddress(format!(
            "Address contains illegal characters: '{spec}'"
        )));
    }

    Ok(spec.to_string())
}
