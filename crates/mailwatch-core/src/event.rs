//! Event payloads.

use std::collections::BTreeMap;

use mailwatch_mime::encoding::encode_base64;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::body::SelectedBody;
use crate::condition::CaptureMap;
use crate::config::{AgentConfig, HeaderStyle};
use crate::message::{AddressField, CandidateMessage};
use crate::scrub::scrub;

/// The event emitted for one selected message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    /// Message-ID without angle brackets; `null` when the message has none.
    pub message_id: Option<String>,
    /// Folder the message was found in.
    pub folder: String,
    /// Scrubbed subject.
    pub subject: Option<String>,
    /// First `From` address.
    pub from: Option<String>,
    /// `To` addresses.
    pub to: Vec<String>,
    /// `Cc` addresses.
    pub cc: Vec<String>,
    /// Date in RFC 3339 form with the sender's offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// MIME type of the selected body part.
    pub mime_type: String,
    /// Scrubbed text of the selected body part.
    pub body: String,
    /// Whether the message has attachments.
    pub has_attachment: bool,
    /// Named captures from regex conditions.
    pub matches: CaptureMap,
    /// Configured headers present on the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    /// Base64 of the message as fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_mail: Option<String>,
}

impl EventPayload {
    /// Builds the payload for a message that passed its conditions.
    pub fn build<M>(
        config: &AgentConfig,
        folder: &str,
        message: &M,
        body: SelectedBody,
        matches: CaptureMap,
    ) -> Self
    where
        M: CandidateMessage + ?Sized,
    {
        let headers = (!config.include_headers.is_empty())
            .then(|| extract_headers(message, &config.include_headers, config.headers_style));
        let raw_mail = config
            .include_raw_mail
            .then(|| encode_base64(message.raw()));

        Self {
            message_id: message.message_id().map(ToString::to_string),
            folder: folder.to_string(),
            subject: message.subject().map(|s| scrub(s).into_owned()),
            from: event_addresses(message, AddressField::From).into_iter().next(),
            to: event_addresses(message, AddressField::To),
            cc: event_addresses(message, AddressField::Cc),
            date: message.date().map(|date| date.to_rfc3339()),
            mime_type: body.mime_type,
            body: body.text,
            has_attachment: message.has_attachment(),
            matches,
            headers,
            raw_mail,
        }
    }
}

fn event_addresses<M>(message: &M, field: AddressField) -> Vec<String>
where
    M: CandidateMessage + ?Sized,
{
    message
        .addresses(field)
        .unwrap_or_else(|e| {
            warn!("UID {}: {}; leaving it out of the event", message.uid(), e);
            Vec::new()
        })
        .iter()
        .map(|address| scrub(address.as_bytes()).into_owned())
        .collect()
}

fn extract_headers<M>(message: &M, names: &[String], style: HeaderStyle) -> BTreeMap<String, String>
where
    M: CandidateMessage + ?Sized,
{
    names
        .iter()
        .filter_map(|name| {
            let values = message.header_values(name);
            if values.is_empty() {
                return None;
            }
            let joined = values
                .iter()
                .map(|value| scrub(value).trim().to_string())
                .collect::<Vec<_>>()
                .join("\n");
            Some((style.apply(name), joined))
        })
        .collect()
}
