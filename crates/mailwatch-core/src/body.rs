//! Body selection.

use std::borrow::Cow;

use crate::message::{BodyPart, CandidateMessage};
use crate::scrub::scrub;

/// A body part picked for one requested MIME type, scrubbed on access.
#[derive(Debug, Clone, Copy)]
pub struct BodyText<'a> {
    part: &'a BodyPart,
}

impl<'a> BodyText<'a> {
    /// MIME type of the part.
    #[must_use]
    pub fn mime_type(&self) -> &'a str {
        &self.part.mime_type
    }

    /// Scrubbed text of the part.
    #[must_use]
    pub fn text(&self) -> Cow<'a, str> {
        scrub(&self.part.content)
    }
}

/// The body that goes into an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedBody {
    /// MIME type of the selected part.
    pub mime_type: String,
    /// Scrubbed text.
    pub text: String,
}

/// Returns, for each requested MIME type that the message has, its first
/// part of that type. Order follows `mime_types`.
pub fn body_parts<'a, M, S>(message: &'a M, mime_types: &[S]) -> Vec<BodyText<'a>>
where
    M: CandidateMessage + ?Sized,
    S: AsRef<str>,
{
    mime_types
        .iter()
        .filter_map(|wanted| first_of_type(message, wanted.as_ref()))
        .collect()
}

/// Picks the body for an event: the first part of the highest-priority
/// MIME type present.
///
/// `None` means no part has an acceptable type and the message must not be
/// selected.
pub fn select_body<M, S>(message: &M, mime_types: &[S]) -> Option<SelectedBody>
where
    M: CandidateMessage + ?Sized,
    S: AsRef<str>,
{
    let body = mime_types
        .iter()
        .find_map(|wanted| first_of_type(message, wanted.as_ref()))?;
    Some(SelectedBody {
        mime_type: body.mime_type().to_ascii_lowercase(),
        text: body.text().into_owned(),
    })
}

fn first_of_type<'a, M>(message: &'a M, mime_type: &str) -> Option<BodyText<'a>>
where
    M: CandidateMessage + ?Sized,
{
    message
        .body_parts()
        .iter()
        .find(|part| part.mime_type.eq_ignore_ascii_case(mime_type))
        .map(|part| BodyText { part })
}
