//! Condition matching.
//!
//! A [`Conditions`] set is compiled once from the agent options and then
//! evaluated against every candidate message. All conditions must hold; an
//! empty set selects everything.

mod pattern;

pub use pattern::{CaptureMap, Pattern, PatternKind};

use serde_json::Value;
use tracing::{debug, warn};

use crate::body::SelectedBody;
use crate::config::{ValidationError, loose_bool};
use crate::message::{AddressField, CandidateMessage};
use crate::scrub::scrub;

/// Message fields a condition can test, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// Decoded, scrubbed subject.
    Subject,
    /// Scrubbed text of the selected body part.
    Body,
    /// Any `From` address.
    From,
    /// Any `To` address.
    To,
    /// Any `Cc` address.
    Cc,
    /// The attachment flag.
    HasAttachment,
}

impl Field {
    /// Option key for this field.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::Body => "body",
            Self::From => "from",
            Self::To => "to",
            Self::Cc => "cc",
            Self::HasAttachment => "has_attachment",
        }
    }

    /// Looks a field up by option key.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "subject" => Some(Self::Subject),
            "body" => Some(Self::Body),
            "from" => Some(Self::From),
            "to" => Some(Self::To),
            "cc" => Some(Self::Cc),
            "has_attachment" => Some(Self::HasAttachment),
            _ => None,
        }
    }

    const fn address(self) -> Option<AddressField> {
        match self {
            Self::From => Some(AddressField::From),
            Self::To => Some(AddressField::To),
            Self::Cc => Some(AddressField::Cc),
            _ => None,
        }
    }

    /// Kind given to a bare pattern string on this field.
    const fn default_kind(self) -> PatternKind {
        if self.address().is_some() {
            PatternKind::Glob
        } else {
            PatternKind::Regex
        }
    }
}

#[derive(Debug, Clone)]
enum Rule {
    /// Matches if any pattern matches (for address fields: any address).
    Patterns(Vec<Pattern>),
    Flag(bool),
}

/// A compiled set of conditions.
#[derive(Debug, Clone, Default)]
pub struct Conditions {
    rules: Vec<(Field, Rule)>,
}

impl Conditions {
    /// Creates an empty set, which matches every message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles the `conditions` option.
    ///
    /// # Errors
    ///
    /// Returns every unknown key and every value that does not compile.
    pub fn from_value(value: &Value) -> Result<Self, Vec<ValidationError>> {
        let map = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            _ => return Err(vec![ValidationError::InvalidConditions]),
        };

        let mut conditions = Self::default();
        let mut errors = Vec::new();
        for (key, value) in map {
            let Some(field) = Field::from_name(key) else {
                errors.push(ValidationError::UnknownCondition(key.clone()));
                continue;
            };
            match parse_rule(field, value) {
                Ok(Some(rule)) => conditions.insert(field, rule),
                Ok(None) => {}
                Err(reason) => errors.push(ValidationError::InvalidCondition {
                    field: key.clone(),
                    reason,
                }),
            }
        }

        if errors.is_empty() {
            Ok(conditions)
        } else {
            Err(errors)
        }
    }

    /// Adds (or replaces) a pattern condition on a text field.
    ///
    /// # Errors
    ///
    /// Returns an error for `HasAttachment`, which takes a flag; use
    /// [`with_attachment`](Self::with_attachment).
    pub fn with_pattern(mut self, field: Field, pattern: Pattern) -> Result<Self, ValidationError> {
        if field == Field::HasAttachment {
            return Err(ValidationError::InvalidCondition {
                field: field.name().to_string(),
                reason: "expects a boolean, not a pattern".to_string(),
            });
        }
        self.insert(field, Rule::Patterns(vec![pattern]));
        Ok(self)
    }

    /// Adds (or replaces) the attachment condition.
    #[must_use]
    pub fn with_attachment(mut self, expected: bool) -> Self {
        self.insert(Field::HasAttachment, Rule::Flag(expected));
        self
    }

    /// Number of conditions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if there are no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Fields that carry a condition, in evaluation order.
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.rules.iter().map(|(field, _)| *field)
    }

    /// Evaluates every condition against a message.
    ///
    /// `body` is the part chosen by the body selector; without one a `body`
    /// condition fails. A field the message lacks, or an address header that
    /// cannot be parsed, fails its condition. Returns the named captures of
    /// all conditions, later fields overwriting earlier ones on a name
    /// clash, or `None` if any condition fails.
    pub fn evaluate<M>(&self, message: &M, body: Option<&SelectedBody>) -> Option<CaptureMap>
    where
        M: CandidateMessage + ?Sized,
    {
        let mut captures = CaptureMap::new();
        for (field, rule) in &self.rules {
            let found = match rule {
                Rule::Flag(expected) => {
                    (message.has_attachment() == *expected).then(CaptureMap::new)
                }
                Rule::Patterns(patterns) => match field.address() {
                    Some(address_field) => match_addresses(message, address_field, patterns),
                    None if *field == Field::Body => {
                        body.and_then(|body| first_match(patterns, &body.text))
                    }
                    None => message
                        .subject()
                        .and_then(|subject| first_match(patterns, &scrub(subject))),
                },
            };

            let Some(found) = found else {
                debug!("UID {} does not match the {} condition", message.uid(), field.name());
                return None;
            };
            captures.extend(found);
        }
        Some(captures)
    }

    fn insert(&mut self, field: Field, rule: Rule) {
        self.rules.retain(|(existing, _)| *existing != field);
        let at = self.rules.partition_point(|(existing, _)| *existing < field);
        self.rules.insert(at, (field, rule));
    }
}

fn match_addresses<M>(message: &M, field: AddressField, patterns: &[Pattern]) -> Option<CaptureMap>
where
    M: CandidateMessage + ?Sized,
{
    match message.addresses(field) {
        Ok(addresses) => addresses
            .iter()
            .find_map(|address| first_match(patterns, address)),
        Err(e) => {
            warn!("UID {}: {}; treating as no match", message.uid(), e);
            None
        }
    }
}

fn first_match(patterns: &[Pattern], text: &str) -> Option<CaptureMap> {
    patterns.iter().find_map(|pattern| pattern.captures(text))
}

fn parse_rule(field: Field, value: &Value) -> Result<Option<Rule>, String> {
    if field == Field::HasAttachment {
        return loose_bool(value)
            .map(|flag| flag.map(Rule::Flag))
            .map_err(|value| format!("must be true or false, got {value}"));
    }

    let patterns = match value {
        Value::Array(items) if field.address().is_some() => items
            .iter()
            .map(|item| parse_pattern(field, item))
            .collect::<Result<Vec<_>, _>>()?,
        Value::Array(_) => return Err("takes a single pattern".to_string()),
        other => vec![parse_pattern(field, other)?],
    };
    if patterns.is_empty() {
        return Err("needs at least one pattern".to_string());
    }
    Ok(Some(Rule::Patterns(patterns)))
}

fn parse_pattern(field: Field, value: &Value) -> Result<Pattern, String> {
    match value {
        Value::String(source) => match field.default_kind() {
            PatternKind::Glob => Pattern::glob(source),
            PatternKind::Regex => Pattern::regex(source),
        },
        Value::Object(map) if map.len() == 1 => match map.iter().next() {
            Some((kind, Value::String(source))) if kind == "regex" => Pattern::regex(source),
            Some((kind, Value::String(source))) if kind == "glob" => Pattern::glob(source),
            _ => Err(r#"expected {"regex": "..."} or {"glob": "..."}"#.to_string()),
        },
        _ => Err("expected a pattern string".to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::body::select_body;
    use crate::config::DEFAULT_MIME_TYPES;
    use crate::message::ParsedMessage;
    use crate::types::Uid;
    use serde_json::json;

    fn message(raw: &str) -> ParsedMessage {
        ParsedMessage::parse(Uid::new(1).unwrap(), raw.replace('\n', "\r\n"))
    }

    fn conditions(value: Value) -> Conditions {
        Conditions::from_value(&value).unwrap()
    }

    fn evaluate(conditions: &Conditions, message: &ParsedMessage) -> Option<CaptureMap> {
        let body = select_body(message, &DEFAULT_MIME_TYPES);
        conditions.evaluate(message, body.as_ref())
    }

    const REPLY: &str = "From: Jane Roe <jane@example.com>
To: John.Doe@Example.com, team@example.org
Subject: Re: Quarterly numbers
Message-ID: <reply@example.com>

Hi John, the total is 42.
";

    #[test]
    fn empty_conditions_match_everything() {
        let caps = evaluate(&Conditions::new(), &message(REPLY)).unwrap();
        assert!(caps.is_empty());
        assert!(conditions(Value::Null).is_empty());
    }

    #[test]
    fn address_glob_matches_any_address() {
        let to = conditions(json!({ "to": "john.doe@*" }));
        assert!(evaluate(&to, &message(REPLY)).is_some());

        let from = conditions(json!({ "from": "john.doe@*" }));
        assert!(evaluate(&from, &message(REPLY)).is_none());
    }

    #[test]
    fn address_lists_match_any_pattern() {
        let to = conditions(json!({ "to": ["nobody@*", "team@example.org"] }));
        assert!(evaluate(&to, &message(REPLY)).is_some());
    }

    #[test]
    fn missing_header_is_no_match() {
        let cc = conditions(json!({ "cc": "*" }));
        assert!(evaluate(&cc, &message(REPLY)).is_none());
    }

    #[test]
    fn unparsable_address_is_no_match() {
        let broken = "From: <jane@example.com\nSubject: x\n\nbody\n";
        let from = conditions(json!({ "from": "*" }));
        assert!(evaluate(&from, &message(broken)).is_none());
        // Only conditioned fields are parsed.
        let subject = conditions(json!({ "subject": "x" }));
        assert!(evaluate(&subject, &message(broken)).is_some());
    }

    #[test]
    fn captures_from_subject_and_body_are_merged() {
        let set = conditions(json!({
            "subject": r"\ARe: (?<topic>.+)",
            "body": r"total is (?<total>\d+)",
        }));
        let caps = evaluate(&set, &message(REPLY)).unwrap();
        assert_eq!(caps["topic"], "Quarterly numbers");
        assert_eq!(caps["total"], "42");
    }

    #[test]
    fn later_field_wins_capture_clash() {
        let set = conditions(json!({
            "body": r"(?<word>Hi)",
            "subject": r"(?<word>Re)",
            "to": { "regex": r"(?<word>team)@" },
        }));
        let caps = evaluate(&set, &message(REPLY)).unwrap();
        assert_eq!(caps["word"], "team");
    }

    #[test]
    fn all_conditions_must_hold() {
        let set = conditions(json!({
            "subject": "Quarterly",
            "from": "nobody@example.com",
        }));
        assert!(evaluate(&set, &message(REPLY)).is_none());
    }

    #[test]
    fn body_condition_needs_a_selected_body() {
        let set = conditions(json!({ "body": "total" }));
        let message = message(REPLY);
        assert!(set.evaluate(&message, None).is_none());
    }

    #[test]
    fn attachment_flag() {
        let with = conditions(json!({ "has_attachment": "true" }));
        let without = conditions(json!({ "has_attachment": false }));
        assert!(evaluate(&with, &message(REPLY)).is_none());
        assert!(evaluate(&without, &message(REPLY)).is_some());
        assert!(conditions(json!({ "has_attachment": "" })).is_empty());
    }

    #[test]
    fn explicit_glob_on_subject() {
        let set = conditions(json!({ "subject": { "glob": "re: *" } }));
        assert!(evaluate(&set, &message(REPLY)).is_some());
    }

    #[test]
    fn invalid_conditions_are_all_reported() {
        let errors = Conditions::from_value(&json!({
            "subject": "(",
            "size": ">10",
            "has_attachment": "sometimes",
            "body": ["a", "b"],
            "cc": { "sql": "x" },
        }))
        .unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::UnknownCondition("size".into())));
        assert!(Conditions::from_value(&json!("subject")).is_err());
    }

    #[test]
    fn builder_keeps_evaluation_order() {
        let set = Conditions::new()
            .with_attachment(false)
            .with_pattern(Field::To, Pattern::glob("*").unwrap())
            .unwrap()
            .with_pattern(Field::Subject, Pattern::regex("Re").unwrap())
            .unwrap()
            .with_pattern(Field::Subject, Pattern::regex("Quarterly").unwrap())
            .unwrap();
        assert_eq!(
            set.fields().collect::<Vec<_>>(),
            [Field::Subject, Field::To, Field::HasAttachment]
        );
        assert!(evaluate(&set, &message(REPLY)).is_some());
    }

    #[test]
    fn pattern_on_attachment_flag_is_rejected() {
        let err = Conditions::new()
            .with_pattern(Field::HasAttachment, Pattern::glob("*").unwrap())
            .unwrap_err();
        assert_eq!(err.field(), "conditions");
        assert!(
            matches!(err, ValidationError::InvalidCondition { ref field, .. } if field == "has_attachment")
        );
    }
}
