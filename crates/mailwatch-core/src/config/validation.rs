//! Configuration validation errors.

use thiserror::Error;

/// A single problem found while validating agent options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// IMAP host is missing, blank or not a string.
    #[error("IMAP host is required")]
    EmptyHost,
    /// Port is not a number in 1-65535.
    #[error("port must be 1-65535, got {0}")]
    InvalidPort(String),
    /// Username is missing, blank or not a string.
    #[error("username is required")]
    EmptyUsername,
    /// Password is missing, empty or not a string.
    #[error("password is required")]
    EmptyPassword,
    /// A boolean option holds something other than a boolean.
    #[error("{option} must be true or false, got {value}")]
    InvalidBoolean {
        /// Option name.
        option: &'static str,
        /// Offending value as given.
        value: String,
    },
    /// No folder to watch.
    #[error("at least one folder is required")]
    NoFolders,
    /// `folders` is not a list of non-empty strings.
    #[error("folders must be a list of folder names")]
    InvalidFolders,
    /// `conditions` is not an object.
    #[error("conditions must be an object")]
    InvalidConditions,
    /// A condition key that is not a known field.
    #[error("unknown condition {0:?}")]
    UnknownCondition(String),
    /// A condition value that does not compile.
    #[error("condition {field}: {reason}")]
    InvalidCondition {
        /// Condition field.
        field: String,
        /// What is wrong with it.
        reason: String,
    },
    /// `mime_types` is not a list of `type/subtype` strings.
    #[error("mime_types must be a list of type/subtype strings")]
    InvalidMimeTypes,
    /// `include_headers` is not a list of header names.
    #[error("include_headers must be a list of header names")]
    InvalidHeaders,
    /// `event_headers_style` names no known style.
    #[error("event_headers_style must be capitalized, downcased, snakecased or raw, got {0:?}")]
    InvalidHeaderStyle(String),
}

impl ValidationError {
    /// Get the option name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyHost => "host",
            Self::InvalidPort(_) => "port",
            Self::EmptyUsername => "username",
            Self::EmptyPassword => "password",
            Self::InvalidBoolean { option, .. } => *option,
            Self::NoFolders | Self::InvalidFolders => "folders",
            Self::InvalidConditions
            | Self::UnknownCondition(_)
            | Self::InvalidCondition { .. } => "conditions",
            Self::InvalidMimeTypes => "mime_types",
            Self::InvalidHeaders => "include_headers",
            Self::InvalidHeaderStyle(_) => "event_headers_style",
        }
    }
}

/// Every problem found in one set of agent options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", summarize(.0))]
pub struct ConfigErrors(pub Vec<ValidationError>);

impl ConfigErrors {
    /// The individual errors, in option order.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    /// Returns true if any error relates to `field`.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field() == field)
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
