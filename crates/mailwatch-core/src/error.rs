//! Error types for the core library.

use thiserror::Error;

use crate::config::ConfigErrors;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The mail source failed; the pass stops here.
    #[error("Mail source error: {0}")]
    Source(#[from] SourceError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// The agent configuration was rejected.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigErrors),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures reported by a [`MailSource`](crate::MailSource) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Connection or authentication failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A folder could not be selected or searched.
    #[error("Folder {folder}: {message}")]
    Folder {
        /// Folder name.
        folder: String,
        /// What went wrong.
        message: String,
    },

    /// A message could not be fetched.
    #[error("Fetching UID {uid} in {folder}: {message}")]
    Fetch {
        /// Folder name.
        folder: String,
        /// Message UID.
        uid: u32,
        /// What went wrong.
        message: String,
    },

    /// A store or expunge operation failed.
    #[error("Operation failed: {0}")]
    Operation(String),
}
