//! Check state carried between passes.

mod notified;
mod watermark;

pub use notified::NotifiedSet;
pub use watermark::Watermarks;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Everything the engine remembers between passes.
///
/// Serializes as `{"lastseen": {...}, "notified": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckState {
    /// Watermarks per folder.
    pub lastseen: Watermarks,
    /// Message-IDs already emitted.
    pub notified: NotifiedSet,
}

impl CheckState {
    /// Creates a blank state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a state from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not a valid state document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the state to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
