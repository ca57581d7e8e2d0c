//! Message-IDs already emitted.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Set of Message-IDs for which an event has been emitted.
///
/// Only grows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotifiedSet {
    ids: BTreeSet<String>,
}

impl NotifiedSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if an event for `message_id` was already emitted.
    #[must_use]
    pub fn already_notified(&self, message_id: &str) -> bool {
        self.ids.contains(message_id)
    }

    /// Records `message_id`. Returns false if it was already present.
    pub fn record(&mut self, message_id: &str) -> bool {
        if self.ids.contains(message_id) {
            return false;
        }
        self.ids.insert(message_id.to_string())
    }

    /// Number of recorded ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Recorded ids in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}
