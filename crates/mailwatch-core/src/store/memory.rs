//! In-process state store.

use std::future::{Future, ready};

use super::StateStore;
use crate::error::Result;
use crate::event::EventPayload;
use crate::state::CheckState;

/// Keeps the committed state and every committed event in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: CheckState,
    events: Vec<EventPayload>,
    commits: usize,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `state`.
    #[must_use]
    pub fn with_state(state: CheckState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    /// Last committed state.
    #[must_use]
    pub const fn state(&self) -> &CheckState {
        &self.state
    }

    /// Committed events, oldest first.
    #[must_use]
    pub fn events(&self) -> &[EventPayload] {
        &self.events
    }

    /// Removes and returns the committed events.
    pub fn take_events(&mut self) -> Vec<EventPayload> {
        std::mem::take(&mut self.events)
    }

    /// Number of commits so far.
    #[must_use]
    pub const fn commits(&self) -> usize {
        self.commits
    }
}

impl StateStore for MemoryStore {
    fn load(&mut self) -> impl Future<Output = Result<CheckState>> + Send {
        ready(Ok(self.state.clone()))
    }

    fn commit(
        &mut self,
        state: &CheckState,
        event: Option<&EventPayload>,
    ) -> impl Future<Output = Result<()>> + Send {
        self.state = state.clone();
        if let Some(event) = event {
            self.events.push(event.clone());
        }
        self.commits += 1;
        ready(Ok(()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Uid, UidValidity};

    #[tokio::test]
    async fn commit_then_load() {
        let mut store = MemoryStore::new();
        assert_eq!(store.load().await.unwrap(), CheckState::default());

        let mut state = CheckState::new();
        state
            .lastseen
            .advance("INBOX", UidValidity::new(1).unwrap(), Uid::new(2).unwrap());
        store.commit(&state, None).await.unwrap();

        assert_eq!(store.load().await.unwrap(), state);
        assert_eq!(store.commits(), 1);
        assert!(store.events().is_empty());
    }
}
