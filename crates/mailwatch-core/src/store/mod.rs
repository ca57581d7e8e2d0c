//! Durable check state.
//!
//! The engine commits after every processed message. A commit carrying an
//! event must persist the event and the state that records it as notified
//! together, or neither.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::future::Future;

use crate::error::Result;
use crate::event::EventPayload;
use crate::state::CheckState;

/// Persistence for one agent's [`CheckState`] and emitted events.
pub trait StateStore {
    /// Loads the last committed state, or a blank one.
    fn load(&mut self) -> impl Future<Output = Result<CheckState>> + Send;

    /// Persists `state`, and `event` if given, atomically.
    fn commit(
        &mut self,
        state: &CheckState,
        event: Option<&EventPayload>,
    ) -> impl Future<Output = Result<()>> + Send;
}
