//! # mailwatch-core
//!
//! Message selection and state tracking for agents that watch IMAP folders.
//!
//! This crate provides:
//! - **Configuration** - loose option documents validated into an [`AgentConfig`]
//! - **Condition matching** - glob and regex conditions with named captures
//! - **Body selection** - MIME type priority over inline parts
//! - **Scrubbing** - invalid bytes rendered as visible `<hh>` escapes
//! - **State tracking** - per-folder UID watermarks and a notified Message-ID set
//! - **Check engine** - one pass over all folders, emitting deduplicated events
//! - **Persistence** - in-memory and `SQLite` state stores
//!
//! The IMAP connection itself lives behind the [`MailSource`] trait.
//!
//! ## Example
//!
//! ```ignore
//! use mailwatch_core::{AgentOptions, CheckEngine, SqliteStore};
//!
//! let config = AgentOptions::from_json(options_json)?.validate()?;
//! let mut store = SqliteStore::new("mailwatch.db", "invoices").await?;
//! let outcome = CheckEngine::new(&config)
//!     .load_and_check(&mut imap_source, &mut store)
//!     .await?;
//! for event in store.events().await? {
//!     println!("{}", serde_json::to_string(&event)?);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod body;
pub mod condition;
pub mod config;
mod engine;
mod error;
mod event;
mod message;
mod scrub;
mod source;
pub mod state;
pub mod store;
mod types;

pub use body::{SelectedBody, select_body};
pub use condition::{CaptureMap, Conditions, Field, Pattern, PatternKind};
pub use config::{
    AgentConfig, AgentOptions, ConfigErrors, ConnectionConfig, HeaderStyle, ValidationError,
};
pub use engine::{CheckEngine, CheckOutcome, CheckReport};
pub use error::{Error, Result, SourceError};
pub use event::EventPayload;
pub use message::{AddressError, AddressField, BodyPart, CandidateMessage, ParsedMessage};
pub use scrub::scrub;
pub use source::MailSource;
pub use state::{CheckState, NotifiedSet, Watermarks};
pub use store::{MemoryStore, SqliteStore, StateStore};
pub use types::{Uid, UidValidity};
