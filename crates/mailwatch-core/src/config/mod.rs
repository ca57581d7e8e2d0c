//! Agent configuration.
//!
//! [`AgentOptions`] is what the host application stores; [`AgentConfig`] is
//! what the engine runs on. Validation sits between them and reports every
//! problem at once.

mod model;
mod options;
mod validation;

pub use model::{AgentConfig, ConnectionConfig, DEFAULT_MIME_TYPES, HeaderStyle};
pub use options::AgentOptions;
pub(crate) use options::loose_bool;
pub use validation::{ConfigErrors, ValidationError};
