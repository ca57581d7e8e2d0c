//! # mailwatch-mime
//!
//! Lenient RFC 5322/MIME reading for mailbox watchers.
//!
//! ## Features
//!
//! - **Header parsing**: unfolding, repeated fields, raw 8-bit values kept intact
//! - **Multipart**: nested bodies flattened into leaf parts
//! - **Decoding**: Base64, Quoted-Printable, RFC 2047 encoded words, ISO-8859-1
//! - **Addresses**: display names, groups and comments, with explicit failures
//! - **Attachments**: disposition and file-name detection
//!
//! Nothing here tries to make bytes "valid": header values and decoded bodies
//! are handed out as bytes, and the consumer decides how to sanitize them.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailwatch_mime::Message;
//!
//! let raw = b"From: sender@example.com\r\n\
//!             Subject: Test\r\n\
//!             \r\n\
//!             Hello, World!";
//!
//! let message = Message::parse(raw);
//! let from = message.addresses("from")?;
//! let body = message.parts[0].text();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;

pub use address::{Address, parse_address_list};
pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Message, Part, TransferEncoding};
