//! Mail source contract.

use std::future::Future;

use crate::error::SourceError;
use crate::message::CandidateMessage;
use crate::types::{Uid, UidValidity};

/// Access to the folders of one mailbox.
///
/// Implemented by IMAP adapters outside this crate. The engine calls these
/// methods strictly one at a time, so an implementation can drive a single
/// connection.
pub trait MailSource {
    /// Message type produced by [`fetch`](Self::fetch).
    type Message: CandidateMessage + Send;

    /// Selects a folder and returns its UIDVALIDITY.
    fn select(
        &mut self,
        folder: &str,
    ) -> impl Future<Output = Result<UidValidity, SourceError>> + Send;

    /// UIDs of unread messages in `folder`, restricted to UIDs greater than
    /// `after` when given. Order does not matter.
    fn search_unread(
        &mut self,
        folder: &str,
        after: Option<Uid>,
    ) -> impl Future<Output = Result<Vec<Uid>, SourceError>> + Send;

    /// Fetches a message. `None` if it vanished since the search.
    ///
    /// An error stops the pass and is retried at the same UID next time, so
    /// reserve it for transport failures. Malformed content is still a
    /// message; [`ParsedMessage::parse`](crate::ParsedMessage::parse) accepts
    /// any bytes.
    fn fetch(
        &mut self,
        folder: &str,
        uid: Uid,
    ) -> impl Future<Output = Result<Option<Self::Message>, SourceError>> + Send;

    /// Sets the `\Seen` flag.
    fn mark_as_read(
        &mut self,
        folder: &str,
        uid: Uid,
    ) -> impl Future<Output = Result<(), SourceError>> + Send;

    /// Sets the `\Deleted` flag.
    fn delete(
        &mut self,
        folder: &str,
        uid: Uid,
    ) -> impl Future<Output = Result<(), SourceError>> + Send;

    /// Removes messages flagged as deleted.
    fn expunge(&mut self, folder: &str) -> impl Future<Output = Result<(), SourceError>> + Send;
}
