//! The check pass.
//!
//! One pass walks every configured folder in order and, within a folder,
//! every unread message past the watermark in ascending UID order. For each
//! message:
//!
//! 1. pick the body part and evaluate the conditions;
//! 2. if selected and its Message-ID is new, record it and commit the state
//!    together with the event;
//! 3. if selected, apply the configured post-actions, even to duplicates;
//! 4. advance the watermark and commit.
//!
//! A mail source or store failure ends the pass. Everything committed before
//! it stays committed, so the next pass resumes at the failed message.

use tracing::{debug, info};

use crate::body::select_body;
use crate::config::AgentConfig;
use crate::error::Result;
use crate::event::EventPayload;
use crate::message::CandidateMessage;
use crate::source::MailSource;
use crate::state::CheckState;
use crate::store::StateStore;

/// Counters for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// Folders fully processed.
    pub folders_checked: usize,
    /// Messages fetched and evaluated.
    pub messages_examined: usize,
    /// Messages that passed body selection and conditions.
    pub messages_matched: usize,
    /// Events emitted.
    pub events_emitted: usize,
    /// Matched messages whose Message-ID was already notified.
    pub duplicates: usize,
    /// Messages marked as read.
    pub marked_read: usize,
    /// Messages flagged as deleted.
    pub deleted: usize,
}

/// Result of a successful pass.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    /// State after the pass; identical to what the store last committed.
    pub state: CheckState,
    /// What happened.
    pub report: CheckReport,
}

/// Runs check passes for one agent configuration.
#[derive(Debug, Clone, Copy)]
pub struct CheckEngine<'a> {
    config: &'a AgentConfig,
}

impl<'a> CheckEngine<'a> {
    /// Creates an engine for `config`.
    #[must_use]
    pub const fn new(config: &'a AgentConfig) -> Self {
        Self { config }
    }

    /// Loads the state from `store` and runs a pass.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or the pass fails.
    pub async fn load_and_check<S, T>(&self, source: &mut S, store: &mut T) -> Result<CheckOutcome>
    where
        S: MailSource,
        T: StateStore,
    {
        let state = store.load().await?;
        self.check(state, source, store).await
    }

    /// Runs one pass starting from `state`.
    ///
    /// On error, discard `state`: the store holds everything that was
    /// committed.
    ///
    /// # Errors
    ///
    /// Returns an error if the mail source or the store fails.
    pub async fn check<S, T>(
        &self,
        mut state: CheckState,
        source: &mut S,
        store: &mut T,
    ) -> Result<CheckOutcome>
    where
        S: MailSource,
        T: StateStore,
    {
        info!("Checking {} folder(s)", self.config.folders.len());
        let mut report = CheckReport::default();

        for folder in &self.config.folders {
            self.check_folder(folder, &mut state, source, store, &mut report)
                .await?;
            report.folders_checked += 1;
        }

        info!(
            "Check finished: {} examined, {} matched, {} emitted, {} duplicate(s)",
            report.messages_examined,
            report.messages_matched,
            report.events_emitted,
            report.duplicates
        );
        Ok(CheckOutcome { state, report })
    }

    async fn check_folder<S, T>(
        &self,
        folder: &str,
        state: &mut CheckState,
        source: &mut S,
        store: &mut T,
        report: &mut CheckReport,
    ) -> Result<()>
    where
        S: MailSource,
        T: StateStore,
    {
        let validity = source.select(folder).await?;
        let after = state.lastseen.last_seen(folder, validity);
        let mut uids = source.search_unread(folder, after).await?;
        uids.sort_unstable();
        uids.dedup();
        debug!(
            "{folder}: UIDVALIDITY {validity}, {} unread candidate(s)",
            uids.len()
        );

        let mut expunge = false;
        for uid in uids {
            if !state.lastseen.is_unseen(folder, validity, uid) {
                debug!("{folder}: UID {uid} already processed");
                continue;
            }
            let Some(message) = source.fetch(folder, uid).await? else {
                debug!("{folder}: UID {uid} vanished before fetch");
                continue;
            };
            report.messages_examined += 1;

            if let Some(event) = self.select(folder, &message) {
                report.messages_matched += 1;
                match event.message_id.as_deref() {
                    Some(id) if state.notified.already_notified(id) => {
                        debug!("{folder}: UID {uid} duplicates already notified <{id}>");
                        report.duplicates += 1;
                    }
                    message_id => {
                        if let Some(id) = message_id {
                            state.notified.record(id);
                        }
                        store.commit(state, Some(&event)).await?;
                        report.events_emitted += 1;
                        info!("{folder}: emitted event for UID {uid}");
                    }
                }

                if self.config.mark_as_read {
                    source.mark_as_read(folder, uid).await?;
                    report.marked_read += 1;
                }
                if self.config.delete {
                    source.delete(folder, uid).await?;
                    report.deleted += 1;
                    expunge = true;
                }
            }

            state.lastseen.advance(folder, validity, uid);
            store.commit(state, None).await?;
        }

        if expunge {
            debug!("{folder}: expunging");
            source.expunge(folder).await?;
        }
        Ok(())
    }

    /// Body selection and conditions. `None` means the message is skipped.
    fn select<M>(&self, folder: &str, message: &M) -> Option<EventPayload>
    where
        M: CandidateMessage,
    {
        let Some(body) = select_body(message, &self.config.mime_types) else {
            debug!(
                "{folder}: UID {} has no body part of type {:?}",
                message.uid(),
                self.config.mime_types
            );
            return None;
        };
        let matches = self.config.conditions.evaluate(message, Some(&body))?;
        debug!("{folder}: UID {} matched", message.uid());
        Some(EventPayload::build(self.config, folder, message, body, matches))
    }
}
