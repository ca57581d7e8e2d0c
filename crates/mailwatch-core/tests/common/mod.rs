//! Shared fixtures: a scripted mail source and a message builder.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::future::{Future, ready};

use mailwatch_core::{
    AgentConfig, AgentOptions, MailSource, ParsedMessage, SourceError, Uid, UidValidity,
};
use serde_json::Value;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn uid(n: u32) -> Uid {
    Uid::new(n).unwrap()
}

pub fn validity(n: u32) -> UidValidity {
    UidValidity::new(n).unwrap()
}

/// Validated config for `INBOX` plus the given option overrides.
pub fn config(overrides: Value) -> AgentConfig {
    let mut options = serde_json::json!({
        "host": "imap.example.com",
        "username": "agent@example.com",
        "password": "secret",
        "folders": ["INBOX"],
    });
    for (key, value) in overrides.as_object().unwrap() {
        options[key] = value.clone();
    }
    serde_json::from_value::<AgentOptions>(options)
        .unwrap()
        .validate()
        .unwrap()
}

/// Builds RFC 5322 messages.
#[derive(Debug, Clone)]
pub struct Mail {
    headers: Vec<(String, String)>,
    body: String,
}

impl Mail {
    pub fn new(message_id: &str) -> Self {
        Self::without_message_id().header("Message-ID", &format!("<{message_id}>"))
    }

    pub fn without_message_id() -> Self {
        Self {
            headers: vec![
                ("From".into(), "Sender <sender@example.com>".into()),
                ("To".into(), "John.Doe@example.com".into()),
                ("Subject".into(), "Hello".into()),
                ("Date".into(), "Fri, 9 May 2014 16:00:00 +0900".into()),
            ],
            body: "Hello there.\r\n".into(),
        }
    }

    /// Sets a header, replacing any earlier value.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn without(mut self, name: &str) -> Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = body.replace("\r\n", "\n").replace('\n', "\r\n");
        self
    }

    pub fn into_raw(self) -> Vec<u8> {
        let mut raw = String::new();
        for (name, value) in &self.headers {
            raw.push_str(&format!("{name}: {value}\r\n"));
        }
        raw.push_str("\r\n");
        raw.push_str(&self.body);
        raw.into_bytes()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Select(String),
    Search(String, Option<u32>),
    Fetch(String, u32),
    MarkAsRead(String, u32),
    Delete(String, u32),
    Expunge(String),
}

#[derive(Debug, Clone)]
struct Stored {
    raw: Vec<u8>,
    seen: bool,
    deleted: bool,
}

#[derive(Debug, Clone)]
struct Mailbox {
    validity: UidValidity,
    messages: BTreeMap<u32, Stored>,
}

/// An in-memory mailbox that records every call made to it.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    folders: BTreeMap<String, Mailbox>,
    pub calls: Vec<Call>,
    /// Fetching this UID fails.
    pub fail_fetch: Option<u32>,
    /// Like servers answering `UID n:*` with the last message even when its
    /// UID is below `n`.
    pub ignore_after: bool,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn folder(mut self, name: &str, validity: UidValidity) -> Self {
        self.folders.insert(
            name.to_string(),
            Mailbox {
                validity,
                messages: BTreeMap::new(),
            },
        );
        self
    }

    pub fn with_message(mut self, folder: &str, uid: u32, raw: Vec<u8>) -> Self {
        self.add_message(folder, uid, raw);
        self
    }

    pub fn add_message(&mut self, folder: &str, uid: u32, raw: Vec<u8>) {
        self.folders
            .get_mut(folder)
            .unwrap()
            .messages
            .insert(uid, Stored {
                raw,
                seen: false,
                deleted: false,
            });
    }

    /// Renumbers a folder under a new UIDVALIDITY, as after a server rebuild.
    pub fn rebuild(&mut self, folder: &str, validity: UidValidity, first_uid: u32) {
        let mailbox = self.folders.get_mut(folder).unwrap();
        let messages = std::mem::take(&mut mailbox.messages);
        mailbox.validity = validity;
        for (offset, stored) in (0..).zip(messages.into_values()) {
            mailbox.messages.insert(first_uid + offset, stored);
        }
    }

    pub fn is_seen(&self, folder: &str, uid: u32) -> bool {
        self.folders[folder].messages[&uid].seen
    }

    pub fn contains(&self, folder: &str, uid: u32) -> bool {
        self.folders[folder].messages.contains_key(&uid)
    }

    pub fn count_calls(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|call| matches(call)).count()
    }

    fn mailbox(&mut self, folder: &str) -> Result<&mut Mailbox, SourceError> {
        self.folders.get_mut(folder).ok_or_else(|| SourceError::Folder {
            folder: folder.to_string(),
            message: "no such folder".to_string(),
        })
    }

    fn stored(&mut self, folder: &str, uid: Uid) -> Result<&mut Stored, SourceError> {
        self.mailbox(folder)?
            .messages
            .get_mut(&uid.get())
            .ok_or_else(|| SourceError::Operation(format!("UID {uid} not in {folder}")))
    }

    fn do_search(&mut self, folder: &str, after: Option<Uid>) -> Result<Vec<Uid>, SourceError> {
        self.calls
            .push(Call::Search(folder.to_string(), after.map(Uid::get)));
        let ignore_after = self.ignore_after;
        let mailbox = self.mailbox(folder)?;
        let mut uids: Vec<Uid> = mailbox
            .messages
            .iter()
            .filter(|(_, stored)| !stored.seen && !stored.deleted)
            .map(|(&n, _)| uid(n))
            .filter(|&u| ignore_after || after.is_none_or(|after| u > after))
            .collect();
        uids.reverse();
        Ok(uids)
    }

    fn do_fetch(&mut self, folder: &str, uid: Uid) -> Result<Option<ParsedMessage>, SourceError> {
        self.calls.push(Call::Fetch(folder.to_string(), uid.get()));
        if self.fail_fetch == Some(uid.get()) {
            return Err(SourceError::Fetch {
                folder: folder.to_string(),
                uid: uid.get(),
                message: "connection reset".to_string(),
            });
        }
        let Some(stored) = self.mailbox(folder)?.messages.get(&uid.get()) else {
            return Ok(None);
        };
        Ok(Some(ParsedMessage::parse(uid, stored.raw.clone())))
    }
}

impl MailSource for ScriptedSource {
    type Message = ParsedMessage;

    fn select(
        &mut self,
        folder: &str,
    ) -> impl Future<Output = Result<UidValidity, SourceError>> + Send {
        self.calls.push(Call::Select(folder.to_string()));
        ready(self.mailbox(folder).map(|mailbox| mailbox.validity))
    }

    fn search_unread(
        &mut self,
        folder: &str,
        after: Option<Uid>,
    ) -> impl Future<Output = Result<Vec<Uid>, SourceError>> + Send {
        ready(self.do_search(folder, after))
    }

    fn fetch(
        &mut self,
        folder: &str,
        uid: Uid,
    ) -> impl Future<Output = Result<Option<ParsedMessage>, SourceError>> + Send {
        ready(self.do_fetch(folder, uid))
    }

    fn mark_as_read(
        &mut self,
        folder: &str,
        uid: Uid,
    ) -> impl Future<Output = Result<(), SourceError>> + Send {
        self.calls.push(Call::MarkAsRead(folder.to_string(), uid.get()));
        ready(self.stored(folder, uid).map(|stored| stored.seen = true))
    }

    fn delete(
        &mut self,
        folder: &str,
        uid: Uid,
    ) -> impl Future<Output = Result<(), SourceError>> + Send {
        self.calls.push(Call::Delete(folder.to_string(), uid.get()));
        ready(self.stored(folder, uid).map(|stored| stored.deleted = true))
    }

    fn expunge(&mut self, folder: &str) -> impl Future<Output = Result<(), SourceError>> + Send {
        self.calls.push(Call::Expunge(folder.to_string()));
        ready(self.mailbox(folder).map(|mailbox| {
            mailbox.messages.retain(|_, stored| !stored.deleted);
        }))
    }
}
