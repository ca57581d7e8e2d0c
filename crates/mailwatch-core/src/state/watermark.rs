//! Per-folder watermarks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{Uid, UidValidity};

/// Last processed UID per folder and UIDVALIDITY.
///
/// Serializes as `{folder: {uidvalidity: uid}}`. Only the current
/// incarnation of a folder is kept: advancing under a new UIDVALIDITY
/// drops the old entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watermarks {
    folders: BTreeMap<String, BTreeMap<u32, u32>>,
}

impl Watermarks {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last UID processed in `folder` under `validity`.
    #[must_use]
    pub fn last_seen(&self, folder: &str, validity: UidValidity) -> Option<Uid> {
        self.folders
            .get(folder)?
            .get(&validity.get())
            .and_then(|&uid| Uid::new(uid))
    }

    /// Returns true if `uid` is past the watermark, or there is none yet.
    #[must_use]
    pub fn is_unseen(&self, folder: &str, validity: UidValidity, uid: Uid) -> bool {
        self.last_seen(folder, validity).is_none_or(|last| uid > last)
    }

    /// Records `uid` as the last processed message.
    pub fn advance(&mut self, folder: &str, validity: UidValidity, uid: Uid) {
        let incarnations = self.folders.entry(folder.to_string()).or_default();
        if !incarnations.contains_key(&validity.get()) {
            incarnations.clear();
        }
        incarnations.insert(validity.get(), uid.get());
    }

    /// Folders with a watermark.
    pub fn folders(&self) -> impl Iterator<Item = &str> {
        self.folders.keys().map(String::as_str)
    }

    /// Returns true if no folder has a watermark.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn uid(n: u32) -> Uid {
        Uid::new(n).unwrap()
    }

    fn validity(n: u32) -> UidValidity {
        UidValidity::new(n).unwrap()
    }

    #[test]
    fn everything_is_unseen_without_a_watermark() {
        let marks = Watermarks::new();
        assert!(marks.is_unseen("INBOX", validity(1), uid(1)));
        assert_eq!(marks.last_seen("INBOX", validity(1)), None);
    }

    #[test]
    fn advance_moves_the_boundary() {
        let mut marks = Watermarks::new();
        marks.advance("INBOX", validity(7), uid(10));
        assert!(!marks.is_unseen("INBOX", validity(7), uid(9)));
        assert!(!marks.is_unseen("INBOX", validity(7), uid(10)));
        assert!(marks.is_unseen("INBOX", validity(7), uid(11)));
        assert!(marks.is_unseen("Archive", validity(7), uid(1)));
    }

    #[test]
    fn new_uidvalidity_starts_fresh() {
        let mut marks = Watermarks::new();
        marks.advance("INBOX", validity(1), uid(500));
        assert!(marks.is_unseen("INBOX", validity(2), uid(3)));

        marks.advance("INBOX", validity(2), uid(3));
        assert_eq!(marks.last_seen("INBOX", validity(2)), Some(uid(3)));
        assert_eq!(marks.last_seen("INBOX", validity(1)), None);
    }

    #[test]
    fn serialized_shape() {
        let mut marks = Watermarks::new();
        marks.advance("INBOX", validity(1_400_000_000), uid(42));
        let json = serde_json::to_string(&marks).unwrap();
        assert_eq!(json, r#"{"INBOX":{"1400000000":42}}"#);
        assert_eq!(serde_json::from_str::<Watermarks>(&json).unwrap(), marks);
    }

    #[test]
    fn zero_uid_in_stored_state_is_ignored() {
        let marks: Watermarks = serde_json::from_str(r#"{"INBOX":{"5":0}}"#).unwrap();
        assert_eq!(marks.last_seen("INBOX", validity(5)), None);
        assert!(marks.is_unseen("INBOX", validity(5), uid(1)));
    }

    proptest! {
        #[test]
        fn watermark_is_the_highest_processed_uid(
            mut uids in proptest::collection::vec(1u32..10_000, 1..50)
        ) {
            uids.sort_unstable();
            uids.dedup();
            let mut marks = Watermarks::new();
            for &n in &uids {
                prop_assert!(marks.is_unseen("INBOX", validity(3), uid(n)));
                marks.advance("INBOX", validity(3), uid(n));
            }
            let max = *uids.last().unwrap();
            prop_assert_eq!(marks.last_seen("INBOX", validity(3)), Some(uid(max)));
            for &n in &uids {
                prop_assert!(!marks.is_unseen("INBOX", validity(3), uid(n)));
            }
            prop_assert!(marks.is_unseen("INBOX", validity(3), uid(max + 1)));
        }
    }
}
