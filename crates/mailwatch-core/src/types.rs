//! Mailbox identifiers.
//!
//! UIDs and UIDVALIDITY values as the mail source reports them.

use std::num::NonZeroU32;

/// Unique identifier for a message within one folder incarnation.
///
/// Combined with [`UidValidity`], a UID identifies a message for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uid(pub NonZeroU32);

impl Uid {
    /// Creates a new UID.
    ///
    /// Returns `None` if the value is 0.
    #[must_use]
    pub fn new(n: u32) -> Option<Self> {
        NonZeroU32::new(n).map(Self)
    }

    /// Returns the underlying value.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl std::fmt::Display for Uid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// UIDVALIDITY value for a folder: the incarnation its UIDs belong to.
///
/// If this value changes, every watermark recorded for the folder is void.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UidValidity(pub NonZeroU32);

impl UidValidity {
    /// Creates a new UIDVALIDITY.
    ///
    /// Returns `None` if the value is 0.
    #[must_use]
    pub fn new(n: u32) -> Option<Self> {
        NonZeroU32::new(n).map(Self)
    }

    /// Returns the underlying value.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl std::fmt::Display for UidValidity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn uid_rejects_zero() {
        assert!(Uid::new(0).is_none());
        assert_eq!(Uid::new(7).unwrap().get(), 7);
    }

    #[test]
    fn uid_ordering_and_display() {
        let a = Uid::new(1).unwrap();
        let b = Uid::new(20).unwrap();
        assert!(a < b);
        assert_eq!(format!("{b}"), "20");
    }

    #[test]
    fn uid_validity_rejects_zero() {
        assert!(UidValidity::new(0).is_none());
        assert_eq!(UidValidity::new(u32::MAX).unwrap().get(), u32::MAX);
    }
}
