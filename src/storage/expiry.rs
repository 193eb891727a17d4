//! Expiration Index
//!
//! This module keeps track of *when* keys die. It is the second of the two
//! indices behind [`Store`](crate::storage::Store): the primary index answers
//! "what is the value of this key", the expiration index answers "which entry
//! expires next".
//!
//! ## Ordering
//!
//! Records are `(expire_at, key)` pairs kept in a `BTreeSet`, so they are
//! sorted by expiry time first and by key second:
//!
//! ```text
//!   (2, "a") < (2, "b") < (2, "c") < (5, "a") < (9, "z")
//!    ▲
//!    └── first(): the next entry to evict
//! ```
//!
//! Ties on the expiry time are therefore resolved by ascending key, which makes
//! eviction order fully deterministic.
//!
//! ## Immortal Entries
//!
//! Entries written with a TTL of zero carry [`Expiry::Never`]. They are never
//! inserted here at all, so no clock reading (not even `u64::MAX`) can make
//! them eligible for eviction.

use bytes::Bytes;
use std::collections::BTreeSet;

/// When an entry stops being retrievable.
///
/// The variant order matters: the derived `Ord` places `Never` after every
/// finite timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Expiry {
    /// Expires once the clock reads this many seconds or more.
    At(u64),
    /// Never expires.
    Never,
}

impl Expiry {
    /// Computes the expiry for an entry written at `now` with `ttl` seconds to live.
    ///
    /// A TTL of zero means the entry never expires.
    #[inline]
    pub fn from_ttl(ttl: u32, now: u64) -> Self {
        if ttl == 0 {
            Expiry::Never
        } else {
            Expiry::At(now.saturating_add(u64::from(ttl)))
        }
    }

    /// Returns true if an entry with this expiry is dead at `now`.
    #[inline]
    pub fn is_expired(&self, now: u64) -> bool {
        match self {
            Expiry::At(at) => *at <= now,
            Expiry::Never => false,
        }
    }

    /// Returns the finite timestamp, if any.
    #[inline]
    pub fn timestamp(&self) -> Option<u64> {
        match self {
            Expiry::At(at) => Some(*at),
            Expiry::Never => None,
        }
    }
}

/// Ordered set of `(expire_at, key)` records for entries with a finite TTL.
#[derive(Debug, Default, Clone)]
pub struct ExpirationIndex {
    records: BTreeSet<(u64, Bytes)>,
}

impl ExpirationIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `key` expires at `at`.
    ///
    /// Returns false if the exact record was already present.
    pub fn insert(&mut self, at: u64, key: Bytes) -> bool {
        self.records.insert((at, key))
    }

    /// Removes the record for `key` expiring at `at`.
    ///
    /// The caller must pass the expiry currently stored for the key; a record
    /// with any other timestamp is left untouched.
    pub fn remove(&mut self, at: u64, key: &Bytes) -> bool {
        self.records.remove(&(at, key.clone()))
    }

    /// Returns the record that expires first.
    pub fn first(&self) -> Option<(u64, &Bytes)> {
        self.records.first().map(|(at, key)| (*at, key))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_from_ttl() {
        assert_eq!(Expiry::from_ttl(0, 100), Expiry::Never);
        assert_eq!(Expiry::from_ttl(5, 100), Expiry::At(105));
        assert_eq!(Expiry::from_ttl(5, u64::MAX - 1), Expiry::At(u64::MAX));
    }

    #[test]
    fn test_expiry_is_expired() {
        assert!(!Expiry::At(10).is_expired(9));
        assert!(Expiry::At(10).is_expired(10));
        assert!(Expiry::At(10).is_expired(11));

        // Immortal entries survive even the largest clock reading
        assert!(!Expiry::Never.is_expired(u64::MAX));
    }

    #[test]
    fn test_never_sorts_after_every_timestamp() {
        assert!(Expiry::At(u64::MAX) < Expiry::Never);
        assert!(Expiry::At(0) < Expiry::At(1));
        assert_eq!(Expiry::Never.timestamp(), None);
        assert_eq!(Expiry::At(3).timestamp(), Some(3));
    }

    #[test]
    fn test_first_orders_by_time_then_key() {
        let mut index = ExpirationIndex::new();
        index.insert(5, Bytes::from("a"));
        index.insert(2, Bytes::from("c"));
        index.insert(2, Bytes::from("b"));

        assert_eq!(index.first(), Some((2, &Bytes::from("b"))));
        assert!(index.remove(2, &Bytes::from("b")));
        assert_eq!(index.first(), Some((2, &Bytes::from("c"))));
        assert!(index.remove(2, &Bytes::from("c")));
        assert_eq!(index.first(), Some((5, &Bytes::from("a"))));
    }

    #[test]
    fn test_remove_requires_matching_timestamp() {
        let mut index = ExpirationIndex::new();
        let key = Bytes::from("k");
        index.insert(7, key.clone());

        assert!(!index.remove(8, &key));
        assert_eq!(index.first(), Some((7, &key)));

        assert!(index.remove(7, &key));
        assert!(index.is_empty());
        assert_eq!(index.first(), None);
    }

    #[test]
    fn test_duplicate_insert() {
        let mut index = ExpirationIndex::new();
        assert!(index.insert(1, Bytes::from("k")));
        assert!(!index.insert(1, Bytes::from("k")));
        assert_eq!(index.len(), 1);

        index.clear();
        assert_eq!(index.len(), 0);
    }
}
