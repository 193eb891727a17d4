//! Dual-Index Storage Engine with TTL Support
//!
//! This module implements the core store of ttlkv: an ordered key-value map
//! where every entry may carry an expiry time, plus the bookkeeping needed to
//! find and evict expired entries in logarithmic time.
//!
//! ## Design Decisions
//!
//! 1. **Two Indices**: a `BTreeMap` keyed by key (range scans) and an
//!    [`ExpirationIndex`] keyed by `(expire_at, key)` (next victim).
//! 2. **Lazy Expiry**: reads treat an expired entry as absent but leave it in
//!    place. Memory is reclaimed only when the caller evicts, removes, or
//!    overwrites it.
//! 3. **Injected Clock**: the store is generic over [`Clock`] so tests drive
//!    time by hand.
//! 4. **Single Writer**: mutating operations take `&mut self`; there is no
//!    internal locking.
//!
//! ## Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Store<C>                             │
//! │                                                             │
//! │  primary: BTreeMap<Bytes, Entry>     expirations:           │
//! │  ┌──────┬───────────────────┐       BTreeSet<(u64, Bytes)>  │
//! │  │ "a"  │ "1", At(5)        │──────▶ (5, "a")               │
//! │  │ "b"  │ "2", Never        │        (not indexed)          │
//! │  │ "d"  │ "4", At(3)        │──────▶ (3, "d")               │
//! │  └──────┴───────────────────┘                               │
//! │                                                             │
//! │  clock: C ── now() ──▶ aliveness test: expire_at > now      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every change to a key's lifetime goes through one routine that clears the
//! old expiration record before installing the new state, so the two indices
//! never disagree.

use crate::clock::Clock;
use crate::storage::expiry::{ExpirationIndex, Expiry};
use bytes::Bytes;
use std::collections::BTreeMap;
use std::ops::Bound;
use tracing::{debug, trace};

/// Approximate per-entry bookkeeping overhead used by [`Store::memory_info`].
const ENTRY_OVERHEAD: usize = 64;

/// Represents a stored value with its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The actual value stored
    pub value: Bytes,
    /// When this entry expires
    pub expire_at: Expiry,
}

impl Entry {
    /// Creates a new entry.
    pub fn new(value: Bytes, expire_at: Expiry) -> Self {
        Self { value, expire_at }
    }

    /// Checks if this entry is still retrievable at `now`.
    #[inline]
    pub fn is_alive(&self, now: u64) -> bool {
        !self.expire_at.is_expired(now)
    }
}

/// The ttlkv store.
///
/// # Example
///
/// ```
/// use ttlkv::clock::ManualClock;
/// use ttlkv::storage::Store;
/// use bytes::Bytes;
///
/// let clock = ManualClock::new(0);
/// let mut store = Store::from_entries(
///     vec![("a", "1", 5), ("b", "2", 0)],
///     clock.clone(),
/// );
///
/// assert_eq!(store.get(b"a"), Some(Bytes::from("1")));
///
/// clock.advance(5);
/// assert_eq!(store.get(b"a"), None);
/// assert_eq!(
///     store.remove_one_expired_entry(),
///     Some((Bytes::from("a"), Bytes::from("1")))
/// );
/// assert_eq!(store.get(b"b"), Some(Bytes::from("2")));
/// ```
pub struct Store<C> {
    /// Key-ordered records, including expired ones not yet evicted
    primary: BTreeMap<Bytes, Entry>,

    /// `(expire_at, key)` for every record with a finite expiry
    expirations: ExpirationIndex,

    /// Time source
    clock: C,

    /// Statistics: total set operations
    set_count: u64,

    /// Statistics: total successful removals
    del_count: u64,

    /// Statistics: number of expired entries evicted
    evicted_count: u64,
}

impl<C> std::fmt::Debug for Store<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("keys", &self.primary.len())
            .field("expiring", &self.expirations.len())
            .field("set_count", &self.set_count)
            .field("del_count", &self.del_count)
            .field("evicted_count", &self.evicted_count)
            .finish()
    }
}

impl<C: Clock + Default> Default for Store<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<C: Clock> Store<C> {
    /// Creates an empty store reading time from `clock`.
    pub fn new(clock: C) -> Self {
        Self {
            primary: BTreeMap::new(),
            expirations: ExpirationIndex::new(),
            clock,
            set_count: 0,
            del_count: 0,
            evicted_count: 0,
        }
    }

    /// Creates a store populated from `(key, value, ttl)` triples.
    ///
    /// The triples are applied in order exactly as if each were passed to
    /// [`set`](Self::set), so a later duplicate key wins.
    pub fn from_entries<I, K, V>(entries: I, clock: C) -> Self
    where
        I: IntoIterator<Item = (K, V, u32)>,
        K: Into<Bytes>,
        V: Into<Bytes>,
    {
        let mut store = Self::new(clock);
        for (key, value, ttl) in entries {
            store.set(key, value, ttl);
        }
        debug!(
            keys = store.primary.len(),
            expiring = store.expirations.len(),
            "Store loaded from initial entries"
        );
        store
    }

    /// Returns the injected clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Replaces the lifetime state of `key`.
    ///
    /// `Some(entry)` installs or overwrites the record, `None` deletes it.
    /// The stale expiration record is always cleared first. Returns the
    /// previous primary record.
    fn relink(&mut self, key: Bytes, next: Option<Entry>) -> Option<Entry> {
        if let Some(at) = self.primary.get(&key[..]).and_then(|e| e.expire_at.timestamp()) {
            self.expirations.remove(at, &key);
        }

        match next {
            Some(entry) => {
                if let Some(at) = entry.expire_at.timestamp() {
                    self.expirations.insert(at, key.clone());
                }
                self.primary.insert(key, entry)
            }
            None => self.primary.remove(&key[..]),
        }
    }

    /// Sets a key-value pair with a TTL in seconds.
    ///
    /// A TTL of zero makes the entry immortal. Any existing value and TTL for
    /// the key are replaced unconditionally.
    pub fn set(&mut self, key: impl Into<Bytes>, value: impl Into<Bytes>, ttl: u32) {
        self.set_count += 1;

        let expire_at = Expiry::from_ttl(ttl, self.clock.now());
        self.relink(key.into(), Some(Entry::new(value.into(), expire_at)));
    }

    /// Deletes a key from both indices.
    ///
    /// Expired entries that have not been evicted yet are still removable.
    ///
    /// # Returns
    ///
    /// Returns `true` if a record was deleted, `false` if the key didn't exist.
    pub fn remove(&mut self, key: &[u8]) -> bool {
        if !self.primary.contains_key(key) {
            return false;
        }

        self.relink(Bytes::copy_from_slice(key), None);
        self.del_count += 1;
        true
    }

    /// Gets the value for a key.
    ///
    /// Returns `None` if the key doesn't exist or its TTL has lapsed. An
    /// expired record is left in place.
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        let now = self.clock.now();
        self.primary
            .get(key)
            .filter(|entry| entry.is_alive(now))
            .map(|entry| entry.value.clone())
    }

    /// Checks if a key exists and is not expired.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        let now = self.clock.now();
        self.primary
            .get(key)
            .map(|entry| entry.is_alive(now))
            .unwrap_or(false)
    }

    /// Returns the absolute expiry of a live key.
    pub fn expire_at(&self, key: &[u8]) -> Option<Expiry> {
        let now = self.clock.now();
        self.primary
            .get(key)
            .filter(|entry| entry.is_alive(now))
            .map(|entry| entry.expire_at)
    }

    /// Gets the remaining TTL for a key in seconds.
    ///
    /// # Returns
    ///
    /// - `Some(seconds)` if the key is alive and has an expiry
    /// - `Some(-1)` if the key is alive but never expires
    /// - `None` if the key doesn't exist or has expired
    pub fn ttl(&self, key: &[u8]) -> Option<i64> {
        let now = self.clock.now();
        self.primary
            .get(key)
            .filter(|entry| entry.is_alive(now))
            .map(|entry| match entry.expire_at {
                Expiry::At(at) => i64::try_from(at.saturating_sub(now)).unwrap_or(i64::MAX),
                Expiry::Never => -1,
            })
    }

    /// Returns up to `count` live pairs with keys `>= key`, in ascending key order.
    ///
    /// Expired records met during the scan are skipped and do not count
    /// towards `count`.
    pub fn get_many_sorted(&self, key: &[u8], count: u32) -> Vec<(Bytes, Bytes)> {
        if count == 0 {
            return Vec::new();
        }

        let now = self.clock.now();
        self.primary
            .range::<[u8], _>((Bound::Included(key), Bound::Unbounded))
            .filter(|(_, entry)| entry.is_alive(now))
            .take(count as usize)
            .map(|(k, entry)| (k.clone(), entry.value.clone()))
            .collect()
    }

    /// Removes one expired entry and returns it.
    ///
    /// The victim is the record with the smallest `(expire_at, key)`, so when
    /// several entries share an expiry time they come out in ascending key
    /// order. Returns `None` if nothing has expired.
    pub fn remove_one_expired_entry(&mut self) -> Option<(Bytes, Bytes)> {
        let now = self.clock.now();

        let key = match self.expirations.first() {
            Some((at, key)) if at <= now => key.clone(),
            _ => return None,
        };

        let entry = self.relink(key.clone(), None)?;
        self.evicted_count += 1;
        trace!(key = ?key, "Evicted expired entry");

        Some((key, entry.value))
    }

    /// Evicts up to `limit` expired entries.
    ///
    /// Entries come out in the same order as repeated calls to
    /// [`remove_one_expired_entry`](Self::remove_one_expired_entry).
    pub fn evict_expired(&mut self, limit: usize) -> Vec<(Bytes, Bytes)> {
        let mut evicted = Vec::new();
        while evicted.len() < limit {
            match self.remove_one_expired_entry() {
                Some(pair) => evicted.push(pair),
                None => break,
            }
        }

        if !evicted.is_empty() {
            debug!(
                evicted = evicted.len(),
                keys_remaining = self.primary.len(),
                "Expired entries evicted"
            );
        }

        evicted
    }

    /// Returns the earliest finite expiry currently indexed.
    ///
    /// The entry may already be expired; this is the time at which the next
    /// eviction becomes possible.
    pub fn next_expiry(&self) -> Option<u64> {
        self.expirations.first().map(|(at, _)| at)
    }

    /// Clears all data from the store.
    pub fn clear(&mut self) {
        self.primary.clear();
        self.expirations.clear();
    }

    /// Returns the number of stored records, including expired ones not yet
    /// evicted.
    pub fn len(&self) -> usize {
        self.primary.len()
    }

    /// Returns true if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }

    /// Returns the number of records with a finite expiry.
    pub fn expiring_len(&self) -> usize {
        self.expirations.len()
    }

    /// Returns store statistics.
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            keys: self.primary.len() as u64,
            expiring: self.expirations.len() as u64,
            set_ops: self.set_count,
            del_ops: self.del_count,
            evicted: self.evicted_count,
        }
    }

    /// Returns memory usage information for live entries (approximate).
    pub fn memory_info(&self) -> MemoryInfo {
        let now = self.clock.now();
        let mut total_keys = 0usize;
        let mut total_bytes = 0usize;

        for (key, entry) in self.primary.iter() {
            if entry.is_alive(now) {
                total_keys += 1;
                total_bytes += key.len() + entry.value.len() + ENTRY_OVERHEAD;
            }
        }

        MemoryInfo {
            keys: total_keys,
            used_memory: total_bytes,
        }
    }
}

/// Store statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of records currently stored
    pub keys: u64,
    /// Number of records with a finite expiry
    pub expiring: u64,
    /// Total SET operations
    pub set_ops: u64,
    /// Total successful removals
    pub del_ops: u64,
    /// Total expired entries evicted
    pub evicted: u64,
}

/// Memory usage information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryInfo {
    /// Number of live keys
    pub keys: usize,
    /// Approximate memory used in bytes
    pub used_memory: usize,
}
