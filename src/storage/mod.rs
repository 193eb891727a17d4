//! Storage Engine Module
//!
//! This module provides the core storage functionality for ttlkv: an ordered
//! key-value store with per-entry TTL and caller-driven eviction.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Store<C>                             │
//! │  ┌───────────────────────┐   ┌───────────────────────────┐  │
//! │  │    Primary Index      │   │    ExpirationIndex        │  │
//! │  │ BTreeMap<key, Entry>  │   │ BTreeSet<(expire_at,key)> │  │
//! │  └───────────────────────┘   └───────────────────────────┘  │
//! └─────────────────────────────┬───────────────────────────────┘
//!                               │ now()
//!                        ┌──────┴──────┐
//!                        │  C: Clock   │
//!                        └─────────────┘
//! ```
//!
//! ## Features
//!
//! - **Ordered Scans**: `get_many_sorted` walks keys in lexicographic order
//! - **TTL Support**: keys can have a time-to-live in seconds
//! - **Lazy Expiry**: expired keys read as absent but stay until evicted
//! - **Explicit Eviction**: `remove_one_expired_entry` frees the entry that
//!   expired first
//!
//! ## Example
//!
//! ```
//! use ttlkv::clock::ManualClock;
//! use ttlkv::storage::Store;
//! use bytes::Bytes;
//!
//! let clock = ManualClock::new(0);
//! let mut store = Store::new(clock.clone());
//!
//! store.set("name", "Ariz", 0);
//! store.set("session", "token123", 60);
//!
//! assert_eq!(store.get(b"name"), Some(Bytes::from("Ariz")));
//!
//! clock.advance(60);
//! assert_eq!(store.get(b"session"), None);
//! assert_eq!(
//!     store.remove_one_expired_entry(),
//!     Some((Bytes::from("session"), Bytes::from("token123")))
//! );
//! ```

pub mod engine;
pub mod expiry;

// Re-export commonly used types
pub use engine::{Entry, MemoryInfo, StorageStats, Store};
pub use expiry::{ExpirationIndex, Expiry};
