//! # ttlkv - An In-Memory Key-Value Store with Expiring Entries
//!
//! ttlkv keeps byte-string keys mapped to byte-string values. Every entry may
//! carry a time-to-live in seconds; once it elapses the entry reads as absent,
//! and the caller reclaims its storage explicitly, oldest expiry first.
//!
//! ## Features
//!
//! - **Ordered Keys**: range scans return live entries in lexicographic order
//! - **TTL Support**: keys can expire after a number of seconds
//! - **Deterministic Eviction**: expired entries are removed one at a time in
//!   order of expiry time, ties broken by key
//! - **Injected Time**: the current time comes from a [`Clock`], so tests can
//!   drive expiry by hand
//! - **Interactive Shell**: the `ttlkv` binary exposes the store over a
//!   line-oriented command shell
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                               ttlkv                                 │
//! │                                                                     │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐              │
//! │  │   stdin /   │───>│   Session   │───>│  Command    │              │
//! │  │   stdout    │    │ (tokenizer) │    │  Handler    │              │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘              │
//! │                                               │                     │
//! │                                               ▼                     │
//! │                     ┌──────────────────────────────────────────────┐│
//! │                     │                  Store<C>                    ││
//! │                     │  ┌─────────────────┐  ┌────────────────────┐ ││
//! │                     │  │ Primary Index   │  │ Expiration Index   │ ││
//! │                     │  │ key -> Entry    │  │ (expire_at, key)   │ ││
//! │                     │  └─────────────────┘  └────────────────────┘ ││
//! │                     └──────────────────────┬───────────────────────┘│
//! │                                            │                        │
//! │                                   ┌────────┴────────┐               │
//! │                                   │    C: Clock     │               │
//! │                                   └─────────────────┘               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use ttlkv::{ManualClock, Store};
//! use bytes::Bytes;
//!
//! let clock = ManualClock::new(1_000);
//! let mut store = Store::from_entries(
//!     vec![("a", "1", 0), ("b", "2", 10), ("c", "3", 5)],
//!     clock.clone(),
//! );
//!
//! assert_eq!(
//!     store.get_many_sorted(b"b", 2),
//!     vec![
//!         (Bytes::from("b"), Bytes::from("2")),
//!         (Bytes::from("c"), Bytes::from("3")),
//!     ]
//! );
//!
//! clock.advance(5);
//! assert_eq!(store.get(b"c"), None);
//! assert_eq!(
//!     store.remove_one_expired_entry(),
//!     Some((Bytes::from("c"), Bytes::from("3")))
//! );
//! assert_eq!(store.remove_one_expired_entry(), None);
//! ```
//!
//! ## Module Overview
//!
//! - [`clock`]: time sources
//! - [`storage`]: the store and its two indices
//! - [`commands`]: shell tokenizer, command dispatch and replies
//! - [`shell`]: the interactive session loop
//!
//! ## Design Highlights
//!
//! ### Two Indices, One Routine
//!
//! Every change to a key's lifetime (set, remove, eviction) goes through a
//! single private routine that updates both indices, so the Expiration Index
//! always holds exactly one record per expiring key.
//!
//! ### Lazy Expiry
//!
//! Reads filter expired entries but never remove them. Storage is reclaimed
//! only by [`Store::remove_one_expired_entry`] and
//! [`Store::evict_expired`], which makes eviction order deterministic.

pub mod clock;
pub mod commands;
pub mod shell;
pub mod storage;

// Re-export commonly used types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use commands::{parse_line, CommandHandler, ParseError, Reply};
pub use shell::{run_session, Session, SessionError, SessionStats};
pub use storage::{Entry, ExpirationIndex, Expiry, MemoryInfo, StorageStats, Store};

/// Version of ttlkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
