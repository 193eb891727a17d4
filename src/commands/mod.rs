//! Command Handler Module
//!
//! This module implements the command processing layer of the ttlkv shell.
//! It turns a typed line into arguments, executes them against the store,
//! and returns a reply to print.
//!
//! ## Architecture
//!
//! ```text
//! Shell line
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  parse_line()   │  (parser)
//! └────────┬────────┘
//!          │ Vec<Bytes>
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (handler)
//! │                 │
//! │  - Dispatch     │
//! │  - Validate     │
//! │  - Execute      │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │    Store<C>     │  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! - Keys: `SET`, `GET`, `DEL`, `EXISTS`, `TTL`, `RANGE`
//! - Eviction: `EVICT`, `NEXTEXPIRY`
//! - Clock: `TIME`, `ADVANCE`, `SETTIME`
//! - Server: `PING`, `ECHO`, `INFO`, `DBSIZE`, `FLUSHDB`, `QUIT`

pub mod handler;
pub mod parser;
pub mod reply;

pub use handler::CommandHandler;
pub use parser::{parse_line, ParseError, ParseResult};
pub use reply::Reply;
