//! Shell Module
//!
//! This module runs the interactive ttlkv shell. A [`Session`] reads one
//! command per line, executes it through a
//! [`CommandHandler`](crate::commands::CommandHandler) and writes the reply.
//!
//! Sessions are generic over their input and output, so the binary drives one
//! over stdin/stdout while tests drive one over in-memory buffers.

pub mod session;

pub use session::{run_session, Session, SessionError, SessionStats, MAX_LINE_SIZE};
