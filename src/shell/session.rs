//! Shell Session
//!
//! This module drives one interactive session: it reads lines from any async
//! reader, executes them against a [`CommandHandler`], and writes the rendered
//! replies to any async writer.
//!
//! ## Session Lifecycle
//!
//! ```text
//! 1. Session created around a reader, a writer and a handler
//!        │
//!        ▼
//! 2. ┌──────────────────────────────┐
//!    │      Main Loop               │
//!    │                              │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Write prompt (optional) │ │
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Read one line           │ │
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Tokenize + execute      │ │
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Write reply             │ │
//!    │  └───────────┬─────────────┘ │
//!    │              ▼               │
//!    │         [Loop back]          │
//!    └──────────────────────────────┘
//!        │
//!        ▼
//! 3. End of input or QUIT
//! ```
//!
//! Tokenizer errors and failed commands are reported as error replies; only
//! I/O failures and oversized lines end the session.

use crate::clock::Clock;
use crate::commands::{parse_line, CommandHandler, Reply};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, trace, warn};

/// Maximum size of a single input line (1 MB)
pub const MAX_LINE_SIZE: usize = 1024 * 1024;

/// Statistics for one session
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    /// Total commands executed
    pub commands_processed: u64,
    /// Replies that were errors (including tokenizer errors)
    pub errors: u64,
    /// Total bytes read
    pub bytes_read: u64,
    /// Total bytes written
    pub bytes_written: u64,
}

/// Errors that end a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// I/O error on the input or output stream
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A line exceeded [`MAX_LINE_SIZE`]
    #[error("Line too long: more than {max} bytes")]
    LineTooLong { max: usize },
}

/// An interactive shell session over an async reader/writer pair.
pub struct Session<R, W, C> {
    /// Line-oriented input
    reader: R,

    /// Reply output
    writer: W,

    /// Executes commands against the store
    handler: CommandHandler<C>,

    /// Buffer for the current line
    line: Vec<u8>,

    /// Printed before every line is read
    prompt: Option<String>,

    /// Session statistics
    stats: SessionStats,
}

impl<R, W, C> Session<R, W, C>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    C: Clock,
{
    /// Creates a new session.
    pub fn new(reader: R, writer: W, handler: CommandHandler<C>) -> Self {
        Self {
            reader,
            writer,
            handler,
            line: Vec::new(),
            prompt: None,
            stats: SessionStats::default(),
        }
    }

    /// Prints `prompt` before reading each line.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Runs the session until end of input or `QUIT`.
    pub async fn run(mut self) -> Result<SessionStats, SessionError> {
        info!("Session started");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => info!(
                commands = self.stats.commands_processed,
                errors = self.stats.errors,
                "Session ended"
            ),
            Err(e) => warn!(error = %e, "Session aborted"),
        }

        result.map(|()| self.stats)
    }

    /// The main read-execute-reply loop.
    async fn main_loop(&mut self) -> Result<(), SessionError> {
        loop {
            if let Some(prompt) = self.prompt.clone() {
                self.write_bytes(prompt.as_bytes()).await?;
            }

            if !self.read_line().await? {
                debug!("End of input");
                return Ok(());
            }

            let args = match parse_line(&self.line) {
                Ok(args) => args,
                Err(e) => {
                    self.stats.errors += 1;
                    self.send_reply(&Reply::error(format!("ERR {}", e))).await?;
                    continue;
                }
            };

            if args.is_empty() {
                continue;
            }

            let reply = self.handler.execute(&args);
            self.stats.commands_processed += 1;
            if reply.is_error() {
                self.stats.errors += 1;
            }

            let quit = args[0].eq_ignore_ascii_case(b"QUIT") && !reply.is_error();

            self.send_reply(&reply).await?;

            if quit {
                debug!("Client requested QUIT");
                return Ok(());
            }
        }
    }

    /// Reads the next line into the buffer. Returns false at end of input.
    async fn read_line(&mut self) -> Result<bool, SessionError> {
        self.line.clear();

        let limit = MAX_LINE_SIZE as u64 + 1;
        let n = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut self.line)
            .await?;

        if n == 0 {
            return Ok(false);
        }

        self.stats.bytes_read += n as u64;

        // The terminating newline does not count towards the limit
        let content = self.line.strip_suffix(b"\n").unwrap_or(&self.line[..]);
        if content.len() > MAX_LINE_SIZE {
            return Err(SessionError::LineTooLong { max: MAX_LINE_SIZE });
        }

        trace!(bytes = n, "Read line");
        Ok(true)
    }

    /// Sends a rendered reply.
    async fn send_reply(&mut self, reply: &Reply) -> Result<(), SessionError> {
        let rendered = reply.render();
        self.write_bytes(rendered.as_bytes()).await
    }

    async fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        self.writer.write_all(bytes).await?;
        self.writer.flush().await?;
        self.stats.bytes_written += bytes.len() as u64;
        Ok(())
    }
}

/// Runs a session to completion.
///
/// This is a convenience function that creates a [`Session`] and runs it.
pub async fn run_session<R, W, C>(
    reader: R,
    writer: W,
    handler: CommandHandler<C>,
) -> Result<SessionStats, SessionError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    C: Clock,
{
    Session::new(reader, writer, handler).run().await
}
