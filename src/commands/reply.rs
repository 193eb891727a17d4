//! Command Replies
//!
//! Every shell command produces a [`Reply`]. Replies are rendered as text in
//! the style of `redis-cli`:
//!
//! ```text
//! OK                    status
//! (error) ERR ...       error
//! (integer) 3           integer
//! "value"               bulk string (non-printable bytes as \xHH)
//! (nil)                 absent value
//! 1) "a"                array, one element per line
//! 2) "1"
//! (empty array)         array without elements
//! ```

use bytes::Bytes;
use std::fmt;

/// The result of executing one shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Short human-readable status such as `OK` or `PONG`
    Status(String),

    /// A failed command; the session keeps running
    Error(String),

    /// 64-bit signed integer
    Integer(i64),

    /// Binary-safe string
    Bulk(Bytes),

    /// Absent value
    Nil,

    /// Ordered list of replies
    Array(Vec<Reply>),
}

impl Reply {
    /// Creates a new status reply.
    pub fn status(s: impl Into<String>) -> Self {
        Reply::Status(s.into())
    }

    /// Creates a new error reply.
    ///
    /// # Example
    /// ```
    /// use ttlkv::commands::Reply;
    /// let err = Reply::error("ERR unknown command 'FOO'");
    /// assert!(err.is_error());
    /// ```
    pub fn error(s: impl Into<String>) -> Self {
        Reply::Error(s.into())
    }

    pub fn integer(n: i64) -> Self {
        Reply::Integer(n)
    }

    /// Creates a new bulk string reply.
    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Reply::Bulk(data.into())
    }

    pub fn nil() -> Self {
        Reply::Nil
    }

    pub fn array(values: Vec<Reply>) -> Self {
        Reply::Array(values)
    }

    /// Common reply for successful operations
    pub fn ok() -> Self {
        Reply::Status("OK".to_string())
    }

    /// Common reply for PING
    pub fn pong() -> Self {
        Reply::Status("PONG".to_string())
    }

    /// Flattens key-value pairs into `[k1, v1, k2, v2, ...]`.
    pub fn pairs(pairs: Vec<(Bytes, Bytes)>) -> Self {
        Reply::Array(
            pairs
                .into_iter()
                .flat_map(|(k, v)| [Reply::Bulk(k), Reply::Bulk(v)])
                .collect(),
        )
    }

    /// Returns true if this reply is an error.
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    /// Renders the reply followed by a newline.
    pub fn render(&self) -> String {
        format!("{}\n", self)
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        match self {
            Reply::Status(s) => write!(f, "{}", s),
            Reply::Error(s) => write!(f, "(error) {}", s),
            Reply::Integer(n) => write!(f, "(integer) {}", n),
            Reply::Bulk(data) => write_quoted(f, data),
            Reply::Nil => write!(f, "(nil)"),
            Reply::Array(values) if values.is_empty() => write!(f, "(empty array)"),
            Reply::Array(values) => {
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                        write!(f, "{:indent$}", "", indent = indent)?;
                    }
                    let label = format!("{}) ", i + 1);
                    write!(f, "{}", label)?;
                    v.fmt_indented(f, indent + label.len())?;
                }
                Ok(())
            }
        }
    }
}

/// Writes bytes as a double-quoted string, escaping anything unprintable.
fn write_quoted(f: &mut fmt::Formatter<'_>, data: &[u8]) -> fmt::Result {
    write!(f, "\"")?;
    for &b in data {
        match b {
            b'"' => write!(f, "\\\"")?,
            b'\\' => write!(f, "\\\\")?,
            b'\n' => write!(f, "\\n")?,
            b'\r' => write!(f, "\\r")?,
            b'\t' => write!(f, "\\t")?,
            0x20..=0x7e => write!(f, "{}", b as char)?,
            _ => write!(f, "\\x{:02x}", b)?,
        }
    }
    write!(f, "\"")
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
