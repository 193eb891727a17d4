//! Shell Line Tokenizer
//!
//! Splits one line typed into the ttlkv shell into its arguments. The syntax
//! follows what `redis-cli` accepts interactively:
//!
//! - arguments are separated by spaces or tabs
//! - `"double quoted"` arguments understand `\"`, `\\`, `\n`, `\r`, `\t`,
//!   `\a`, `\b` and `\xHH`; any other escaped byte stands for itself
//! - `'single quoted'` arguments are literal except for `\'`
//! - a closing quote must be followed by a separator or the end of the line
//!
//! Arguments are returned as [`Bytes`], so values may carry arbitrary binary
//! content through hex escapes.

use bytes::Bytes;
use thiserror::Error;

/// Errors that can occur while tokenizing a shell line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A quoted argument was never closed
    #[error("unbalanced {quote} quotes")]
    UnterminatedQuote { quote: char },

    /// `\x` was not followed by two hex digits
    #[error("invalid hex escape at byte {position}")]
    InvalidHexEscape { position: usize },

    /// A closing quote was directly followed by another character
    #[error("closing quote must be followed by a space at byte {position}")]
    MissingSeparator { position: usize },
}

/// Result type for tokenizing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Splits a line into arguments.
///
/// An empty or whitespace-only line yields no arguments.
///
/// # Example
///
/// ```
/// use ttlkv::commands::parse_line;
/// use bytes::Bytes;
///
/// let args = parse_line(br#"SET greeting "hello world" 30"#).unwrap();
/// assert_eq!(
///     args,
///     vec![
///         Bytes::from("SET"),
///         Bytes::from("greeting"),
///         Bytes::from("hello world"),
///         Bytes::from("30"),
///     ]
/// );
/// ```
pub fn parse_line(line: &[u8]) -> ParseResult<Vec<Bytes>> {
    let mut args = Vec::new();
    let mut pos = 0;

    loop {
        while pos < line.len() && is_separator(line[pos]) {
            pos += 1;
        }
        if pos >= line.len() {
            return Ok(args);
        }

        let (arg, next) = match line[pos] {
            b'"' => parse_double_quoted(line, pos + 1)?,
            b'\'' => parse_single_quoted(line, pos + 1)?,
            _ => parse_bare(line, pos),
        };
        args.push(Bytes::from(arg));
        pos = next;
    }
}

#[inline]
fn is_separator(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

/// Reads an unquoted argument starting at `start`.
fn parse_bare(line: &[u8], start: usize) -> (Vec<u8>, usize) {
    let end = line[start..]
        .iter()
        .position(|&b| is_separator(b))
        .map(|offset| start + offset)
        .unwrap_or(line.len());
    (line[start..end].to_vec(), end)
}

/// Reads a double-quoted argument whose content starts at `start`.
fn parse_double_quoted(line: &[u8], start: usize) -> ParseResult<(Vec<u8>, usize)> {
    let mut out = Vec::new();
    let mut pos = start;

    while pos < line.len() {
        match line[pos] {
            b'\\' if pos + 1 < line.len() => {
                let escaped = line[pos + 1];
                if escaped == b'x' {
                    let byte = line
                        .get(pos + 2..pos + 4)
                        .and_then(|hex| std::str::from_utf8(hex).ok())
                        .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                        .ok_or(ParseError::InvalidHexEscape { position: pos })?;
                    out.push(byte);
                    pos += 4;
                } else {
                    out.push(match escaped {
                        b'n' => b'\n',
                        b'r' => b'\r',
                        b't' => b'\t',
                        b'a' => 0x07,
                        b'b' => 0x08,
                        other => other,
                    });
                    pos += 2;
                }
            }
            b'"' => {
                let next = closing_quote_end(line, pos)?;
                return Ok((out, next));
            }
            b => {
                out.push(b);
                pos += 1;
            }
        }
    }

    Err(ParseError::UnterminatedQuote { quote: '"' })
}

/// Reads a single-quoted argument whose content starts at `start`.
fn parse_single_quoted(line: &[u8], start: usize) -> ParseResult<(Vec<u8>, usize)> {
    let mut out = Vec::new();
    let mut pos = start;

    while pos < line.len() {
        match line[pos] {
            b'\\' if line.get(pos + 1) == Some(&b'\'') => {
                out.push(b'\'');
                pos += 2;
            }
            b'\'' => {
                let next = closing_quote_end(line, pos)?;
                return Ok((out, next));
            }
            b => {
                out.push(b);
                pos += 1;
            }
        }
    }

    Err(ParseError::UnterminatedQuote { quote: '\'' })
}

/// Checks the byte after a closing quote at `quote_pos` and returns the
/// position to resume scanning from.
fn closing_quote_end(line: &[u8], quote_pos: usize) -> ParseResult<usize> {
    let next = quote_pos + 1;
    match line.get(next) {
        None => Ok(next),
        Some(&b) if is_separator(b) => Ok(next),
        Some(_) => Err(ParseError::MissingSeparator { position: next }),
    }
}
