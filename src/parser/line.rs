//! Unfold the physical lines of an iCalendar stream into logical lines.
//!
//! A physical line whose first character is a space or horizontal tab
//! continues the previous line; the single whitespace character is stripped
//! when the lines are joined. Bare CR, CRLF and LF all terminate a physical
//! line. Empty physical lines end the current logical line and are dropped.

use std::fmt;
use std::io::BufRead;

/// Error arising while assembling a logical line
#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Line {0}: invalid UTF-8.")]
    InvalidUtf8(usize),
}

/// A logical content line together with the number of the physical line it
/// started on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Line {
    pub inner: String,
    number: usize,
}

impl Line {
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn number(&self) -> usize {
        self.number
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

/// Reader returning unfolded [`Line`]s from a byte stream.
pub struct LineReader<R> {
    reader: R,
    line_number: usize,
    logical_start: usize,
}

impl<'a> LineReader<&'a [u8]> {
    pub fn from_slice(slice: &'a [u8]) -> Self {
        Self::new(slice)
    }
}

impl<R: BufRead> LineReader<R> {
    pub fn new(reader: R) -> Self {
        LineReader {
            reader,
            line_number: 0,
            logical_start: 0,
        }
    }

    /// Number of the physical line the last logical line started on.
    pub fn line_number(&self) -> usize {
        self.logical_start
    }

    /// One physical line, without its terminator. `None` at end of stream.
    fn read_physical(&mut self) -> Result<Option<Vec<u8>>, LineError> {
        let mut buf = Vec::new();
        let mut saw_any = false;
        loop {
            let chunk = self.reader.fill_buf()?;
            if chunk.is_empty() {
                if saw_any {
                    self.line_number += 1;
                    return Ok(Some(buf));
                }
                return Ok(None);
            }
            saw_any = true;
            if let Some(pos) = chunk.iter().position(|&b| matches!(b, b'\r' | b'\n')) {
                let terminator = chunk[pos];
                buf.extend_from_slice(&chunk[..pos]);
                self.reader.consume(pos + 1);
                if terminator == b'\r' && self.reader.fill_buf()?.first() == Some(&b'\n') {
                    self.reader.consume(1);
                }
                self.line_number += 1;
                return Ok(Some(buf));
            }
            let len = chunk.len();
            buf.extend_from_slice(chunk);
            self.reader.consume(len);
        }
    }

    /// Assemble the next logical line, joining folded continuations.
    pub fn next_line(&mut self) -> Result<Option<Line>, LineError> {
        let mut logical = loop {
            match self.read_physical()? {
                None => return Ok(None),
                Some(physical) if physical.is_empty() => {}
                Some(physical) => break physical,
            }
        };
        let number = self.line_number;

        loop {
            match self.reader.fill_buf()?.first().copied() {
                Some(b' ' | b'\t') => {
                    self.reader.consume(1);
                    match self.read_physical()? {
                        Some(continuation) => logical.extend_from_slice(&continuation),
                        None => break,
                    }
                }
                _ => break,
            }
        }

        self.logical_start = number;
        match String::from_utf8(logical) {
            Ok(inner) => Ok(Some(Line { inner, number })),
            Err(_) => Err(LineError::InvalidUtf8(number)),
        }
    }
}

impl<R: BufRead> Iterator for LineReader<R> {
    type Item = Result<Line, LineError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().transpose()
    }
}
