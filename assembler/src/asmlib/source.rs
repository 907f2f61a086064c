//! Reading the original input one line at a time.
use std::fmt::{self, Display, Formatter};
use std::io::{BufRead, Error as IoError};

use super::types::{LineNumber, MAX_LINE_LENGTH};

#[derive(Debug)]
pub enum ReadFailure {
    /// The line exceeds the maximum length.  The whole physical line
    /// has been consumed, so the next read starts on the next line.
    TooLong,
    Io(IoError),
}

impl Display for ReadFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ReadFailure::TooLong => {
                write!(f, "line is longer than {MAX_LINE_LENGTH} characters")
            }
            ReadFailure::Io(e) => write!(f, "{e}"),
        }
    }
}

/// Yields the lines of the input with their line numbers, without
/// their line terminators.  Bytes which are not valid UTF-8 are
/// replaced (and will later be rejected as part of whatever token
/// they are in).
#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
    line_number: LineNumber,
    max_length: usize,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> LineReader<R> {
        LineReader::with_max_length(inner, MAX_LINE_LENGTH)
    }

    pub fn with_max_length(inner: R, max_length: usize) -> LineReader<R> {
        LineReader {
            inner,
            line_number: 0,
            max_length,
            buf: Vec::new(),
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for LineReader<R> {
    type Item = (LineNumber, Result<String, ReadFailure>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.buf.clear();
        match self.inner.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                self.line_number = self.line_number.saturating_add(1);
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }
                let line = String::from_utf8_lossy(&self.buf).into_owned();
                if line.chars().count() > self.max_length {
                    Some((self.line_number, Err(ReadFailure::TooLong)))
                } else {
                    Some((self.line_number, Ok(line)))
                }
            }
            Err(e) => {
                // A failed read leaves the stream in an unknown
                // position, so we do not try to continue.
                self.done = true;
                Some((self.line_number.saturating_add(1), Err(ReadFailure::Io(e))))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(input: &str) -> Vec<(LineNumber, Result<String, String>)> {
        LineReader::with_max_length(input.as_bytes(), 10)
            .map(|(n, r)| (n, r.map_err(|e| e.to_string())))
            .collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(read_all("").is_empty());
    }

    #[test]
    fn test_line_terminators_are_removed() {
        assert_eq!(
            read_all("a\r\nb\nc"),
            vec![
                (1, Ok("a".to_string())),
                (2, Ok("b".to_string())),
                (3, Ok("c".to_string())),
            ]
        );
    }

    #[test]
    fn test_long_line_is_skipped_entirely() {
        let got = read_all("short\n0123456789abc\nnext\n");
        assert_eq!(got.len(), 3);
        assert_eq!(got[0], (1, Ok("short".to_string())));
        assert!(matches!(got[1], (2, Err(_))));
        assert_eq!(got[2], (3, Ok("next".to_string())));
    }

    #[test]
    fn test_exactly_max_length_is_fine() {
        assert_eq!(read_all("0123456789"), vec![(1, Ok("0123456789".to_string()))]);
    }
}
