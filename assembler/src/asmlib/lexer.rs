//! Low-level scanning of a single source line.
//!
//! A line is never modified while we scan it.  [`Cursor`] walks
//! through the words of a line by advancing an offset, and
//! [`split_fields`] uses a Logos-generated scanner to divide a
//! comma-separated list (directive values or instruction operands)
//! into its items.
use std::ops::Range;

use logos::Logos;

pub(crate) mod rx;

/// A read position within an immutable line.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor<'a> {
    line: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(line: &'a str) -> Cursor<'a> {
        Cursor { line, pos: 0 }
    }

    fn skip_whitespace(&mut self) {
        let remaining = &self.line[self.pos..];
        self.pos += remaining.len() - remaining.trim_start().len();
    }

    /// Return the next run of non-whitespace characters, if any.
    pub(crate) fn next_word(&mut self) -> Option<&'a str> {
        self.skip_whitespace();
        let remaining = &self.line[self.pos..];
        if remaining.is_empty() {
            return None;
        }
        let len = remaining
            .find(char::is_whitespace)
            .unwrap_or(remaining.len());
        self.pos += len;
        Some(&remaining[..len])
    }

    /// Look at the next word without consuming it.
    pub(crate) fn peek_word(&self) -> Option<&'a str> {
        let mut lookahead = *self;
        lookahead.next_word()
    }

    /// Everything after the current position, without surrounding
    /// white space.
    pub(crate) fn rest(&self) -> &'a str {
        self.line[self.pos..].trim()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.rest().is_empty()
    }
}

/// Tokens of a comma-separated list.  White space only separates
/// tokens; it is otherwise insignificant.
#[derive(Debug, Logos, PartialEq, Eq, Clone, Copy)]
#[logos(skip r"[ \t\r\f\v]+")]
pub(crate) enum FieldToken {
    #[token(",")]
    Comma,

    #[regex(r"[^, \t\r\f\v]+")]
    Text,
}

/// Why a comma-separated list is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldError {
    LeadingComma,
    TrailingComma,
    ConsecutiveCommas,
    /// Two items with only white space between them.
    MissingComma,
    /// Something the scanner could not make sense of.
    Unrecognised,
}

/// One item of a comma-separated list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Field<'a> {
    pub(crate) text: &'a str,
    pub(crate) span: Range<usize>,
}

/// Divide `input` into comma-separated items.  An empty (or
/// all-whitespace) input yields no items.
pub(crate) fn split_fields(input: &str) -> Result<Vec<Field<'_>>, FieldError> {
    let mut fields: Vec<Field<'_>> = Vec::new();
    let mut expecting_item = true;
    let mut lexer = FieldToken::lexer(input);
    while let Some(result) = lexer.next() {
        match result {
            Err(()) => {
                return Err(FieldError::Unrecognised);
            }
            Ok(FieldToken::Text) => {
                if !expecting_item {
                    return Err(FieldError::MissingComma);
                }
                fields.push(Field {
                    text: lexer.slice(),
                    span: lexer.span(),
                });
                expecting_item = false;
            }
            Ok(FieldToken::Comma) => {
                if expecting_item {
                    return Err(if fields.is_empty() {
                        FieldError::LeadingComma
                    } else {
                        FieldError::ConsecutiveCommas
                    });
                }
                expecting_item = true;
            }
        }
    }
    if expecting_item && !fields.is_empty() {
        return Err(FieldError::TrailingComma);
    }
    Ok(fields)
}
