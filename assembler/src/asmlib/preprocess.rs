//! Macro expansion.
//!
//! A macro is defined by a block of lines:
//!
//! ```text
//! mcro NAME
//!     ...body...
//! mcroend
//! ```
//!
//! A later line consisting of just `NAME` (optionally preceded by a
//! label) is replaced by the body.  Everything else is copied through
//! unchanged.  The result is an [`ExpandedSource`] which both passes
//! read independently.
use std::io::{BufRead, Write};

use tracing::{event, Level};

use super::diagnostics::ErrorKind;
use super::diagnostics::ErrorList;
use super::lexer::Cursor;
use super::macros::MacroTable;
use super::source::{LineReader, ReadFailure};
use super::symbol::{check_macro_name, is_comment_or_blank, MACRO_END, MACRO_START};
use super::types::LineNumber;

/// One line of the expanded source, together with the number of the
/// source line it came from.  Lines from a macro body carry the line
/// number of the macro call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedLine {
    pub text: String,
    pub origin: LineNumber,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandedSource {
    lines: Vec<ExpandedLine>,
}

impl ExpandedSource {
    pub fn lines(&self) -> &[ExpandedLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn push(&mut self, text: String, origin: LineNumber) {
        self.lines.push(ExpandedLine { text, origin });
    }

    /// Write the expanded text, one line per source line.
    pub fn write_to<W: Write>(&self, mut w: W) -> std::io::Result<()> {
        for line in self.lines.iter() {
            writeln!(w, "{}", line.text)?;
        }
        w.flush()
    }
}

impl FromIterator<ExpandedLine> for ExpandedSource {
    fn from_iter<I: IntoIterator<Item = ExpandedLine>>(iter: I) -> Self {
        ExpandedSource {
            lines: iter.into_iter().collect(),
        }
    }
}

enum State {
    Outside,
    /// Inside a definition.  The name is `None` when the `mcro` line
    /// was rejected; the body is then skipped.
    Defining {
        name: Option<String>,
        started_at: LineNumber,
    },
}

/// Expand the macros in `reader`, recording problems in `errors`.
/// Stops at the first fatal problem.
pub fn preprocess<R: BufRead>(
    reader: R,
    macros: &mut MacroTable,
    errors: &mut ErrorList,
) -> ExpandedSource {
    let mut output = ExpandedSource::default();
    let mut state = State::Outside;
    for (line_number, item) in LineReader::new(reader) {
        if errors.has_fatal() {
            break;
        }
        let line = match item {
            Ok(line) => line,
            Err(ReadFailure::TooLong) => {
                errors.record(ErrorKind::LineTooLong, line_number);
                continue;
            }
            Err(ReadFailure::Io(e)) => {
                event!(Level::ERROR, "read failed at line {line_number}: {e}");
                errors.record(ErrorKind::InputReadFailed, line_number);
                break;
            }
        };
        state = match state {
            State::Outside => {
                handle_outside(&line, line_number, macros, errors, &mut output)
            }
            State::Defining { name, started_at } => {
                handle_definition_line(line, line_number, name, started_at, macros, errors)
            }
        };
    }
    if let State::Defining { started_at, .. } = state {
        if !errors.has_fatal() {
            errors.record(ErrorKind::UnterminatedMacro, started_at);
        }
    }
    output
}

fn handle_outside(
    line: &str,
    line_number: LineNumber,
    macros: &mut MacroTable,
    errors: &mut ErrorList,
    output: &mut ExpandedSource,
) -> State {
    if is_comment_or_blank(line) {
        output.push(line.to_string(), line_number);
        return State::Outside;
    }
    let mut cursor = Cursor::new(line);
    let first = cursor.next_word();
    match first {
        Some(MACRO_START) => {
            return start_definition(cursor, line_number, macros, errors);
        }
        Some(MACRO_END) => {
            errors.record(ErrorKind::UnmatchedMacroEnd, line_number);
            return State::Outside;
        }
        _ => (),
    }

    // A macro call, possibly with a label in front of it.
    let (label, call) = match first {
        Some(word) if word.ends_with(':') => (Some(word), cursor.next_word()),
        other => (None, other),
    };
    match call {
        Some(name) if macros.exists(name) => {
            if !cursor.is_at_end() {
                errors.record(ErrorKind::ExtraTextAfterMacroCall, line_number);
                return State::Outside;
            }
            expand_call(name, label, line_number, macros, errors, output);
        }
        _ => output.push(line.to_string(), line_number),
    }
    State::Outside
}

fn start_definition(
    mut cursor: Cursor<'_>,
    line_number: LineNumber,
    macros: &mut MacroTable,
    errors: &mut ErrorList,
) -> State {
    let name = cursor.next_word().unwrap_or("");
    let name = match check_macro_name(name, macros) {
        Ok(()) => {
            if !cursor.is_at_end() {
                errors.record(ErrorKind::ExtraTextAfterMacroName, line_number);
            }
            match macros.define(name, line_number) {
                Ok(()) => {
                    event!(Level::DEBUG, "line {line_number}: defining macro {name}");
                    Some(name.to_string())
                }
                Err(e) => {
                    event!(Level::DEBUG, "line {line_number}: {e}");
                    errors.record(ErrorKind::MacroAlreadyDefined, line_number);
                    None
                }
            }
        }
        Err(kind) => {
            errors.record(kind, line_number);
            None
        }
    };
    State::Defining {
        name,
        started_at: line_number,
    }
}

fn handle_definition_line(
    line: String,
    line_number: LineNumber,
    name: Option<String>,
    started_at: LineNumber,
    macros: &mut MacroTable,
    errors: &mut ErrorList,
) -> State {
    let mut cursor = Cursor::new(&line);
    if cursor.next_word() == Some(MACRO_END) {
        if !cursor.is_at_end() {
            errors.record(ErrorKind::ExtraTextAfterMacroEnd, line_number);
        }
        if let Some(name) = name.as_deref() {
            event!(
                Level::DEBUG,
                "line {line_number}: macro {name} has {} lines",
                macros.expand(name).map_or(0, <[String]>::len)
            );
        }
        return State::Outside;
    }
    if let Some(name) = name.as_deref() {
        if let Err(e) = macros.append_body(name, &line) {
            event!(Level::ERROR, "line {line_number}: {e}");
            errors.record(ErrorKind::InternalInconsistency, line_number);
        }
    }
    State::Defining { name, started_at }
}

fn expand_call(
    name: &str,
    label: Option<&str>,
    line_number: LineNumber,
    macros: &MacroTable,
    errors: &mut ErrorList,
    output: &mut ExpandedSource,
) {
    let body = match macros.expand(name) {
        Ok(body) => body,
        Err(e) => {
            event!(Level::ERROR, "line {line_number}: {e}");
            errors.record(ErrorKind::InternalInconsistency, line_number);
            return;
        }
    };
    event!(
        Level::TRACE,
        "line {line_number}: expanding {name} ({} lines)",
        body.len()
    );
    let mut lines = body.iter();
    if let Some(label) = label {
        // The label goes on the first line holding a statement.
        let mut attached = false;
        for first in lines.by_ref() {
            if is_comment_or_blank(first) {
                output.push(first.clone(), line_number);
                continue;
            }
            let first_has_label = Cursor::new(first)
                .next_word()
                .is_some_and(|word| word.contains(':'));
            if first_has_label {
                errors.record(ErrorKind::MacroCallLabelConflict, line_number);
                output.push(first.clone(), line_number);
            } else {
                output.push(format!("{label} {}", first.trim_start()), line_number);
            }
            attached = true;
            break;
        }
        if !attached {
            output.push(label.to_string(), line_number);
        }
    }
    for body_line in lines {
        output.push(body_line.clone(), line_number);
    }
}
