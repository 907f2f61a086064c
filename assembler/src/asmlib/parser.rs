//! Classification of a single (macro-expanded) source line.
//!
//! [`classify`] looks at one line and either returns its structured
//! form or the single most specific reason the line is wrong.  It
//! has no side effects, so calling it twice on the same line gives
//! the same answer; both passes rely on that.
use base::prelude::{MEMORY_SIZE, Opcode, Register, Unsigned10Bit};

use super::ast::{Directive, Instruction, LineBody, Operand, OperandValue, ParsedLine};
use super::diagnostics::ErrorKind;
use super::lexer::rx::{INTEGER, MATRIX_DIMENSIONS, MATRIX_OPERAND, REGISTER_SHAPE};
use super::lexer::{split_fields, Cursor, Field, FieldError};
use super::macros::MacroTable;
use super::symbol::{check_label_name, COMMENT_PREFIX};

#[cfg(test)]
mod tests;

const LABEL_SUFFIX: char = ':';
const IMMEDIATE_PREFIX: char = '#';
const QUOTE: char = '"';

/// Classify one line of the expanded source.
///
/// # Errors
///
/// Returns the kind of the first problem found in the line.
pub fn classify(raw: &str, macros: &MacroTable) -> Result<ParsedLine, ErrorKind> {
    let line = raw.trim();
    if line.is_empty() {
        return Ok(ParsedLine {
            label: None,
            body: LineBody::Empty,
        });
    }
    if line.starts_with(COMMENT_PREFIX) {
        return Ok(ParsedLine {
            label: None,
            body: LineBody::Comment,
        });
    }

    let mut cursor = Cursor::new(line);
    let label = match cursor.peek_word() {
        Some(word) if word.contains(LABEL_SUFFIX) => {
            cursor.next_word();
            Some(parse_label(word, macros)?)
        }
        _ => None,
    };

    let Some(first) = cursor.next_word() else {
        return Err(ErrorKind::LabelWithoutStatement);
    };
    let body = if let Ok(opcode) = first.parse::<Opcode>() {
        LineBody::Instruction(parse_instruction(opcode, cursor.rest(), macros)?)
    } else if let Some(name) = first.strip_prefix('.') {
        LineBody::Directive(parse_directive(name, cursor.rest(), macros)?)
    } else {
        return Err(ErrorKind::UnknownLineType);
    };
    Ok(ParsedLine { label, body })
}

/// `word` is the first word of a line and contains a colon.  The
/// colon must be its last character.
fn parse_label(word: &str, macros: &MacroTable) -> Result<String, ErrorKind> {
    match word.split_once(LABEL_SUFFIX) {
        Some((name, "")) => {
            check_label_name(name, macros)?;
            Ok(name.to_string())
        }
        _ => Err(ErrorKind::TextAfterLabelColon),
    }
}

/// Range check for values in `.data` and `.mat`: a 10-bit two's
/// complement number.
pub(crate) fn check_data_value(text: &str) -> Result<Unsigned10Bit, ErrorKind> {
    if !INTEGER.is_match(text) {
        return Err(ErrorKind::DataNotAnInteger);
    }
    text.parse::<i32>()
        .ok()
        .and_then(|n| Unsigned10Bit::from_signed(n).ok())
        .ok_or(ErrorKind::DataValueOutOfRange)
}

/// Range check for immediate operands (the text after `#`): an 8-bit
/// two's complement number.
pub(crate) fn check_immediate_value(text: &str) -> Result<i8, ErrorKind> {
    if !INTEGER.is_match(text) {
        return Err(ErrorKind::ImmediateNotANumber);
    }
    text.parse::<i8>()
        .map_err(|_| ErrorKind::ImmediateOutOfRange)
}

fn list_error(e: FieldError, unrecognised: ErrorKind) -> ErrorKind {
    match e {
        FieldError::LeadingComma => ErrorKind::LeadingComma,
        FieldError::TrailingComma => ErrorKind::TrailingComma,
        FieldError::ConsecutiveCommas => ErrorKind::ConsecutiveCommas,
        FieldError::MissingComma => ErrorKind::MissingComma,
        FieldError::Unrecognised => unrecognised,
    }
}

fn parse_directive(name: &str, rest: &str, macros: &MacroTable) -> Result<Directive, ErrorKind> {
    match name {
        "data" => Ok(Directive::Data(parse_data_values(rest)?)),
        "string" => Ok(Directive::String(parse_string(rest)?)),
        "mat" => parse_matrix(rest),
        "entry" => Ok(Directive::Entry(parse_directive_label(rest, macros)?)),
        "extern" => Ok(Directive::Extern(parse_directive_label(rest, macros)?)),
        _ => Err(ErrorKind::InvalidDirective),
    }
}

fn parse_data_values(rest: &str) -> Result<Vec<Unsigned10Bit>, ErrorKind> {
    let values = parse_value_list(rest)?;
    if values.is_empty() {
        Err(ErrorKind::DataMissingValues)
    } else {
        Ok(values)
    }
}

/// An empty list is not an error here; the caller decides.
fn parse_value_list(rest: &str) -> Result<Vec<Unsigned10Bit>, ErrorKind> {
    split_fields(rest)
        .map_err(|e| list_error(e, ErrorKind::DataNotAnInteger))?
        .iter()
        .map(|field| check_data_value(field.text))
        .collect()
}

fn parse_matrix(rest: &str) -> Result<Directive, ErrorKind> {
    if !rest.starts_with('[') {
        return Ok(Directive::Matrix {
            dimensions: None,
            values: parse_data_values(rest)?,
        });
    }
    let caps = MATRIX_DIMENSIONS
        .captures(rest)
        .ok_or(ErrorKind::InvalidMatrixDimensions)?;
    let dimension = |group: &str| -> Result<usize, ErrorKind> {
        match caps[group].trim().parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ErrorKind::InvalidMatrixDimensions),
        }
    };
    let rows = dimension("rows")?;
    let columns = dimension("columns")?;
    let cells = rows
        .checked_mul(columns)
        .filter(|&cells| cells <= MEMORY_SIZE)
        .ok_or(ErrorKind::InvalidMatrixDimensions)?;
    let after = caps.get(0).map_or(rest.len(), |m| m.end());
    let values = parse_value_list(&rest[after..])?;
    if values.len() > cells {
        return Err(ErrorKind::MatrixTooManyValues);
    }
    Ok(Directive::Matrix {
        dimensions: Some((rows, columns)),
        values,
    })
}

fn parse_string(rest: &str) -> Result<String, ErrorKind> {
    let Some(after_open) = rest.strip_prefix(QUOTE) else {
        return Err(if rest.is_empty() {
            ErrorKind::StringMissing
        } else {
            ErrorKind::StringMissingOpeningQuote
        });
    };
    let Some(close) = after_open.rfind(QUOTE) else {
        return Err(ErrorKind::StringMissingClosingQuote);
    };
    let (content, trailing) = after_open.split_at(close);
    if !trailing[1..].trim().is_empty() {
        return Err(ErrorKind::TextAfterString);
    }
    if !content.chars().all(|ch| ch == ' ' || ch.is_ascii_graphic()) {
        return Err(ErrorKind::StringHasNonPrintableCharacter);
    }
    Ok(content.to_string())
}

fn parse_directive_label(rest: &str, macros: &MacroTable) -> Result<String, ErrorKind> {
    let mut cursor = Cursor::new(rest);
    let name = cursor.next_word().ok_or(ErrorKind::DirectiveLabelMissing)?;
    check_label_name(name, macros)?;
    if !cursor.is_at_end() {
        return Err(ErrorKind::TextAfterDirectiveLabel);
    }
    Ok(name.to_string())
}

fn parse_instruction(
    opcode: Opcode,
    rest: &str,
    macros: &MacroTable,
) -> Result<Instruction, ErrorKind> {
    let fields: Vec<Field<'_>> =
        split_fields(rest).map_err(|e| list_error(e, ErrorKind::InvalidOperand))?;
    let expected = opcode.operand_count();
    if fields.len() < expected {
        return Err(ErrorKind::MissingOperand);
    }
    if fields.len() > expected {
        return Err(if expected == 1 {
            ErrorKind::UnexpectedComma
        } else {
            ErrorKind::TooManyOperands
        });
    }

    let mut operands = fields
        .iter()
        .map(|field| parse_operand(field.text, macros))
        .collect::<Result<Vec<Operand>, ErrorKind>>()?;
    let destination = operands.pop();
    let source = operands.pop();

    if let Some(op) = &source {
        if !opcode.accepts_source(op.mode()) {
            return Err(ErrorKind::IllegalSourceAddressingMode);
        }
    }
    if let Some(op) = &destination {
        if !opcode.accepts_destination(op.mode()) {
            return Err(ErrorKind::IllegalDestinationAddressingMode);
        }
    }
    Ok(Instruction {
        opcode,
        source,
        destination,
    })
}

fn parse_operand(text: &str, macros: &MacroTable) -> Result<Operand, ErrorKind> {
    let value = if let Some(number) = text.strip_prefix(IMMEDIATE_PREFIX) {
        OperandValue::Immediate(check_immediate_value(number)?)
    } else if let Ok(register) = text.parse::<Register>() {
        OperandValue::Register(register)
    } else if text.contains(['[', ']']) {
        parse_matrix_operand(text, macros)?
    } else {
        // Names such as r8 are ordinary labels.
        check_label_name(text, macros).map_err(|_| {
            if REGISTER_SHAPE.is_match(text) {
                ErrorKind::InvalidRegister
            } else {
                ErrorKind::InvalidOperand
            }
        })?;
        OperandValue::Direct(text.to_string())
    };
    Ok(Operand {
        text: text.to_string(),
        value,
    })
}

fn parse_matrix_operand(text: &str, macros: &MacroTable) -> Result<OperandValue, ErrorKind> {
    let caps = MATRIX_OPERAND
        .captures(text)
        .ok_or(ErrorKind::MalformedMatrixOperand)?;
    let name = &caps["name"];
    check_label_name(name, macros).map_err(|_| ErrorKind::MalformedMatrixOperand)?;
    let register = |group: &str| -> Result<Register, ErrorKind> {
        caps[group]
            .trim()
            .parse::<Register>()
            .map_err(|()| ErrorKind::InvalidMatrixRegister)
    };
    Ok(OperandValue::Matrix {
        name: name.to_string(),
        row: register("row")?,
        column: register("column")?,
    })
}
