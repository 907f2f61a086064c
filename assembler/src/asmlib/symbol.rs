//! Rules for the names of labels and macros.
use base::prelude::{Opcode, Register};

use super::diagnostics::ErrorKind;
use super::macros::MacroTable;
use super::types::MAX_SYMBOL_LENGTH;

pub(crate) const MACRO_START: &str = "mcro";
pub(crate) const MACRO_END: &str = "mcroend";
pub(crate) const COMMENT_PREFIX: char = ';';

/// Directive names, without their leading dot.
pub(crate) const DIRECTIVE_NAMES: [&str; 5] = ["data", "string", "mat", "entry", "extern"];

/// Lines with no statement in them.
pub(crate) fn is_comment_or_blank(line: &str) -> bool {
    let line = line.trim_start();
    line.is_empty() || line.starts_with(COMMENT_PREFIX)
}

/// Reserved words can be used neither as labels nor as macro names.
pub(crate) fn is_reserved_word(name: &str) -> bool {
    name.parse::<Opcode>().is_ok()
        || name.parse::<Register>().is_ok()
        || name == MACRO_START
        || name == MACRO_END
        || DIRECTIVE_NAMES.contains(&name)
}

/// Check a label name (without its colon).  A label is a letter
/// followed by letters and digits, is not too long, is not a reserved
/// word and is not the name of a macro.
pub(crate) fn check_label_name(name: &str, macros: &MacroTable) -> Result<(), ErrorKind> {
    let mut chars = name.chars();
    match chars.next() {
        None => return Err(ErrorKind::LabelEmpty),
        Some(first) if !first.is_ascii_alphabetic() => {
            return Err(ErrorKind::LabelStartsWithNonLetter);
        }
        Some(_) => (),
    }
    if !chars.all(|ch| ch.is_ascii_alphanumeric()) {
        return Err(ErrorKind::LabelHasInvalidCharacter);
    }
    if name.len() > MAX_SYMBOL_LENGTH {
        return Err(ErrorKind::LabelTooLong);
    }
    if is_reserved_word(name) {
        return Err(ErrorKind::LabelIsReservedWord);
    }
    if macros.exists(name) {
        return Err(ErrorKind::LabelIsMacroName);
    }
    Ok(())
}

/// Check the name given in a `mcro` line.  Macro names may also
/// contain underscores.
pub(crate) fn check_macro_name(name: &str, macros: &MacroTable) -> Result<(), ErrorKind> {
    let mut chars = name.chars();
    match chars.next() {
        None => return Err(ErrorKind::MacroNameMissing),
        Some(first) if !first.is_ascii_alphabetic() => {
            return Err(ErrorKind::MacroNameStartsWithNonLetter);
        }
        Some(_) => (),
    }
    if !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return Err(ErrorKind::MacroNameHasInvalidCharacter);
    }
    if name.len() > MAX_SYMBOL_LENGTH {
        return Err(ErrorKind::MacroNameTooLong);
    }
    if is_reserved_word(name) {
        return Err(ErrorKind::MacroNameIsReservedWord);
    }
    if macros.exists(name) {
        return Err(ErrorKind::MacroAlreadyDefined);
    }
    Ok(())
}
