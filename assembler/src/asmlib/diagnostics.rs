//! Diagnostics collected while translating one source file.
//!
//! Every stage of the pipeline shares a single [`ErrorList`].  Stages
//! record problems and carry on scanning, so that all the problems in
//! a file are reported together.  A [`Severity::Fatal`] problem is
//! different: once one is recorded, [`ErrorList::has_fatal`] becomes
//! true and every stage stops at the next line.
use std::error::Error;
use std::fmt::{self, Display, Formatter};

use tracing::{event, Level};

use super::types::LineNumber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational; never causes the translation to fail.
    Note,
    /// A defect in the source program.  Scanning continues, but no
    /// output is produced.
    Error,
    /// Translation cannot continue at all.
    Fatal,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Note => "note",
            Severity::Error => "error",
            Severity::Fatal => "fatal error",
        })
    }
}

/// The pipeline stage which recorded a diagnostic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Stage {
    #[default]
    Preprocessor,
    FirstPass,
    SecondPass,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Preprocessor => "preprocessor",
            Stage::FirstPass => "first pass",
            Stage::SecondPass => "second pass",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // Fatal problems.
    InputReadFailed,
    UnmatchedMacroEnd,
    MemoryOverflow,
    InternalInconsistency,

    LineTooLong,

    // Macro definitions and invocations.
    MacroNameMissing,
    MacroNameTooLong,
    MacroNameStartsWithNonLetter,
    MacroNameHasInvalidCharacter,
    MacroNameIsReservedWord,
    MacroAlreadyDefined,
    ExtraTextAfterMacroName,
    ExtraTextAfterMacroEnd,
    ExtraTextAfterMacroCall,
    UnterminatedMacro,
    MacroCallLabelConflict,

    // Labels.
    LabelEmpty,
    LabelTooLong,
    LabelStartsWithNonLetter,
    LabelHasInvalidCharacter,
    LabelIsReservedWord,
    LabelIsMacroName,
    TextAfterLabelColon,
    LabelWithoutStatement,

    // Line type.
    InvalidDirective,
    UnknownLineType,

    // Comma-separated lists.
    LeadingComma,
    TrailingComma,
    ConsecutiveCommas,
    MissingComma,

    // `.data` and `.mat`.
    DataMissingValues,
    DataNotAnInteger,
    DataValueOutOfRange,
    InvalidMatrixDimensions,
    MatrixTooManyValues,

    // `.string`.
    StringMissing,
    StringMissingOpeningQuote,
    StringMissingClosingQuote,
    StringHasNonPrintableCharacter,
    TextAfterString,

    // `.entry` and `.extern`.
    DirectiveLabelMissing,
    TextAfterDirectiveLabel,

    // Instruction operands.
    MissingOperand,
    TooManyOperands,
    UnexpectedComma,
    ImmediateNotANumber,
    ImmediateOutOfRange,
    InvalidRegister,
    MalformedMatrixOperand,
    InvalidMatrixRegister,
    InvalidOperand,
    IllegalSourceAddressingMode,
    IllegalDestinationAddressingMode,

    // Symbols.
    DuplicateSymbol,
    UndefinedSymbol,
    EntryLabelDoesNotExist,
    EntryLabelIsExtern,

    // Notes.
    LabelBeforeEntryIgnored,
    LabelBeforeExternIgnored,
}

impl ErrorKind {
    pub fn severity(&self) -> Severity {
        use ErrorKind::*;
        match self {
            InputReadFailed | UnmatchedMacroEnd | MemoryOverflow | InternalInconsistency => {
                Severity::Fatal
            }
            LabelBeforeEntryIgnored | LabelBeforeExternIgnored => Severity::Note,
            _ => Severity::Error,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    pub fn message(&self) -> &'static str {
        use ErrorKind::*;
        match self {
            InputReadFailed => "failed to read the source file",
            UnmatchedMacroEnd => "'mcroend' without a preceding 'mcro'",
            MemoryOverflow => "program does not fit into memory",
            InternalInconsistency => "internal error: passes disagree about the program size",
            LineTooLong => "line is longer than 80 characters",
            MacroNameMissing => "macro definition has no name",
            MacroNameTooLong => "macro name is longer than 30 characters",
            MacroNameStartsWithNonLetter => "macro name must start with a letter",
            MacroNameHasInvalidCharacter => {
                "macro name may contain only letters, digits and underscores"
            }
            MacroNameIsReservedWord => "macro name is a reserved word",
            MacroAlreadyDefined => "a macro with this name is already defined",
            ExtraTextAfterMacroName => "unexpected text after the macro name (macros take no parameters)",
            ExtraTextAfterMacroEnd => "unexpected text after 'mcroend'",
            ExtraTextAfterMacroCall => "unexpected text after the macro name in a macro call",
            UnterminatedMacro => "macro definition has no 'mcroend'",
            MacroCallLabelConflict => {
                "macro call has a label, but the first line of the macro body already has one"
            }
            LabelEmpty => "label has no name before the colon",
            LabelTooLong => "label is longer than 30 characters",
            LabelStartsWithNonLetter => "label must start with a letter",
            LabelHasInvalidCharacter => "label may contain only letters and digits",
            LabelIsReservedWord => "label is a reserved word",
            LabelIsMacroName => "label has the same name as a macro",
            TextAfterLabelColon => "expected white space after the label's colon",
            LabelWithoutStatement => "label is not followed by an instruction or directive",
            InvalidDirective => "unknown directive",
            UnknownLineType => "unknown operation",
            LeadingComma => "unexpected comma before the first item",
            TrailingComma => "unexpected comma after the last item",
            ConsecutiveCommas => "two commas in a row",
            MissingComma => "items must be separated by commas",
            DataMissingValues => "directive requires at least one value",
            DataNotAnInteger => "value is not an integer",
            DataValueOutOfRange => "value does not fit in a 10-bit word (-512 to 511)",
            InvalidMatrixDimensions => "matrix dimensions must look like [rows][columns] with positive sizes",
            MatrixTooManyValues => "more values than the matrix has cells",
            StringMissing => "'.string' requires a quoted string",
            StringMissingOpeningQuote => "string must start with '\"'",
            StringMissingClosingQuote => "string must end with '\"'",
            StringHasNonPrintableCharacter => "string contains a non-printable character",
            TextAfterString => "unexpected text after the closing '\"'",
            DirectiveLabelMissing => "directive requires a label name",
            TextAfterDirectiveLabel => "unexpected text after the label name",
            MissingOperand => "too few operands",
            TooManyOperands => "too many operands",
            UnexpectedComma => "this operation takes a single operand",
            ImmediateNotANumber => "immediate operand is not an integer",
            ImmediateOutOfRange => "immediate operand does not fit in 8 bits (-128 to 127)",
            InvalidRegister => "no such register (registers are r0 to r7)",
            MalformedMatrixOperand => "matrix operand must look like NAME[rX][rY]",
            InvalidMatrixRegister => "matrix row and column must be registers",
            InvalidOperand => "operand is not a register, immediate, label or matrix element",
            IllegalSourceAddressingMode => "addressing mode not allowed for this operation's source operand",
            IllegalDestinationAddressingMode => {
                "addressing mode not allowed for this operation's destination operand"
            }
            DuplicateSymbol => "symbol is already defined",
            UndefinedSymbol => "symbol is not defined",
            EntryLabelDoesNotExist => "'.entry' names a symbol which is not defined",
            EntryLabelIsExtern => "'.entry' names a symbol declared '.extern'",
            LabelBeforeEntryIgnored => "label in front of '.entry' is ignored",
            LabelBeforeExternIgnored => "label in front of '.extern' is ignored",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub line: LineNumber,
    pub stage: Stage,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: {}: {}: {}",
            self.line,
            self.stage,
            self.kind.severity(),
            self.kind
        )
    }
}

/// The diagnostics for one input file, in the order they were
/// recorded.  Entries are never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorList {
    file_name: String,
    stage: Stage,
    entries: Vec<Diagnostic>,
    fatal: bool,
}

impl ErrorList {
    pub fn new(file_name: &str) -> ErrorList {
        ErrorList {
            file_name: file_name.to_string(),
            ..Default::default()
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn set_stage(&mut self, stage: Stage) {
        self.stage = stage;
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn record(&mut self, kind: ErrorKind, line: LineNumber) {
        event!(
            Level::DEBUG,
            "{}:{line}: recorded {kind:?} in {}",
            self.file_name,
            self.stage
        );
        if kind.is_fatal() {
            self.fatal = true;
        }
        self.entries.push(Diagnostic {
            kind,
            line,
            stage: self.stage,
        });
    }

    pub fn has_fatal(&self) -> bool {
        self.fatal
    }

    /// The number of Error and Fatal diagnostics.  Notes are not
    /// counted.
    pub fn count(&self) -> usize {
        self.entries
            .iter()
            .filter(|d| d.kind.severity() >= Severity::Error)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.entries.iter().map(|d| d.kind).collect()
    }

    /// Emit every diagnostic as a log event.
    pub fn report(&self) {
        for d in self.entries.iter() {
            match d.kind.severity() {
                Severity::Note => {
                    event!(Level::WARN, file = %self.file_name, "{d}");
                }
                Severity::Error | Severity::Fatal => {
                    event!(Level::ERROR, file = %self.file_name, "{d}");
                }
            }
        }
    }
}

impl Display for ErrorList {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for d in self.entries.iter() {
            writeln!(f, "{}: {d}", self.file_name)?;
        }
        Ok(())
    }
}

impl Error for ErrorList {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notes_do_not_count() {
        let mut errors = ErrorList::new("prog.as");
        errors.record(ErrorKind::LabelBeforeExternIgnored, 3);
        assert_eq!(errors.count(), 0);
        assert!(!errors.is_empty());
        errors.record(ErrorKind::UndefinedSymbol, 4);
        assert_eq!(errors.count(), 1);
        assert!(!errors.has_fatal());
    }

    #[test]
    fn test_fatal_sets_flag() {
        let mut errors = ErrorList::new("prog.as");
        errors.record(ErrorKind::UnmatchedMacroEnd, 9);
        assert!(errors.has_fatal());
        assert_eq!(errors.count(), 1);
    }

    #[test]
    fn test_stage_is_attached_to_each_entry() {
        let mut errors = ErrorList::new("prog.as");
        errors.record(ErrorKind::MacroNameMissing, 1);
        errors.set_stage(Stage::SecondPass);
        errors.record(ErrorKind::UndefinedSymbol, 7);
        let stages: Vec<Stage> = errors.diagnostics().iter().map(|d| d.stage).collect();
        assert_eq!(stages, vec![Stage::Preprocessor, Stage::SecondPass]);
        assert_eq!(
            errors.diagnostics()[1].to_string(),
            "line 7: second pass: error: symbol is not defined"
        );
    }
}
