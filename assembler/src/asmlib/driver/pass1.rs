//! The first pass: assign addresses and build the symbol table.
use tracing::{event, span, Level};

use base::prelude::{Address, MEMORY_SIZE};

use super::super::ast::{Directive, LineBody, ParsedLine};
use super::super::diagnostics::{ErrorKind, ErrorList, Stage};
use super::super::macros::MacroTable;
use super::super::parser::classify;
use super::super::preprocess::ExpandedSource;
use super::super::symtab::{SymbolKind, SymbolTable, SymbolTableError};
use super::super::types::LineNumber;

/// The sizes of the two memory areas, as found by the first pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Counters {
    /// Number of instruction words (ICF less the load address).
    pub(crate) code_words: usize,
    /// Number of data words (DCF).
    pub(crate) data_words: usize,
}

impl Counters {
    /// The address just past the last instruction word, which is
    /// also the address of the first data word.
    pub(crate) fn data_origin(&self) -> usize {
        usize::from(Address::CODE_BASE) + self.code_words
    }
}

struct Allocator {
    /// Instruction counter, an absolute address.
    ic: usize,
    /// Data counter, relative to the start of the data area.
    dc: usize,
}

impl Allocator {
    fn new() -> Allocator {
        Allocator {
            ic: usize::from(Address::CODE_BASE),
            dc: 0,
        }
    }

    fn fits(&self) -> bool {
        self.ic + self.dc <= MEMORY_SIZE
    }
}

fn define(
    symtab: &mut SymbolTable,
    name: &str,
    kind: SymbolKind,
    address: usize,
    line: LineNumber,
    errors: &mut ErrorList,
) {
    let Ok(address) = Address::try_from(address) else {
        errors.record(ErrorKind::MemoryOverflow, line);
        return;
    };
    match symtab.insert(name, kind, address, line) {
        Ok(()) => (),
        Err(SymbolTableError::Duplicate(_)) => {
            errors.record(ErrorKind::DuplicateSymbol, line);
        }
        Err(e) => {
            event!(Level::ERROR, "line {line}: unexpected symbol table failure: {e}");
            errors.record(ErrorKind::InternalInconsistency, line);
        }
    }
}

fn declare_extern(symtab: &mut SymbolTable, name: &str, line: LineNumber, errors: &mut ErrorList) {
    // Repeating a `.extern` is harmless.
    if symtab
        .lookup(name)
        .is_some_and(|sym| sym.kind == SymbolKind::Extern)
    {
        return;
    }
    define(
        symtab,
        name,
        SymbolKind::Extern,
        usize::from(Address::ZERO),
        line,
        errors,
    );
}

/// Walk the expanded source, defining a symbol for every label and
/// counting the words of code and data.  When the walk finishes
/// without a fatal problem, data symbols are moved so that the data
/// area follows the code.
pub(crate) fn first_pass(
    expanded: &ExpandedSource,
    macros: &MacroTable,
    symtab: &mut SymbolTable,
    errors: &mut ErrorList,
) -> Counters {
    let span = span!(Level::ERROR, "first pass");
    let _enter = span.enter();
    errors.set_stage(Stage::FirstPass);

    let mut counters = Allocator::new();
    for line in expanded.lines() {
        if errors.has_fatal() {
            break;
        }
        let origin = line.origin;
        let ParsedLine { label, body } = match classify(&line.text, macros) {
            Ok(parsed) => parsed,
            Err(kind) => {
                errors.record(kind, origin);
                continue;
            }
        };
        match body {
            LineBody::Empty | LineBody::Comment => (),
            LineBody::Directive(Directive::Entry(_)) => {
                if label.is_some() {
                    errors.record(ErrorKind::LabelBeforeEntryIgnored, origin);
                }
                // Entries are resolved by the second pass.
            }
            LineBody::Directive(Directive::Extern(name)) => {
                if label.is_some() {
                    errors.record(ErrorKind::LabelBeforeExternIgnored, origin);
                }
                declare_extern(symtab, &name, origin, errors);
            }
            LineBody::Directive(directive) => {
                if let Some(name) = label.as_deref() {
                    let kind = match directive {
                        Directive::Matrix { .. } => SymbolKind::Matrix,
                        _ => SymbolKind::Data,
                    };
                    define(symtab, name, kind, counters.dc, origin, errors);
                }
                counters.dc += directive.data_size();
            }
            LineBody::Instruction(instruction) => {
                if let Some(name) = label.as_deref() {
                    define(symtab, name, SymbolKind::Code, counters.ic, origin, errors);
                }
                counters.ic += instruction.word_count();
            }
        }
        if !counters.fits() {
            errors.record(ErrorKind::MemoryOverflow, origin);
        }
    }

    let result = Counters {
        code_words: counters.ic - usize::from(Address::CODE_BASE),
        data_words: counters.dc,
    };
    event!(
        Level::DEBUG,
        "first pass: ICF={}, DCF={}",
        counters.ic,
        counters.dc
    );
    if !errors.has_fatal() {
        if let Err(e) = symtab.relocate_data_symbols(result.data_origin()) {
            event!(Level::ERROR, "{e}");
            errors.record(ErrorKind::MemoryOverflow, 0);
        }
    }
    result
}
