//! The second pass: encode every statement now that all symbols
//! have their final addresses.
use tracing::{event, span, Level};

use base::prelude::{Address, AddressingMode, Are, Word};

use super::super::ast::{Directive, Instruction, LineBody, Operand, OperandValue};
use super::super::diagnostics::{ErrorKind, ErrorList, Stage};
use super::super::listing::{Listing, ListingLine};
use super::super::macros::MacroTable;
use super::super::parser::classify;
use super::super::preprocess::ExpandedSource;
use super::super::symtab::{SymbolKind, SymbolTable, SymbolTableError};
use super::super::types::LineNumber;
use super::pass1::Counters;

/// A place where an external symbol is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternReference {
    pub name: String,
    /// The address of the word which refers to the symbol.
    pub address: Address,
}

/// The encoded program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Binary {
    pub code: Vec<Word>,
    pub data: Vec<Word>,
    /// In the order the references occur in the program.
    pub externs: Vec<ExternReference>,
}

impl Binary {
    /// Every memory cell of the program with its address: first the
    /// code, loaded at [`Address::CODE_BASE`], then the data.
    pub fn cells(&self) -> impl Iterator<Item = (Address, Word)> + '_ {
        (0..)
            .map_while(|offset| Address::CODE_BASE.checked_add(offset))
            .zip(self.code.iter().chain(self.data.iter()).copied())
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty() && self.data.is_empty()
    }
}

#[derive(Default)]
struct Encoder {
    binary: Binary,
}

impl Encoder {
    fn next_code_address(&self) -> Option<Address> {
        Address::CODE_BASE.checked_add(self.binary.code.len())
    }

    /// Emit the word holding the address of `name`.
    fn emit_symbol_address(
        &mut self,
        symtab: &SymbolTable,
        name: &str,
        line: LineNumber,
        errors: &mut ErrorList,
    ) {
        let Some(here) = self.next_code_address() else {
            errors.record(ErrorKind::MemoryOverflow, line);
            return;
        };
        let word = match symtab.lookup(name) {
            None => {
                errors.record(ErrorKind::UndefinedSymbol, line);
                Word::Address {
                    address: Address::ZERO,
                    are: Are::Absolute,
                }
            }
            Some(sym) if sym.kind == SymbolKind::Extern => {
                event!(Level::TRACE, "line {line}: external {name} used at {here}");
                self.binary.externs.push(ExternReference {
                    name: name.to_string(),
                    address: here,
                });
                Word::Address {
                    address: Address::ZERO,
                    are: Are::External,
                }
            }
            Some(sym) => Word::Address {
                address: sym.address,
                are: Are::Relocatable,
            },
        };
        self.binary.code.push(word);
    }

    fn emit_operand(
        &mut self,
        symtab: &SymbolTable,
        operand: &Operand,
        is_source: bool,
        line: LineNumber,
        errors: &mut ErrorList,
    ) {
        match &operand.value {
            OperandValue::Immediate(value) => self.binary.code.push(Word::Immediate {
                value: *value,
                are: Are::Absolute,
            }),
            OperandValue::Register(r) => self.binary.code.push(if is_source {
                Word::source_register(*r)
            } else {
                Word::destination_register(*r)
            }),
            OperandValue::Direct(name) => self.emit_symbol_address(symtab, name, line, errors),
            OperandValue::Matrix { name, row, column } => {
                self.emit_symbol_address(symtab, name, line, errors);
                self.binary.code.push(Word::MatrixRegisters {
                    row: *row,
                    column: *column,
                    are: Are::Absolute,
                });
            }
        }
    }

    fn emit_instruction(
        &mut self,
        symtab: &SymbolTable,
        inst: &Instruction,
        line: LineNumber,
        errors: &mut ErrorList,
    ) {
        // An absent operand has mode field 0.
        let mode = |op: &Option<Operand>| {
            op.as_ref()
                .map_or(AddressingMode::Immediate, Operand::mode)
        };
        self.binary.code.push(Word::First {
            opcode: inst.opcode,
            source: mode(&inst.source),
            destination: mode(&inst.destination),
            are: Are::Absolute,
        });
        match (&inst.source, &inst.destination) {
            (Some(source), Some(destination)) if inst.shares_register_word() => {
                if let (Some(s), Some(d)) = (source.register(), destination.register()) {
                    self.binary.code.push(Word::Registers {
                        source: s,
                        destination: d,
                        are: Are::Absolute,
                    });
                }
            }
            (source, destination) => {
                if let Some(op) = source {
                    self.emit_operand(symtab, op, true, line, errors);
                }
                if let Some(op) = destination {
                    self.emit_operand(symtab, op, false, line, errors);
                }
            }
        }
    }
}

/// Walk the expanded source again, encoding instructions and data,
/// resolving `.entry` directives and recording uses of external
/// symbols.  Lines the first pass rejected are skipped silently,
/// since their problems have already been recorded.
pub(crate) fn second_pass(
    expanded: &ExpandedSource,
    macros: &MacroTable,
    symtab: &mut SymbolTable,
    counters: Counters,
    errors: &mut ErrorList,
) -> (Binary, Listing) {
    let span = span!(Level::ERROR, "second pass");
    let _enter = span.enter();
    errors.set_stage(Stage::SecondPass);

    let mut listing = Listing::default();
    let mut encoder = Encoder::default();
    for line in expanded.lines() {
        if errors.has_fatal() {
            break;
        }
        let origin = line.origin;
        let Ok(parsed) = classify(&line.text, macros) else {
            continue;
        };
        match parsed.body {
            LineBody::Empty | LineBody::Comment => (),
            LineBody::Directive(Directive::Entry(name)) => match symtab.mark_entry(&name) {
                Ok(()) => (),
                Err(SymbolTableError::IsExtern(_)) => {
                    errors.record(ErrorKind::EntryLabelIsExtern, origin);
                }
                Err(_) => errors.record(ErrorKind::EntryLabelDoesNotExist, origin),
            },
            LineBody::Directive(Directive::Extern(_)) => (),
            LineBody::Directive(directive) => {
                let first = encoder.binary.data.len();
                encoder
                    .binary
                    .data
                    .extend(directive.data_words().into_iter().map(Word::Data));
                listing.push_line(ListingLine::Data {
                    offset: first,
                    words: encoder.binary.data[first..].to_vec(),
                    text: line.text.clone(),
                });
            }
            LineBody::Instruction(inst) => {
                let Some(address) = encoder.next_code_address() else {
                    errors.record(ErrorKind::MemoryOverflow, origin);
                    break;
                };
                let first = encoder.binary.code.len();
                encoder.emit_instruction(symtab, &inst, origin, errors);
                listing.push_line(ListingLine::Instruction {
                    address,
                    words: encoder.binary.code[first..].to_vec(),
                    text: line.text.clone(),
                });
            }
        }
    }
    let binary = encoder.binary;

    if !errors.has_fatal()
        && (binary.code.len() != counters.code_words || binary.data.len() != counters.data_words)
    {
        event!(
            Level::ERROR,
            "first pass found {} code and {} data words, second pass produced {} and {}",
            counters.code_words,
            counters.data_words,
            binary.code.len(),
            binary.data.len()
        );
        errors.record(ErrorKind::InternalInconsistency, 0);
    }
    listing.set_data_origin(counters.data_origin());
    (binary, listing)
}
