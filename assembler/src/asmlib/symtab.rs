//! The symbol table built by the first pass.
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use tracing::{event, Level};

use base::prelude::Address;

use super::types::LineNumber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SymbolKind {
    /// A label on an instruction.
    Code,
    /// A label on `.data` or `.string`.
    Data,
    /// A label on `.mat`.
    Matrix,
    /// Declared by `.extern`; the address is always zero.
    Extern,
}

impl SymbolKind {
    /// Symbols which live in the data area, and so move when the
    /// data area is placed after the code.
    pub fn is_data(&self) -> bool {
        matches!(self, SymbolKind::Data | SymbolKind::Matrix)
    }
}

impl Display for SymbolKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SymbolKind::Code => "code",
            SymbolKind::Data => "data",
            SymbolKind::Matrix => "matrix",
            SymbolKind::Extern => "extern",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub address: Address,
    pub kind: SymbolKind,
    /// Set only by `.entry`.
    pub entry: bool,
    pub defined_at: LineNumber,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolTableError {
    Duplicate(String),
    NotFound(String),
    IsExtern(String),
    /// Relocation would move the symbol past the end of memory.
    AddressOverflow(String),
}

impl Display for SymbolTableError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SymbolTableError::Duplicate(name) => write!(f, "symbol {name} is already defined"),
            SymbolTableError::NotFound(name) => write!(f, "symbol {name} is not defined"),
            SymbolTableError::IsExtern(name) => write!(f, "symbol {name} is external"),
            SymbolTableError::AddressOverflow(name) => {
                write!(f, "symbol {name} would lie outside memory")
            }
        }
    }
}

impl std::error::Error for SymbolTableError {}

/// Symbols by name.  Each name is defined at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    symbols: BTreeMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    /// Define a new symbol.
    ///
    /// # Errors
    ///
    /// Fails if the name is already defined.
    pub fn insert(
        &mut self,
        name: &str,
        kind: SymbolKind,
        address: Address,
        defined_at: LineNumber,
    ) -> Result<(), SymbolTableError> {
        if self.symbols.contains_key(name) {
            return Err(SymbolTableError::Duplicate(name.to_string()));
        }
        event!(
            Level::DEBUG,
            "line {defined_at}: defining {kind} symbol {name} at {address}"
        );
        self.symbols.insert(
            name.to_string(),
            Symbol {
                name: name.to_string(),
                address,
                kind,
                entry: false,
                defined_at,
            },
        );
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Mark a symbol as an entry point.  Marking it twice is harmless.
    ///
    /// # Errors
    ///
    /// Fails if the symbol is undefined or external.
    pub fn mark_entry(&mut self, name: &str) -> Result<(), SymbolTableError> {
        match self.symbols.get_mut(name) {
            None => Err(SymbolTableError::NotFound(name.to_string())),
            Some(sym) if sym.kind == SymbolKind::Extern => {
                Err(SymbolTableError::IsExtern(name.to_string()))
            }
            Some(sym) => {
                sym.entry = true;
                Ok(())
            }
        }
    }

    /// Move every data and matrix symbol up by `offset` cells.
    ///
    /// # Errors
    ///
    /// Fails (leaving the table partly relocated) if a symbol would
    /// end up outside memory.
    pub fn relocate_data_symbols(&mut self, offset: usize) -> Result<(), SymbolTableError> {
        for sym in self.symbols.values_mut().filter(|sym| sym.kind.is_data()) {
            sym.address = sym
                .address
                .checked_add(offset)
                .ok_or_else(|| SymbolTableError::AddressOverflow(sym.name.clone()))?;
        }
        Ok(())
    }

    /// Entry symbols in order of increasing address.
    pub fn entries(&self) -> Vec<&Symbol> {
        let mut result: Vec<&Symbol> = self.symbols.values().filter(|sym| sym.entry).collect();
        result.sort_by_key(|sym| (sym.address, sym.name.as_str()));
        result
    }

    /// All symbols, in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl Display for SymbolTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for sym in self.symbols.values() {
            write!(
                f,
                "{:<30} {:>3} {:<6}",
                sym.name,
                u8::from(sym.address),
                sym.kind
            )?;
            if sym.entry {
                f.write_str(" entry")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
