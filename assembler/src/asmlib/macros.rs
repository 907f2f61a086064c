//! The table of macro definitions.
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use super::types::LineNumber;

/// A macro: a name and the lines of its body, in order.  Once the
/// definition is closed by `mcroend` it is never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroEntry {
    name: String,
    body: Vec<String>,
    defined_at: LineNumber,
}

impl MacroEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> &[String] {
        &self.body
    }

    pub fn defined_at(&self) -> LineNumber {
        self.defined_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroTableError {
    NameConflict(String),
    NotFound(String),
}

impl Display for MacroTableError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MacroTableError::NameConflict(name) => {
                write!(f, "macro {name} is already defined")
            }
            MacroTableError::NotFound(name) => write!(f, "macro {name} is not defined"),
        }
    }
}

impl std::error::Error for MacroTableError {}

/// Macro definitions, looked up by name.  Definitions are only ever
/// added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroTable {
    macros: BTreeMap<String, MacroEntry>,
}

impl MacroTable {
    pub fn new() -> MacroTable {
        MacroTable::default()
    }

    /// Start a new (empty) macro definition.
    ///
    /// # Errors
    ///
    /// Fails if a macro of the same name already exists.
    pub fn define(&mut self, name: &str, defined_at: LineNumber) -> Result<(), MacroTableError> {
        if self.macros.contains_key(name) {
            return Err(MacroTableError::NameConflict(name.to_string()));
        }
        self.macros.insert(
            name.to_string(),
            MacroEntry {
                name: name.to_string(),
                body: Vec::new(),
                defined_at,
            },
        );
        Ok(())
    }

    /// Append a line to the body of the macro `name`.
    ///
    /// # Errors
    ///
    /// Fails if there is no such macro.
    pub fn append_body(&mut self, name: &str, line: &str) -> Result<(), MacroTableError> {
        match self.macros.get_mut(name) {
            Some(entry) => {
                entry.body.push(line.to_string());
                Ok(())
            }
            None => Err(MacroTableError::NotFound(name.to_string())),
        }
    }

    /// The body of the macro `name`, line by line.
    ///
    /// # Errors
    ///
    /// Fails if there is no such macro.
    pub fn expand(&self, name: &str) -> Result<&[String], MacroTableError> {
        self.macros
            .get(name)
            .map(|entry| entry.body())
            .ok_or_else(|| MacroTableError::NotFound(name.to_string()))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&MacroEntry> {
        self.macros.get(name)
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}
