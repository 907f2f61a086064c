//! An optional human-readable listing of the assembled program.
use std::fmt::{self, Display, Formatter};

use base::prelude::{address_to_base4, word_to_base4, Address, Word};

use super::symtab::SymbolTable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ListingLine {
    Instruction {
        address: Address,
        words: Vec<Word>,
        text: String,
    },
    /// Data statements only know their position within the data
    /// area until the code size is known.
    Data {
        offset: usize,
        words: Vec<Word>,
        text: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Listing {
    data_origin: usize,
    output: Vec<ListingLine>,
}

impl Listing {
    pub(crate) fn push_line(&mut self, line: ListingLine) {
        self.output.push(line);
    }

    pub(crate) fn set_data_origin(&mut self, origin: usize) {
        self.data_origin = origin;
    }

    fn address_of(&self, line: &ListingLine) -> Option<Address> {
        match line {
            ListingLine::Instruction { address, .. } => Some(*address),
            ListingLine::Data { offset, .. } => {
                Address::try_from(self.data_origin.checked_add(*offset)?).ok()
            }
        }
    }
}

/// Words shown on each line of the listing.
const WORD_COLUMNS: usize = 3;
/// Width of one base-4 word plus its separator.
const WORD_WIDTH: usize = 6;

fn write_words(f: &mut Formatter<'_>, words: &[Word]) -> fmt::Result {
    for (i, chunk) in words.chunks(WORD_COLUMNS).enumerate() {
        if i > 0 {
            write!(f, "\n{:8}", "")?;
        }
        for w in chunk {
            write!(f, " {}", word_to_base4(w.bits()))?;
        }
    }
    Ok(())
}

pub(crate) struct ListingWithSymbols<'a> {
    pub(crate) listing: &'a Listing,
    pub(crate) symtab: &'a SymbolTable,
}

impl Display for ListingWithSymbols<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for line in self.listing.output.iter() {
            let (words, text) = match line {
                ListingLine::Instruction { words, text, .. }
                | ListingLine::Data { words, text, .. } => (words, text),
            };
            match self.listing.address_of(line) {
                Some(address) => {
                    write!(
                        f,
                        "{:>3} {}",
                        u8::from(address),
                        address_to_base4(address)
                    )?;
                }
                None => write!(f, "{:8}", "???")?,
            }
            write_words(f, words)?;
            let in_last_row = match words.len() {
                0 => 0,
                n => (n - 1) % WORD_COLUMNS + 1,
            };
            let width = (WORD_COLUMNS - in_last_row) * WORD_WIDTH;
            writeln!(f, "{:width$}  {}", "", text.trim())?;
        }
        writeln!(f)?;
        writeln!(f, "Symbol Table:")?;
        write!(f, "{}", self.symtab)
    }
}
