//! Machine words and their interpretations.
//!
//! Every memory cell holds 10 bits, but those bits mean different
//! things depending on where the cell sits in an instruction (or in
//! the data area).  At the file-format level nothing but position
//! tells them apart.  Here each interpretation is a separate variant
//! of [`Word`], and decoding requires the caller to say which
//! interpretation ([`WordKind`]) it expects.
//!
//! | Kind             | bits 9-6        | bits 5-2                   | bits 1-0 |
//! |------------------|-----------------|----------------------------|----------|
//! | First            | opcode          | source mode, dest. mode    | ARE      |
//! | Immediate        | 8-bit two's complement value                 || ARE      |
//! | Registers        | source register | destination register       | ARE      |
//! | Address          | 8-bit address                                || ARE      |
//! | MatrixRegisters  | row register    | column register            | ARE      |
//! | Data             | 10-bit value (no ARE field)                       |||

use std::fmt::{self, Display, Formatter};

#[cfg(test)]
use test_strategy::{proptest, Arbitrary};

use super::error::DecodeFailure;
use super::instruction::{AddressingMode, Are, Opcode, Register};
use super::types::{Address, Unsigned10Bit};

const ARE_SHIFT: u32 = 0;
const DEST_MODE_SHIFT: u32 = 2;
const SOURCE_MODE_SHIFT: u32 = 4;
const OPCODE_SHIFT: u32 = 6;
const PAYLOAD_SHIFT: u32 = 2;
const LOW_REGISTER_SHIFT: u32 = 2;
const HIGH_REGISTER_SHIFT: u32 = 6;

/// Selects one of the interpretations of a 10-bit cell.
#[cfg_attr(test, derive(Arbitrary))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WordKind {
    First,
    Immediate,
    Registers,
    Address,
    MatrixRegisters,
    Data,
}

#[cfg_attr(test, derive(Arbitrary))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Word {
    /// The first word of every instruction.  An absent operand has
    /// mode field 0.
    First {
        opcode: Opcode,
        source: AddressingMode,
        destination: AddressingMode,
        are: Are,
    },
    /// The value of an immediate (`#n`) operand.
    Immediate { value: i8, are: Are },
    /// Register operands.  When only one operand is a register, the
    /// other half holds [`Register::R0`] (i.e. zero bits).
    Registers {
        source: Register,
        destination: Register,
        are: Are,
    },
    /// The address of a label (zero for an external symbol).
    Address { address: Address, are: Are },
    /// The index registers of a matrix operand.
    MatrixRegisters {
        row: Register,
        column: Register,
        are: Are,
    },
    /// A cell in the data area.
    Data(Unsigned10Bit),
}

impl Word {
    /// A word holding a source register operand, with no register
    /// destination.
    pub fn source_register(r: Register) -> Word {
        Word::Registers {
            source: r,
            destination: Register::R0,
            are: Are::Absolute,
        }
    }

    /// A word holding a destination register operand, with no register
    /// source.
    pub fn destination_register(r: Register) -> Word {
        Word::Registers {
            source: Register::R0,
            destination: r,
            are: Are::Absolute,
        }
    }

    pub fn kind(&self) -> WordKind {
        match self {
            Word::First { .. } => WordKind::First,
            Word::Immediate { .. } => WordKind::Immediate,
            Word::Registers { .. } => WordKind::Registers,
            Word::Address { .. } => WordKind::Address,
            Word::MatrixRegisters { .. } => WordKind::MatrixRegisters,
            Word::Data(_) => WordKind::Data,
        }
    }

    /// The ARE tag of the word.  Data words have no ARE field; their
    /// low bits are part of the value, so we report them as absolute.
    pub fn are(&self) -> Are {
        match self {
            Word::First { are, .. }
            | Word::Immediate { are, .. }
            | Word::Registers { are, .. }
            | Word::Address { are, .. }
            | Word::MatrixRegisters { are, .. } => *are,
            Word::Data(_) => Are::Absolute,
        }
    }

    /// Pack the word into its 10-bit form.
    pub fn bits(&self) -> Unsigned10Bit {
        let bits: u16 = match self {
            Word::First {
                opcode,
                source,
                destination,
                are,
            } => {
                (u16::from(opcode.number()) << OPCODE_SHIFT)
                    | (source.bits() << SOURCE_MODE_SHIFT)
                    | (destination.bits() << DEST_MODE_SHIFT)
                    | (are.bits() << ARE_SHIFT)
            }
            Word::Immediate { value, are } => {
                // `as u8` keeps the two's complement bit pattern.
                (u16::from(*value as u8) << PAYLOAD_SHIFT) | are.bits()
            }
            Word::Registers {
                source,
                destination,
                are,
            } => {
                (u16::from(source.number()) << HIGH_REGISTER_SHIFT)
                    | (u16::from(destination.number()) << LOW_REGISTER_SHIFT)
                    | are.bits()
            }
            Word::Address { address, are } => (u16::from(*address) << PAYLOAD_SHIFT) | are.bits(),
            Word::MatrixRegisters { row, column, are } => {
                (u16::from(row.number()) << HIGH_REGISTER_SHIFT)
                    | (u16::from(column.number()) << LOW_REGISTER_SHIFT)
                    | are.bits()
            }
            Word::Data(value) => value.bits(),
        };
        Unsigned10Bit {
            bits: bits & Unsigned10Bit::MAX.bits(),
        }
    }

    /// Unpack a 10-bit cell, given the interpretation it is known to
    /// have.
    pub fn decode(kind: WordKind, w: Unsigned10Bit) -> Result<Word, DecodeFailure> {
        let are = || Are::try_from(w.field(ARE_SHIFT, 2));
        let high_register = || Register::try_from(w.field(HIGH_REGISTER_SHIFT, 4));
        let low_register = || Register::try_from(w.field(LOW_REGISTER_SHIFT, 4));
        match kind {
            WordKind::First => Ok(Word::First {
                opcode: Opcode::from_number((w.field(OPCODE_SHIFT, 4) & 0xF) as u8)
                    .expect("every 4-bit value is an opcode"),
                source: AddressingMode::from_bits(w.field(SOURCE_MODE_SHIFT, 2)),
                destination: AddressingMode::from_bits(w.field(DEST_MODE_SHIFT, 2)),
                are: are()?,
            }),
            WordKind::Immediate => Ok(Word::Immediate {
                value: (w.field(PAYLOAD_SHIFT, 8) as u8) as i8,
                are: are()?,
            }),
            WordKind::Registers => Ok(Word::Registers {
                source: high_register()?,
                destination: low_register()?,
                are: are()?,
            }),
            WordKind::Address => Ok(Word::Address {
                address: Address::new(w.field(PAYLOAD_SHIFT, 8) as u8),
                are: are()?,
            }),
            WordKind::MatrixRegisters => Ok(Word::MatrixRegisters {
                row: high_register()?,
                column: low_register()?,
                are: are()?,
            }),
            WordKind::Data => Ok(Word::Data(w)),
        }
    }
}

impl Display for Word {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Word::First {
                opcode,
                source,
                destination,
                are,
            } => write!(f, "{opcode} src={source} dst={destination} {are:?}"),
            Word::Immediate { value, are } => write!(f, "#{value} {are:?}"),
            Word::Registers {
                source,
                destination,
                are,
            } => write!(f, "src={source} dst={destination} {are:?}"),
            Word::Address { address, are } => write!(f, "@{address} {are:?}"),
            Word::MatrixRegisters { row, column, are } => {
                write!(f, "[{row}][{column}] {are:?}")
            }
            Word::Data(value) => write!(f, "data {}", value.as_signed()),
        }
    }
}

#[test]
fn test_first_word_layout() {
    // mov #5, r1: opcode 0, source immediate (0), destination register (3).
    let w = Word::First {
        opcode: Opcode::Mov,
        source: AddressingMode::Immediate,
        destination: AddressingMode::Register,
        are: Are::Absolute,
    };
    assert_eq!(w.bits().bits(), 0b0000_00_11_00);

    // stop: opcode 15, no operands.
    let w = Word::First {
        opcode: Opcode::Stop,
        source: AddressingMode::Immediate,
        destination: AddressingMode::Immediate,
        are: Are::Absolute,
    };
    assert_eq!(w.bits().bits(), 0b1111_00_00_00);
}

#[test]
fn test_negative_immediate() {
    let w = Word::Immediate {
        value: -1,
        are: Are::Absolute,
    };
    assert_eq!(w.bits().bits(), 0b1111_1111_00);
}

#[test]
fn test_register_halves() {
    assert_eq!(
        Word::source_register(Register::R3).bits().bits(),
        0b0011_0000_00
    );
    assert_eq!(
        Word::destination_register(Register::R3).bits().bits(),
        0b0000_0011_00
    );
}

#[test]
fn test_external_address_word() {
    let w = Word::Address {
        address: Address::ZERO,
        are: Are::External,
    };
    assert_eq!(w.bits().bits(), 0b01);
}

#[test]
fn test_decode_rejects_bad_register_field() {
    let bits = Unsigned10Bit::try_from(0b1001_0000_00_u16).unwrap();
    assert_eq!(
        Word::decode(WordKind::Registers, bits),
        Err(DecodeFailure::InvalidRegister(9))
    );
}

#[cfg(test)]
#[proptest]
fn encoding_then_decoding_gives_the_same_word(w: Word) {
    assert_eq!(Word::decode(w.kind(), w.bits()), Ok(w));
}
