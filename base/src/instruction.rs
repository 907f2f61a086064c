//! Symbolic representation of the machine's instruction set.
//!
//! An instruction occupies between one and five 10-bit words.  The
//! first word always looks like this (least significant bit on the
//! right, bits numbered 0 to 9):
//!
//! |Opcode |Source mode|Destination mode|ARE   |
//! |-------|-----------|----------------|------|
//! |4 bits |  2 bits   |    2 bits      |2 bits|
//! |(6-9)  |  (4-5)    |    (2-3)       |(0-1) |
//!
//! The words which follow it depend on the addressing modes of the
//! operands; see [`crate::word::Word`].

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

#[cfg(test)]
use test_strategy::{proptest, Arbitrary};

use super::error::DecodeFailure;

/// The machine's operations, numbered as they appear in the opcode
/// field of the first instruction word.
#[cfg_attr(test, derive(Arbitrary))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Opcode {
    Mov = 0,
    Cmp = 1,
    Add = 2,
    Sub = 3,
    Lea = 4,
    Clr = 5,
    Not = 6,
    Inc = 7,
    Dec = 8,
    Jmp = 9,
    Bne = 10,
    Jsr = 11,
    Red = 12,
    Prn = 13,
    Rts = 14,
    Stop = 15,
}

const ALL_MODES: &[AddressingMode] = &[
    AddressingMode::Immediate,
    AddressingMode::Direct,
    AddressingMode::Matrix,
    AddressingMode::Register,
];
const WRITABLE_MODES: &[AddressingMode] = &[
    AddressingMode::Direct,
    AddressingMode::Matrix,
    AddressingMode::Register,
];
const MEMORY_MODES: &[AddressingMode] = &[AddressingMode::Direct, AddressingMode::Matrix];
const NO_MODES: &[AddressingMode] = &[];

impl Opcode {
    pub const ALL: [Opcode; 16] = [
        Opcode::Mov,
        Opcode::Cmp,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Lea,
        Opcode::Clr,
        Opcode::Not,
        Opcode::Inc,
        Opcode::Dec,
        Opcode::Jmp,
        Opcode::Bne,
        Opcode::Jsr,
        Opcode::Red,
        Opcode::Prn,
        Opcode::Rts,
        Opcode::Stop,
    ];

    pub fn number(&self) -> u8 {
        *self as u8
    }

    pub fn from_number(n: u8) -> Option<Opcode> {
        Opcode::ALL.get(usize::from(n)).copied()
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Mov => "mov",
            Opcode::Cmp => "cmp",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Lea => "lea",
            Opcode::Clr => "clr",
            Opcode::Not => "not",
            Opcode::Inc => "inc",
            Opcode::Dec => "dec",
            Opcode::Jmp => "jmp",
            Opcode::Bne => "bne",
            Opcode::Jsr => "jsr",
            Opcode::Red => "red",
            Opcode::Prn => "prn",
            Opcode::Rts => "rts",
            Opcode::Stop => "stop",
        }
    }

    /// The number of operands the instruction takes (0, 1 or 2).
    pub fn operand_count(&self) -> usize {
        match self {
            Opcode::Mov | Opcode::Cmp | Opcode::Add | Opcode::Sub | Opcode::Lea => 2,
            Opcode::Clr
            | Opcode::Not
            | Opcode::Inc
            | Opcode::Dec
            | Opcode::Jmp
            | Opcode::Bne
            | Opcode::Jsr
            | Opcode::Red
            | Opcode::Prn => 1,
            Opcode::Rts | Opcode::Stop => 0,
        }
    }

    /// Addressing modes the source operand may use.  Empty for
    /// instructions without a source operand.
    pub fn legal_source_modes(&self) -> &'static [AddressingMode] {
        match self {
            Opcode::Mov | Opcode::Cmp | Opcode::Add | Opcode::Sub => ALL_MODES,
            Opcode::Lea => MEMORY_MODES,
            _ => NO_MODES,
        }
    }

    /// Addressing modes the destination operand may use.  Empty for
    /// instructions without operands.
    pub fn legal_destination_modes(&self) -> &'static [AddressingMode] {
        match self {
            Opcode::Cmp | Opcode::Prn => ALL_MODES,
            Opcode::Rts | Opcode::Stop => NO_MODES,
            _ => WRITABLE_MODES,
        }
    }

    pub fn accepts_source(&self, mode: AddressingMode) -> bool {
        self.legal_source_modes().contains(&mode)
    }

    pub fn accepts_destination(&self, mode: AddressingMode) -> bool {
        self.legal_destination_modes().contains(&mode)
    }
}

impl Display for Opcode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMnemonic(pub String);

impl Display for UnknownMnemonic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not an operation name", self.0)
    }
}

impl std::error::Error for UnknownMnemonic {}

impl FromStr for Opcode {
    type Err = UnknownMnemonic;

    /// Mnemonics are case-sensitive; `MOV` is not an operation.
    fn from_str(s: &str) -> Result<Opcode, UnknownMnemonic> {
        Opcode::ALL
            .iter()
            .find(|op| op.mnemonic() == s)
            .copied()
            .ok_or_else(|| UnknownMnemonic(s.to_string()))
    }
}

/// How an operand is located.  The discriminant is the value of the
/// 2-bit mode field.
#[cfg_attr(test, derive(Arbitrary))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AddressingMode {
    /// `#5`: the value is in the word following the instruction.
    Immediate = 0,
    /// `LABEL`: the address of the operand follows the instruction.
    Direct = 1,
    /// `M[r1][r2]`: the matrix base address follows the instruction,
    /// then a word naming the row and column registers.
    Matrix = 2,
    /// `r3`: the operand is a register.
    Register = 3,
}

impl AddressingMode {
    pub fn bits(&self) -> u16 {
        *self as u16
    }

    pub fn from_bits(bits: u16) -> AddressingMode {
        match bits & 0b11 {
            0 => AddressingMode::Immediate,
            1 => AddressingMode::Direct,
            2 => AddressingMode::Matrix,
            _ => AddressingMode::Register,
        }
    }
}

impl Display for AddressingMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AddressingMode::Immediate => "immediate",
            AddressingMode::Direct => "direct",
            AddressingMode::Matrix => "matrix",
            AddressingMode::Register => "register",
        })
    }
}

/// The Absolute/Relocatable/External tag carried in the bottom two
/// bits of every instruction word.
#[cfg_attr(test, derive(Arbitrary))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Are {
    Absolute = 0b00,
    External = 0b01,
    Relocatable = 0b10,
}

impl Are {
    pub fn bits(&self) -> u16 {
        *self as u16
    }
}

impl TryFrom<u16> for Are {
    type Error = DecodeFailure;
    fn try_from(bits: u16) -> Result<Are, DecodeFailure> {
        match bits {
            0b00 => Ok(Are::Absolute),
            0b01 => Ok(Are::External),
            0b10 => Ok(Are::Relocatable),
            other => Err(DecodeFailure::InvalidAre((other & 0xFF) as u8)),
        }
    }
}

/// One of the eight general registers, `r0` to `r7`.
#[cfg_attr(test, derive(Arbitrary))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Register {
    #[default]
    R0 = 0,
    R1 = 1,
    R2 = 2,
    R3 = 3,
    R4 = 4,
    R5 = 5,
    R6 = 6,
    R7 = 7,
}

impl Register {
    pub const ALL: [Register; 8] = [
        Register::R0,
        Register::R1,
        Register::R2,
        Register::R3,
        Register::R4,
        Register::R5,
        Register::R6,
        Register::R7,
    ];

    pub fn number(&self) -> u8 {
        *self as u8
    }

    pub fn name(&self) -> &'static str {
        ["r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7"][usize::from(self.number())]
    }
}

impl TryFrom<u16> for Register {
    type Error = DecodeFailure;
    fn try_from(n: u16) -> Result<Register, DecodeFailure> {
        Register::ALL
            .get(usize::from(n))
            .copied()
            .ok_or(DecodeFailure::InvalidRegister((n & 0xFF) as u8))
    }
}

impl FromStr for Register {
    type Err = ();

    fn from_str(s: &str) -> Result<Register, ()> {
        Register::ALL
            .iter()
            .find(|r| r.name() == s)
            .copied()
            .ok_or(())
    }
}

impl Display for Register {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[test]
fn test_opcode_numbers_follow_table_order() {
    for (n, op) in Opcode::ALL.iter().enumerate() {
        assert_eq!(usize::from(op.number()), n);
        assert_eq!(Opcode::from_number(op.number()), Some(*op));
    }
    assert_eq!(Opcode::from_number(16), None);
}

#[test]
fn test_mnemonic_lookup() {
    assert_eq!("stop".parse::<Opcode>(), Ok(Opcode::Stop));
    assert_eq!("lea".parse::<Opcode>(), Ok(Opcode::Lea));
    assert!("MOV".parse::<Opcode>().is_err());
    assert!("halt".parse::<Opcode>().is_err());
}

#[test]
fn test_lea_source_must_be_in_memory() {
    assert!(Opcode::Lea.accepts_source(AddressingMode::Direct));
    assert!(Opcode::Lea.accepts_source(AddressingMode::Matrix));
    assert!(!Opcode::Lea.accepts_source(AddressingMode::Immediate));
    assert!(!Opcode::Lea.accepts_source(AddressingMode::Register));
}

#[test]
fn test_immediate_destination_only_for_cmp_and_prn() {
    for op in Opcode::ALL {
        let expected = matches!(op, Opcode::Cmp | Opcode::Prn);
        assert_eq!(
            op.accepts_destination(AddressingMode::Immediate),
            expected,
            "{op}"
        );
    }
}

#[test]
fn test_mode_tables_agree_with_operand_count() {
    for op in Opcode::ALL {
        let expected_count = match (
            op.legal_source_modes().is_empty(),
            op.legal_destination_modes().is_empty(),
        ) {
            (true, true) => 0,
            (true, false) => 1,
            (false, false) => 2,
            (false, true) => panic!("{op} has a source but no destination"),
        };
        assert_eq!(op.operand_count(), expected_count, "{op}");
    }
}

#[test]
fn test_register_names() {
    assert_eq!("r5".parse::<Register>(), Ok(Register::R5));
    assert_eq!("r8".parse::<Register>(), Err(()));
    assert_eq!("R1".parse::<Register>(), Err(()));
    assert_eq!(Register::try_from(8_u16), Err(DecodeFailure::InvalidRegister(8)));
}

#[test]
fn test_are_rejects_reserved_value() {
    assert_eq!(Are::try_from(0b11_u16), Err(DecodeFailure::InvalidAre(3)));
}

#[cfg(test)]
#[proptest]
fn addressing_mode_bits_are_reversible(mode: AddressingMode) {
    assert_eq!(AddressingMode::from_bits(mode.bits()), mode);
}
