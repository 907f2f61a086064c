/// The machine uses 10-bit words.  We use [`Unsigned10Bit`] to
/// represent the contents of one memory cell, and [`Address`] to
/// represent the (8-bit) location of a cell.
use std::fmt::{self, Debug, Display, Formatter, Octal};

#[cfg(test)]
use test_strategy::Arbitrary;

use super::error::ConversionFailed;

/// Number of cells in the machine's memory.  Addresses are 8 bits
/// wide, so the last cell is at address 255.
pub const MEMORY_SIZE: usize = 256;

/// A 10-bit quantity.  Signed values are stored in two's complement.
#[cfg_attr(test, derive(Arbitrary))]
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Unsigned10Bit {
    #[cfg_attr(test, strategy(0u16..1024))]
    pub(crate) bits: u16,
}

impl Unsigned10Bit {
    pub const WIDTH: u32 = 10;
    pub const ZERO: Unsigned10Bit = Unsigned10Bit { bits: 0 };
    pub const MAX: Unsigned10Bit = Unsigned10Bit { bits: 0o1777 };

    /// The smallest and largest values representable when the word
    /// is interpreted as a signed (two's complement) number.
    pub const MIN_SIGNED: i32 = -512;
    pub const MAX_SIGNED: i32 = 511;

    pub const fn new<const N: u16>() -> Unsigned10Bit {
        assert!(N <= 0o1777);
        Unsigned10Bit { bits: N }
    }

    /// Build a word from a signed value, using two's complement for
    /// negative values.
    pub fn from_signed(n: i32) -> Result<Unsigned10Bit, ConversionFailed> {
        if n < Self::MIN_SIGNED {
            Err(ConversionFailed::TooSmall)
        } else if n > Self::MAX_SIGNED {
            Err(ConversionFailed::TooLarge)
        } else {
            // Truncation to 10 bits yields the two's complement form.
            Ok(Unsigned10Bit {
                bits: (n as u16) & Self::MAX.bits,
            })
        }
    }

    /// Interpret the word as a two's complement signed value.
    pub fn as_signed(self) -> i16 {
        if self.bits & 0o1000 == 0 {
            self.bits as i16
        } else {
            (self.bits as i16) - 1024
        }
    }

    pub const fn bits(self) -> u16 {
        self.bits
    }

    /// Extract the field `width` bits wide whose least significant
    /// bit is `shift`.
    pub fn field(self, shift: u32, width: u32) -> u16 {
        (self.bits >> shift) & ((1 << width) - 1)
    }
}

impl From<u8> for Unsigned10Bit {
    fn from(n: u8) -> Unsigned10Bit {
        Unsigned10Bit { bits: n.into() }
    }
}

impl TryFrom<u16> for Unsigned10Bit {
    type Error = ConversionFailed;
    fn try_from(n: u16) -> Result<Unsigned10Bit, ConversionFailed> {
        if n > Self::MAX.bits {
            Err(ConversionFailed::TooLarge)
        } else {
            Ok(Unsigned10Bit { bits: n })
        }
    }
}

impl TryFrom<u32> for Unsigned10Bit {
    type Error = ConversionFailed;
    fn try_from(n: u32) -> Result<Unsigned10Bit, ConversionFailed> {
        u16::try_from(n)
            .map_err(|_| ConversionFailed::TooLarge)
            .and_then(Unsigned10Bit::try_from)
    }
}

impl From<Unsigned10Bit> for u16 {
    fn from(w: Unsigned10Bit) -> u16 {
        w.bits
    }
}

impl From<Unsigned10Bit> for u32 {
    fn from(w: Unsigned10Bit) -> u32 {
        w.bits.into()
    }
}

impl Display for Unsigned10Bit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.bits, f)
    }
}

impl Debug for Unsigned10Bit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Unsigned10Bit({:#06o})", self.bits)
    }
}

impl Octal for Unsigned10Bit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Octal::fmt(&self.bits, f)
    }
}

/// The location of a memory cell.
#[cfg_attr(test, derive(Arbitrary))]
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(u8);

impl Address {
    pub const ZERO: Address = Address(0);
    pub const MAX: Address = Address(u8::MAX);

    /// Programs are loaded starting at this address; the cells below
    /// it are reserved.
    pub const CODE_BASE: Address = Address(100);

    pub const fn new(a: u8) -> Address {
        Address(a)
    }

    /// Compute the address `delta` cells beyond this one, if that
    /// is still inside memory.
    pub fn checked_add(&self, delta: usize) -> Option<Address> {
        usize::from(self.0)
            .checked_add(delta)
            .and_then(|n| u8::try_from(n).ok())
            .map(Address)
    }
}

impl From<u8> for Address {
    fn from(a: u8) -> Address {
        Address(a)
    }
}

impl TryFrom<usize> for Address {
    type Error = ConversionFailed;
    fn try_from(n: usize) -> Result<Address, ConversionFailed> {
        u8::try_from(n)
            .map(Address)
            .map_err(|_| ConversionFailed::TooLarge)
    }
}

impl From<Address> for u8 {
    fn from(a: Address) -> u8 {
        a.0
    }
}

impl From<Address> for usize {
    fn from(a: Address) -> usize {
        a.0.into()
    }
}

impl From<Address> for u16 {
    fn from(a: Address) -> u16 {
        a.0.into()
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}
