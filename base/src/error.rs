//! Basic error reporting.

use std::error::Error;
use std::fmt::{self, Debug, Display, Formatter};

/// Represents a failure to convert to or from one of the fixed-width
/// types defined in the base crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConversionFailed {
    TooLarge,
    TooSmall,
}

impl Error for ConversionFailed {}

impl Display for ConversionFailed {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            ConversionFailed::TooLarge => f.write_str("value is too large"),
            ConversionFailed::TooSmall => f.write_str("value is too small"),
        }
    }
}

/// Signals that a bit pattern (or a base-4 string) could not be
/// turned back into the thing it is supposed to represent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeFailure {
    /// The ARE field holds 0b11, which no word may carry.
    InvalidAre(u8),
    /// A register field holds a number larger than the highest
    /// register.
    InvalidRegister(u8),
    /// A base-4 string contains something other than `a`-`d`.
    InvalidDigit(char),
    /// A base-4 string is too long for the target width.
    TooManyDigits(usize),
    /// A base-4 string is empty.
    Empty,
}

impl Error for DecodeFailure {}

impl Display for DecodeFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            DecodeFailure::InvalidAre(bits) => {
                write!(f, "ARE field value {bits:#b} is not valid")
            }
            DecodeFailure::InvalidRegister(n) => {
                write!(f, "register number {n} does not exist")
            }
            DecodeFailure::InvalidDigit(ch) => {
                write!(f, "'{ch}' is not a base-4 digit (expected one of a, b, c, d)")
            }
            DecodeFailure::TooManyDigits(n) => {
                write!(f, "{n} base-4 digits will not fit in the target width")
            }
            DecodeFailure::Empty => f.write_str("empty base-4 string"),
        }
    }
}
