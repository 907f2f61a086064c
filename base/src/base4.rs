//! The "unique base 4" text encoding used in object files.
//!
//! Each pair of bits becomes one letter (`a`=0, `b`=1, `c`=2, `d`=3),
//! most significant pair first.  Values are always written with a
//! fixed number of digits: 5 for a 10-bit word and 4 for an 8-bit
//! address.

use super::error::{ConversionFailed, DecodeFailure};
use super::types::{Address, Unsigned10Bit};

const DIGITS: [char; 4] = ['a', 'b', 'c', 'd'];

/// Number of base-4 digits used for a machine word.
pub const WORD_DIGITS: usize = 5;
/// Number of base-4 digits used for an address (or a count).
pub const ADDRESS_DIGITS: usize = 4;

/// Render `value` as exactly `width` base-4 digits.
///
/// # Errors
///
/// Fails if `value` does not fit in `width` digits.
pub fn encode_base4(value: u32, width: usize) -> Result<String, ConversionFailed> {
    let bits = width.saturating_mul(2);
    if bits < 32 && u64::from(value) >= (1u64 << bits) {
        return Err(ConversionFailed::TooLarge);
    }
    let digit_at = |position: usize| -> char {
        let shift = u32::try_from(position * 2).unwrap_or(u32::MAX);
        DIGITS[(value.checked_shr(shift).unwrap_or(0) & 0b11) as usize]
    };
    Ok((0..width).rev().map(digit_at).collect())
}

/// Parse a base-4 string written with the `a`-`d` alphabet.
///
/// # Errors
///
/// Fails on an empty string, an unknown digit, or more digits than
/// fit in a `u32`.
pub fn decode_base4(s: &str) -> Result<u32, DecodeFailure> {
    if s.is_empty() {
        return Err(DecodeFailure::Empty);
    }
    let count = s.chars().count();
    if count > 16 {
        return Err(DecodeFailure::TooManyDigits(count));
    }
    s.chars().try_fold(0u32, |acc, ch| match ch {
        'a'..='d' => Ok((acc << 2) | (u32::from(ch) - u32::from('a'))),
        other => Err(DecodeFailure::InvalidDigit(other)),
    })
}

pub fn word_to_base4(w: Unsigned10Bit) -> String {
    encode_base4(w.into(), WORD_DIGITS).expect("a 10-bit value always fits in 5 base-4 digits")
}

pub fn address_to_base4(a: Address) -> String {
    encode_base4(u8::from(a).into(), ADDRESS_DIGITS)
        .expect("an 8-bit value always fits in 4 base-4 digits")
}
