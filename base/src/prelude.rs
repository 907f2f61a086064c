//! The prelude exports the structs which are useful in representing
//! programs for the 10-bit machine.  Providing this prelude is the
//! main purpose of the base crate.
pub use super::base4::{
    address_to_base4, decode_base4, encode_base4, word_to_base4, ADDRESS_DIGITS, WORD_DIGITS,
};
pub use super::error::*;
pub use super::instruction::*;
pub use super::types::*;
pub use super::word::{Word, WordKind};
pub use super::u10;
