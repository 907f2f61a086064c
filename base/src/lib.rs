//! The `base` crate defines the things about the 10-bit machine which
//! are useful to more than one tool.  The idea is that if you want to
//! write an assembler (or a disassembler, or a loader), it would
//! depend on the base crate and find here the shape of a machine word,
//! the instruction set, and the "abcd" base-4 text encoding used by
//! object files.

mod types;

pub mod base4;
pub mod error;
pub mod instruction;
pub mod prelude;
pub mod word;

pub use crate::types::*;

#[macro_export]
macro_rules! u10 {
    ($n:expr) => {
        $crate::prelude::Unsigned10Bit::new::<{ $n }>()
    };
}

#[test]
fn test_u10() {
    use prelude::Unsigned10Bit;
    let m: Unsigned10Bit = u10!(40_u16);
    let n: Unsigned10Bit = Unsigned10Bit::from(40_u8);
    assert_eq!(m, n);

    let p: Unsigned10Bit = u10!(0o1777);
    let q: Unsigned10Bit = Unsigned10Bit::try_from(1023_u16).expect("test data should be in range");
    assert_eq!(p, q);
}
