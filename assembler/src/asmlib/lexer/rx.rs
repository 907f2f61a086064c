//! Regular expressions describing the shapes of operand and data
//! tokens.  They are compiled on first use.
use std::{ops::Deref, sync::OnceLock};

use regex::Regex;

pub(crate) struct LazyRegex {
    once: OnceLock<Regex>,
    pattern: &'static str,
}

impl LazyRegex {
    pub(crate) const fn new(pattern: &'static str) -> Self {
        LazyRegex {
            once: OnceLock::new(),
            pattern,
        }
    }
}

impl Deref for LazyRegex {
    type Target = Regex;

    fn deref(&self) -> &Regex {
        self.once.get_or_init(|| match Regex::new(self.pattern) {
            Ok(r) => r,
            Err(e) => {
                panic!("'{}' is not a valid regular expression: {e}", self.pattern,);
            }
        })
    }
}

/// A signed decimal integer, as used in `.data` and after `#`.
pub(crate) static INTEGER: LazyRegex = LazyRegex::new(r"^[+-]?[0-9]+$");

/// Anything which looks like a register name, including ones which
/// do not exist (such as `r9`).
pub(crate) static REGISTER_SHAPE: LazyRegex = LazyRegex::new(r"^r[0-9]+$");

/// `NAME[row][column]`.  The contents of the brackets are checked
/// separately, so that we can say what is wrong with them.
pub(crate) static MATRIX_OPERAND: LazyRegex =
    LazyRegex::new(r"^(?<name>[^\[\]]+)\[(?<row>[^\[\]]*)\]\[(?<column>[^\[\]]*)\]$");

/// The `[rows][columns]` prefix of a `.mat` directive.  This is not
/// anchored at the end; the values follow it.
pub(crate) static MATRIX_DIMENSIONS: LazyRegex =
    LazyRegex::new(r"^\[(?<rows>[^\[\]]*)\]\s*\[(?<columns>[^\[\]]*)\]");

#[test]
fn test_patterns_compile() {
    for rx in [&INTEGER, &REGISTER_SHAPE, &MATRIX_OPERAND, &MATRIX_DIMENSIONS] {
        assert!(!rx.as_str().is_empty());
    }
}

#[test]
fn test_matrix_operand_captures() {
    let caps = MATRIX_OPERAND
        .captures("M1[r2][ r7 ]")
        .expect("should match");
    assert_eq!(&caps["name"], "M1");
    assert_eq!(&caps["row"], "r2");
    assert_eq!(&caps["column"], " r7 ");
    assert!(!MATRIX_OPERAND.is_match("M1[r2]"));
    assert!(!MATRIX_OPERAND.is_match("M1[r2][r3"));
    assert!(!MATRIX_OPERAND.is_match("M1[r2][r3]x"));
}

#[test]
fn test_integer_shapes() {
    for good in ["0", "-5", "+17", "007"] {
        assert!(INTEGER.is_match(good), "{good}");
    }
    for bad in ["", "-", "1.5", "x1", "1x", "--1"] {
        assert!(!INTEGER.is_match(bad), "{bad}");
    }
}

#[test]
fn test_matrix_dimensions_prefix() {
    let caps = MATRIX_DIMENSIONS
        .captures("[2][ 3] 1, 2")
        .expect("should match");
    assert_eq!(&caps["rows"], "2");
    assert_eq!(&caps["columns"], " 3");
    assert_eq!(caps.get(0).map(|m| m.end()), Some(7));
    assert!(!MATRIX_DIMENSIONS.is_match("[2] 1, 2"));
}
