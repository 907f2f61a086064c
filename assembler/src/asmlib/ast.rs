//! The structured form of one source line, as produced by
//! [`super::parser::classify`].
//!
//! A `ParsedLine` is created for a line, used by the pass which asked
//! for it, and then discarded.  The two passes each classify the
//! expanded source independently.
use base::prelude::{AddressingMode, Opcode, Register, Unsigned10Bit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Empty,
    Comment,
    Directive,
    Instruction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub label: Option<String>,
    pub body: LineBody,
}

impl ParsedLine {
    pub fn kind(&self) -> LineKind {
        match &self.body {
            LineBody::Empty => LineKind::Empty,
            LineBody::Comment => LineKind::Comment,
            LineBody::Directive(_) => LineKind::Directive,
            LineBody::Instruction(_) => LineKind::Instruction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineBody {
    Empty,
    Comment,
    Directive(Directive),
    Instruction(Instruction),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `.data 1, -2, 3`
    Data(Vec<Unsigned10Bit>),
    /// `.string "abc"`; the stored text excludes the quotes.
    String(String),
    /// `.mat [2][3] 1, 2` or `.mat 1, 2, 3`.
    Matrix {
        dimensions: Option<(usize, usize)>,
        values: Vec<Unsigned10Bit>,
    },
    /// `.entry NAME`
    Entry(String),
    /// `.extern NAME`
    Extern(String),
}

impl Directive {
    pub fn name(&self) -> &'static str {
        match self {
            Directive::Data(_) => ".data",
            Directive::String(_) => ".string",
            Directive::Matrix { .. } => ".mat",
            Directive::Entry(_) => ".entry",
            Directive::Extern(_) => ".extern",
        }
    }

    /// The words this directive places in the data area, in order.
    /// Strings are followed by a zero word, and matrices are padded
    /// with zeroes up to their declared size.
    pub fn data_words(&self) -> Vec<Unsigned10Bit> {
        match self {
            Directive::Data(values) => values.clone(),
            Directive::String(text) => text
                .bytes()
                .map(Unsigned10Bit::from)
                .chain(std::iter::once(Unsigned10Bit::ZERO))
                .collect(),
            Directive::Matrix { dimensions, values } => {
                let cells = match dimensions {
                    Some((rows, columns)) => rows * columns,
                    None => values.len(),
                };
                values
                    .iter()
                    .copied()
                    .chain(std::iter::repeat(Unsigned10Bit::ZERO))
                    .take(cells)
                    .collect()
            }
            Directive::Entry(_) | Directive::Extern(_) => Vec::new(),
        }
    }

    /// How many data words the directive occupies.
    pub fn data_size(&self) -> usize {
        match self {
            Directive::Data(values) => values.len(),
            Directive::String(text) => text.len() + 1,
            Directive::Matrix {
                dimensions: Some((rows, columns)),
                ..
            } => rows * columns,
            Directive::Matrix {
                dimensions: None,
                values,
            } => values.len(),
            Directive::Entry(_) | Directive::Extern(_) => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperandValue {
    Immediate(i8),
    Direct(String),
    Matrix {
        name: String,
        row: Register,
        column: Register,
    },
    Register(Register),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    /// The operand as written.
    pub text: String,
    pub value: OperandValue,
}

impl Operand {
    pub fn mode(&self) -> AddressingMode {
        match self.value {
            OperandValue::Immediate(_) => AddressingMode::Immediate,
            OperandValue::Direct(_) => AddressingMode::Direct,
            OperandValue::Matrix { .. } => AddressingMode::Matrix,
            OperandValue::Register(_) => AddressingMode::Register,
        }
    }

    pub fn register(&self) -> Option<Register> {
        match self.value {
            OperandValue::Register(r) => Some(r),
            _ => None,
        }
    }

    /// Words needed after the first instruction word, when this
    /// operand does not share a word with the other one.
    fn extra_words(&self) -> usize {
        match self.value {
            OperandValue::Matrix { .. } => 2,
            _ => 1,
        }
    }
}

/// An instruction.  A single operand is always the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub source: Option<Operand>,
    pub destination: Option<Operand>,
}

impl Instruction {
    pub fn operand_count(&self) -> usize {
        usize::from(self.source.is_some()) + usize::from(self.destination.is_some())
    }

    /// Both operands are registers, so they share a single word.
    pub fn shares_register_word(&self) -> bool {
        matches!(
            (&self.source, &self.destination),
            (Some(s), Some(d)) if s.register().is_some() && d.register().is_some()
        )
    }

    /// The number of words the instruction occupies.
    pub fn word_count(&self) -> usize {
        if self.shares_register_word() {
            2
        } else {
            1 + self.source.iter().map(Operand::extra_words).sum::<usize>()
                + self.destination.iter().map(Operand::extra_words).sum::<usize>()
        }
    }
}
