use base::prelude::{AddressingMode, Opcode, Register, Unsigned10Bit};
use test_strategy::proptest;

use super::*;
use crate::ast::LineKind;

fn classify_plain(line: &str) -> Result<ParsedLine, ErrorKind> {
    classify(line, &MacroTable::new())
}

fn instruction(line: &str) -> Instruction {
    match classify_plain(line) {
        Ok(ParsedLine {
            body: LineBody::Instruction(inst),
            ..
        }) => inst,
        other => panic!("expected an instruction from {line:?}, got {other:?}"),
    }
}

fn directive(line: &str) -> Directive {
    match classify_plain(line) {
        Ok(ParsedLine {
            body: LineBody::Directive(d),
            ..
        }) => d,
        other => panic!("expected a directive from {line:?}, got {other:?}"),
    }
}

fn words(values: &[i32]) -> Vec<Unsigned10Bit> {
    values
        .iter()
        .map(|&n| Unsigned10Bit::from_signed(n).expect("test value should be in range"))
        .collect()
}

#[test]
fn test_empty_and_comment_lines() {
    assert_eq!(classify_plain("").map(|p| p.kind()), Ok(LineKind::Empty));
    assert_eq!(classify_plain(" \t ").map(|p| p.kind()), Ok(LineKind::Empty));
    assert_eq!(
        classify_plain("; mov r1, r2").map(|p| p.kind()),
        Ok(LineKind::Comment)
    );
    assert_eq!(
        classify_plain("   ;indented").map(|p| p.kind()),
        Ok(LineKind::Comment)
    );
}

#[test]
fn test_labelled_instruction() {
    let parsed = classify_plain("MAIN: mov #5, r1").expect("valid line");
    assert_eq!(parsed.label.as_deref(), Some("MAIN"));
    let LineBody::Instruction(inst) = parsed.body else {
        panic!("expected an instruction");
    };
    assert_eq!(inst.opcode, Opcode::Mov);
    assert_eq!(
        inst.source.as_ref().map(Operand::mode),
        Some(AddressingMode::Immediate)
    );
    assert_eq!(
        inst.destination.as_ref().map(Operand::mode),
        Some(AddressingMode::Register)
    );
    assert_eq!(inst.word_count(), 3);
}

#[test]
fn test_label_errors() {
    assert_eq!(
        classify_plain("1X: stop"),
        Err(ErrorKind::LabelStartsWithNonLetter)
    );
    assert_eq!(
        classify_plain("A_B: stop"),
        Err(ErrorKind::LabelHasInvalidCharacter)
    );
    assert_eq!(classify_plain("X:stop"), Err(ErrorKind::TextAfterLabelColon));
    assert_eq!(classify_plain("X:: stop"), Err(ErrorKind::TextAfterLabelColon));
    assert_eq!(classify_plain(": stop"), Err(ErrorKind::LabelEmpty));
    assert_eq!(
        classify_plain("stop: stop"),
        Err(ErrorKind::LabelIsReservedWord)
    );
    assert_eq!(
        classify_plain("LONELY:"),
        Err(ErrorKind::LabelWithoutStatement)
    );
    let long = format!("{}: stop", "L".repeat(31));
    assert_eq!(classify_plain(&long), Err(ErrorKind::LabelTooLong));
}

#[test]
fn test_label_may_not_name_a_macro() {
    let mut macros = MacroTable::new();
    macros.define("twice", 1).unwrap();
    assert_eq!(
        classify("twice: stop", &macros),
        Err(ErrorKind::LabelIsMacroName)
    );
}

#[test]
fn test_unknown_lines() {
    assert_eq!(classify_plain("halt"), Err(ErrorKind::UnknownLineType));
    assert_eq!(classify_plain("MOV r1, r2"), Err(ErrorKind::UnknownLineType));
    assert_eq!(classify_plain(".word 5"), Err(ErrorKind::InvalidDirective));
    assert_eq!(classify_plain(".Data 5"), Err(ErrorKind::InvalidDirective));
}

#[test]
fn test_operand_counts() {
    assert_eq!(classify_plain("mov r1"), Err(ErrorKind::MissingOperand));
    assert_eq!(classify_plain("inc"), Err(ErrorKind::MissingOperand));
    assert_eq!(classify_plain("inc r1, r2"), Err(ErrorKind::UnexpectedComma));
    assert_eq!(classify_plain("stop r1"), Err(ErrorKind::TooManyOperands));
    assert_eq!(
        classify_plain("mov r1, r2, r3"),
        Err(ErrorKind::TooManyOperands)
    );
    assert_eq!(classify_plain("mov r1 r2"), Err(ErrorKind::MissingComma));
    assert_eq!(classify_plain("mov r1,,r2"), Err(ErrorKind::ConsecutiveCommas));
    assert_eq!(classify_plain("mov ,r1, r2"), Err(ErrorKind::LeadingComma));
    assert_eq!(classify_plain("inc r1,"), Err(ErrorKind::TrailingComma));
}

#[test]
fn test_single_operand_is_destination() {
    let inst = instruction("inc COUNT");
    assert_eq!(inst.source, None);
    assert_eq!(
        inst.destination.map(|op| op.value),
        Some(OperandValue::Direct("COUNT".to_string()))
    );
}

#[test]
fn test_immediate_operands() {
    let inst = instruction("prn #-128");
    assert_eq!(
        inst.destination.map(|op| op.value),
        Some(OperandValue::Immediate(-128))
    );
    assert_eq!(
        instruction("prn #+127").destination.map(|op| op.value),
        Some(OperandValue::Immediate(127))
    );
    assert_eq!(classify_plain("prn #128"), Err(ErrorKind::ImmediateOutOfRange));
    assert_eq!(
        classify_plain("prn #-129"),
        Err(ErrorKind::ImmediateOutOfRange)
    );
    assert_eq!(classify_plain("prn #x"), Err(ErrorKind::ImmediateNotANumber));
    assert_eq!(classify_plain("prn #"), Err(ErrorKind::ImmediateNotANumber));
}

#[test]
fn test_register_operands() {
    let inst = instruction("mov r0, r7");
    assert_eq!(inst.word_count(), 2);
    assert_eq!(
        inst.source.and_then(|op| op.register()),
        Some(Register::R0)
    );
    assert_eq!(
        classify_plain(&format!("clr r{}", "9".repeat(30))),
        Err(ErrorKind::InvalidRegister)
    );
}

#[test]
fn test_register_like_name_is_a_label() {
    let inst = instruction("jmp r8");
    assert_eq!(
        inst.destination.map(|op| op.value),
        Some(OperandValue::Direct("r8".to_string()))
    );
    assert_eq!(
        classify_plain("r10: stop").map(|p| p.label),
        Ok(Some("r10".to_string()))
    );
}

#[test]
fn test_matrix_operands() {
    let inst = instruction("lea M1[r2][r3], r4");
    assert_eq!(
        inst.source.map(|op| op.value),
        Some(OperandValue::Matrix {
            name: "M1".to_string(),
            row: Register::R2,
            column: Register::R3,
        })
    );
    assert_eq!(
        classify_plain("clr M1[r2]"),
        Err(ErrorKind::MalformedMatrixOperand)
    );
    assert_eq!(
        classify_plain("clr M1[r2][r3"),
        Err(ErrorKind::MalformedMatrixOperand)
    );
    assert_eq!(
        classify_plain("clr 1M[r2][r3]"),
        Err(ErrorKind::MalformedMatrixOperand)
    );
    assert_eq!(
        classify_plain("clr M1[r2][x]"),
        Err(ErrorKind::InvalidMatrixRegister)
    );
    assert_eq!(
        classify_plain("clr M1[r9][r1]"),
        Err(ErrorKind::InvalidMatrixRegister)
    );
}

#[test]
fn test_invalid_operand() {
    assert_eq!(classify_plain("jmp 5"), Err(ErrorKind::InvalidOperand));
    assert_eq!(classify_plain("jmp A-B"), Err(ErrorKind::InvalidOperand));
}

#[test]
fn test_addressing_mode_restrictions() {
    assert_eq!(
        classify_plain("lea #1, r1"),
        Err(ErrorKind::IllegalSourceAddressingMode)
    );
    assert_eq!(
        classify_plain("lea r1, r2"),
        Err(ErrorKind::IllegalSourceAddressingMode)
    );
    assert_eq!(
        classify_plain("mov r1, #3"),
        Err(ErrorKind::IllegalDestinationAddressingMode)
    );
    assert_eq!(
        classify_plain("inc #3"),
        Err(ErrorKind::IllegalDestinationAddressingMode)
    );
    assert!(classify_plain("cmp #1, #2").is_ok());
    assert!(classify_plain("prn #3").is_ok());
}

#[test]
fn test_data_directive() {
    assert_eq!(
        directive(".data 7, -57, +17, 9"),
        Directive::Data(words(&[7, -57, 17, 9]))
    );
    assert_eq!(
        directive(".data -512,511"),
        Directive::Data(words(&[-512, 511]))
    );
    assert_eq!(classify_plain(".data"), Err(ErrorKind::DataMissingValues));
    assert_eq!(classify_plain(".data 512"), Err(ErrorKind::DataValueOutOfRange));
    assert_eq!(
        classify_plain(".data -99999999999"),
        Err(ErrorKind::DataValueOutOfRange)
    );
    assert_eq!(classify_plain(".data 1.5"), Err(ErrorKind::DataNotAnInteger));
    assert_eq!(classify_plain(".data 1,"), Err(ErrorKind::TrailingComma));
    assert_eq!(classify_plain(".data ,1"), Err(ErrorKind::LeadingComma));
    assert_eq!(classify_plain(".data 1,,2"), Err(ErrorKind::ConsecutiveCommas));
}

#[test]
fn test_string_directive() {
    assert_eq!(
        directive(".string \"ab cd\""),
        Directive::String("ab cd".to_string())
    );
    assert_eq!(directive(".string \"\""), Directive::String(String::new()));
    assert_eq!(classify_plain(".string"), Err(ErrorKind::StringMissing));
    assert_eq!(
        classify_plain(".string abc\""),
        Err(ErrorKind::StringMissingOpeningQuote)
    );
    assert_eq!(
        classify_plain(".string \"abc"),
        Err(ErrorKind::StringMissingClosingQuote)
    );
    assert_eq!(
        classify_plain(".string \"abc\" x"),
        Err(ErrorKind::TextAfterString)
    );
    assert_eq!(
        classify_plain(".string \"a\tb\""),
        Err(ErrorKind::StringHasNonPrintableCharacter)
    );
}

#[test]
fn test_matrix_directive() {
    assert_eq!(
        directive(".mat [2][2] 1, 2, 3"),
        Directive::Matrix {
            dimensions: Some((2, 2)),
            values: words(&[1, 2, 3]),
        }
    );
    assert_eq!(
        directive(".mat [1][3]"),
        Directive::Matrix {
            dimensions: Some((1, 3)),
            values: Vec::new(),
        }
    );
    assert_eq!(
        directive(".mat 4, 5"),
        Directive::Matrix {
            dimensions: None,
            values: words(&[4, 5]),
        }
    );
    assert_eq!(
        classify_plain(".mat [2][1] 1, 2, 3"),
        Err(ErrorKind::MatrixTooManyValues)
    );
    assert_eq!(
        classify_plain(".mat [0][2]"),
        Err(ErrorKind::InvalidMatrixDimensions)
    );
    assert_eq!(
        classify_plain(".mat [x][2]"),
        Err(ErrorKind::InvalidMatrixDimensions)
    );
    assert_eq!(
        classify_plain(".mat [2] 1"),
        Err(ErrorKind::InvalidMatrixDimensions)
    );
    assert_eq!(classify_plain(".mat"), Err(ErrorKind::DataMissingValues));
}

#[test]
fn test_entry_and_extern() {
    assert_eq!(
        directive(".entry LOOP"),
        Directive::Entry("LOOP".to_string())
    );
    assert_eq!(directive(".extern W"), Directive::Extern("W".to_string()));
    assert_eq!(
        classify_plain(".extern"),
        Err(ErrorKind::DirectiveLabelMissing)
    );
    assert_eq!(
        classify_plain(".entry A B"),
        Err(ErrorKind::TextAfterDirectiveLabel)
    );
    assert_eq!(
        classify_plain(".entry 9A"),
        Err(ErrorKind::LabelStartsWithNonLetter)
    );
    // The label is kept; the caller decides what to do with it.
    let parsed = classify_plain("X: .extern W").expect("valid line");
    assert_eq!(parsed.label.as_deref(), Some("X"));
}

#[test]
fn test_reclassifying_gives_the_same_result() {
    let macros = MacroTable::new();
    for line in [
        "MAIN: mov M[r1][r2], LENGTH",
        "  .data 1, 2, 3",
        "STR: .string \"hello\"",
        "bad line",
        "prn #999",
    ] {
        assert_eq!(classify(line, &macros), classify(line, &macros), "{line}");
    }
}

#[proptest]
fn valid_labels_are_accepted(#[strategy("[A-Za-z][A-Za-z0-9]{0,29}")] name: String) {
    let line = format!("{name}: stop");
    let result = classify_plain(&line);
    if crate::symbol::is_reserved_word(&name) {
        assert_eq!(result, Err(ErrorKind::LabelIsReservedWord));
    } else {
        assert_eq!(result.map(|p| p.label), Ok(Some(name)));
    }
}

#[proptest]
fn label_with_bad_character_is_rejected(
    #[strategy("[A-Za-z][A-Za-z0-9]{0,10}")] head: String,
    #[strategy("[_\\-.$@!]")] bad: String,
    #[strategy("[A-Za-z0-9]{0,10}")] tail: String,
) {
    let line = format!("{head}{bad}{tail}: stop");
    assert_eq!(
        classify_plain(&line),
        Err(ErrorKind::LabelHasInvalidCharacter)
    );
}

#[proptest]
fn data_values_in_range_are_accepted(#[strategy(-512i32..=511)] n: i32) {
    assert_eq!(
        directive(&format!(".data {n}")),
        Directive::Data(words(&[n]))
    );
}
