use std::fs;
use std::path::Path;

use base::prelude::{Address, AddressingMode, Are, Opcode, Register, Word};

use super::super::diagnostics::ErrorKind;
use super::super::symtab::SymbolKind;
use super::*;

fn assemble_ok(source: &str) -> Translation {
    match translate(source.as_bytes(), "test.as") {
        Ok(t) => t,
        Err(e) => panic!("translation should have succeeded: {e}\n{source}"),
    }
}

fn assemble_errors(source: &str) -> ErrorList {
    match translate(source.as_bytes(), "test.as") {
        Ok(t) => panic!(
            "translation should have failed, but produced {:?}",
            t.binary()
        ),
        Err(AssemblerFailure::Rejected { errors, .. }) => errors,
        Err(e) => panic!("unexpected failure {e}"),
    }
}

fn address_of(t: &Translation, name: &str) -> u8 {
    t.symbols()
        .lookup(name)
        .map(|sym| u8::from(sym.address))
        .unwrap_or_else(|| panic!("symbol {name} should be defined"))
}

#[test]
fn test_immediate_to_register() {
    let t = assemble_ok("MAIN: mov #5, r1\n");
    let main = t.symbols().lookup("MAIN").expect("MAIN should be defined");
    assert_eq!(main.kind, SymbolKind::Code);
    assert_eq!(main.address, Address::CODE_BASE);
    assert_eq!(
        t.binary().code,
        vec![
            Word::First {
                opcode: Opcode::Mov,
                source: AddressingMode::Immediate,
                destination: AddressingMode::Register,
                are: Are::Absolute,
            },
            Word::Immediate {
                value: 5,
                are: Are::Absolute,
            },
            Word::destination_register(Register::R1),
        ]
    );
    assert!(t.binary().code.iter().all(|w| w.are() == Are::Absolute));
    assert_eq!(
        render_object(t.binary()),
        "aaad aaaa\nbcba aaada\nbcbb aabba\nbcbc aaaba\n"
    );
    assert_eq!(render_entries(t.symbols()), None);
    assert_eq!(render_externs(t.binary()), None);
}

#[test]
fn test_extern_reference() {
    let t = assemble_ok(".extern EXT\njmp EXT\nstop\n");
    assert_eq!(
        t.binary().code[1],
        Word::Address {
            address: Address::ZERO,
            are: Are::External,
        }
    );
    assert_eq!(
        t.binary().externs,
        vec![ExternReference {
            name: "EXT".to_string(),
            address: Address::new(101),
        }]
    );
    assert_eq!(render_externs(t.binary()).as_deref(), Some("EXT bcbb\n"));
    assert_eq!(
        render_object(t.binary()),
        "aaad aaaa\nbcba cbaba\nbcbb aaaab\nbcbc ddaaa\n"
    );
}

#[test]
fn test_extern_used_twice_is_recorded_twice() {
    let t = assemble_ok(".extern W\ncmp W, M[r1][r2]\nM: .mat [1][1]\n.extern M2\nprn W\n");
    let uses: Vec<(&str, u8)> = t
        .binary()
        .externs
        .iter()
        .map(|r| (r.name.as_str(), u8::from(r.address)))
        .collect();
    assert_eq!(uses, vec![("W", 101), ("W", 105)]);
}

#[test]
fn test_undefined_entry() {
    let errors = assemble_errors(".entry LBL\nstop\n");
    assert_eq!(errors.kinds(), vec![ErrorKind::EntryLabelDoesNotExist]);
    assert_eq!(errors.diagnostics()[0].line, 1);
}

#[test]
fn test_entry_may_not_be_extern() {
    let errors = assemble_errors(".extern X\n.entry X\nstop\n");
    assert_eq!(errors.kinds(), vec![ErrorKind::EntryLabelIsExtern]);
}

#[test]
fn test_entries_are_reported() {
    let t = assemble_ok(".entry LOOP\nMAIN: inc r1\nLOOP: jmp LOOP\n.entry MAIN\n");
    assert_eq!(
        render_entries(t.symbols()).as_deref(),
        Some("MAIN bcba\nLOOP bcbc\n")
    );
    assert_eq!(
        t.binary().code[3],
        Word::Address {
            address: Address::new(102),
            are: Are::Relocatable,
        }
    );
}

#[test]
fn test_macro_named_like_an_operation() {
    let errors = assemble_errors("mcro mov\ninc r1\nmcroend\nstop\n");
    assert_eq!(errors.kinds(), vec![ErrorKind::MacroNameIsReservedWord]);
}

#[test]
fn test_macro_body_is_assembled_at_call() {
    let source = concat!(
        "mcro bump\n",
        "inc r1\n",
        "inc r2\n",
        "mcroend\n",
        "START: bump\n",
        "bump\n",
        "stop\n",
    );
    let t = assemble_ok(source);
    assert_eq!(address_of(&t, "START"), 100);
    let texts: Vec<&str> = t
        .expanded()
        .lines()
        .iter()
        .map(|l| l.text.as_str())
        .collect();
    assert_eq!(
        texts,
        vec!["START: inc r1", "inc r2", "inc r1", "inc r2", "stop"]
    );
    // Four two-word instructions and a stop.
    assert_eq!(t.binary().code.len(), 9);
}

#[test]
fn test_errors_carry_source_line_numbers() {
    let source = concat!(
        "mcro broken\n",
        "jmp NOWHERE\n",
        "mcroend\n",
        "stop\n",
        "broken\n",
    );
    let errors = assemble_errors(source);
    assert_eq!(errors.kinds(), vec![ErrorKind::UndefinedSymbol]);
    assert_eq!(errors.diagnostics()[0].line, 5);
    assert_eq!(errors.diagnostics()[0].stage, Stage::SecondPass);
}

#[test]
fn test_all_errors_are_reported() {
    let source = concat!(
        "X: inc r1\n",
        "X: dec r1\n",
        ".data 1000\n",
        "prn NOPE\n",
        "bogus\n",
    );
    let errors = assemble_errors(source);
    assert_eq!(
        errors.kinds(),
        vec![
            ErrorKind::DuplicateSymbol,
            ErrorKind::DataValueOutOfRange,
            ErrorKind::UnknownLineType,
            ErrorKind::UndefinedSymbol,
        ]
    );
    let lines: Vec<u32> = errors.diagnostics().iter().map(|d| d.line).collect();
    assert_eq!(lines, vec![2, 3, 5, 4]);
}

#[test]
fn test_labels_before_entry_and_extern_are_notes() {
    let t = assemble_ok("A: .extern W\nB: .entry MAIN\nMAIN: jsr W\n");
    assert_eq!(
        t.diagnostics().kinds(),
        vec![
            ErrorKind::LabelBeforeExternIgnored,
            ErrorKind::LabelBeforeEntryIgnored
        ]
    );
    assert!(t.symbols().lookup("A").is_none());
    assert!(t.symbols().lookup("B").is_none());
}

#[test]
fn test_label_on_empty_macro_is_an_error() {
    let errors = assemble_errors("mcro nothing\nmcroend\nL: nothing\nstop\n");
    assert_eq!(errors.kinds(), vec![ErrorKind::LabelWithoutStatement]);
}

#[test]
fn test_preprocessing_errors_stop_translation() {
    // The undefined symbol would be reported by the second pass; we
    // never get that far.
    let errors = assemble_errors("mcro 1bad\nmcroend\njmp NOWHERE\n");
    assert_eq!(errors.kinds(), vec![ErrorKind::MacroNameStartsWithNonLetter]);
}

#[test]
fn test_data_follows_code() {
    let source = concat!(
        "MAIN: mov STR, r1\n",
        "STR: .string \"ab\"\n",
        "M: .mat [2][2] 1, -1\n",
        "N: .data 7\n",
        "stop\n",
    );
    let t = assemble_ok(source);
    // mov (3 words) and stop (1 word) occupy 100 to 103.
    assert_eq!(address_of(&t, "MAIN"), 100);
    assert_eq!(address_of(&t, "STR"), 104);
    assert_eq!(address_of(&t, "M"), 107);
    assert_eq!(address_of(&t, "N"), 111);
    assert_eq!(t.binary().data.len(), 8);
    assert_eq!(
        t.symbols().lookup("M").map(|sym| sym.kind),
        Some(SymbolKind::Matrix)
    );
    // The operand refers to the relocated address.
    assert_eq!(
        t.binary().code[1],
        Word::Address {
            address: Address::new(104),
            are: Are::Relocatable,
        }
    );
    let object = render_object(t.binary());
    let mut lines = object.lines();
    assert_eq!(lines.next(), Some("aaba aaca"));
    // The last data word is 7, at address 111.
    assert_eq!(object.lines().last(), Some("bcdd aaabd"));
}

#[test]
fn test_address_layout() {
    let source = concat!(
        "A: mov M[r1][r2], r3\n",
        "B: .data 1, 2, 3\n",
        "C: lea B, M[r4][r5]\n",
        "M: .mat [2][3]\n",
        "D: add #-1, C\n",
        "S: .string \"xyz\"\n",
        "E: rts\n",
    );
    let t = assemble_ok(source);
    let icf = 100 + t.binary().code.len();
    let dcf = t.binary().data.len();
    for sym in t.symbols().iter() {
        let a = usize::from(sym.address);
        match sym.kind {
            SymbolKind::Code => assert!((100..icf).contains(&a), "{sym:?}"),
            SymbolKind::Data | SymbolKind::Matrix => {
                assert!((icf..icf + dcf).contains(&a), "{sym:?}");
            }
            SymbolKind::Extern => assert_eq!(a, 0),
        }
    }
    let mut addresses: Vec<Address> = t.symbols().iter().map(|sym| sym.address).collect();
    addresses.sort();
    addresses.dedup();
    assert_eq!(addresses.len(), t.symbols().len());
}

#[test]
fn test_memory_overflow_is_fatal() {
    let errors = assemble_errors(".mat [16][16]\nstop\n.data 1\n");
    assert!(errors.has_fatal());
    assert_eq!(errors.kinds(), vec![ErrorKind::MemoryOverflow]);
}

#[test]
fn test_matrix_operand_encoding() {
    let t = assemble_ok("M: .mat [2][2]\nclr M[r2][r7]\n");
    assert_eq!(
        t.binary().code,
        vec![
            Word::First {
                opcode: Opcode::Clr,
                source: AddressingMode::Immediate,
                destination: AddressingMode::Matrix,
                are: Are::Absolute,
            },
            Word::Address {
                address: Address::new(103),
                are: Are::Relocatable,
            },
            Word::MatrixRegisters {
                row: Register::R2,
                column: Register::R7,
                are: Are::Absolute,
            },
        ]
    );
}

#[test]
fn test_label_named_like_a_register_can_be_referenced() {
    let t = assemble_ok("r8: stop\njmp r8\n");
    assert_eq!(address_of(&t, "r8"), 100);
    assert_eq!(
        t.binary().code[2],
        Word::Address {
            address: Address::CODE_BASE,
            are: Are::Relocatable,
        }
    );
}

#[test]
fn test_source_path() {
    assert_eq!(source_path(Path::new("prog")), Path::new("prog.as"));
    assert_eq!(source_path(Path::new("dir/prog.as")), Path::new("dir/prog.as"));
}

#[test]
fn test_assemble_file_writes_outputs() {
    let dir = tempfile::tempdir().expect("should be able to create a temporary directory");
    let input = dir.path().join("prog.as");
    fs::write(&input, ".entry MAIN\n.extern EXT\nMAIN: jmp EXT\n").unwrap();
    assemble_file(&input, &OutputOptions::default()).expect("assembly should succeed");
    for ext in ["am", "ob", "ent", "ext"] {
        assert!(input.with_extension(ext).exists(), "missing .{ext} file");
    }
    assert_eq!(
        fs::read_to_string(input.with_extension("ext")).unwrap(),
        "EXT bcbb\n"
    );

    // A failing translation removes the outputs of the earlier run.
    fs::write(&input, ".entry MAIN\nMAIN: jmp NOWHERE\n").unwrap();
    let result = assemble_file(&input, &OutputOptions::default());
    assert!(matches!(result, Err(AssemblerFailure::Rejected { .. })));
    for ext in ["ob", "ent", "ext"] {
        assert!(!input.with_extension(ext).exists(), "stale .{ext} file");
    }
    // Preprocessing succeeded, so there is an expanded source.
    assert!(input.with_extension("am").exists());
}

#[test]
fn test_unused_outputs_are_removed() {
    let dir = tempfile::tempdir().expect("should be able to create a temporary directory");
    let input = dir.path().join("prog.as");
    fs::write(&input, ".extern EXT\njmp EXT\n").unwrap();
    assemble_file(&input, &OutputOptions::default()).expect("assembly should succeed");
    assert!(input.with_extension("ext").exists());

    fs::write(&input, "stop\n").unwrap();
    let options = OutputOptions {
        list: false,
        write_expanded: false,
    };
    assemble_file(&input, &options).expect("assembly should succeed");
    assert!(input.with_extension("ob").exists());
    assert!(!input.with_extension("ext").exists());
    assert!(!input.with_extension("ent").exists());
}

/// Put a non-empty directory where an output file belongs, so that
/// neither writing nor removing that output can succeed.
fn block_output(path: &Path) {
    fs::create_dir(path).unwrap();
    fs::write(path.join("keep"), "x").unwrap();
}

#[test]
fn test_cleanup_failure_keeps_rejection() {
    let dir = tempfile::tempdir().expect("should be able to create a temporary directory");
    let input = dir.path().join("prog.as");
    fs::write(&input, "jmp NOWHERE\n").unwrap();
    block_output(&input.with_extension("ent"));
    let result = assemble_file(&input, &OutputOptions::default());
    assert!(
        matches!(result, Err(AssemblerFailure::Rejected { .. })),
        "{result:?}"
    );
}

#[test]
fn test_cleanup_failure_keeps_write_error() {
    let dir = tempfile::tempdir().expect("should be able to create a temporary directory");
    let input = dir.path().join("prog.as");
    fs::write(&input, "stop\n").unwrap();
    block_output(&input.with_extension("ob"));
    let result = assemble_file(&input, &OutputOptions::default());
    assert!(
        matches!(
            result,
            Err(AssemblerFailure::Io(IoFailed {
                action: IoAction::Rename,
                ..
            }))
        ),
        "{result:?}"
    );
}

#[test]
fn test_missing_input() {
    let dir = tempfile::tempdir().expect("should be able to create a temporary directory");
    let result = assemble_file(&dir.path().join("absent.as"), &OutputOptions::default());
    assert!(matches!(
        result,
        Err(AssemblerFailure::Io(IoFailed {
            action: IoAction::Read,
            ..
        }))
    ));
}
