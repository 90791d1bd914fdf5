//! Integration tests for the listing assembler.
//!
//! Tests validate:
//! - Generated listings assemble back to the same instructions
//! - Hand-written listings with comments and same-line braces
//! - Syntax errors are collected, located and rendered

use tangle_asm::{assemble, parse_program, AsmError};
use tangle_codegen::{generate, CompileOptions};
use tangle_graph::catalog::codes;
use tangle_graph::{resolve, Catalog, Collection};
use tangle_types::{ErrorCode, Instruction, Marker, NativeAction};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn compiled(markers: &[Marker], options: &CompileOptions) -> tangle_types::CompiledProgram {
    let (mut c, _) = Collection::from_markers(markers, &Catalog::standard());
    resolve(&mut c);
    generate(&mut c, options).unwrap().program
}

fn at(code: u32, column: usize, row: usize) -> Marker {
    Marker::upright(code, column as f32 * 40.0, row as f32 * 40.0, 20.0)
}

// ══════════════════════════════════════════════════════════════════════════════
// Generated listings
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn generated_repeat_listing_assembles_back() {
    let markers = [
        at(codes::BEGIN, 0, 0),
        at(codes::BEGIN_REPEAT, 1, 0),
        at(codes::COUNTS[1], 1, 1),
        at(codes::WALK, 2, 0),
        at(codes::WAIT, 3, 0),
        at(codes::TAP_SENSOR, 3, 1),
        at(codes::END_REPEAT, 4, 0),
        at(codes::JUMP, 5, 0),
    ];
    let program = compiled(&markers, &CompileOptions::debug());
    let assembled = parse_program(&program.listing()).unwrap();
    assert_eq!(assembled.instructions(), program.instructions());
    assert!(assembled.trace_map().is_empty());
}

// ══════════════════════════════════════════════════════════════════════════════
// Hand-written listings
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn hand_written_listing() {
    let source = "\
// greet, then wait for a tap
print \"hello\"
walk()
while not getTouchSensor(): {
  wait 100
}
dance()
";
    let program = parse_program(source).unwrap();
    assert_eq!(program.native_call_count(), 2);
    assert!(program.is_runnable());
    assert_eq!(
        program.instructions()[1],
        Instruction::call(NativeAction::Walk, vec![])
    );
}

#[test]
fn unknown_names_are_carried_through() {
    // Name resolution happens in the VM, not here.
    let program = parse_program("fly()\n").unwrap();
    assert_eq!(
        program.instructions(),
        &[Instruction::Call {
            name: "fly".into(),
            args: vec![]
        }]
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Errors
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn errors_from_both_stages_are_collected() {
    let assembly = assemble("walk() @\nwait x\njump()\n");
    assert_eq!(assembly.errors.total_errors, 2);
    assert!(assembly
        .errors
        .with_code(ErrorCode::UNEXPECTED_CHARACTER)
        .next()
        .is_some());
    assert!(assembly
        .errors
        .with_code(ErrorCode::UNEXPECTED_TOKEN)
        .next()
        .is_some());
    assert_eq!(assembly.instructions.len(), 2);
}

#[test]
fn syntax_error_report_shows_source_line() {
    let err = parse_program("walk()\nwhile a 5:\n{\n}\n").unwrap_err();
    let AsmError::Syntax { count, report } = err;
    assert!(count >= 1);
    assert!(report.contains("2:9"));
    assert!(report.contains("  | while a 5:"));
}

#[test]
fn long_run_of_bad_characters_is_a_syntax_error() {
    let listing = format!("walk()\n{}\njump()\n", "@".repeat(100_000));
    match parse_program(&listing) {
        Err(AsmError::Syntax { count, .. }) => assert_eq!(count, tangle_types::MAX_ERRORS),
        Ok(_) => panic!("garbage listing assembled"),
    }
}

#[test]
fn print_text_with_control_characters_assembles_back() {
    let program = tangle_types::CompiledProgram::new(
        vec![
            Instruction::Print {
                text: "Nap\0\u{7}\t\"zz\"\\ ✓".into(),
            },
            Instruction::call(NativeAction::Sleep, vec![]),
        ],
        tangle_types::TraceMap::new(),
    );
    let assembled = parse_program(&program.listing()).unwrap();
    assert_eq!(assembled.instructions(), program.instructions());
}
