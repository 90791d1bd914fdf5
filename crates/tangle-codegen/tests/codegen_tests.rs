//! Integration tests for the Tangle code generator.
//!
//! Tests validate:
//! - Linear chains produce one native call per action, in connection order
//! - Wait and Repeat templates with counts, tap and the forever default
//! - Loop balance for matched and unmatched Repeat regions
//! - Nested counters never share a variable
//! - Debug trace emission and the trace map
//! - Deterministic output (same graph → same program, same flags)

use tangle_codegen::{generate, CodegenError, CompileOptions};
use tangle_graph::catalog::{codes, names};
use tangle_graph::{resolve, Catalog, Collection, StatementId};
use tangle_types::{ErrorCode, Instruction, Marker};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

const D: f32 = 20.0;

/// Sticker layout builder: a row of flow stickers plus parameters placed
/// under chosen columns.
struct Layout {
    markers: Vec<Marker>,
    column: usize,
}

impl Layout {
    fn new() -> Self {
        Self {
            markers: Vec::new(),
            column: 0,
        }
    }

    fn then(mut self, code: u32) -> Self {
        let x = self.column as f32 * 2.0 * D;
        self.markers.push(Marker::upright(code, x, 0.0, D));
        self.column += 1;
        self
    }

    /// Put a parameter under the most recent flow sticker.
    fn with(mut self, code: u32) -> Self {
        let x = (self.column - 1) as f32 * 2.0 * D;
        self.markers.push(Marker::upright(code, x, 2.0 * D, D));
        self
    }

    fn resolve(self) -> Collection {
        let (mut c, diagnostics) = Collection::from_markers(&self.markers, &Catalog::standard());
        assert!(!diagnostics.has_errors());
        resolve(&mut c);
        c
    }
}

fn count(n: u32) -> u32 {
    codes::COUNTS[(n - 2) as usize]
}

fn lines(collection: &mut Collection, options: &CompileOptions) -> Vec<String> {
    let out = generate(collection, options).unwrap();
    out.program
        .listing()
        .lines()
        .map(str::to_string)
        .collect()
}

fn plain(collection: &mut Collection) -> Vec<String> {
    lines(collection, &CompileOptions::default())
}

// ══════════════════════════════════════════════════════════════════════════════
// Linear programs
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn walk_then_jump() {
    let mut c = Layout::new()
        .then(codes::BEGIN)
        .then(codes::WALK)
        .then(codes::JUMP)
        .resolve();
    assert_eq!(plain(&mut c), vec!["walk()", "jump()"]);
}

#[test]
fn n_actions_give_n_calls_in_order() {
    let actions = [
        codes::RUN,
        codes::SPIN,
        codes::WIGGLE,
        codes::SLEEP,
        codes::YAWN,
        codes::STAND,
        codes::DANCE,
        codes::END,
    ];
    for n in 1..=actions.len() {
        let mut layout = Layout::new().then(codes::BEGIN);
        for code in &actions[..n] {
            layout = layout.then(*code);
        }
        let mut c = layout.resolve();
        let out = generate(&mut c, &CompileOptions::default()).unwrap();
        assert_eq!(out.program.native_call_count(), n);
        assert_eq!(out.program.len(), n);
    }
    let mut c = Layout::new()
        .then(codes::BEGIN)
        .then(codes::DANCE)
        .then(codes::RUN)
        .then(codes::YAWN)
        .resolve();
    assert_eq!(plain(&mut c), vec!["dance()", "run()", "yawn()"]);
}

#[test]
fn begin_alone_is_empty() {
    let mut c = Layout::new().then(codes::BEGIN).resolve();
    let out = generate(&mut c, &CompileOptions::default()).unwrap();
    assert!(out.program.is_empty());
    assert_eq!(out.program.native_call_count(), 0);
    assert_eq!(out.diagnostics.with_code(ErrorCode::EMPTY_PROGRAM).count(), 1);
    assert!(c.get(StatementId(0)).unwrap().is_dangling());
}

#[test]
fn missing_begin_is_an_error() {
    let mut c = Layout::new().then(codes::WALK).then(codes::JUMP).resolve();
    assert_eq!(
        generate(&mut c, &CompileOptions::default()).unwrap_err(),
        CodegenError::MissingStart
    );
    assert!(c.iter().all(|s| !s.is_compiled()));
}

#[test]
fn unreached_stickers_stay_uncompiled() {
    let mut markers = Layout::new().then(codes::BEGIN).then(codes::WALK).markers;
    markers.push(Marker::upright(codes::JUMP, 500.0, 500.0, D));
    let (mut c, _) = Collection::from_markers(&markers, &Catalog::standard());
    resolve(&mut c);
    assert_eq!(plain(&mut c), vec!["walk()"]);
    assert!(!c.get(StatementId(2)).unwrap().is_compiled());
}

// ══════════════════════════════════════════════════════════════════════════════
// Wait
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn wait_five_then_spin() {
    let mut c = Layout::new()
        .then(codes::BEGIN)
        .then(codes::WAIT)
        .with(count(5))
        .then(codes::SPIN)
        .resolve();
    assert_eq!(
        plain(&mut c),
        vec![
            "doWait(5)",
            "wait 1000",
            "a = 0",
            "while a < 5:",
            "{",
            "wait 1000",
            "a = a + 1",
            "}",
            "spin()",
        ]
    );
    // The parameter sticker was consumed.
    assert!(c.iter().all(|s| s.is_compiled()));
}

#[test]
fn wait_without_parameter_is_forever() {
    let mut c = Layout::new().then(codes::BEGIN).then(codes::WAIT).resolve();
    let out = lines(&mut c, &CompileOptions::default());
    assert_eq!(out[0], "doWait(1000)");
    assert_eq!(out[3], "while a < 1000:");
}

#[test]
fn wait_for_tap() {
    let mut c = Layout::new()
        .then(codes::BEGIN)
        .then(codes::WAIT)
        .with(codes::TAP_SENSOR)
        .then(codes::JUMP)
        .resolve();
    assert_eq!(
        plain(&mut c),
        vec![
            "doWait(1)",
            "wait 500",
            "while not getTouchSensor():",
            "{",
            "wait 100",
            "}",
            "jump()",
        ]
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Repeat
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn counted_repeat_region() {
    let mut c = Layout::new()
        .then(codes::BEGIN)
        .then(codes::BEGIN_REPEAT)
        .with(count(3))
        .then(codes::WALK)
        .then(codes::END_REPEAT)
        .then(codes::JUMP)
        .resolve();
    let out = generate(&mut c, &CompileOptions::default()).unwrap();
    assert!(out.program.block_balance().is_balanced());
    assert!(out.program.is_runnable());
    assert_eq!(
        out.program.listing(),
        "a = 0\nwhile a < 3:\n{\nwait 500\na = a + 1\nwalk()\n}\njump()\n"
    );
}

#[test]
fn tap_repeat_region() {
    let mut c = Layout::new()
        .then(codes::BEGIN)
        .then(codes::BEGIN_REPEAT)
        .with(codes::TAP_SENSOR)
        .then(codes::DANCE)
        .then(codes::END_REPEAT)
        .resolve();
    assert_eq!(
        plain(&mut c),
        vec!["while not getTouchSensor():", "{", "wait 100", "dance()", "}"]
    );
}

#[test]
fn repeat_without_end_leaves_block_open() {
    let mut c = Layout::new()
        .then(codes::BEGIN)
        .then(codes::BEGIN_REPEAT)
        .then(codes::WALK)
        .resolve();
    let out = generate(&mut c, &CompileOptions::default()).unwrap();
    assert_eq!(out.program.block_balance().unclosed, 1);
    assert!(!out.program.is_runnable());
    assert_eq!(out.diagnostics.with_code(ErrorCode::UNCLOSED_LOOP).count(), 1);
    assert!(!out.diagnostics.has_errors());
}

#[test]
fn end_without_repeat_is_ignored_with_warning() {
    let mut c = Layout::new()
        .then(codes::BEGIN)
        .then(codes::WALK)
        .then(codes::END_REPEAT)
        .then(codes::JUMP)
        .resolve();
    let out = generate(&mut c, &CompileOptions::default()).unwrap();
    assert_eq!(out.program.listing(), "walk()\njump()\n");
    assert!(out.program.block_balance().is_balanced());
    assert_eq!(
        out.diagnostics
            .with_code(ErrorCode::UNMATCHED_LOOP_END)
            .count(),
        1
    );
}

#[test]
fn nested_wait_uses_its_own_counter() {
    let mut c = Layout::new()
        .then(codes::BEGIN)
        .then(codes::BEGIN_REPEAT)
        .with(count(2))
        .then(codes::WAIT)
        .with(count(4))
        .then(codes::END_REPEAT)
        .resolve();
    let out = plain(&mut c);
    assert!(out.contains(&"while a < 2:".to_string()));
    assert!(out.contains(&"b = 0".to_string()));
    assert!(out.contains(&"while b < 4:".to_string()));
    assert!(out.contains(&"b = b + 1".to_string()));
}

#[test]
fn cycle_back_into_chain_terminates() {
    let mut c = Layout::new()
        .then(codes::BEGIN)
        .then(codes::WALK)
        .then(codes::JUMP)
        .resolve();
    // Jump's plug points back at Walk, closing a cycle.
    let jump = c.get_mut(StatementId(2)).unwrap();
    for connector in &mut jump.connectors {
        if connector.name == names::NEXT {
            connector.target = Some(StatementId(1));
        }
    }
    let out = generate(&mut c, &CompileOptions::default()).unwrap();
    assert_eq!(out.program.listing(), "walk()\njump()\n");
}

// ══════════════════════════════════════════════════════════════════════════════
// Debug traces
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn debug_mode_traces_each_statement() {
    let mut c = Layout::new()
        .then(codes::BEGIN)
        .then(codes::WALK)
        .then(codes::WAIT)
        .with(codes::TAP_SENSOR)
        .resolve();
    let out = generate(&mut c, &CompileOptions::debug()).unwrap();
    let instructions = out.program.instructions();
    assert_eq!(instructions[0], Instruction::Trace { point: 0 });
    assert_eq!(
        instructions[1],
        Instruction::Print {
            text: "Walk".into()
        }
    );
    assert_eq!(instructions[3], Instruction::Trace { point: 1 });
    let map = out.program.trace_map();
    assert_eq!(map.len(), 2);
    assert_eq!(map.statement_for(0), Some(1));
    assert_eq!(map.statement_for(1), Some(2));
}

#[test]
fn release_mode_has_no_traces() {
    let mut c = Layout::new().then(codes::BEGIN).then(codes::WALK).resolve();
    let out = generate(&mut c, &CompileOptions::default()).unwrap();
    assert!(out.program.trace_map().is_empty());
    assert!(!out
        .program
        .instructions()
        .iter()
        .any(|i| matches!(i, Instruction::Trace { .. } | Instruction::Print { .. })));
}

// ══════════════════════════════════════════════════════════════════════════════
// Determinism
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn same_graph_same_program_100_iterations() {
    let mut c = Layout::new()
        .then(codes::BEGIN)
        .then(codes::BEGIN_REPEAT)
        .with(count(4))
        .then(codes::WALK)
        .then(codes::WAIT)
        .with(codes::TAP_SENSOR)
        .then(codes::END_REPEAT)
        .then(codes::JUMP)
        .resolve();
    let options = CompileOptions::debug();
    let first = generate(&mut c, &options).unwrap().program;
    let flags: Vec<(bool, bool)> = c.iter().map(|s| (s.is_compiled(), s.is_dangling())).collect();
    for _ in 0..100 {
        let again = generate(&mut c, &options).unwrap().program;
        assert_eq!(again, first);
        assert_eq!(again.listing(), first.listing());
        let again_flags: Vec<(bool, bool)> =
            c.iter().map(|s| (s.is_compiled(), s.is_dangling())).collect();
        assert_eq!(again_flags, flags);
    }
}
