//! Per-compile state threaded through every emission rule.

use serde::{Deserialize, Serialize};
use tangle_graph::StatementId;
use tangle_types::{CompileErrors, CompiledProgram, Instruction, TangleError, TraceMap};

/// Code generation options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Emit `trace`/`print` before every action, wait and repeat.
    pub debug: bool,
    /// Longest statement chain the generator will follow.
    pub max_chain_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            debug: false,
            max_chain_depth: 256,
        }
    }
}

impl CompileOptions {
    pub fn debug() -> Self {
        Self {
            debug: true,
            ..Self::default()
        }
    }
}

/// A `while` block opened by a loop-begin statement and not yet closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenBlock {
    pub statement: StatementId,
    /// Counter variable, `None` for sensor-polling loops.
    pub counter: Option<String>,
}

/// Mutable state for one compile pass.
///
/// Replaces process-wide counters: trace points, nesting depth and counter
/// allocation all live here and die with the pass.
#[derive(Debug)]
pub struct CompileContext {
    pub options: CompileOptions,
    instructions: Vec<Instruction>,
    trace_map: TraceMap,
    next_trace: u32,
    open_blocks: Vec<OpenBlock>,
    pub diagnostics: CompileErrors,
}

impl CompileContext {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            options,
            instructions: Vec::new(),
            trace_map: TraceMap::new(),
            next_trace: 0,
            open_blocks: Vec::new(),
            diagnostics: CompileErrors::empty(),
        }
    }

    pub fn emit(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Allocate the next trace point for `statement`.
    pub fn trace_point(&mut self, statement: StatementId) -> u32 {
        let point = self.next_trace;
        self.next_trace += 1;
        self.trace_map.insert(point, statement.0);
        point
    }

    /// Number of blocks currently open.
    pub fn depth(&self) -> usize {
        self.open_blocks.len()
    }

    /// Counter variable for a loop opened at the current depth: `a`, `b`, …
    /// then `a26`, `a27`, … past the alphabet.
    pub fn counter_var(&self) -> String {
        let depth = self.depth();
        match u8::try_from(depth) {
            Ok(d) if d < 26 => char::from(b'a' + d).to_string(),
            _ => format!("a{depth}"),
        }
    }

    pub fn open_block(&mut self, block: OpenBlock) {
        self.open_blocks.push(block);
    }

    /// Close the innermost open block, if there is one.
    pub fn close_block(&mut self) -> Option<OpenBlock> {
        self.open_blocks.pop()
    }

    pub fn open_blocks(&self) -> &[OpenBlock] {
        &self.open_blocks
    }

    pub fn report(&mut self, diagnostic: TangleError) {
        self.diagnostics.push(diagnostic);
    }

    /// Finish the pass.
    pub fn finish(self) -> (CompiledProgram, CompileErrors) {
        (
            CompiledProgram::new(self.instructions, self.trace_map),
            self.diagnostics,
        )
    }
}
