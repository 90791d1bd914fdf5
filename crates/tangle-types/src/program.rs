//! The immutable output of code generation.

use crate::Instruction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maps trace points emitted into the program back to statement ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceMap {
    points: BTreeMap<u32, u32>,
}

impl TraceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, point: u32, statement: u32) {
        self.points.insert(point, statement);
    }

    /// Statement that emitted the given trace point.
    pub fn statement_for(&self, point: u32) -> Option<u32> {
        self.points.get(&point).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.points.iter().map(|(p, s)| (*p, *s))
    }
}

/// Open/close accounting of `while` blocks over a whole program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockBalance {
    /// Headers still open at the end of the program.
    pub unclosed: usize,
    /// Closes encountered with no open header.
    pub stray_closes: usize,
}

impl BlockBalance {
    pub fn is_balanced(&self) -> bool {
        self.unclosed == 0 && self.stray_closes == 0
    }
}

/// An ordered instruction sequence plus its trace map.
///
/// Produced once per successful compile and never mutated afterwards; a new
/// compile always yields a new value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompiledProgram {
    instructions: Vec<Instruction>,
    trace_map: TraceMap,
}

impl CompiledProgram {
    pub fn new(instructions: Vec<Instruction>, trace_map: TraceMap) -> Self {
        Self {
            instructions,
            trace_map,
        }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn trace_map(&self) -> &TraceMap {
        &self.trace_map
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// `true` when no native call was emitted.
    pub fn is_empty(&self) -> bool {
        self.native_call_count() == 0
    }

    pub fn native_call_count(&self) -> usize {
        self.instructions
            .iter()
            .filter(|i| i.is_native_call())
            .count()
    }

    pub fn block_balance(&self) -> BlockBalance {
        let mut balance = BlockBalance::default();
        for instruction in &self.instructions {
            match instruction {
                Instruction::While(_) => balance.unclosed += 1,
                Instruction::Close if balance.unclosed > 0 => balance.unclosed -= 1,
                Instruction::Close => balance.stray_closes += 1,
                _ => {}
            }
        }
        balance
    }

    /// Non-empty and every loop block properly closed.
    pub fn is_runnable(&self) -> bool {
        !self.is_empty() && self.block_balance().is_balanced()
    }

    /// Render the program in the textual listing language, one line per
    /// instruction (a `while` header occupies two).
    pub fn listing(&self) -> String {
        let mut out = String::new();
        for instruction in &self.instructions {
            out.push_str(&instruction.to_string());
            out.push('\n');
        }
        out
    }
}
