//! Shared types for the Tangle toolchain.
//!
//! This crate defines the detected-marker records consumed by the compiler,
//! the instruction set produced by code generation, the immutable
//! [`CompiledProgram`], source spans for the textual listing, and the
//! structured error types used across every stage.

mod error;
mod instruction;
mod marker;
mod program;
mod span;

pub use error::{CompileErrors, ErrorCategory, ErrorCode, Severity, TangleError, MAX_ERRORS};
pub use instruction::{Condition, Instruction, NativeAction};
pub use marker::{Marker, Point};
pub use program::{BlockBalance, CompiledProgram, TraceMap};
pub use span::{SourceText, Span};

/// Result type used throughout the Tangle toolchain.
pub type Result<T> = std::result::Result<T, TangleError>;
