//! Codegen error types.

use thiserror::Error;

/// Errors that stop code generation outright.
///
/// Everything recoverable (dangling branches, unmatched loop ends, unclosed
/// loops) is reported as a diagnostic instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodegenError {
    /// The graph has no start statement.
    #[error("no Begin sticker found")]
    MissingStart,

    /// More than one start statement; the entry point is ambiguous.
    #[error("{count} Begin stickers found, expected exactly one")]
    DuplicateStart { count: usize },

    /// The emission walk exceeded the configured chain depth.
    #[error("statement chain deeper than {limit} at statement {statement}")]
    ChainTooDeep { limit: usize, statement: u32 },
}

/// Codegen result type alias.
pub type CodegenResult<T> = Result<T, CodegenError>;
