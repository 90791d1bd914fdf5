use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of errors stored before further ones are only counted.
pub const MAX_ERRORS: usize = 20;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Diagnostic category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Layout,
    Generation,
    Syntax,
    Runtime,
}

/// Numeric error code (E100–E499).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Layout errors (E100–E199) ──
    pub const MISSING_START: Self = Self(100);
    pub const UNKNOWN_MARKER: Self = Self(101);
    pub const DUPLICATE_START: Self = Self(102);
    pub const DETECTION_FAILED: Self = Self(103);

    // ── Generation errors (E200–E299) ──
    pub const DANGLING_BRANCH: Self = Self(200);
    pub const UNMATCHED_LOOP_END: Self = Self(201);
    pub const UNCLOSED_LOOP: Self = Self(202);
    pub const EMPTY_PROGRAM: Self = Self(203);
    pub const CHAIN_TOO_DEEP: Self = Self(204);
    pub const COMPILE_ABORTED: Self = Self(205);

    // ── Syntax errors (E300–E399) ──
    pub const UNEXPECTED_TOKEN: Self = Self(300);
    pub const UNTERMINATED_STRING: Self = Self(301);
    pub const INVALID_NUMBER: Self = Self(302);
    pub const UNEXPECTED_CHARACTER: Self = Self(303);

    // ── Runtime errors (E400–E499) ──
    pub const NATIVE_STATUS: Self = Self(400);
    pub const UNDEFINED_VARIABLE: Self = Self(401);
    pub const UNRESOLVABLE_INSTRUCTION: Self = Self(402);

    /// Get the category for this error code.
    pub fn category(self) -> ErrorCategory {
        match self.0 {
            100..=199 => ErrorCategory::Layout,
            200..=299 => ErrorCategory::Generation,
            300..=399 => ErrorCategory::Syntax,
            _ => ErrorCategory::Runtime,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Layout => write!(f, "layout"),
            Self::Generation => write!(f, "generation"),
            Self::Syntax => write!(f, "syntax"),
            Self::Runtime => write!(f, "runtime"),
        }
    }
}

/// A structured diagnostic.
///
/// Layout and generation diagnostics point at a statement id; assembler
/// diagnostics point at a span of the listing text. Hosts render these
/// directly and must not parse the message.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[error("{code} [{category}] {message}")]
pub struct TangleError {
    pub code: ErrorCode,
    pub severity: Severity,
    pub category: ErrorCategory,
    pub message: String,
    /// Originating statement, when the diagnostic comes from the graph.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement: Option<u32>,
    /// Listing location, when the diagnostic comes from the assembler.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    /// Optional hint for the person arranging the stickers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl TangleError {
    /// Create a new error-severity diagnostic.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Error,
            category: code.category(),
            message: message.into(),
            statement: None,
            span: None,
            suggestion: None,
        }
    }

    /// Create a new warning-severity diagnostic.
    pub fn warning(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::new(code, message)
        }
    }

    pub fn at_statement(mut self, statement: u32) -> Self {
        self.statement = Some(statement);
        self
    }

    pub fn at_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Attach a fix suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Accumulated diagnostics for one compile or assemble pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompileErrors {
    pub errors: Vec<TangleError>,
    pub warnings: Vec<TangleError>,
    pub total_errors: usize,
    pub total_warnings: usize,
}

impl CompileErrors {
    /// Create an empty result (no diagnostics).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Returns `true` once the stored error cap is reached.
    pub fn is_full(&self) -> bool {
        self.total_errors >= MAX_ERRORS
    }

    /// Add a diagnostic, routed by its severity. Errors respect [`MAX_ERRORS`].
    pub fn push(&mut self, diagnostic: TangleError) {
        match diagnostic.severity {
            Severity::Error => {
                if self.errors.len() < MAX_ERRORS {
                    self.errors.push(diagnostic);
                }
                self.total_errors += 1;
            }
            Severity::Warning => {
                self.warnings.push(diagnostic);
                self.total_warnings += 1;
            }
        }
    }

    /// Iterate every stored diagnostic with the given code.
    pub fn with_code(&self, code: ErrorCode) -> impl Iterator<Item = &TangleError> {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .filter(move |d| d.code == code)
    }

    /// Append all diagnostics from another pass.
    pub fn extend(&mut self, other: CompileErrors) {
        for d in other.errors.into_iter().chain(other.warnings) {
            self.push(d);
        }
    }
}
