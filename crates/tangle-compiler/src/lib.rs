//! Tangle compiler: orchestrates the full compilation pipeline.
//!
//! ```text
//! MarkerSource → Collection (catalog) → resolve → generate → CompiledProgram
//! ```
//!
//! [`compile`] returns either a [`Compilation`] or a [`CompileError`]. A
//! missing start is its own error kind so hosts can prompt for the Begin
//! sticker; empty programs and dangling branches are not errors and are
//! reported through [`CompiledProgram::is_empty`] and the diagnostics.
//! [`compile_to_result`] flattens either outcome into a serializable
//! [`CompileResult`].

pub mod source;
pub mod worker;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tangle_codegen::{generate, CodegenError};
use tangle_graph::{resolve, Catalog, Collection, LayoutReport};
use tangle_types::{CompileErrors, CompiledProgram, ErrorCode, Marker, TangleError, TraceMap};
use thiserror::Error;
use tracing::{info, warn};

pub use source::{DetectionError, MarkerSource};
pub use tangle_codegen::CompileOptions;
pub use worker::{CompileTicket, CompileWorker, WorkerError};

// ══════════════════════════════════════════════════════════════════════════════
// Errors
// ══════════════════════════════════════════════════════════════════════════════

/// Why no program was produced.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompileError {
    /// No Begin sticker: ask the user to add one.
    #[error("no Begin sticker found")]
    MissingStart,

    #[error("{count} Begin stickers found, expected exactly one")]
    DuplicateStart { count: usize },

    /// The detector failed before a graph could be built.
    #[error("detection failed: {0}")]
    Detection(String),

    /// Generation could not salvage any program.
    #[error("compile failed: {0}")]
    Failure(String),

    /// The compile task died before producing an outcome.
    #[error("compile aborted: {0}")]
    Aborted(String),
}

impl CompileError {
    /// The diagnostic code recorded for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MissingStart => ErrorCode::MISSING_START,
            Self::DuplicateStart { .. } => ErrorCode::DUPLICATE_START,
            Self::Detection(_) => ErrorCode::DETECTION_FAILED,
            Self::Failure(_) => ErrorCode::CHAIN_TOO_DEEP,
            Self::Aborted(_) => ErrorCode::COMPILE_ABORTED,
        }
    }

    fn to_diagnostic(&self) -> TangleError {
        let diagnostic = TangleError::new(self.code(), self.to_string());
        match self {
            Self::MissingStart => {
                diagnostic.with_suggestion("Add a Begin sticker and take the picture again")
            }
            Self::DuplicateStart { .. } => {
                diagnostic.with_suggestion("Remove all but one Begin sticker")
            }
            Self::Detection(_) | Self::Failure(_) | Self::Aborted(_) => {
                diagnostic.with_suggestion("Try taking the picture again")
            }
        }
    }
}

impl From<CodegenError> for CompileError {
    fn from(e: CodegenError) -> Self {
        match e {
            CodegenError::MissingStart => Self::MissingStart,
            CodegenError::DuplicateStart { count } => Self::DuplicateStart { count },
            other @ CodegenError::ChainTooDeep { .. } => Self::Failure(other.to_string()),
        }
    }
}

impl From<DetectionError> for CompileError {
    fn from(e: DetectionError) -> Self {
        Self::Detection(e.0)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════════════════════

/// Everything one successful compile produced.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub program: CompiledProgram,
    /// The marked statement graph, kept for the host's overlay.
    pub collection: Collection,
    pub diagnostics: CompileErrors,
    pub report: LayoutReport,
}

impl Compilation {
    /// SHA-256 of the program listing, lowercase hex.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.program)
    }

    /// Runnable: has actions and every repeat is closed.
    pub fn is_runnable(&self) -> bool {
        self.program.is_runnable()
    }
}

/// Compile markers with the standard sticker catalog.
pub fn compile(markers: &[Marker], options: &CompileOptions) -> Result<Compilation, CompileError> {
    compile_with(markers, &Catalog::standard(), options)
}

/// Compile markers with a caller-supplied catalog.
pub fn compile_with(
    markers: &[Marker],
    catalog: &Catalog,
    options: &CompileOptions,
) -> Result<Compilation, CompileError> {
    info!(markers = markers.len(), debug = options.debug, "compile started");

    let (mut collection, mut diagnostics) = Collection::from_markers(markers, catalog);
    let edges = resolve(&mut collection);

    let output = match generate(&mut collection, options) {
        Ok(output) => output,
        Err(e) => {
            warn!(error = %e, "compile failed");
            return Err(e.into());
        }
    };
    diagnostics.extend(output.diagnostics);
    let report = LayoutReport::from_collection(&collection);

    info!(
        statements = collection.len(),
        edges,
        instructions = output.program.len(),
        empty = output.program.is_empty(),
        hint = %report.hint,
        "compile finished"
    );
    Ok(Compilation {
        program: output.program,
        collection,
        diagnostics,
        report,
    })
}

/// Run the detector, then compile its markers.
pub fn compile_from<S: MarkerSource + ?Sized>(
    source: &S,
    catalog: &Catalog,
    options: &CompileOptions,
) -> Result<Compilation, CompileError> {
    let markers = source.detect().map_err(|e| {
        warn!(error = %e, "marker detection failed");
        CompileError::from(e)
    })?;
    compile_with(&markers, catalog, options)
}

/// SHA-256 of a program's listing, lowercase hex.
pub fn fingerprint(program: &CompiledProgram) -> String {
    let mut hasher = Sha256::new();
    hasher.update(program.listing().as_bytes());
    format!("{:x}", hasher.finalize())
}

// ══════════════════════════════════════════════════════════════════════════════
// Serializable result
// ══════════════════════════════════════════════════════════════════════════════

/// A compile outcome flattened for hosts that speak JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileResult {
    pub success: bool,
    /// Program listing, on success.
    pub listing: Option<String>,
    pub trace_map: Option<TraceMap>,
    /// SHA-256 of `listing`.
    pub fingerprint: Option<String>,
    /// `true` when the program has no actions.
    pub empty: bool,
    pub runnable: bool,
    pub report: Option<LayoutReport>,
    pub errors: CompileErrors,
}

impl From<Result<Compilation, CompileError>> for CompileResult {
    fn from(outcome: Result<Compilation, CompileError>) -> Self {
        match outcome {
            Ok(compilation) => Self {
                success: true,
                fingerprint: Some(compilation.fingerprint()),
                listing: Some(compilation.program.listing()),
                trace_map: Some(compilation.program.trace_map().clone()),
                empty: compilation.program.is_empty(),
                runnable: compilation.is_runnable(),
                report: Some(compilation.report),
                errors: compilation.diagnostics,
            },
            Err(e) => {
                let mut errors = CompileErrors::empty();
                errors.push(e.to_diagnostic());
                Self {
                    success: false,
                    listing: None,
                    trace_map: None,
                    fingerprint: None,
                    empty: true,
                    runnable: false,
                    report: None,
                    errors,
                }
            }
        }
    }
}

/// Compile markers and flatten the outcome into a [`CompileResult`].
pub fn compile_to_result(markers: &[Marker], options: &CompileOptions) -> CompileResult {
    compile(markers, options).into()
}
