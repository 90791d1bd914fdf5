//! Tangle code generator: resolved statement graph to instruction sequence.
//!
//! # Architecture
//!
//! [`generate`] starts at the unique start statement and walks outgoing
//! connectors depth first. Each statement kind has one emission rule in
//! [`emit`]; the walk itself only decides where to go next. All mutable
//! per-pass state (trace points, open blocks, counter allocation,
//! diagnostics) lives in a [`CompileContext`] created for the pass.
//!
//! The walk never aborts on a malformed region. Dangling branches, stray
//! loop ends and unclosed loops are recorded as warnings and the best-effort
//! program is still returned. Only a missing or ambiguous start and the chain
//! depth limit are hard errors.

pub mod context;
pub mod emit;
pub mod error;
pub mod generator;

pub use context::{CompileContext, CompileOptions, OpenBlock};
pub use error::{CodegenError, CodegenResult};
pub use generator::{generate, CodegenOutput};
