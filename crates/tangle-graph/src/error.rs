//! Graph construction errors.

use thiserror::Error;

/// Errors raised while loading a catalog or building a collection.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The catalog JSON could not be parsed.
    #[error("catalog parse error: {0}")]
    CatalogJson(#[from] serde_json::Error),

    /// A catalog entry violates a structural rule.
    #[error("invalid catalog entry for marker {code}: {reason}")]
    InvalidTemplate { code: u32, reason: String },

    /// Two catalog entries claim the same marker code.
    #[error("duplicate catalog entry for marker {0}")]
    DuplicateCode(u32),
}

/// Graph result type alias.
pub type GraphResult<T> = Result<T, GraphError>;
