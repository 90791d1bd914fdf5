use serde::{Deserialize, Serialize};
use std::fmt;

/// Location inside a program listing.
///
/// The listing language is line-oriented, so a span never crosses a line.
/// Line and column values are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub line: u32,
    pub column: u32,
    pub end_column: u32,
}

impl Span {
    pub fn new(line: u32, column: u32, end_column: u32) -> Self {
        Self {
            line,
            column,
            end_column,
        }
    }

    /// Create a zero-width span at a single position.
    pub fn point(line: u32, column: u32) -> Self {
        Self::new(line, column, column)
    }

    /// Merge two spans on the same line into one covering both.
    pub fn merge(self, other: Span) -> Span {
        if self.line != other.line {
            return if self.line < other.line { self } else { other };
        }
        Span::new(
            self.line,
            self.column.min(other.column),
            self.end_column.max(other.end_column),
        )
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Listing text with a line index for diagnostics.
#[derive(Debug, Clone)]
pub struct SourceText {
    pub source: String,
    line_starts: Vec<usize>,
}

impl SourceText {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            line_starts,
        }
    }

    /// Extract a line by 1-based line number, without its terminator.
    pub fn line(&self, line_number: u32) -> Option<&str> {
        let idx = line_number.checked_sub(1)? as usize;
        let start = *self.line_starts.get(idx)?;
        let end = self
            .line_starts
            .get(idx + 1)
            .map(|&s| s.saturating_sub(1))
            .unwrap_or(self.source.len());
        Some(self.source[start..end].trim_end_matches('\r'))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
