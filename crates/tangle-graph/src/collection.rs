//! The statement arena produced by one detection pass.

use tangle_types::{CompileErrors, ErrorCode, Marker, TangleError};
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::statement::{Statement, StatementId, StatementKind};

/// Every statement built from one photograph.
///
/// Statement ids are arena indices, assigned in marker order and stable for
/// the lifetime of the collection. The graph may be cyclic; edges live on
/// connectors as ids.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    statements: Vec<Statement>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one statement per recognized marker.
    ///
    /// Markers whose code is not in the catalog are skipped and reported as
    /// warnings; they never abort the pass.
    pub fn from_markers(markers: &[Marker], catalog: &Catalog) -> (Self, CompileErrors) {
        let mut collection = Self::new();
        let mut diagnostics = CompileErrors::empty();

        for marker in markers {
            match catalog.get(marker.code) {
                Some(template) => {
                    let id = collection.next_id();
                    let statement = template.instantiate(id, *marker);
                    debug!(statement = id.0, name = %statement.name, "statement created");
                    collection.statements.push(statement);
                }
                None => {
                    warn!(code = marker.code, "unknown marker skipped");
                    diagnostics.push(
                        TangleError::warning(
                            ErrorCode::UNKNOWN_MARKER,
                            format!("marker {} is not a known sticker", marker.code),
                        )
                        .with_suggestion("Check that the sticker is not faded or partly covered"),
                    );
                }
            }
        }

        (collection, diagnostics)
    }

    fn next_id(&self) -> StatementId {
        StatementId(self.statements.len() as u32)
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn get(&self, id: StatementId) -> Option<&Statement> {
        self.statements.get(id.index())
    }

    pub fn get_mut(&mut self, id: StatementId) -> Option<&mut Statement> {
        self.statements.get_mut(id.index())
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub(crate) fn statements_mut(&mut self) -> &mut [Statement] {
        &mut self.statements
    }

    pub fn iter(&self) -> impl Iterator<Item = &Statement> {
        self.statements.iter()
    }

    /// Number of start statements.
    pub fn start_count(&self) -> usize {
        self.statements.iter().filter(|s| s.kind.is_start()).count()
    }

    /// `true` iff exactly one start statement exists.
    pub fn has_start(&self) -> bool {
        self.start_count() == 1
    }

    /// The unique start statement.
    pub fn start(&self) -> Option<StatementId> {
        if !self.has_start() {
            return None;
        }
        self.statements
            .iter()
            .find(|s| s.kind.is_start())
            .map(|s| s.id)
    }

    pub fn contains_kind(&self, kind: StatementKind) -> bool {
        self.statements.iter().any(|s| s.kind == kind)
    }

    /// Clear every compiled/dangling flag, keeping the resolved graph.
    pub fn clear_marks(&mut self) {
        for s in &mut self.statements {
            s.clear_marks();
        }
    }

    /// Clear every compiled/dangling flag and connector target.
    pub fn reset(&mut self) {
        for s in &mut self.statements {
            s.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::codes;

    #[test]
    fn unknown_markers_become_warnings() {
        let markers = [
            Marker::upright(codes::BEGIN, 0.0, 0.0, 10.0),
            Marker::upright(9999, 20.0, 0.0, 10.0),
            Marker::upright(codes::WALK, 40.0, 0.0, 10.0),
        ];
        let (collection, diags) = Collection::from_markers(&markers, &Catalog::standard());
        assert_eq!(collection.len(), 2);
        assert_eq!(diags.total_warnings, 1);
        assert_eq!(diags.warnings[0].code, ErrorCode::UNKNOWN_MARKER);
        assert_eq!(collection.get(StatementId(1)).unwrap().name, "Walk");
    }

    #[test]
    fn has_start_requires_exactly_one() {
        let catalog = Catalog::standard();
        let none = Collection::from_markers(&[Marker::upright(codes::WALK, 0.0, 0.0, 10.0)], &catalog).0;
        assert!(!none.has_start());
        assert_eq!(none.start(), None);

        let two = Collection::from_markers(
            &[
                Marker::upright(codes::BEGIN, 0.0, 0.0, 10.0),
                Marker::upright(codes::BEGIN, 0.0, 50.0, 10.0),
            ],
            &catalog,
        )
        .0;
        assert_eq!(two.start_count(), 2);
        assert!(!two.has_start());

        let one = Collection::from_markers(&[Marker::upright(codes::BEGIN, 0.0, 0.0, 10.0)], &catalog).0;
        assert_eq!(one.start(), Some(StatementId(0)));
    }
}
