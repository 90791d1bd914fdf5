//! Post-compile layout report: which stickers were reached and what the
//! user most likely needs to fix.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::collection::Collection;
use crate::statement::{StatementId, StatementKind};

/// The single most useful thing to tell the user about a layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "hint", content = "stickers", rename_all = "snake_case")]
pub enum LayoutHint {
    Ok,
    MissingStart,
    MissingLoopEnd,
    MissingLoopBegin,
    /// These stickers were detected but never reached from the start.
    Misaligned(Vec<String>),
}

impl fmt::Display for LayoutHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "program layout looks good"),
            Self::MissingStart => write!(f, "make sure you have exactly one Begin sticker"),
            Self::MissingLoopEnd => write!(f, "make sure you have an End Repeat sticker"),
            Self::MissingLoopBegin => write!(f, "make sure you have a Begin Repeat sticker"),
            Self::Misaligned(names) => {
                write!(f, "check the alignment of: {}", names.join(", "))
            }
        }
    }
}

/// Compile coverage of one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutReport {
    pub begin_found: bool,
    pub loop_begin_found: bool,
    /// Every loop-begin sticker was reached.
    pub loop_begin_compiled: bool,
    pub loop_end_found: bool,
    /// Every loop-end sticker was reached.
    pub loop_end_compiled: bool,
    /// Names of stickers never reached, in statement order.
    pub misplaced: Vec<String>,
    /// Statements with an unresolved outgoing connector.
    pub dangling: Vec<StatementId>,
    pub hint: LayoutHint,
}

impl LayoutReport {
    /// Inspect a collection after code generation has marked it.
    pub fn from_collection(collection: &Collection) -> Self {
        let of_kind = |kind: StatementKind| collection.iter().filter(move |s| s.kind == kind);

        let begin_found = collection.start_count() > 0;
        let loop_begin_found = of_kind(StatementKind::LoopBegin).next().is_some();
        let loop_end_found = of_kind(StatementKind::LoopEnd).next().is_some();
        let loop_begin_compiled = of_kind(StatementKind::LoopBegin).all(|s| s.is_compiled());
        let loop_end_compiled = of_kind(StatementKind::LoopEnd).all(|s| s.is_compiled());

        let misplaced: Vec<String> = collection
            .iter()
            .filter(|s| !s.is_compiled())
            .map(|s| s.name.clone())
            .collect();
        let dangling = collection
            .iter()
            .filter(|s| s.is_dangling())
            .map(|s| s.id)
            .collect();

        let hint = if !collection.has_start() {
            LayoutHint::MissingStart
        } else if loop_begin_found && !loop_end_found {
            LayoutHint::MissingLoopEnd
        } else if loop_end_found && !loop_begin_found {
            LayoutHint::MissingLoopBegin
        } else if !misplaced.is_empty() {
            LayoutHint::Misaligned(misplaced.clone())
        } else {
            LayoutHint::Ok
        };

        Self {
            begin_found,
            loop_begin_found,
            loop_begin_compiled,
            loop_end_found,
            loop_end_compiled,
            misplaced,
            dangling,
            hint,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.hint == LayoutHint::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{codes, Catalog};
    use tangle_types::Marker;

    fn collection(markers: &[Marker]) -> Collection {
        Collection::from_markers(markers, &Catalog::standard()).0
    }

    fn mark_all(c: &mut Collection) {
        for s in c.statements_mut() {
            s.mark_compiled();
        }
    }

    #[test]
    fn fully_compiled_layout_is_ok() {
        let mut c = collection(&[
            Marker::upright(codes::BEGIN, 0.0, 0.0, 20.0),
            Marker::upright(codes::WALK, 40.0, 0.0, 20.0),
        ]);
        mark_all(&mut c);
        let report = LayoutReport::from_collection(&c);
        assert!(report.is_ok());
        assert!(report.begin_found);
        assert!(report.misplaced.is_empty());
    }

    #[test]
    fn missing_begin_takes_priority() {
        let c = collection(&[Marker::upright(codes::BEGIN_REPEAT, 0.0, 0.0, 20.0)]);
        let report = LayoutReport::from_collection(&c);
        assert_eq!(report.hint, LayoutHint::MissingStart);
        assert!(!report.begin_found);
    }

    #[test]
    fn loop_without_end_is_reported() {
        let mut c = collection(&[
            Marker::upright(codes::BEGIN, 0.0, 0.0, 20.0),
            Marker::upright(codes::BEGIN_REPEAT, 40.0, 0.0, 20.0),
        ]);
        mark_all(&mut c);
        let report = LayoutReport::from_collection(&c);
        assert_eq!(report.hint, LayoutHint::MissingLoopEnd);
        assert!(report.loop_begin_found);
        assert!(!report.loop_end_found);
    }

    #[test]
    fn end_without_begin_is_reported() {
        let mut c = collection(&[
            Marker::upright(codes::BEGIN, 0.0, 0.0, 20.0),
            Marker::upright(codes::END_REPEAT, 40.0, 0.0, 20.0),
        ]);
        mark_all(&mut c);
        assert_eq!(
            LayoutReport::from_collection(&c).hint,
            LayoutHint::MissingLoopBegin
        );
    }

    #[test]
    fn unreached_stickers_are_misaligned() {
        let mut c = collection(&[
            Marker::upright(codes::BEGIN, 0.0, 0.0, 20.0),
            Marker::upright(codes::JUMP, 500.0, 500.0, 20.0),
        ]);
        c.get_mut(StatementId(0)).unwrap().mark_compiled();
        c.get_mut(StatementId(0)).unwrap().mark_dangling();
        let report = LayoutReport::from_collection(&c);
        assert_eq!(report.hint, LayoutHint::Misaligned(vec!["Jump".into()]));
        assert_eq!(report.dangling, vec![StatementId(0)]);
        assert_eq!(report.hint.to_string(), "check the alignment of: Jump");
    }
}
