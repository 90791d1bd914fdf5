//! Integration tests for the statement graph.
//!
//! Tests validate:
//! - One statement per recognized marker, unknown codes skipped
//! - Geometric resolution of flow and parameter connectors
//! - Layout report hints after marking
//! - JSON catalogs drive instantiation the same way the standard one does

use tangle_graph::catalog::{codes, names};
use tangle_graph::{
    resolve, Catalog, Collection, LayoutHint, LayoutReport, ParamValue, StatementId, StatementKind,
};
use tangle_types::{ErrorCode, Marker};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

const D: f32 = 20.0;

/// Lay codes out left to right, two diameters apart.
fn row(codes: &[u32]) -> Vec<Marker> {
    codes
        .iter()
        .enumerate()
        .map(|(i, code)| Marker::upright(*code, i as f32 * 2.0 * D, 0.0, D))
        .collect()
}

fn resolved(markers: &[Marker]) -> Collection {
    let (mut collection, diagnostics) = Collection::from_markers(markers, &Catalog::standard());
    assert!(!diagnostics.has_errors());
    resolve(&mut collection);
    collection
}

/// Follow `next` connectors from the start.
fn chain(collection: &Collection) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = collection.start();
    while let Some(id) = current {
        let statement = collection.get(id).unwrap();
        out.push(statement.name.clone());
        current = statement.connection(names::NEXT);
        if out.len() > collection.len() {
            break;
        }
    }
    out
}

// ══════════════════════════════════════════════════════════════════════════════
// Resolution
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn linear_row_forms_a_chain() {
    let c = resolved(&row(&[codes::BEGIN, codes::WALK, codes::JUMP, codes::SPIN]));
    assert_eq!(chain(&c), vec!["Begin", "Walk", "Jump", "Spin"]);
}

#[test]
fn marker_order_does_not_matter() {
    let mut markers = row(&[codes::BEGIN, codes::WALK, codes::JUMP]);
    markers.reverse();
    let c = resolved(&markers);
    assert_eq!(chain(&c), vec!["Begin", "Walk", "Jump"]);
}

#[test]
fn gap_breaks_the_chain() {
    let mut markers = row(&[codes::BEGIN, codes::WALK]);
    markers.push(Marker::upright(codes::JUMP, 400.0, 0.0, D));
    let c = resolved(&markers);
    assert_eq!(chain(&c), vec!["Begin", "Walk"]);
    assert_eq!(c.get(StatementId(2)).unwrap().connection(names::PREV), None);
    assert!(c.get(StatementId(0)).unwrap().has_outgoing_connection());
    assert!(!c.get(StatementId(1)).unwrap().has_outgoing_connection());
    assert!(!c.get(StatementId(2)).unwrap().has_outgoing_connection());
}

#[test]
fn repeat_reads_its_parameter() {
    let mut markers = row(&[codes::BEGIN, codes::BEGIN_REPEAT, codes::WALK, codes::END_REPEAT]);
    // Count "3" under the repeat sticker.
    markers.push(Marker::upright(codes::COUNTS[1], 2.0 * D, 2.0 * D, D));
    let c = resolved(&markers);

    let repeat = c.get(StatementId(1)).unwrap();
    assert_eq!(repeat.kind, StatementKind::LoopBegin);
    let param = c.get(repeat.parameter_connection().unwrap()).unwrap();
    assert_eq!(
        param.kind,
        StatementKind::Parameter {
            value: ParamValue::Count(3)
        }
    );
    assert_eq!(chain(&c), vec!["Begin", "Begin Repeat", "Walk", "End Repeat"]);
}

#[test]
fn unknown_codes_are_reported_not_fatal() {
    let (c, diagnostics) =
        Collection::from_markers(&row(&[codes::BEGIN, 7, codes::WALK]), &Catalog::standard());
    assert_eq!(c.len(), 2);
    assert!(!diagnostics.has_errors());
    assert_eq!(diagnostics.with_code(ErrorCode::UNKNOWN_MARKER).count(), 1);
}

#[test]
fn reset_clears_resolution_and_flags() {
    let mut c = resolved(&row(&[codes::BEGIN, codes::WALK]));
    c.get_mut(StatementId(0)).unwrap().mark_compiled();
    c.reset();
    assert!(c.iter().all(|s| !s.is_compiled()));
    assert!(c.iter().all(|s| s.connectors.iter().all(|k| k.target.is_none())));
}

// ══════════════════════════════════════════════════════════════════════════════
// Catalog
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn custom_json_catalog() {
    let json = r#"{
      "templates": [
        { "code": 1, "name": "Go", "kind": "start",
          "connectors": [ { "name": "next", "direction": "outgoing", "dx": 1.0, "dy": 0.0, "radius": 0.5 } ] },
        { "code": 2, "name": "Hop", "kind": "action", "action": "jump",
          "connectors": [
            { "name": "prev", "direction": "incoming", "dx": -1.0, "dy": 0.0, "radius": 0.5 },
            { "name": "next", "direction": "outgoing", "dx": 1.0, "dy": 0.0, "radius": 0.5 } ] }
      ]
    }"#;
    let catalog = Catalog::from_json(json).unwrap();
    assert_eq!(catalog.len(), 2);

    let (mut c, _) = Collection::from_markers(&row(&[1, 2]), &catalog);
    assert_eq!(resolve(&mut c), 1);
    assert_eq!(chain(&c), vec!["Go", "Hop"]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Layout report
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn report_on_unmarked_graph_lists_everything() {
    let c = resolved(&row(&[codes::BEGIN, codes::WALK]));
    let report = LayoutReport::from_collection(&c);
    assert_eq!(
        report.hint,
        LayoutHint::Misaligned(vec!["Begin".into(), "Walk".into()])
    );
    assert!(!report.is_ok());
}

#[test]
fn report_serializes_hint_tag() {
    let c = resolved(&row(&[codes::WALK]));
    let report = LayoutReport::from_collection(&c);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["hint"]["hint"], "missing_start");
}
