//! Geometric connector matching.
//!
//! Every plug (outgoing or parameter connector) is tested against every
//! incoming socket on another statement. Overlapping pairs become edges. The
//! pass is O(n²) in connectors, which is fine for the few dozen stickers a
//! photograph holds.

use std::cmp::Ordering;
use tracing::{debug, trace};

use crate::collection::Collection;
use crate::statement::StatementId;

/// One overlapping plug/socket pair.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance: f32,
    plug: (StatementId, usize),
    socket: (StatementId, usize),
}

impl Candidate {
    /// Nearest first; ids break exact ties so the outcome never depends on
    /// float noise or iteration order.
    fn order(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.plug.cmp(&other.plug))
            .then_with(|| self.socket.cmp(&other.socket))
    }
}

/// Resolve all connector targets in place. Returns the number of edges.
///
/// Previous targets are discarded first, so resolving twice yields the same
/// graph. A plug resolves to at most one socket and a socket accepts at most
/// one plug; a connector never resolves to its own statement.
pub fn resolve(collection: &mut Collection) -> usize {
    for s in collection.statements_mut() {
        for c in &mut s.connectors {
            c.target = None;
        }
    }

    let mut candidates = Vec::new();
    for plug_owner in collection.iter() {
        for (pi, plug) in plug_owner.connectors.iter().enumerate() {
            if !plug.direction.is_plug() {
                continue;
            }
            for socket_owner in collection.iter() {
                if socket_owner.id == plug_owner.id {
                    continue;
                }
                for (si, socket) in socket_owner.connectors.iter().enumerate() {
                    if socket.direction.is_plug() {
                        continue;
                    }
                    if let Some(distance) = plug.zone.overlap(&socket.zone) {
                        candidates.push(Candidate {
                            distance,
                            plug: (plug_owner.id, pi),
                            socket: (socket_owner.id, si),
                        });
                    }
                }
            }
        }
    }
    candidates.sort_by(Candidate::order);
    trace!(candidates = candidates.len(), "connector candidates collected");

    let mut edges = 0;
    for candidate in candidates {
        let (plug_id, pi) = candidate.plug;
        let (socket_id, si) = candidate.socket;

        let plug_free = collection
            .get(plug_id)
            .is_some_and(|s| s.connectors[pi].target.is_none());
        let socket_free = collection
            .get(socket_id)
            .is_some_and(|s| s.connectors[si].target.is_none());
        if !(plug_free && socket_free) {
            continue;
        }

        if let Some(s) = collection.get_mut(plug_id) {
            s.connectors[pi].target = Some(socket_id);
        }
        if let Some(s) = collection.get_mut(socket_id) {
            s.connectors[si].target = Some(plug_id);
        }
        debug!(
            plug = plug_id.0,
            socket = socket_id.0,
            distance = candidate.distance,
            "connectors matched"
        );
        edges += 1;
    }
    edges
}
