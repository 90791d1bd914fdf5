//! Connectors: named, directional attachment points with a circular
//! acceptance zone derived from the owning marker's geometry.

use serde::{Deserialize, Serialize};
use tangle_types::{Marker, Point};

use crate::statement::StatementId;

/// Which way a connector points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// A socket: receives flow from a plug on another statement.
    Incoming,
    /// A plug continuing the flow of control.
    Outgoing,
    /// A plug that reads a parameter statement.
    Parameter,
}

impl Direction {
    /// Plugs initiate a match; sockets accept one.
    pub fn is_plug(self) -> bool {
        matches!(self, Self::Outgoing | Self::Parameter)
    }
}

/// Catalog geometry for one connector.
///
/// Offsets and radius are expressed in marker diameters and rotated with the
/// marker, so the same template works at any scale and orientation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorTemplate {
    pub name: String,
    pub direction: Direction,
    pub dx: f32,
    pub dy: f32,
    pub radius: f32,
}

impl ConnectorTemplate {
    pub fn new(name: &str, direction: Direction, dx: f32, dy: f32, radius: f32) -> Self {
        Self {
            name: name.to_string(),
            direction,
            dx,
            dy,
            radius,
        }
    }

    /// Place this connector's zone relative to a detected marker.
    pub fn zone_for(&self, marker: &Marker) -> Zone {
        let d = marker.diameter;
        Zone {
            center: marker
                .position
                .offset_rotated(self.dx * d, self.dy * d, marker.rotation),
            radius: self.radius * d,
        }
    }
}

/// A circular acceptance zone in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub center: Point,
    pub radius: f32,
}

impl Zone {
    /// Center distance when the two zones overlap, `None` otherwise.
    pub fn overlap(&self, other: &Zone) -> Option<f32> {
        let distance = self.center.distance(other.center);
        (distance < self.radius + other.radius).then_some(distance)
    }
}

/// A connector instance on a statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    pub name: String,
    pub direction: Direction,
    pub zone: Zone,
    /// Resolved statement on the other side. Recomputed on every compile.
    pub target: Option<StatementId>,
}

impl Connector {
    pub fn from_template(template: &ConnectorTemplate, marker: &Marker) -> Self {
        Self {
            name: template.name.clone(),
            direction: template.direction,
            zone: template.zone_for(marker),
            target: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.target.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn zone_scales_with_diameter() {
        let template = ConnectorTemplate::new("next", Direction::Outgoing, 1.0, 0.0, 0.5);
        let zone = template.zone_for(&Marker::upright(1, 100.0, 50.0, 20.0));
        assert_eq!(zone.center, Point::new(120.0, 50.0));
        assert_eq!(zone.radius, 10.0);
    }

    #[test]
    fn zone_rotates_with_marker() {
        let template = ConnectorTemplate::new("next", Direction::Outgoing, 1.0, 0.0, 0.5);
        let zone = template.zone_for(&Marker::new(1, 100.0, 50.0, PI, 20.0));
        assert!((zone.center.x - 80.0).abs() < 1e-3);
        assert!((zone.center.y - 50.0).abs() < 1e-3);
    }

    #[test]
    fn overlap_requires_radius_sum() {
        let a = Zone {
            center: Point::new(0.0, 0.0),
            radius: 5.0,
        };
        let near = Zone {
            center: Point::new(8.0, 0.0),
            radius: 5.0,
        };
        let far = Zone {
            center: Point::new(10.0, 0.0),
            radius: 5.0,
        };
        assert_eq!(a.overlap(&near), Some(8.0));
        assert_eq!(a.overlap(&far), None);
    }

    #[test]
    fn plugs_and_sockets() {
        assert!(Direction::Outgoing.is_plug());
        assert!(Direction::Parameter.is_plug());
        assert!(!Direction::Incoming.is_plug());
    }
}
