//! Detected fiducial markers and plane geometry.

use serde::{Deserialize, Serialize};

/// A point in image coordinates (pixels, y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Offset this point by `(dx, dy)` rotated by `angle` radians.
    pub fn offset_rotated(self, dx: f32, dy: f32, angle: f32) -> Point {
        let (sin, cos) = angle.sin_cos();
        Point::new(self.x + dx * cos - dy * sin, self.y + dx * sin + dy * cos)
    }
}

/// One marker reported by the detector.
///
/// Owned by the detector and read-only to the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Decoded marker code.
    pub code: u32,
    /// Center of the marker.
    pub position: Point,
    /// Orientation in radians.
    pub rotation: f32,
    /// Diameter in pixels. Connector geometry scales with it.
    pub diameter: f32,
}

impl Marker {
    pub fn new(code: u32, x: f32, y: f32, rotation: f32, diameter: f32) -> Self {
        Self {
            code,
            position: Point::new(x, y),
            rotation,
            diameter,
        }
    }

    /// An axis-aligned marker, the common case in tests and photographs.
    pub fn upright(code: u32, x: f32, y: f32, diameter: f32) -> Self {
        Self::new(code, x, y, 0.0, diameter)
    }
}
