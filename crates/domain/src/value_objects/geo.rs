//! Map coordinates and the geofence check.
//!
//! Both axes are percentages of the map extent (0-100), so distances are
//! comparable across maps of different pixel sizes.

use serde::{Deserialize, Serialize};

/// A point in normalized map space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
}

impl MapPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(&self, other: &MapPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// True when `a` lies within `radius` of `b`. The boundary counts as inside.
pub fn within_radius(a: MapPoint, b: MapPoint, radius: f64) -> bool {
    a.distance_to(&b) <= radius
}
