//! Safe-zone rectangles used as a coarse vehicle footprint.

use crate::geo::{meters_to_lat, meters_to_lon};
use crate::models::Coordinate;
use serde::{Deserialize, Serialize};

/// Inflation applied to twice the vehicle length; a car's diagonal is longer
/// than half its length.
pub const DEFAULT_FOOTPRINT_FACTOR: f64 = 0.7;

/// Axis-aligned rectangle in lat/lon space.
///
/// The zone always extends north and east of its anchor, independent of the
/// vehicle's heading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafeZone {
    pub anchor: Coordinate,
    pub far: Coordinate,
}

impl SafeZone {
    /// Build the zone for a vehicle of `length_m` at `point`.
    pub fn around(length_m: f64, point: Coordinate, footprint_factor: f64) -> Self {
        let extent_m = 2.0 * length_m * footprint_factor;
        Self {
            anchor: point,
            far: Coordinate::new(
                point.lat + meters_to_lat(extent_m),
                point.lon + meters_to_lon(extent_m, point.lat),
            ),
        }
    }

    pub fn delta_lat(&self) -> f64 {
        self.far.lat - self.anchor.lat
    }

    pub fn delta_lon(&self) -> f64 {
        self.far.lon - self.anchor.lon
    }

    /// Corners in the order anchor, north, far, east.
    pub fn corners(&self) -> [Coordinate; 4] {
        [
            self.anchor,
            Coordinate::new(self.anchor.lat + self.delta_lat(), self.anchor.lon),
            Coordinate::new(
                self.anchor.lat + self.delta_lat(),
                self.anchor.lon + self.delta_lon(),
            ),
            Coordinate::new(self.anchor.lat, self.anchor.lon + self.delta_lon()),
        ]
    }

    /// Point-in-rectangle test, boundary included.
    pub fn contains(&self, point: Coordinate) -> bool {
        let (min_lat, max_lat) = min_max(self.anchor.lat, self.far.lat);
        let (min_lon, max_lon) = min_max(self.anchor.lon, self.far.lon);
        (min_lat..=max_lat).contains(&point.lat) && (min_lon..=max_lon).contains(&point.lon)
    }

    /// Eight-point corner containment: either zone holds a corner of the other.
    ///
    /// This is deliberately weaker than a full rectangle intersection test; two
    /// zones crossing like a plus sign without sharing a corner do not overlap.
    pub fn overlaps(&self, other: &SafeZone) -> bool {
        other.corners().iter().any(|&c| self.contains(c))
            || self.corners().iter().any(|&c| other.contains(c))
    }
}

/// Safe zone with the default footprint factor.
pub fn safe_zone(length_m: f64, point: Coordinate) -> SafeZone {
    SafeZone::around(length_m, point, DEFAULT_FOOTPRINT_FACTOR)
}

fn min_max(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
