//! Drive path implementations.

use cwa_core::geo::{heading_between, offset_position};
use cwa_core::Coordinate;
use std::f64::consts::PI;

/// A path driven at constant nominal speed.
pub trait DrivePath: Send + Sync {
    /// Position at time `t` seconds from start.
    fn position(&self, t: f64) -> Coordinate;

    /// Approximate heading at time t (degrees, 0 = North).
    fn heading(&self, t: f64) -> f64 {
        // Default: estimate heading from position delta
        let dt = 0.1;
        heading_between(self.position(t), self.position(t + dt))
    }

    fn speed_mps(&self) -> f64;

    /// Time needed to drive the whole path at nominal speed.
    fn duration_s(&self) -> f64;

    /// Waypoints one host step apart, the way a recorded route looks.
    fn sample(&self, interval_ms: u64) -> Vec<Coordinate> {
        let step_s = interval_ms.max(1) as f64 / 1000.0;
        let steps = (self.duration_s() / step_s).floor() as usize;
        (0..=steps).map(|k| self.position(k as f64 * step_s)).collect()
    }
}

/// Straight path between two points.
pub struct LinearPath {
    pub start: Coordinate,
    pub end: Coordinate,
    pub speed_mps: f64,
    pub distance_m: f64,
    duration: f64,
    heading: f64,
}

impl LinearPath {
    pub fn new(start: Coordinate, end: Coordinate, speed_mps: f64) -> Self {
        let distance_m = cwa_core::distance_between(start, end);
        let duration = if speed_mps > 0.0 {
            distance_m / speed_mps
        } else {
            0.0
        };
        Self {
            start,
            end,
            speed_mps,
            distance_m,
            duration,
            heading: heading_between(start, end),
        }
    }

    /// Path through `center` on the given heading, starting `half_length_m`
    /// before it and ending the same distance after it.
    pub fn through(center: Coordinate, heading_deg: f64, half_length_m: f64, speed_mps: f64) -> Self {
        let (north, east) = (heading_deg.to_radians().cos(), heading_deg.to_radians().sin());
        let start = offset_position(center, -north * half_length_m, -east * half_length_m);
        let end = offset_position(center, north * half_length_m, east * half_length_m);
        Self::new(start, end, speed_mps)
    }
}

impl DrivePath for LinearPath {
    fn position(&self, t: f64) -> Coordinate {
        // Clamp progress to [0, 1]
        let progress = if self.duration > 0.0 {
            (t / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Coordinate::new(
            self.start.lat + progress * (self.end.lat - self.start.lat),
            self.start.lon + progress * (self.end.lon - self.start.lon),
        )
    }

    fn heading(&self, _t: f64) -> f64 {
        self.heading
    }

    fn speed_mps(&self) -> f64 {
        self.speed_mps
    }

    fn duration_s(&self) -> f64 {
        self.duration
    }
}

/// Arc around a center point, e.g. a turn at an intersection.
pub struct ArcPath {
    pub center: Coordinate,
    pub radius_m: f64,
    pub speed_mps: f64,
    /// Starting angle in radians, 0 = North of the center
    pub start_angle: f64,
    /// Swept angle in radians
    pub sweep: f64,
    pub clockwise: bool,
}

impl ArcPath {
    pub fn new(
        center: Coordinate,
        radius_m: f64,
        speed_mps: f64,
        start_angle: f64,
        sweep: f64,
        clockwise: bool,
    ) -> Self {
        Self {
            center,
            radius_m,
            speed_mps,
            start_angle,
            sweep: sweep.clamp(0.0, 2.0 * PI),
            clockwise,
        }
    }

    /// Quarter circle, the usual turn.
    pub fn quarter_turn(center: Coordinate, radius_m: f64, speed_mps: f64, start_angle: f64, clockwise: bool) -> Self {
        Self::new(center, radius_m, speed_mps, start_angle, PI / 2.0, clockwise)
    }
}

impl DrivePath for ArcPath {
    fn position(&self, t: f64) -> Coordinate {
        let travelled = (self.speed_mps * t.clamp(0.0, self.duration_s())) / self.radius_m;
        let angle = if self.clockwise {
            self.start_angle + travelled
        } else {
            self.start_angle - travelled
        };
        offset_position(
            self.center,
            self.radius_m * angle.cos(),
            self.radius_m * angle.sin(),
        )
    }

    fn speed_mps(&self) -> f64 {
        self.speed_mps
    }

    fn duration_s(&self) -> f64 {
        if self.speed_mps > 0.0 && self.radius_m > 0.0 {
            self.radius_m * self.sweep / self.speed_mps
        } else {
            0.0
        }
    }
}
