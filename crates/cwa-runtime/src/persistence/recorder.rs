//! Records the path a vehicle drives into a route file.

use super::route_files::{write_route_file, RouteFile};
use anyhow::Result;
use chrono::{DateTime, Utc};
use cwa_core::{Coordinate, KinematicSnapshot};
use std::path::{Path, PathBuf};

/// Samples a vehicle's position once per host step.
///
/// Waypoint spacing therefore encodes the speed driven while recording,
/// which the forecaster compares against later.
#[derive(Debug, Clone)]
pub struct RouteRecorder {
    vehicle_id: String,
    route_id: String,
    waypoints: Vec<Coordinate>,
    started_at: DateTime<Utc>,
}

impl RouteRecorder {
    pub fn new(vehicle_id: impl Into<String>, route_id: impl Into<String>) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            route_id: route_id.into(),
            waypoints: Vec::new(),
            started_at: Utc::now(),
        }
    }

    /// Append the snapshot's position if it belongs to the recorded vehicle.
    pub fn record(&mut self, snapshot: &KinematicSnapshot) -> bool {
        if snapshot.vehicle_id != self.vehicle_id {
            return false;
        }
        self.waypoints.push(snapshot.position());
        true
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn finish(self) -> RouteFile {
        RouteFile::from_waypoints(self.route_id, &self.waypoints).with_recorded_at(self.started_at)
    }

    /// Finish recording and write the route into `dir` under `slot`.
    pub fn write_to(self, dir: &Path, slot: usize) -> Result<PathBuf> {
        let file = self.finish();
        write_route_file(dir, slot, &file)
    }
}
