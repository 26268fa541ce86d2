//! Local dynamic map: a bounded history of kinematic snapshots per vehicle.

use crate::error::ForecastError;
use crate::models::KinematicSnapshot;
use std::collections::{HashMap, VecDeque};

pub const DEFAULT_HISTORY_CAPACITY: usize = 3;

/// Per-vehicle FIFO of the last few snapshots.
///
/// Entries are created on first observation and kept for the lifetime of the
/// store. Vehicles that stop reporting keep their last snapshots.
#[derive(Debug, Clone)]
pub struct VehicleHistoryStore {
    capacity: usize,
    vehicles: HashMap<String, VecDeque<KinematicSnapshot>>,
}

impl Default for VehicleHistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl VehicleHistoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            vehicles: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a snapshot, evicting the oldest one when the history is full.
    pub fn record(&mut self, vehicle_id: &str, snapshot: KinematicSnapshot) {
        let history = self
            .vehicles
            .entry(vehicle_id.to_string())
            .or_insert_with(|| VecDeque::with_capacity(self.capacity));
        if history.len() >= self.capacity {
            history.pop_front();
        }
        history.push_back(snapshot);
    }

    /// Most recently recorded snapshot for a vehicle.
    pub fn latest(&self, vehicle_id: &str) -> Result<&KinematicSnapshot, ForecastError> {
        self.vehicles
            .get(vehicle_id)
            .and_then(|history| history.back())
            .ok_or_else(|| ForecastError::NotTracked(vehicle_id.to_string()))
    }

    /// All stored snapshots for a vehicle, oldest first.
    pub fn history(&self, vehicle_id: &str) -> Option<impl Iterator<Item = &KinematicSnapshot>> {
        self.vehicles.get(vehicle_id).map(|history| history.iter())
    }

    pub fn contains(&self, vehicle_id: &str) -> bool {
        self.vehicles.contains_key(vehicle_id)
    }

    /// Number of tracked vehicles.
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn vehicle_ids(&self) -> impl Iterator<Item = &str> {
        self.vehicles.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(speed: f64) -> KinematicSnapshot {
        KinematicSnapshot::new("veh_0", 52.5, 13.2, 4.0).with_motion(90.0, speed, 0.0)
    }

    #[test]
    fn history_keeps_most_recent_snapshots_oldest_first() {
        let mut store = VehicleHistoryStore::default();
        for speed in 1..=5 {
            store.record("veh_0", snapshot(speed as f64));
        }

        let speeds: Vec<f64> = store
            .history("veh_0")
            .unwrap()
            .map(|s| s.speed_mps)
            .collect();
        assert_eq!(speeds, vec![3.0, 4.0, 5.0]);
        assert_eq!(store.latest("veh_0").unwrap().speed_mps, 5.0);
    }

    #[test]
    fn partially_filled_history_is_not_evicted() {
        let mut store = VehicleHistoryStore::default();
        store.record("veh_0", snapshot(1.0));
        store.record("veh_0", snapshot(2.0));
        assert_eq!(store.history("veh_0").unwrap().count(), 2);
    }

    #[test]
    fn latest_of_unknown_vehicle_is_not_tracked() {
        let store = VehicleHistoryStore::default();
        assert_eq!(
            store.latest("ghost"),
            Err(ForecastError::NotTracked("ghost".to_string()))
        );
        assert!(store.history("ghost").is_none());
    }

    #[test]
    fn vehicles_are_tracked_independently() {
        let mut store = VehicleHistoryStore::new(2);
        store.record("a", snapshot(1.0));
        store.record("b", snapshot(2.0));
        store.record("a", snapshot(3.0));
        store.record("a", snapshot(4.0));

        assert_eq!(store.len(), 2);
        assert_eq!(store.latest("b").unwrap().speed_mps, 2.0);
        assert_eq!(store.history("a").unwrap().count(), 2);
    }
}
