//! Route polyline store.

use crate::models::Coordinate;
use std::fmt::Display;
use tracing::{debug, info, warn};

pub const DEFAULT_ROUTE_SLOTS: usize = 20;

/// Supplies route polylines for the store at startup.
pub trait RouteSource {
    type Error: Display;

    /// Read the polyline stored for `slot`.
    fn read_route(&self, slot: usize) -> Result<Vec<Coordinate>, Self::Error>;
}

/// Fixed pool of route polylines, addressed by slot name (`"0"`, `"1"`, ...).
///
/// Each slot is written at most once. Route ids that do not name a slot
/// behave like an empty slot.
#[derive(Debug, Clone)]
pub struct RoutePolylineStore {
    slots: Vec<Option<Vec<Coordinate>>>,
}

impl Default for RoutePolylineStore {
    fn default() -> Self {
        Self::new(DEFAULT_ROUTE_SLOTS)
    }
}

impl RoutePolylineStore {
    pub fn new(slot_count: usize) -> Self {
        Self {
            slots: vec![None; slot_count],
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Resolve a route id to its slot index.
    pub fn slot_index(&self, route_id: &str) -> Option<usize> {
        route_id
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|&slot| slot < self.slots.len())
    }

    /// Populate a slot. Returns false if the slot is unknown or already loaded.
    pub fn load(&mut self, route_id: &str, waypoints: Vec<Coordinate>) -> bool {
        let Some(slot) = self.slot_index(route_id) else {
            warn!(route_id, "ignoring route load into unknown slot");
            return false;
        };
        if self.slots[slot].is_some() {
            debug!(route_id, "route slot already loaded");
            return false;
        }
        self.slots[slot] = Some(waypoints);
        true
    }

    /// Load every slot from `source`. Unreadable slots stay empty.
    ///
    /// Returns the number of slots populated by this call.
    pub fn load_all<S: RouteSource>(&mut self, source: &S) -> usize {
        let mut loaded = 0;
        for slot in 0..self.slots.len() {
            match source.read_route(slot) {
                Ok(waypoints) => {
                    if self.load(&slot.to_string(), waypoints) {
                        loaded += 1;
                    }
                }
                Err(e) => warn!(slot, "route slot left empty: {}", e),
            }
        }
        info!(loaded, slots = self.slots.len(), "route polylines loaded");
        loaded
    }

    pub fn polyline(&self, route_id: &str) -> Option<&[Coordinate]> {
        let slot = self.slot_index(route_id)?;
        self.slots[slot].as_deref()
    }

    pub fn waypoint(&self, route_id: &str, index: usize) -> Option<Coordinate> {
        self.polyline(route_id)?.get(index).copied()
    }

    /// Number of waypoints in a route (0 if unloaded).
    pub fn len(&self, route_id: &str) -> usize {
        self.polyline(route_id).map_or(0, <[Coordinate]>::len)
    }

    pub fn is_loaded(&self, route_id: &str) -> bool {
        self.polyline(route_id).is_some()
    }
}
