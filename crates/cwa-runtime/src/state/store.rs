//! In-memory agent store using DashMap.

use cwa_core::{
    Beacon, CollisionWarningAgent, KinematicUpdate, ReactionState, ReactionTimer, RoutePolylineStore,
    TimerToken, VehicleActuator, WarningRules,
};
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// One collision warning agent per vehicle known to the host.
///
/// All agents share the same route polylines, which are read-only once
/// loaded.
pub struct HostState {
    routes: Arc<RoutePolylineStore>,
    rules: WarningRules,
    agents: DashMap<String, CollisionWarningAgent>,
    agents_created: AtomicU64,
}

impl HostState {
    pub fn new(routes: Arc<RoutePolylineStore>, rules: WarningRules) -> Self {
        Self {
            routes,
            rules,
            agents: DashMap::new(),
            agents_created: AtomicU64::new(0),
        }
    }

    pub fn routes(&self) -> &Arc<RoutePolylineStore> {
        &self.routes
    }

    pub fn rules(&self) -> &WarningRules {
        &self.rules
    }

    /// Create the vehicle's agent if it does not exist yet.
    pub fn register_vehicle(&self, vehicle_id: &str) {
        self.agents
            .entry(vehicle_id.to_string())
            .or_insert_with(|| self.new_agent(vehicle_id));
    }

    pub fn remove_vehicle(&self, vehicle_id: &str) -> bool {
        self.agents.remove(vehicle_id).is_some()
    }

    pub fn vehicle_count(&self) -> usize {
        self.agents.len()
    }

    pub fn vehicle_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.agents.iter().map(|r| r.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn reaction_state(&self, vehicle_id: &str) -> Option<ReactionState> {
        self.agents.get(vehicle_id).map(|agent| agent.reaction_state())
    }

    /// Run one ego step for the updated vehicle.
    pub fn apply_update(
        &self,
        update: KinematicUpdate,
        timer: &mut dyn ReactionTimer,
        actuator: &mut dyn VehicleActuator,
    ) -> BTreeSet<String> {
        let vehicle_id = update.snapshot.vehicle_id.clone();
        let mut agent = self
            .agents
            .entry(vehicle_id.clone())
            .or_insert_with(|| self.new_agent(&vehicle_id));
        agent.on_vehicle_updated(update, timer, actuator)
    }

    /// Deliver a beacon to every vehicle except its sender.
    ///
    /// Returns the number of receivers.
    pub fn broadcast_beacon(&self, beacon: &Beacon) -> usize {
        let mut receivers = 0;
        for mut agent in self.agents.iter_mut() {
            if agent.key() != beacon.sender_id() {
                agent.value_mut().on_beacon(beacon);
                receivers += 1;
            }
        }
        receivers
    }

    /// Deliver a beacon to a single receiver.
    ///
    /// Beacons for vehicles the host does not know, or that have left, are
    /// dropped.
    pub fn deliver_beacon(&self, receiver_id: &str, beacon: &Beacon) -> bool {
        match self.agents.get_mut(receiver_id) {
            Some(mut agent) => {
                agent.on_beacon(beacon);
                true
            }
            None => {
                tracing::debug!(
                    receiver_id,
                    sender_id = %beacon.sender_id(),
                    "beacon for unknown vehicle dropped"
                );
                false
            }
        }
    }

    pub fn fire_reaction_timer(
        &self,
        vehicle_id: &str,
        token: TimerToken,
        actuator: &mut dyn VehicleActuator,
    ) -> bool {
        match self.agents.get_mut(vehicle_id) {
            Some(mut agent) => agent.on_reaction_timer(token, actuator),
            None => {
                tracing::debug!(vehicle_id, "reaction timer for unknown vehicle");
                false
            }
        }
    }

    fn new_agent(&self, vehicle_id: &str) -> CollisionWarningAgent {
        // each agent gets its own token range
        let generation = self.agents_created.fetch_add(1, Ordering::SeqCst);
        CollisionWarningAgent::new(vehicle_id, self.routes.clone(), self.rules.clone())
            .with_first_token(generation << 32)
    }
}
