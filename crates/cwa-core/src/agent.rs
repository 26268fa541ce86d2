//! Collision warning application running on one vehicle.

use crate::models::{Beacon, KinematicUpdate};
use crate::predictor::CollisionPredictor;
use crate::reaction::{ReactionController, ReactionState, ReactionTimer, TimerToken, VehicleActuator};
use crate::routes::RoutePolylineStore;
use crate::rules::WarningRules;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Per-vehicle state: the ego's local dynamic map, its predictor and its
/// braking reaction. Owned exclusively by the host context processing that
/// vehicle.
pub struct CollisionWarningAgent {
    ego_id: String,
    predictor: CollisionPredictor,
    reaction: ReactionController,
}

impl CollisionWarningAgent {
    pub fn new(ego_id: impl Into<String>, routes: Arc<RoutePolylineStore>, rules: WarningRules) -> Self {
        let ego_id = ego_id.into();
        Self {
            reaction: ReactionController::new(ego_id.clone(), &rules),
            predictor: CollisionPredictor::new(routes, rules),
            ego_id,
        }
    }

    /// Give this agent's reaction timers their own token range, so a timer
    /// left over from an earlier agent for the same vehicle never matches.
    pub fn with_first_token(mut self, first: u64) -> Self {
        self.reaction = self.reaction.with_first_token(first);
        self
    }

    pub fn ego_id(&self) -> &str {
        &self.ego_id
    }

    pub fn predictor(&self) -> &CollisionPredictor {
        &self.predictor
    }

    pub fn reaction_state(&self) -> ReactionState {
        self.reaction.state()
    }

    /// Ego vehicle step: record, predict, react.
    ///
    /// Returns the vehicles forecast to collide with the ego on this tick.
    pub fn on_vehicle_updated(
        &mut self,
        update: KinematicUpdate,
        timer: &mut dyn ReactionTimer,
        actuator: &mut dyn VehicleActuator,
    ) -> BTreeSet<String> {
        if update.snapshot.vehicle_id != self.ego_id {
            warn!(
                ego_id = %self.ego_id,
                vehicle_id = %update.snapshot.vehicle_id,
                "ignoring update addressed to another vehicle"
            );
            return BTreeSet::new();
        }

        self.predictor
            .record_kinematics(update.snapshot, update.route_id.as_deref());

        let horizon_s = self.predictor.rules().forecast_horizon_s;
        let at_risk = self.predictor.predict(&self.ego_id, horizon_s);
        for other in &at_risk {
            info!("{} collides with {}", self.ego_id, other);
        }
        self.reaction.on_prediction(&at_risk, timer, actuator);
        at_risk
    }

    /// Beacon received from another vehicle.
    pub fn on_beacon(&mut self, beacon: &Beacon) {
        if beacon.sender_id() == self.ego_id {
            return;
        }
        self.predictor.ingest_beacon(beacon);
    }

    /// Route assignment delivered outside of a beacon.
    pub fn assign_route(&mut self, vehicle_id: &str, route_id: &str) -> bool {
        self.predictor.assign_route(vehicle_id, route_id)
    }

    pub fn on_reaction_timer(&mut self, token: TimerToken, actuator: &mut dyn VehicleActuator) -> bool {
        self.reaction.on_timer_fired(token, actuator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo;
    use crate::models::{ActuatorCommandType, Coordinate, KinematicSnapshot};
    use crate::reaction::tests::{RecordingActuator, RecordingTimer};

    fn shared_route() -> Arc<RoutePolylineStore> {
        let origin = Coordinate::new(52.5, 13.2);
        let polyline: Vec<Coordinate> = (0..200)
            .map(|k| geo::offset_position(origin, k as f64 * 0.1, k as f64 * 0.1))
            .collect();
        let mut store = RoutePolylineStore::default();
        store.load("0", polyline.clone());
        store.load("1", polyline);
        Arc::new(store)
    }

    fn snapshot(routes: &RoutePolylineStore, id: &str, index: usize) -> KinematicSnapshot {
        let a = routes.waypoint("0", index - 1).unwrap();
        let b = routes.waypoint("0", index).unwrap();
        KinematicSnapshot::new(id, (a.lat + b.lat) / 2.0, (a.lon + b.lon) / 2.0, 4.0)
            .with_motion(45.0, 14.0, 0.0)
    }

    fn update(routes: &RoutePolylineStore, index: usize) -> KinematicUpdate {
        KinematicUpdate {
            snapshot: snapshot(routes, "ego", index),
            route_id: Some("0".to_string()),
        }
    }

    #[test]
    fn converging_vehicle_triggers_reaction_then_resume() {
        let routes = shared_route();
        let mut agent = CollisionWarningAgent::new("ego", routes.clone(), WarningRules::default());
        let mut timer = RecordingTimer::default();
        let mut actuator = RecordingActuator::default();

        agent.on_beacon(&Beacon::new(snapshot(&routes, "other", 5), "1"));

        // first tick only assigns the ego route
        assert!(agent.on_vehicle_updated(update(&routes, 5), &mut timer, &mut actuator).is_empty());

        let at_risk = agent.on_vehicle_updated(update(&routes, 5), &mut timer, &mut actuator);
        assert_eq!(at_risk, BTreeSet::from(["other".to_string()]));
        assert!(matches!(agent.reaction_state(), ReactionState::ReactionPending { .. }));

        assert!(agent.on_reaction_timer(timer.scheduled[0].1, &mut actuator));
        assert_eq!(agent.reaction_state(), ReactionState::Braking);

        // the other vehicle moves far ahead on its route
        agent.on_beacon(&Beacon::new(snapshot(&routes, "other", 120), "1"));
        assert!(agent.on_vehicle_updated(update(&routes, 5), &mut timer, &mut actuator).is_empty());
        assert_eq!(agent.reaction_state(), ReactionState::Idle);
        assert!(matches!(
            actuator.commands.as_slice(),
            [first, second]
                if matches!(first.command_type, ActuatorCommandType::Decelerate { .. })
                    && second.command_type == ActuatorCommandType::Resume
        ));
    }

    #[test]
    fn own_beacons_and_foreign_updates_are_ignored() {
        let routes = shared_route();
        let mut agent = CollisionWarningAgent::new("ego", routes.clone(), WarningRules::default());
        let mut timer = RecordingTimer::default();
        let mut actuator = RecordingActuator::default();

        agent.on_beacon(&Beacon::new(snapshot(&routes, "ego", 5), "1"));
        assert!(agent.predictor().assignments().is_empty());

        let foreign = KinematicUpdate {
            snapshot: snapshot(&routes, "other", 5),
            route_id: Some("1".to_string()),
        };
        assert!(agent.on_vehicle_updated(foreign, &mut timer, &mut actuator).is_empty());
        assert!(agent.predictor().history().is_empty());
    }
}
