//! Collision prediction for one ego vehicle.
//!
//! Keeps the ego's local dynamic map and route assignments, forecasts every
//! assigned vehicle a short horizon ahead and reports the vehicles whose
//! safe zone overlaps the ego's.

use crate::error::ForecastError;
use crate::forecast::PositionForecaster;
use crate::history::VehicleHistoryStore;
use crate::models::{Beacon, KinematicSnapshot};
use crate::registry::RouteAssignmentRegistry;
use crate::routes::RoutePolylineStore;
use crate::rules::WarningRules;
use crate::safe_zone::SafeZone;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct CollisionPredictor {
    rules: WarningRules,
    routes: Arc<RoutePolylineStore>,
    history: VehicleHistoryStore,
    assignments: RouteAssignmentRegistry,
    /// Last route id reported for each vehicle
    reported_routes: HashMap<String, String>,
}

impl CollisionPredictor {
    pub fn new(routes: Arc<RoutePolylineStore>, rules: WarningRules) -> Self {
        Self {
            history: VehicleHistoryStore::new(rules.history_capacity),
            rules,
            routes,
            assignments: RouteAssignmentRegistry::new(),
            reported_routes: HashMap::new(),
        }
    }

    pub fn rules(&self) -> &WarningRules {
        &self.rules
    }

    pub fn routes(&self) -> &RoutePolylineStore {
        &self.routes
    }

    pub fn history(&self) -> &VehicleHistoryStore {
        &self.history
    }

    pub fn assignments(&self) -> &RouteAssignmentRegistry {
        &self.assignments
    }

    /// Record a snapshot and remember the route the host reported with it.
    pub fn record_kinematics(&mut self, snapshot: KinematicSnapshot, route_id: Option<&str>) {
        if let Some(route_id) = route_id {
            self.reported_routes
                .insert(snapshot.vehicle_id.clone(), route_id.to_string());
        }
        let vehicle_id = snapshot.vehicle_id.clone();
        self.history.record(&vehicle_id, snapshot);
    }

    /// Assign a route to a vehicle. No-op if it already has one.
    pub fn assign_route(&mut self, vehicle_id: &str, route_id: &str) -> bool {
        let assigned = self.assignments.assign(vehicle_id, route_id);
        if assigned {
            debug!(vehicle_id, route_id, "route assigned");
        }
        assigned
    }

    /// Record a received beacon and take over the route id it carries.
    pub fn ingest_beacon(&mut self, beacon: &Beacon) {
        match beacon.route_id() {
            Some(route_id) => {
                self.assign_route(beacon.sender_id(), route_id);
            }
            None => warn!(
                sender = beacon.sender_id(),
                "beacon carries no readable route id"
            ),
        }
        self.record_kinematics(beacon.snapshot.clone(), beacon.route_id());
    }

    pub fn latest(&self, vehicle_id: &str) -> Result<&KinematicSnapshot, ForecastError> {
        self.history.latest(vehicle_id)
    }

    pub fn forecaster(&self) -> PositionForecaster<'_> {
        PositionForecaster::new(&self.history, &self.routes, &self.assignments)
            .with_update_interval(self.rules.update_interval_ms)
            .with_fallback(self.rules.index_fallback)
    }

    /// Safe zone around the vehicle's forecast position.
    pub fn forecast_zone(&self, vehicle_id: &str, horizon_s: f64) -> Result<SafeZone, ForecastError> {
        let length_m = self.history.latest(vehicle_id)?.length_m;
        let position = self.forecaster().forecast(vehicle_id, horizon_s)?;
        Ok(SafeZone::around(length_m, position, self.rules.footprint_factor))
    }

    /// Vehicles whose forecast safe zone overlaps the ego's.
    ///
    /// An ego without a route assignment takes over its last reported route and
    /// yields no prediction on that tick. Vehicles that cannot be forecast are
    /// left out.
    pub fn predict(&mut self, ego_id: &str, horizon_s: f64) -> BTreeSet<String> {
        let mut at_risk = BTreeSet::new();

        if self.assignments.route_of(ego_id).is_none() {
            match self.reported_routes.get(ego_id).cloned() {
                Some(route_id) => {
                    self.assign_route(ego_id, &route_id);
                }
                None => debug!(ego_id, "no route reported for ego yet"),
            }
            return at_risk;
        }

        let ego_zone = match self.forecast_zone(ego_id, horizon_s) {
            Ok(zone) => zone,
            Err(e) => {
                debug!(ego_id, "skipping prediction: {}", e);
                return at_risk;
            }
        };

        for (vehicle_id, _) in self.assignments.iter() {
            if vehicle_id == ego_id {
                continue;
            }
            match self.forecast_zone(vehicle_id, horizon_s) {
                Ok(zone) if ego_zone.overlaps(&zone) => {
                    at_risk.insert(vehicle_id.to_string());
                }
                Ok(_) => {}
                Err(e) => debug!(ego_id, vehicle_id, "vehicle excluded: {}", e),
            }
        }

        at_risk
    }
}
