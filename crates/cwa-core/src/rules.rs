//! Tunable parameters for history, forecasting and reaction.

use serde::{Deserialize, Serialize};

/// What the forecaster does when no route segment brackets the vehicle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexFallback {
    /// Fail the forecast with `RouteUnresolved`
    #[default]
    Fail,
    /// Assume the vehicle sits at waypoint 0 and skip the braking adjustment
    RouteStart,
}

/// Configuration for the collision warning pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarningRules {
    /// Snapshots kept per vehicle in the local dynamic map
    pub history_capacity: usize,
    /// Number of route slots in the polyline store
    pub route_slots: usize,
    /// Look-ahead used by the predictor (seconds)
    pub forecast_horizon_s: f64,
    /// Host simulation step; also the spacing of recorded route waypoints (ms)
    pub update_interval_ms: u64,
    /// Safe-zone inflation applied to twice the vehicle length
    pub footprint_factor: f64,
    /// Driver reaction time before braking starts (ms)
    pub reaction_delay_ms: u64,
    /// Speed the vehicle brakes down to once a collision is forecast (m/s)
    pub brake_target_speed_mps: f64,
    /// Time over which the deceleration is applied (ms)
    pub brake_interval_ms: u64,
    /// Beacon transmission interval (ms)
    pub beacon_interval_ms: u64,
    pub index_fallback: IndexFallback,
}

impl Default for WarningRules {
    fn default() -> Self {
        Self {
            history_capacity: 3,
            route_slots: 20,
            forecast_horizon_s: 0.3,
            update_interval_ms: 10,
            footprint_factor: 0.7,
            reaction_delay_ms: 500,
            brake_target_speed_mps: 25.0 / 3.6, // 25 km/h
            brake_interval_ms: 1000,
            beacon_interval_ms: 100, // 10 Hz
            index_fallback: IndexFallback::Fail,
        }
    }
}

impl WarningRules {
    /// Parse rules from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
