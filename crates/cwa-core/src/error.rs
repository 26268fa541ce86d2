//! Failure taxonomy for forecasting.
//!
//! None of these are fatal: the predictor drops the affected vehicle for the
//! current tick and moves on.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForecastError {
    /// Vehicle has never been recorded in the history store
    #[error("vehicle {0} is not tracked")]
    NotTracked(String),

    /// Vehicle has no route assignment yet
    #[error("vehicle {0} has no route assignment")]
    RouteUnassigned(String),

    /// The vehicle's position could not be bracketed by any route segment
    #[error("vehicle {vehicle_id} could not be located on route {route_id}")]
    RouteUnresolved { vehicle_id: String, route_id: String },

    /// The located index is the last waypoint, so no segment follows it
    #[error("route {route_id} has no waypoint after index {index}")]
    RouteExhausted { route_id: String, index: usize },

    /// The extrapolated index falls outside the route polyline
    #[error("forecast index {index} is outside route {route_id} (len {len})")]
    ForecastOutOfRange {
        route_id: String,
        index: i64,
        len: usize,
    },
}
