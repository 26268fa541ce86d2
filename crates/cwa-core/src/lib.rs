pub mod agent;
pub mod error;
pub mod forecast;
pub mod geo;
pub mod history;
pub mod models;
pub mod predictor;
pub mod reaction;
pub mod registry;
pub mod routes;
pub mod rules;
pub mod safe_zone;

pub use agent::CollisionWarningAgent;
pub use error::ForecastError;
pub use forecast::{braking_factor, locate_in_polyline, steps_ahead, PositionForecaster};
pub use geo::{distance_between, haversine_distance};
pub use history::VehicleHistoryStore;
pub use models::{
    ActuatorCommand, ActuatorCommandType, Beacon, Coordinate, KinematicSnapshot, KinematicUpdate,
};
pub use predictor::CollisionPredictor;
pub use reaction::{ReactionController, ReactionState, ReactionTimer, TimerToken, VehicleActuator};
pub use registry::RouteAssignmentRegistry;
pub use routes::{RoutePolylineStore, RouteSource};
pub use rules::{IndexFallback, WarningRules};
pub use safe_zone::{safe_zone, SafeZone};
