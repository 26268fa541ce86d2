//! Traffic simulation for exercising the collision warning agents.

pub mod paths;
pub mod runner;
pub mod scenarios;

pub use paths::{ArcPath, DrivePath, LinearPath};
pub use runner::{RunOptions, ScenarioEvent, ScenarioEventKind, ScenarioReport, ScenarioRunner};
pub use scenarios::{
    create_crossing_scenario, create_following_scenario, create_parallel_scenario,
    create_turning_scenario, Scenario, ScenarioVehicle,
};
