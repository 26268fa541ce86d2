//! Command line tools for the collision warning agents.
//!
//! - run_scenario: simulate a traffic scenario and report warnings
//! - record_route: record a synthetic route into a route file

pub mod sim;
