//! Pre-defined traffic scenarios.

use super::paths::{ArcPath, LinearPath};
use super::DrivePath;
use cwa_core::geo::offset_position;
use cwa_core::Coordinate;
use std::f64::consts::PI;
use std::sync::Arc;

/// Typical passenger car length (m).
pub const CAR_LENGTH_M: f64 = 4.5;

/// One vehicle driving a route at its nominal speed.
pub struct ScenarioVehicle {
    pub vehicle_id: String,
    /// Route slot the vehicle's path is recorded into
    pub route_id: String,
    pub path: Arc<dyn DrivePath>,
    pub length_m: f64,
}

/// A named scenario consisting of multiple vehicles with paths.
pub struct Scenario {
    pub name: String,
    pub vehicles: Vec<ScenarioVehicle>,
}

impl Scenario {
    fn new(name: &str, paths: Vec<Arc<dyn DrivePath>>) -> Self {
        let vehicles = paths
            .into_iter()
            .enumerate()
            .map(|(i, path)| ScenarioVehicle {
                vehicle_id: format!("veh_{i}"),
                route_id: i.to_string(),
                path,
                length_m: CAR_LENGTH_M,
            })
            .collect();
        Self {
            name: name.to_string(),
            vehicles,
        }
    }

    /// Longest time any vehicle needs to finish its path.
    pub fn duration_s(&self) -> f64 {
        self.vehicles
            .iter()
            .map(|v| v.path.duration_s())
            .fold(0.0, f64::max)
    }
}

/// Two vehicles reaching an intersection at the same time.
///
/// - veh_0: south-west to north-east through the center
/// - veh_1: north-west to south-east through the center
pub fn create_crossing_scenario(center: Coordinate, speed_mps: f64) -> Scenario {
    let half_length_m = 60.0;
    Scenario::new(
        "crossing",
        vec![
            Arc::new(LinearPath::through(center, 45.0, half_length_m, speed_mps)),
            Arc::new(LinearPath::through(center, 135.0, half_length_m, speed_mps)),
        ],
    )
}

/// Two vehicles on parallel lanes 30 m apart. Never in conflict.
pub fn create_parallel_scenario(center: Coordinate, speed_mps: f64) -> Scenario {
    let half_length_m = 60.0;
    let offset = offset_position(center, -15.0, 15.0);
    Scenario::new(
        "parallel",
        vec![
            Arc::new(LinearPath::through(center, 45.0, half_length_m, speed_mps)),
            Arc::new(LinearPath::through(offset, 45.0, half_length_m, speed_mps)),
        ],
    )
}

/// A fast vehicle catching up with a slower one on the same lane.
///
/// The lead drives faster than the braking target, so once the rear vehicle
/// brakes the gap stops closing.
pub fn create_following_scenario(center: Coordinate, speed_mps: f64) -> Scenario {
    let half_length_m = 80.0;
    let ahead = offset_position(center, 25.0 / 2f64.sqrt(), 25.0 / 2f64.sqrt());
    Scenario::new(
        "following",
        vec![
            Arc::new(LinearPath::through(center, 45.0, half_length_m, speed_mps)),
            Arc::new(LinearPath::through(ahead, 45.0, half_length_m, speed_mps * 0.8)),
        ],
    )
}

/// A vehicle turning right through the intersection while another crosses it.
///
/// The turn passes the center halfway through, heading south-east, at the
/// moment the straight vehicle reaches it.
pub fn create_turning_scenario(center: Coordinate, speed_mps: f64) -> Scenario {
    let radius_m = 40.0;
    // east-bound at the start, south-bound at the end
    let to_pivot = radius_m / 2f64.sqrt();
    let pivot = offset_position(center, -to_pivot, -to_pivot);
    let turn = ArcPath::quarter_turn(pivot, radius_m, speed_mps, 0.0, true);
    let straight = LinearPath::through(center, 45.0, radius_m * PI / 4.0, speed_mps);
    Scenario::new("turning", vec![Arc::new(turn), Arc::new(straight)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_paths_meet_at_the_center() {
        let center = Coordinate::new(52.5, 13.2);
        let scenario = create_crossing_scenario(center, 10.0);
        assert_eq!(scenario.vehicles.len(), 2);
        let midway = scenario.vehicles[0].path.duration_s() / 2.0;
        for vehicle in &scenario.vehicles {
            let at = vehicle.path.position(midway);
            assert!(cwa_core::distance_between(at, center) < 0.1);
        }
        assert_eq!(scenario.vehicles[1].route_id, "1");
    }

    #[test]
    fn turning_path_crosses_the_center_halfway() {
        let center = Coordinate::new(52.5, 13.2);
        let scenario = create_turning_scenario(center, 10.0);
        let turn = &scenario.vehicles[0].path;
        let halfway = turn.duration_s() / 2.0;
        assert!(cwa_core::distance_between(turn.position(halfway), center) < 0.1);
        assert!((turn.heading(halfway) - 135.0).abs() < 2.0);
        let straight = &scenario.vehicles[1].path;
        assert!(cwa_core::distance_between(straight.position(halfway), center) < 0.1);
    }
}
