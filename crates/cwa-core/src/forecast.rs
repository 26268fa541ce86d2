//! Route-based position forecasting.
//!
//! A vehicle is located on its route polyline by bracketing its last known
//! position between two consecutive waypoints, using its heading to decide in
//! which direction latitude and longitude grow. The forecast then walks ahead
//! along the polyline by the number of host steps covered in the horizon,
//! scaled by how fast the vehicle currently drives compared to the speed the
//! route was recorded at.

use crate::error::ForecastError;
use crate::geo;
use crate::history::VehicleHistoryStore;
use crate::models::{Coordinate, KinematicSnapshot};
use crate::registry::RouteAssignmentRegistry;
use crate::routes::RoutePolylineStore;
use crate::rules::IndexFallback;

pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 10;

/// Read-only view over the stores needed to forecast a vehicle's position.
#[derive(Debug, Clone, Copy)]
pub struct PositionForecaster<'a> {
    history: &'a VehicleHistoryStore,
    routes: &'a RoutePolylineStore,
    assignments: &'a RouteAssignmentRegistry,
    update_interval_ms: u64,
    fallback: IndexFallback,
}

impl<'a> PositionForecaster<'a> {
    pub fn new(
        history: &'a VehicleHistoryStore,
        routes: &'a RoutePolylineStore,
        assignments: &'a RouteAssignmentRegistry,
    ) -> Self {
        Self {
            history,
            routes,
            assignments,
            update_interval_ms: DEFAULT_UPDATE_INTERVAL_MS,
            fallback: IndexFallback::default(),
        }
    }

    /// Interval between two recorded route waypoints (host step).
    pub fn with_update_interval(mut self, update_interval_ms: u64) -> Self {
        self.update_interval_ms = update_interval_ms.max(1);
        self
    }

    pub fn with_fallback(mut self, fallback: IndexFallback) -> Self {
        self.fallback = fallback;
        self
    }

    fn route_of(&self, vehicle_id: &str) -> Result<&'a str, ForecastError> {
        self.assignments
            .route_of(vehicle_id)
            .ok_or_else(|| ForecastError::RouteUnassigned(vehicle_id.to_string()))
    }

    /// Index of the route waypoint the vehicle is currently heading towards.
    ///
    /// `Ok(None)` means the vehicle is tracked and assigned but no segment of
    /// its route brackets its position.
    pub fn locate_route_index(&self, vehicle_id: &str) -> Result<Option<usize>, ForecastError> {
        let route_id = self.route_of(vehicle_id)?;
        let snapshot = self.history.latest(vehicle_id)?;
        let polyline = self.routes.polyline(route_id).unwrap_or_default();
        Ok(locate_in_polyline(polyline, snapshot))
    }

    /// Forecast the vehicle's position `horizon_s` seconds ahead.
    pub fn forecast(&self, vehicle_id: &str, horizon_s: f64) -> Result<Coordinate, ForecastError> {
        let route_id = self.route_of(vehicle_id)?;
        let snapshot = self.history.latest(vehicle_id)?;
        let polyline = self.routes.polyline(route_id).unwrap_or_default();

        let (index, factor) = match locate_in_polyline(polyline, snapshot) {
            Some(index) => {
                let next = polyline
                    .get(index + 1)
                    .ok_or_else(|| ForecastError::RouteExhausted {
                        route_id: route_id.to_string(),
                        index,
                    })?;
                let segment_m = geo::distance_between(polyline[index], *next);
                let factor = braking_factor(snapshot.speed_mps, segment_m, self.update_interval_ms);
                (index, factor)
            }
            None => match self.fallback {
                IndexFallback::Fail => {
                    return Err(ForecastError::RouteUnresolved {
                        vehicle_id: vehicle_id.to_string(),
                        route_id: route_id.to_string(),
                    })
                }
                IndexFallback::RouteStart => (0, 1.0),
            },
        };

        let forecast_index =
            (index as i64).saturating_add(steps_ahead(factor, horizon_s, self.update_interval_ms));
        usize::try_from(forecast_index)
            .ok()
            .and_then(|i| polyline.get(i).copied())
            .ok_or_else(|| ForecastError::ForecastOutOfRange {
                route_id: route_id.to_string(),
                index: forecast_index,
                len: polyline.len(),
            })
    }
}

/// Find the first segment `(wp[i-1], wp[i])` that brackets the snapshot's
/// position in its direction of travel and return `i`.
pub fn locate_in_polyline(polyline: &[Coordinate], snapshot: &KinematicSnapshot) -> Option<usize> {
    let position = snapshot.position();
    polyline
        .windows(2)
        .position(|pair| brackets(pair[0], pair[1], position, snapshot.heading_deg))
        .map(|i| i + 1)
}

fn brackets(prev: Coordinate, cur: Coordinate, p: Coordinate, heading_deg: f64) -> bool {
    if (0.0..90.0).contains(&heading_deg) {
        ascending(prev.lat, p.lat, cur.lat) && ascending(prev.lon, p.lon, cur.lon)
    } else if (90.0..180.0).contains(&heading_deg) {
        descending(prev.lat, p.lat, cur.lat) && ascending(prev.lon, p.lon, cur.lon)
    } else if (180.0..270.0).contains(&heading_deg) {
        descending(prev.lat, p.lat, cur.lat) && descending(prev.lon, p.lon, cur.lon)
    } else if (270.0..360.0).contains(&heading_deg) {
        ascending(prev.lat, p.lat, cur.lat) && descending(prev.lon, p.lon, cur.lon)
    } else {
        false
    }
}

// A segment that does not move along an axis only brackets points lying on it.
fn ascending(prev: f64, value: f64, next: f64) -> bool {
    if prev == next {
        return value == prev;
    }
    prev <= value && value < next
}

fn descending(prev: f64, value: f64, next: f64) -> bool {
    if prev == next {
        return value == prev;
    }
    prev >= value && value > next
}

/// Ratio of the observed speed to the speed implied by the route spacing.
///
/// Falls back to 1.0 when the segment has zero length.
pub fn braking_factor(speed_mps: f64, segment_m: f64, update_interval_ms: u64) -> f64 {
    let nominal_speed = segment_m / (update_interval_ms.max(1) as f64 / 1000.0);
    if nominal_speed > 0.0 {
        speed_mps / nominal_speed
    } else {
        1.0
    }
}

/// Number of route waypoints covered in `horizon_s` at the given factor.
pub fn steps_ahead(factor: f64, horizon_s: f64, update_interval_ms: u64) -> i64 {
    // `as` saturates and maps NaN to 0
    (factor * horizon_s * 1000.0 / update_interval_ms.max(1) as f64).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP_M: f64 = 0.1;

    /// Polyline heading north-east, one waypoint per host step at 10 m/s.
    fn north_east_route(n: usize) -> Vec<Coordinate> {
        let origin = Coordinate::new(52.5, 13.2);
        (0..n)
            .map(|k| geo::offset_position(origin, k as f64 * STEP_M, k as f64 * STEP_M))
            .collect()
    }

    fn midpoint(a: Coordinate, b: Coordinate) -> Coordinate {
        Coordinate::new((a.lat + b.lat) / 2.0, (a.lon + b.lon) / 2.0)
    }

    struct Fixture {
        history: VehicleHistoryStore,
        routes: RoutePolylineStore,
        assignments: RouteAssignmentRegistry,
    }

    impl Fixture {
        fn new(route: Vec<Coordinate>) -> Self {
            let mut routes = RoutePolylineStore::default();
            routes.load("0", route);
            let mut assignments = RouteAssignmentRegistry::new();
            assignments.assign("veh_0", "0");
            Self {
                history: VehicleHistoryStore::default(),
                routes,
                assignments,
            }
        }

        fn place(&mut self, at: Coordinate, heading_deg: f64, speed_mps: f64) {
            self.history.record(
                "veh_0",
                KinematicSnapshot::new("veh_0", at.lat, at.lon, 4.0)
                    .with_motion(heading_deg, speed_mps, 0.0),
            );
        }

        fn forecaster(&self) -> PositionForecaster<'_> {
            PositionForecaster::new(&self.history, &self.routes, &self.assignments)
        }
    }

    #[test]
    fn locates_vehicle_on_straight_route() {
        let polyline = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 1.0),
            Coordinate::new(0.0, 2.0),
        ];
        let snapshot = KinematicSnapshot::new("veh_0", 0.0, 0.5, 4.0).with_motion(45.0, 10.0, 0.0);
        assert_eq!(locate_in_polyline(&polyline, &snapshot), Some(1));

        let snapshot = KinematicSnapshot::new("veh_0", 0.0, 1.5, 4.0).with_motion(45.0, 10.0, 0.0);
        assert_eq!(locate_in_polyline(&polyline, &snapshot), Some(2));
    }

    #[test]
    fn heading_selects_direction_of_travel() {
        let route = north_east_route(10);
        let at = midpoint(route[3], route[4]);
        let south_west: Vec<Coordinate> = route.iter().rev().copied().collect();

        let towards = KinematicSnapshot::new("v", at.lat, at.lon, 4.0).with_motion(45.0, 10.0, 0.0);
        let against = KinematicSnapshot::new("v", at.lat, at.lon, 4.0).with_motion(225.0, 10.0, 0.0);

        assert_eq!(locate_in_polyline(&route, &towards), Some(4));
        assert_eq!(locate_in_polyline(&route, &against), None);
        assert_eq!(locate_in_polyline(&south_west, &against), Some(6));
        assert_eq!(locate_in_polyline(&south_west, &towards), None);
    }

    #[test]
    fn mixed_quadrants_bracket_their_axes() {
        let origin = Coordinate::new(52.5, 13.2);
        // heading south-east: latitude falls, longitude grows
        let south_east = vec![origin, geo::offset_position(origin, -10.0, 10.0)];
        let at = geo::offset_position(origin, -5.0, 5.0);
        let snapshot = KinematicSnapshot::new("v", at.lat, at.lon, 4.0).with_motion(135.0, 5.0, 0.0);
        assert_eq!(locate_in_polyline(&south_east, &snapshot), Some(1));

        // heading north-west: latitude grows, longitude falls
        let north_west = vec![origin, geo::offset_position(origin, 10.0, -10.0)];
        let at = geo::offset_position(origin, 5.0, -5.0);
        let snapshot = KinematicSnapshot::new("v", at.lat, at.lon, 4.0).with_motion(315.0, 5.0, 0.0);
        assert_eq!(locate_in_polyline(&north_west, &snapshot), Some(1));
    }

    #[test]
    fn heading_outside_full_circle_never_matches() {
        let route = north_east_route(4);
        let at = midpoint(route[0], route[1]);
        let snapshot = KinematicSnapshot::new("v", at.lat, at.lon, 4.0).with_motion(360.0, 5.0, 0.0);
        assert_eq!(locate_in_polyline(&route, &snapshot), None);
    }

    #[test]
    fn forecast_at_route_speed_advances_horizon_steps() {
        let route = north_east_route(60);
        let nominal = geo::distance_between(route[5], route[6]) / 0.01;
        let mut fixture = Fixture::new(route.clone());
        fixture.place(midpoint(route[4], route[5]), 45.0, nominal);

        let forecaster = fixture.forecaster();
        assert_eq!(forecaster.locate_route_index("veh_0"), Ok(Some(5)));
        // 0.3s at 10ms steps = 30 waypoints ahead
        assert_eq!(forecaster.forecast("veh_0", 0.3), Ok(route[35]));
    }

    #[test]
    fn braking_vehicle_forecast_advances_fewer_steps() {
        let route = north_east_route(60);
        let nominal = geo::distance_between(route[5], route[6]) / 0.01;
        let mut fixture = Fixture::new(route.clone());
        fixture.place(midpoint(route[4], route[5]), 45.0, nominal / 2.0);

        assert_eq!(fixture.forecaster().forecast("veh_0", 0.3), Ok(route[20]));
    }

    #[test]
    fn zero_length_segment_uses_unit_factor() {
        assert_eq!(braking_factor(12.0, 0.0, 10), 1.0);

        let mut polyline = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 1e-5),
            Coordinate::new(0.0, 1e-5),
        ];
        polyline.extend((2..40).map(|k| Coordinate::new(0.0, k as f64 * 1e-5)));
        let mut fixture = Fixture::new(polyline.clone());
        fixture.place(Coordinate::new(0.0, 0.5e-5), 45.0, 3.0);

        let forecast = fixture.forecaster().forecast("veh_0", 0.3);
        assert_eq!(forecast, Ok(polyline[31]));
    }

    #[test]
    fn forecast_past_route_end_is_out_of_range() {
        let route = north_east_route(20);
        let nominal = geo::distance_between(route[5], route[6]) / 0.01;
        let mut fixture = Fixture::new(route.clone());
        fixture.place(midpoint(route[4], route[5]), 45.0, nominal);

        assert_eq!(
            fixture.forecaster().forecast("veh_0", 0.3),
            Err(ForecastError::ForecastOutOfRange {
                route_id: "0".to_string(),
                index: 35,
                len: 20,
            })
        );
    }

    #[test]
    fn last_segment_is_exhausted() {
        let route = north_east_route(3);
        let mut fixture = Fixture::new(route.clone());
        fixture.place(midpoint(route[1], route[2]), 45.0, 10.0);

        assert_eq!(
            fixture.forecaster().forecast("veh_0", 0.3),
            Err(ForecastError::RouteExhausted {
                route_id: "0".to_string(),
                index: 2,
            })
        );
    }

    #[test]
    fn unresolved_index_follows_fallback_policy() {
        let route = north_east_route(40);
        let mut fixture = Fixture::new(route.clone());
        // far off the route
        fixture.place(Coordinate::new(10.0, 10.0), 45.0, 0.0);

        assert_eq!(fixture.forecaster().locate_route_index("veh_0"), Ok(None));
        assert!(matches!(
            fixture.forecaster().forecast("veh_0", 0.3),
            Err(ForecastError::RouteUnresolved { .. })
        ));
        assert_eq!(
            fixture
                .forecaster()
                .with_fallback(IndexFallback::RouteStart)
                .forecast("veh_0", 0.3),
            Ok(route[30])
        );
    }

    #[test]
    fn untracked_and_unassigned_vehicles_fail() {
        let fixture = Fixture::new(north_east_route(5));
        assert_eq!(
            fixture.forecaster().forecast("veh_0", 0.3),
            Err(ForecastError::NotTracked("veh_0".to_string()))
        );
        assert_eq!(
            fixture.forecaster().forecast("veh_9", 0.3),
            Err(ForecastError::RouteUnassigned("veh_9".to_string()))
        );
    }

    #[test]
    fn steps_ahead_rounds_to_nearest() {
        assert_eq!(steps_ahead(1.0, 0.3, 10), 30);
        assert_eq!(steps_ahead(0.51, 0.1, 10), 5);
        assert_eq!(steps_ahead(0.56, 0.1, 10), 6);
        assert_eq!(steps_ahead(f64::NAN, 0.3, 10), 0);
    }
}
