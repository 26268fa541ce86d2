//! Flat-plane and great-circle helpers used by forecasting and safe zones.

use crate::models::Coordinate;

/// Mean earth radius used for great-circle distances (meters).
pub const EARTH_RADIUS_M: f64 = 6_378_388.0;

/// Meters spanned by one degree of latitude (and of longitude at the equator).
pub const METERS_PER_DEG: f64 = 111_120.0;

/// Calculate distance between two points in meters using the Haversine formula.
///
/// # Arguments
/// * `lat1`, `lon1` - First point coordinates in decimal degrees
/// * `lat2`, `lon2` - Second point coordinates in decimal degrees
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Great-circle distance between two coordinates in meters.
pub fn distance_between(a: Coordinate, b: Coordinate) -> f64 {
    haversine_distance(a.lat, a.lon, b.lat, b.lon)
}

/// Convert a north/south distance in meters to degrees latitude.
pub fn meters_to_lat(meters: f64) -> f64 {
    meters / METERS_PER_DEG
}

/// Convert an east/west distance in meters to degrees longitude at `ref_lat_deg`.
pub fn meters_to_lon(meters: f64, ref_lat_deg: f64) -> f64 {
    meters / METERS_PER_DEG / ref_lat_deg.to_radians().cos()
}

/// Convert degrees latitude to meters.
pub fn lat_to_meters(deg: f64) -> f64 {
    deg * METERS_PER_DEG
}

/// Convert degrees longitude to meters at `ref_lat_deg`.
pub fn lon_to_meters(deg: f64, ref_lat_deg: f64) -> f64 {
    deg * METERS_PER_DEG * ref_lat_deg.to_radians().cos()
}

/// Offset a position by meters in the north and east directions.
pub fn offset_position(origin: Coordinate, north_m: f64, east_m: f64) -> Coordinate {
    Coordinate::new(
        origin.lat + meters_to_lat(north_m),
        origin.lon + meters_to_lon(east_m, origin.lat),
    )
}

/// Heading from `from` to `to` in degrees, 0 = north, clockwise, in [0, 360).
pub fn heading_between(from: Coordinate, to: Coordinate) -> f64 {
    let north = lat_to_meters(to.lat - from.lat);
    let east = lon_to_meters(to.lon - from.lon, from.lat);
    if north.abs() < 1e-9 && east.abs() < 1e-9 {
        return 0.0;
    }
    east.atan2(north).to_degrees().rem_euclid(360.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_known_distance() {
        // ~111.3km per degree of latitude on this sphere
        let dist = haversine_distance(0.0, 0.0, 1.0, 0.0);
        let expected = EARTH_RADIUS_M * 1.0_f64.to_radians();
        assert!((dist - expected).abs() < 1e-6);
        assert!((dist - 111_323.0).abs() < 10.0);
    }

    #[test]
    fn test_haversine_same_point() {
        let dist = haversine_distance(52.5, 13.2, 52.5, 13.2);
        assert_eq!(dist, 0.0);
    }

    #[test]
    fn offset_position_round_trips_through_meters() {
        let origin = Coordinate::new(52.5, 13.2);
        let moved = offset_position(origin, 100.0, -50.0);
        assert!((lat_to_meters(moved.lat - origin.lat) - 100.0).abs() < 1e-6);
        assert!((lon_to_meters(moved.lon - origin.lon, origin.lat) + 50.0).abs() < 1e-6);
    }

    #[test]
    fn heading_between_cardinal_directions() {
        let origin = Coordinate::new(52.5, 13.2);
        let north = offset_position(origin, 10.0, 0.0);
        let east = offset_position(origin, 0.0, 10.0);
        let west = offset_position(origin, 0.0, -10.0);
        assert!(heading_between(origin, north).abs() < 1e-6);
        assert!((heading_between(origin, east) - 90.0).abs() < 1e-6);
        assert!((heading_between(origin, west) - 270.0).abs() < 1e-6);
    }
}
