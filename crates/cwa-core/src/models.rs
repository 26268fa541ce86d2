//! Core data models for the collision warning system.

use serde::{Deserialize, Serialize};

/// A geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Kinematic state of a vehicle as observed on one simulation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KinematicSnapshot {
    pub vehicle_id: String,
    pub lat: f64,
    pub lon: f64,
    /// Heading in degrees, 0 = north, clockwise, expected in [0, 360)
    pub heading_deg: f64,
    #[serde(default)]
    pub speed_mps: f64,
    #[serde(default)]
    pub acceleration_mps2: f64,
    pub length_m: f64,
}

impl KinematicSnapshot {
    /// Create a stationary snapshot with only the required fields.
    pub fn new(vehicle_id: impl Into<String>, lat: f64, lon: f64, length_m: f64) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            lat,
            lon,
            heading_deg: 0.0,
            speed_mps: 0.0,
            acceleration_mps2: 0.0,
            length_m,
        }
    }

    /// Set heading, speed and longitudinal acceleration.
    pub fn with_motion(mut self, heading_deg: f64, speed_mps: f64, acceleration_mps2: f64) -> Self {
        self.heading_deg = heading_deg;
        self.speed_mps = speed_mps;
        self.acceleration_mps2 = acceleration_mps2;
        self
    }

    pub fn position(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

/// Update delivered by the host for the ego vehicle on every step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KinematicUpdate {
    pub snapshot: KinematicSnapshot,
    /// Route the host currently reports for this vehicle
    #[serde(default)]
    pub route_id: Option<String>,
}

/// Cooperative awareness beacon received from another vehicle.
///
/// The sender piggybacks its route id on the user tagged value as UTF-8 bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Beacon {
    pub snapshot: KinematicSnapshot,
    #[serde(default)]
    pub tagged_value: Vec<u8>,
}

impl Beacon {
    pub fn new(snapshot: KinematicSnapshot, route_id: &str) -> Self {
        Self {
            snapshot,
            tagged_value: route_id.as_bytes().to_vec(),
        }
    }

    pub fn sender_id(&self) -> &str {
        &self.snapshot.vehicle_id
    }

    /// Decode the route id carried in the tagged value.
    ///
    /// Returns `None` for an empty or non UTF-8 payload.
    pub fn route_id(&self) -> Option<&str> {
        if self.tagged_value.is_empty() {
            return None;
        }
        std::str::from_utf8(&self.tagged_value)
            .ok()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Command issued to the vehicle actuator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorCommand {
    pub vehicle_id: String,
    pub command_type: ActuatorCommandType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActuatorCommandType {
    /// Slow down to the target speed over the given interval
    Decelerate {
        target_speed_mps: f64,
        interval_ms: u64,
    },
    /// Return to the speed the host would normally drive
    Resume,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beacon_decodes_route_id() {
        let beacon = Beacon::new(KinematicSnapshot::new("veh_1", 52.5, 13.2, 4.0), "7");
        assert_eq!(beacon.route_id(), Some("7"));
        assert_eq!(beacon.sender_id(), "veh_1");
    }

    #[test]
    fn beacon_with_invalid_payload_has_no_route() {
        let mut beacon = Beacon::new(KinematicSnapshot::new("veh_1", 52.5, 13.2, 4.0), "");
        assert_eq!(beacon.route_id(), None);

        beacon.tagged_value = vec![0xff, 0xfe];
        assert_eq!(beacon.route_id(), None);
    }

    #[test]
    fn actuator_command_serializes_with_type_tag() {
        let cmd = ActuatorCommand {
            vehicle_id: "veh_0".to_string(),
            command_type: ActuatorCommandType::Resume,
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["command_type"]["type"], "RESUME");
    }
}
