//! Host event loop.
//!
//! Consumes vehicle updates, beacons and reaction timer expiries in arrival
//! order and dispatches them to the per-vehicle agents. Each event is handled
//! to completion before the next one is taken, so agents never observe
//! interleaved updates.

use std::sync::Arc;

use cwa_core::{ActuatorCommand, Beacon, KinematicUpdate, TimerToken};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::actuator::ChannelActuator;
use crate::scheduler::TokioReactionTimer;
use crate::state::HostState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostEvent {
    /// Ego step for the vehicle named in the snapshot
    VehicleUpdated(KinematicUpdate),
    /// Beacon heard by every other vehicle
    BeaconBroadcast(Beacon),
    /// Beacon heard by one vehicle only
    BeaconReceived { receiver_id: String, beacon: Beacon },
    ReactionTimerFired { vehicle_id: String, token: TimerToken },
    VehicleRemoved { vehicle_id: String },
    Shutdown,
}

/// Counters reported when the loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostLoopSummary {
    pub updates: u64,
    pub beacons: u64,
    /// Updates that forecast at least one collision
    pub warnings: u64,
    pub reactions_fired: u64,
}

/// Run until `Shutdown` is received or every sender is gone.
///
/// `timer_events` must feed the same channel as `events`; reaction timers
/// report back through it.
pub async fn run_host_loop(
    state: Arc<HostState>,
    mut events: mpsc::UnboundedReceiver<HostEvent>,
    timer_events: mpsc::UnboundedSender<HostEvent>,
    commands: mpsc::UnboundedSender<ActuatorCommand>,
) -> HostLoopSummary {
    let mut timer = TokioReactionTimer::new(timer_events);
    let mut actuator = ChannelActuator::new(commands);
    let mut summary = HostLoopSummary::default();

    tracing::info!(
        vehicles = state.vehicle_count(),
        "Host loop started"
    );

    while let Some(event) = events.recv().await {
        match event {
            HostEvent::VehicleUpdated(update) => {
                summary.updates += 1;
                let at_risk = state.apply_update(update, &mut timer, &mut actuator);
                if !at_risk.is_empty() {
                    summary.warnings += 1;
                }
            }
            HostEvent::BeaconBroadcast(beacon) => {
                summary.beacons += 1;
                state.broadcast_beacon(&beacon);
            }
            HostEvent::BeaconReceived { receiver_id, beacon } => {
                summary.beacons += 1;
                state.deliver_beacon(&receiver_id, &beacon);
            }
            HostEvent::ReactionTimerFired { vehicle_id, token } => {
                if !timer.fired(&vehicle_id, token) {
                    tracing::debug!(vehicle_id = %vehicle_id, ?token, "stale reaction timer ignored");
                    continue;
                }
                if state.fire_reaction_timer(&vehicle_id, token, &mut actuator) {
                    summary.reactions_fired += 1;
                }
            }
            HostEvent::VehicleRemoved { vehicle_id } => {
                timer.cancel_vehicle(&vehicle_id);
                if state.remove_vehicle(&vehicle_id) {
                    tracing::debug!(vehicle_id = %vehicle_id, "vehicle left the host");
                }
            }
            HostEvent::Shutdown => break,
        }
    }

    timer.cancel_all();
    tracing::info!(
        updates = summary.updates,
        beacons = summary.beacons,
        warnings = summary.warnings,
        reactions = summary.reactions_fired,
        "Host loop stopped"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use cwa_core::KinematicSnapshot;

    #[test]
    fn events_use_tagged_json() {
        let event = HostEvent::BeaconReceived {
            receiver_id: "veh_0".to_string(),
            beacon: Beacon::new(KinematicSnapshot::new("veh_1", 52.5, 13.2, 4.0), "3"),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "BEACON_RECEIVED");
        assert_eq!(json["receiver_id"], "veh_0");

        let shutdown: HostEvent = serde_json::from_str(r#"{"type": "SHUTDOWN"}"#).unwrap();
        assert!(matches!(shutdown, HostEvent::Shutdown));
    }
}
