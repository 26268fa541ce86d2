//! Braking reaction driven by collision predictions.
//!
//! `Idle -> ReactionPending -> Braking -> Idle`. A forecast collision starts a
//! single driver-reaction timer; when it fires the vehicle brakes. As soon as a
//! tick predicts no collision the timer is cancelled and normal speed resumed.

use crate::models::{ActuatorCommand, ActuatorCommandType};
use crate::rules::WarningRules;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info};

/// Identifies one scheduled reaction timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerToken(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReactionState {
    #[default]
    Idle,
    /// Waiting for the driver reaction time to elapse
    ReactionPending { token: TimerToken },
    /// Deceleration command issued
    Braking,
}

/// Deferred task scheduler for reaction timers.
///
/// At most one timer per vehicle is outstanding at any time.
pub trait ReactionTimer {
    fn schedule(&mut self, vehicle_id: &str, token: TimerToken, delay: Duration);
    fn cancel(&mut self, vehicle_id: &str, token: TimerToken);
}

/// Receives speed commands for the vehicle. Fire-and-forget.
pub trait VehicleActuator {
    fn execute(&mut self, command: ActuatorCommand);
}

#[derive(Debug, Clone)]
pub struct ReactionController {
    vehicle_id: String,
    state: ReactionState,
    next_token: u64,
    reaction_delay: Duration,
    brake_target_speed_mps: f64,
    brake_interval_ms: u64,
}

impl ReactionController {
    pub fn new(vehicle_id: impl Into<String>, rules: &WarningRules) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            state: ReactionState::Idle,
            next_token: 0,
            reaction_delay: Duration::from_millis(rules.reaction_delay_ms),
            brake_target_speed_mps: rules.brake_target_speed_mps,
            brake_interval_ms: rules.brake_interval_ms,
        }
    }

    /// Start numbering timer tokens at `first` instead of zero.
    pub fn with_first_token(mut self, first: u64) -> Self {
        self.next_token = first;
        self
    }

    pub fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }

    pub fn state(&self) -> ReactionState {
        self.state
    }

    /// Feed the result of this tick's prediction.
    pub fn on_prediction(
        &mut self,
        at_risk: &BTreeSet<String>,
        timer: &mut dyn ReactionTimer,
        actuator: &mut dyn VehicleActuator,
    ) -> ReactionState {
        match (self.state, at_risk.is_empty()) {
            (ReactionState::Idle, false) => {
                let token = TimerToken(self.next_token);
                self.next_token += 1;
                timer.schedule(&self.vehicle_id, token, self.reaction_delay);
                self.state = ReactionState::ReactionPending { token };
                info!(
                    vehicle_id = %self.vehicle_id,
                    delay_ms = self.reaction_delay.as_millis() as u64,
                    "collision forecast, reaction timer started"
                );
            }
            (ReactionState::ReactionPending { token }, true) => {
                timer.cancel(&self.vehicle_id, token);
                self.resume(actuator);
            }
            (ReactionState::Braking, true) => self.resume(actuator),
            _ => {}
        }
        self.state
    }

    /// Called by the scheduler when a reaction timer elapses.
    ///
    /// Returns true if the brake command was issued. Timers that were
    /// cancelled or superseded are ignored.
    pub fn on_timer_fired(&mut self, token: TimerToken, actuator: &mut dyn VehicleActuator) -> bool {
        match self.state {
            ReactionState::ReactionPending { token: pending } if pending == token => {
                actuator.execute(ActuatorCommand {
                    vehicle_id: self.vehicle_id.clone(),
                    command_type: ActuatorCommandType::Decelerate {
                        target_speed_mps: self.brake_target_speed_mps,
                        interval_ms: self.brake_interval_ms,
                    },
                });
                self.state = ReactionState::Braking;
                info!(vehicle_id = %self.vehicle_id, "braking");
                true
            }
            _ => {
                debug!(vehicle_id = %self.vehicle_id, token = token.0, "stale reaction timer ignored");
                false
            }
        }
    }

    fn resume(&mut self, actuator: &mut dyn VehicleActuator) {
        actuator.execute(ActuatorCommand {
            vehicle_id: self.vehicle_id.clone(),
            command_type: ActuatorCommandType::Resume,
        });
        self.state = ReactionState::Idle;
        info!(vehicle_id = %self.vehicle_id, "risk cleared, resuming normal speed");
    }
}
