//! Actuator that forwards speed commands to the host.

use cwa_core::{ActuatorCommand, VehicleActuator};
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct ChannelActuator {
    commands: mpsc::UnboundedSender<ActuatorCommand>,
}

impl ChannelActuator {
    pub fn new(commands: mpsc::UnboundedSender<ActuatorCommand>) -> Self {
        Self { commands }
    }
}

impl VehicleActuator for ChannelActuator {
    fn execute(&mut self, command: ActuatorCommand) {
        let vehicle_id = command.vehicle_id.clone();
        if self.commands.send(command).is_err() {
            tracing::warn!(vehicle_id = %vehicle_id, "actuator channel closed, command dropped");
        }
    }
}
