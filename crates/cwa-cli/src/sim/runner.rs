//! Simulation-time scenario runner.
//!
//! Every step moves the vehicles along their paths, fires due reaction
//! timers, exchanges beacons at the configured rate and runs each vehicle's
//! collision warning agent. Actuator commands are applied to the simulated
//! speed right away.

use super::scenarios::Scenario;
use cwa_core::{
    ActuatorCommand, ActuatorCommandType, Beacon, KinematicSnapshot, KinematicUpdate,
    RoutePolylineStore, VehicleActuator, WarningRules,
};
use cwa_runtime::{HostState, SimClockTimer};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Acceleration used to get back to nominal speed after a resume (m/s²).
const RESUME_ACCEL_MPS2: f64 = 2.6;

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Stop after this much simulated time even if vehicles are still driving
    pub max_duration_s: f64,
    /// Probability that a single beacon is lost on the way to one receiver
    pub beacon_loss: f64,
    pub seed: u64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_duration_s: 30.0,
            beacon_loss: 0.0,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScenarioEventKind {
    /// The set of vehicles forecast to collide changed to a non-empty set
    Warning { at_risk: Vec<String> },
    Brake { target_speed_mps: f64 },
    Resume,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioEvent {
    pub at_ms: u64,
    pub vehicle_id: String,
    #[serde(flatten)]
    pub kind: ScenarioEventKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub steps: u64,
    pub simulated_ms: u64,
    pub beacons_sent: u64,
    pub beacons_lost: u64,
    /// Steps on which each vehicle had a non-empty prediction
    pub warning_steps: BTreeMap<String, u64>,
    /// Smallest distance between any two vehicles (m)
    pub min_separation_m: Option<f64>,
    pub events: Vec<ScenarioEvent>,
}

impl ScenarioReport {
    pub fn events_for<'a>(&'a self, vehicle_id: &'a str) -> impl Iterator<Item = &'a ScenarioEventKind> {
        self.events
            .iter()
            .filter(move |e| e.vehicle_id == vehicle_id)
            .map(|e| &e.kind)
    }
}

#[derive(Debug, Clone, Copy)]
enum SpeedControl {
    Nominal,
    Ramp {
        from_mps: f64,
        to_mps: f64,
        start_ms: u64,
        interval_ms: u64,
    },
    Recovering,
}

struct SimVehicle {
    distance_m: f64,
    speed_mps: f64,
    acceleration_mps2: f64,
    control: SpeedControl,
    last_risk: BTreeSet<String>,
}

#[derive(Default)]
struct CommandBuffer {
    commands: Vec<ActuatorCommand>,
}

impl VehicleActuator for CommandBuffer {
    fn execute(&mut self, command: ActuatorCommand) {
        self.commands.push(command);
    }
}

pub struct ScenarioRunner {
    scenario: Scenario,
    rules: WarningRules,
    options: RunOptions,
    state: HostState,
    timer: SimClockTimer,
    vehicles: Vec<SimVehicle>,
    rng: StdRng,
    now_ms: u64,
    next_beacon_ms: u64,
    report: ScenarioReport,
}

impl ScenarioRunner {
    /// Record every vehicle's path as its route and set up one agent per
    /// vehicle.
    pub fn new(scenario: Scenario, rules: WarningRules, options: RunOptions) -> Self {
        let mut routes = RoutePolylineStore::new(rules.route_slots);
        for vehicle in &scenario.vehicles {
            routes.load(&vehicle.route_id, vehicle.path.sample(rules.update_interval_ms));
        }
        Self::with_routes(scenario, Arc::new(routes), rules, options)
    }

    /// Run against routes loaded elsewhere, e.g. from route files.
    pub fn with_routes(
        scenario: Scenario,
        routes: Arc<RoutePolylineStore>,
        rules: WarningRules,
        options: RunOptions,
    ) -> Self {
        let state = HostState::new(routes, rules.clone());
        let vehicles = scenario
            .vehicles
            .iter()
            .map(|v| {
                state.register_vehicle(&v.vehicle_id);
                SimVehicle {
                    distance_m: 0.0,
                    speed_mps: v.path.speed_mps(),
                    acceleration_mps2: 0.0,
                    control: SpeedControl::Nominal,
                    last_risk: BTreeSet::new(),
                }
            })
            .collect();
        let report = ScenarioReport {
            scenario: scenario.name.clone(),
            steps: 0,
            simulated_ms: 0,
            beacons_sent: 0,
            beacons_lost: 0,
            warning_steps: BTreeMap::new(),
            min_separation_m: None,
            events: Vec::new(),
        };
        Self {
            rng: StdRng::seed_from_u64(options.seed),
            scenario,
            rules,
            options,
            state,
            timer: SimClockTimer::new(),
            vehicles,
            now_ms: 0,
            next_beacon_ms: 0,
            report,
        }
    }

    pub fn run(mut self) -> ScenarioReport {
        let step_ms = self.rules.update_interval_ms.max(1);
        let max_ms = (self.options.max_duration_s * 1000.0).max(0.0) as u64;
        tracing::info!(
            scenario = %self.scenario.name,
            vehicles = self.scenario.vehicles.len(),
            step_ms,
            "Running scenario"
        );

        while self.now_ms < max_ms && !self.all_finished() {
            self.now_ms += step_ms;
            self.step(step_ms);
        }

        self.report.simulated_ms = self.now_ms;
        tracing::info!(
            steps = self.report.steps,
            events = self.report.events.len(),
            beacons_lost = self.report.beacons_lost,
            "Scenario finished"
        );
        self.report
    }

    fn all_finished(&self) -> bool {
        self.scenario
            .vehicles
            .iter()
            .zip(&self.vehicles)
            .all(|(spec, sim)| path_time(spec.path.speed_mps(), sim.distance_m) >= spec.path.duration_s())
    }

    fn step(&mut self, step_ms: u64) {
        self.report.steps += 1;
        let dt = step_ms as f64 / 1000.0;

        for (i, spec) in self.scenario.vehicles.iter().enumerate() {
            let sim = &mut self.vehicles[i];
            let speed = target_speed(sim.control, sim.speed_mps, spec.path.speed_mps(), self.now_ms, dt);
            if let SpeedControl::Recovering = sim.control {
                if speed >= spec.path.speed_mps() {
                    sim.control = SpeedControl::Nominal;
                }
            }
            sim.acceleration_mps2 = (speed - sim.speed_mps) / dt;
            sim.speed_mps = speed;
            sim.distance_m += speed * dt;
        }

        let snapshots: Vec<KinematicSnapshot> = (0..self.vehicles.len()).map(|i| self.snapshot(i)).collect();
        self.track_separation(&snapshots);

        let mut actuator = CommandBuffer::default();
        for (vehicle_id, token) in self.timer.advance_to(self.now_ms) {
            self.state.fire_reaction_timer(&vehicle_id, token, &mut actuator);
        }
        self.apply_commands(&mut actuator);

        if self.now_ms >= self.next_beacon_ms {
            self.exchange_beacons(&snapshots);
            let beacon_interval = self.rules.beacon_interval_ms.max(1);
            while self.next_beacon_ms <= self.now_ms {
                self.next_beacon_ms += beacon_interval;
            }
        }

        for (i, snapshot) in snapshots.into_iter().enumerate() {
            let vehicle_id = snapshot.vehicle_id.clone();
            let update = KinematicUpdate {
                snapshot,
                route_id: Some(self.scenario.vehicles[i].route_id.clone()),
            };
            let at_risk = self.state.apply_update(update, &mut self.timer, &mut actuator);
            if !at_risk.is_empty() {
                *self.report.warning_steps.entry(vehicle_id.clone()).or_default() += 1;
                if at_risk != self.vehicles[i].last_risk {
                    self.push_event(&vehicle_id, ScenarioEventKind::Warning {
                        at_risk: at_risk.iter().cloned().collect(),
                    });
                }
            }
            self.vehicles[i].last_risk = at_risk;
            self.apply_commands(&mut actuator);
        }
    }

    fn snapshot(&self, i: usize) -> KinematicSnapshot {
        let spec = &self.scenario.vehicles[i];
        let sim = &self.vehicles[i];
        let t = path_time(spec.path.speed_mps(), sim.distance_m);
        let at = spec.path.position(t);
        KinematicSnapshot::new(&spec.vehicle_id, at.lat, at.lon, spec.length_m).with_motion(
            spec.path.heading(t),
            sim.speed_mps,
            sim.acceleration_mps2,
        )
    }

    fn exchange_beacons(&mut self, snapshots: &[KinematicSnapshot]) {
        for (i, snapshot) in snapshots.iter().enumerate() {
            let beacon = Beacon::new(snapshot.clone(), &self.scenario.vehicles[i].route_id);
            for receiver in &self.scenario.vehicles {
                if receiver.vehicle_id == snapshot.vehicle_id {
                    continue;
                }
                self.report.beacons_sent += 1;
                if self.options.beacon_loss > 0.0
                    && self.rng.random_bool(self.options.beacon_loss.min(1.0))
                {
                    self.report.beacons_lost += 1;
                    continue;
                }
                self.state.deliver_beacon(&receiver.vehicle_id, &beacon);
            }
        }
    }

    fn apply_commands(&mut self, actuator: &mut CommandBuffer) {
        for command in actuator.commands.drain(..) {
            let Some(i) = self
                .scenario
                .vehicles
                .iter()
                .position(|v| v.vehicle_id == command.vehicle_id)
            else {
                tracing::warn!(vehicle_id = %command.vehicle_id, "command for unknown vehicle");
                continue;
            };
            let kind = match command.command_type {
                ActuatorCommandType::Decelerate {
                    target_speed_mps,
                    interval_ms,
                } => {
                    let sim = &mut self.vehicles[i];
                    // slowing down never speeds up a vehicle already below the target
                    sim.control = SpeedControl::Ramp {
                        from_mps: sim.speed_mps,
                        to_mps: target_speed_mps.min(sim.speed_mps),
                        start_ms: self.now_ms,
                        interval_ms,
                    };
                    ScenarioEventKind::Brake { target_speed_mps }
                }
                ActuatorCommandType::Resume => {
                    self.vehicles[i].control = SpeedControl::Recovering;
                    ScenarioEventKind::Resume
                }
            };
            self.push_event(&command.vehicle_id, kind);
        }
    }

    fn track_separation(&mut self, snapshots: &[KinematicSnapshot]) {
        for (i, a) in snapshots.iter().enumerate() {
            for b in &snapshots[i + 1..] {
                let d = cwa_core::distance_between(a.position(), b.position());
                let min = self.report.min_separation_m.get_or_insert(d);
                if d < *min {
                    *min = d;
                }
            }
        }
    }

    fn push_event(&mut self, vehicle_id: &str, kind: ScenarioEventKind) {
        tracing::debug!(at_ms = self.now_ms, vehicle_id, ?kind, "scenario event");
        self.report.events.push(ScenarioEvent {
            at_ms: self.now_ms,
            vehicle_id: vehicle_id.to_string(),
            kind,
        });
    }
}

/// Path time at which a vehicle that drove `distance_m` is found.
fn path_time(nominal_mps: f64, distance_m: f64) -> f64 {
    if nominal_mps > 0.0 {
        distance_m / nominal_mps
    } else {
        0.0
    }
}

fn target_speed(control: SpeedControl, current: f64, nominal: f64, now_ms: u64, dt: f64) -> f64 {
    match control {
        SpeedControl::Nominal => nominal,
        SpeedControl::Ramp {
            from_mps,
            to_mps,
            start_ms,
            interval_ms,
        } => {
            let elapsed = now_ms.saturating_sub(start_ms) as f64;
            let progress = if interval_ms == 0 {
                1.0
            } else {
                (elapsed / interval_ms as f64).min(1.0)
            };
            from_mps + (to_mps - from_mps) * progress
        }
        SpeedControl::Recovering => (current + RESUME_ACCEL_MPS2 * dt).min(nominal),
    }
}
