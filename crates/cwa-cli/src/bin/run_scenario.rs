//! Simulate a traffic scenario and report collision warnings.
//!
//! Vehicles drive pre-recorded routes in simulation time, exchange beacons
//! and react to forecast collisions by braking.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use cwa_cli::sim::{
    create_crossing_scenario, create_following_scenario, create_parallel_scenario,
    create_turning_scenario, RunOptions, ScenarioEventKind, ScenarioRunner,
};
use cwa_core::{Coordinate, RoutePolylineStore};
use cwa_runtime::config::Config;
use cwa_runtime::logging::init_tracing;
use cwa_runtime::persistence::{write_route_file, JsonRouteDirectory, RouteFile};
use std::path::PathBuf;
use std::sync::Arc;

/// Available scenarios
#[derive(Debug, Clone, ValueEnum)]
enum ScenarioType {
    /// Two vehicles meeting at an intersection
    Crossing,
    /// Two vehicles on parallel lanes
    Parallel,
    /// Fast vehicle catching up with a slower one
    Following,
    /// Turning vehicle meeting a crossing one
    Turning,
}

/// Collision warning scenario simulator
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Scenario to simulate
    #[arg(long, value_enum, default_value = "crossing")]
    scenario: ScenarioType,

    /// Center latitude
    #[arg(long, default_value_t = 52.5200)]
    lat: f64,

    /// Center longitude
    #[arg(long, default_value_t = 13.4050)]
    lon: f64,

    /// Nominal speed in m/s
    #[arg(long, default_value_t = 10.0)]
    speed: f64,

    /// Maximum simulated duration in seconds
    #[arg(long, default_value_t = 30.0)]
    duration: f64,

    /// Probability of losing a single beacon (0.0 - 1.0)
    #[arg(long, default_value_t = 0.0)]
    beacon_loss: f64,

    /// Seed for beacon loss
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Write the scenario routes as route files into this directory and
    /// load them back from there
    #[arg(long)]
    routes_dir: Option<PathBuf>,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing("cwa_cli=info", args.log_json)?;

    if !(0.0..=1.0).contains(&args.beacon_loss) {
        anyhow::bail!("--beacon-loss must be within 0.0 and 1.0");
    }

    let center = Coordinate::new(args.lat, args.lon);
    let scenario = match args.scenario {
        ScenarioType::Crossing => create_crossing_scenario(center, args.speed),
        ScenarioType::Parallel => create_parallel_scenario(center, args.speed),
        ScenarioType::Following => create_following_scenario(center, args.speed),
        ScenarioType::Turning => create_turning_scenario(center, args.speed),
    };
    let rules = Config::from_env().load_rules();
    let options = RunOptions {
        max_duration_s: args.duration,
        beacon_loss: args.beacon_loss,
        seed: args.seed,
    };

    println!("\nScenario: {}", scenario.name);

    let runner = match &args.routes_dir {
        Some(dir) => {
            for vehicle in &scenario.vehicles {
                let slot: usize = vehicle
                    .route_id
                    .parse()
                    .with_context(|| format!("route id {} is not a slot", vehicle.route_id))?;
                let file = RouteFile::from_waypoints(
                    vehicle.route_id.clone(),
                    &vehicle.path.sample(rules.update_interval_ms),
                )
                .with_recorded_at(chrono::Utc::now());
                write_route_file(dir, slot, &file)?;
            }
            let mut routes = RoutePolylineStore::new(rules.route_slots);
            routes.load_all(&JsonRouteDirectory::new(dir));
            ScenarioRunner::with_routes(scenario, Arc::new(routes), rules, options)
        }
        None => ScenarioRunner::new(scenario, rules, options),
    };

    let report = runner.run();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for event in &report.events {
        let what = match &event.kind {
            ScenarioEventKind::Warning { at_risk } => format!("collision forecast with {}", at_risk.join(", ")),
            ScenarioEventKind::Brake { target_speed_mps } => {
                format!("braking to {:.1} km/h", target_speed_mps * 3.6)
            }
            ScenarioEventKind::Resume => "resuming".to_string(),
        };
        println!("  {:>7.2}s  {:<8} {}", event.at_ms as f64 / 1000.0, event.vehicle_id, what);
    }
    println!(
        "\n{} steps, {:.1}s simulated, {}/{} beacons lost",
        report.steps,
        report.simulated_ms as f64 / 1000.0,
        report.beacons_lost,
        report.beacons_sent
    );
    if let Some(min) = report.min_separation_m {
        println!("Minimum separation: {:.2} m", min);
    }
    Ok(())
}
