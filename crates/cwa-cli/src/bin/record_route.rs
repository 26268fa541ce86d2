//! Record a synthetic route into a route file.
//!
//! Drives a straight or turning path at the given speed, sampling the
//! position once per host step, and writes `Route{slot}.json`.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use cwa_cli::sim::{ArcPath, DrivePath, LinearPath};
use cwa_core::{Coordinate, KinematicSnapshot};
use cwa_runtime::config::Config;
use cwa_runtime::logging::init_tracing;
use cwa_runtime::persistence::RouteRecorder;
use std::path::PathBuf;

#[derive(Debug, Clone, ValueEnum)]
enum Shape {
    Straight,
    TurnLeft,
    TurnRight,
}

/// Route recorder
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Route slot to write
    #[arg(long)]
    slot: usize,

    #[arg(long, value_enum, default_value = "straight")]
    shape: Shape,

    /// Start latitude
    #[arg(long, default_value_t = 52.5200)]
    lat: f64,

    /// Start longitude
    #[arg(long, default_value_t = 13.4050)]
    lon: f64,

    /// Initial heading in degrees
    #[arg(long, default_value_t = 45.0)]
    heading: f64,

    /// Length of a straight route, radius of a turn (m)
    #[arg(long, default_value_t = 100.0)]
    length: f64,

    /// Recording speed in m/s
    #[arg(long, default_value_t = 10.0)]
    speed: f64,

    /// Output directory (defaults to CWA_ROUTES_DIR)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing("cwa_cli=info", args.log_json)?;

    let config = Config::from_env();
    let rules = config.load_rules();
    let start = Coordinate::new(args.lat, args.lon);

    let path: Box<dyn DrivePath> = match args.shape {
        Shape::Straight => {
            let (north, east) = (args.heading.to_radians().cos(), args.heading.to_radians().sin());
            let end = cwa_core::geo::offset_position(start, north * args.length, east * args.length);
            Box::new(LinearPath::new(start, end, args.speed))
        }
        Shape::TurnLeft | Shape::TurnRight => {
            let clockwise = matches!(args.shape, Shape::TurnRight);
            // pivot sits to the side of the start, perpendicular to the heading
            let side = if clockwise { 90.0 } else { -90.0 };
            let to_pivot = (args.heading + side).to_radians();
            let pivot = cwa_core::geo::offset_position(
                start,
                to_pivot.cos() * args.length,
                to_pivot.sin() * args.length,
            );
            let start_angle = (args.heading + side + 180.0).to_radians();
            Box::new(ArcPath::quarter_turn(pivot, args.length, args.speed, start_angle, clockwise))
        }
    };

    let vehicle_id = "recorder";
    let mut recorder = RouteRecorder::new(vehicle_id, args.slot.to_string());
    for point in path.sample(rules.update_interval_ms) {
        recorder.record(&KinematicSnapshot::new(vehicle_id, point.lat, point.lon, 4.5));
    }

    let waypoints = recorder.len();
    let dir = args.out.unwrap_or(config.routes_dir);
    let written = recorder.write_to(&dir, args.slot)?;
    println!("Recorded {} waypoints to {}", waypoints, written.display());
    Ok(())
}
