//! Host runtime for the collision warning agents.

pub mod actuator;
pub mod config;
pub mod logging;
pub mod loops;
pub mod persistence;
pub mod scheduler;
pub mod state;

pub use actuator::ChannelActuator;
pub use config::Config;
pub use loops::host_loop::{run_host_loop, HostEvent, HostLoopSummary};
pub use persistence::{JsonRouteDirectory, RouteFile, RouteRecorder};
pub use scheduler::{SimClockTimer, TokioReactionTimer};
pub use state::HostState;
