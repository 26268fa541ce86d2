//! Collision warning host.
//!
//! Reads host events as JSON lines on stdin and writes the resulting actuator
//! commands as JSON lines on stdout.

use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use cwa_core::RoutePolylineStore;
use cwa_runtime::config::Config;
use cwa_runtime::logging::init_tracing;
use cwa_runtime::persistence::JsonRouteDirectory;
use cwa_runtime::{run_host_loop, HostEvent, HostState};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();
    init_tracing("cwa_runtime=debug", config.log_json)?;

    tracing::info!("Starting collision warning host...");

    let rules = config.load_rules();
    let mut routes = RoutePolylineStore::new(rules.route_slots);
    let loaded = routes.load_all(&JsonRouteDirectory::new(&config.routes_dir));
    if loaded == 0 {
        tracing::warn!(
            "No routes found in {}; forecasts will fail until routes exist",
            config.routes_dir.display()
        );
    }
    let state = Arc::new(HostState::new(Arc::new(routes), rules));

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (command_tx, mut command_rx) = mpsc::unbounded_channel();

    let host = tokio::spawn(run_host_loop(state, event_rx, event_tx.clone(), command_tx));

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(command) = command_rx.recv().await {
            let mut line = serde_json::to_string(&command)?;
            line.push('\n');
            stdout.write_all(line.as_bytes()).await?;
            stdout.flush().await?;
        }
        anyhow::Ok(())
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<HostEvent>(&line) {
            Ok(event) => {
                let shutdown = matches!(event, HostEvent::Shutdown);
                if event_tx.send(event).is_err() || shutdown {
                    break;
                }
            }
            Err(e) => tracing::warn!("Skipping malformed event: {}", e),
        }
    }
    // The loop holds its own sender for timers, so stop it explicitly.
    let _ = event_tx.send(HostEvent::Shutdown);

    let summary = host.await?;
    writer.await??;
    tracing::info!(?summary, "Host stopped");
    Ok(())
}
