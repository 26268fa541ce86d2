//! Tracing subscriber setup shared by the binaries.

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// `default_directive` (e.g. `cwa_runtime=debug`) is added on top of
/// `RUST_LOG`. Logs go to stderr so stdout stays free for command output.
pub fn init_tracing(default_directive: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive(default_directive.parse()?);
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()?;
    }
    Ok(())
}
