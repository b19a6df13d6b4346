//! # Cadence
//!
//! Command-line player for the Cadence audio kernel.
//!
//! Usage: `cadence [CONFIG_PATH]`. Without a path the platform config
//! directory is used (`<config dir>/cadence/cadence.toml`).

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use anyhow::Result;
use cadence_engine::{app, EngineConfig};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("cadence=info".parse()?))
        .init();

    info!("Cadence starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = match std::env::args_os().nth(1) {
        Some(path) => EngineConfig::load_from(path),
        None => EngineConfig::load(),
    };
    config.validate();

    app::run(&config)?;

    info!("Cadence shutdown complete");
    Ok(())
}
