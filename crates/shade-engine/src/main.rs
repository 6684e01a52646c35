//! # Shade Engine
//!
//! Main entry point for Shade: a headless driver for the character status
//! and state-transition core.
//!
//! The binary loads `shade.toml` (or the path given as the first argument),
//! installs the weapon table, spawns the configured player and enemies, and
//! runs the fixed-rate and frame-rate passes until the time limit.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;
mod config;
mod timing;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::EngineConfig;

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("shade=info".parse()?))
        .init();

    info!("Shade starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load_from(path),
        None => EngineConfig::load(),
    };

    // Run the simulation
    let report = app::run(config)?;
    info!(
        "{} event(s), {} item(s) collected, {} used, {} fragment(s)",
        report.events, report.items_collected, report.items_used, report.shadow_fragments
    );

    info!("Shade shutdown complete");
    Ok(())
}
