//! `GammaKeeper` - Per-monitor gamma control for Windows
//!
//! Sets each monitor's hardware gamma ramp independently and re-applies the
//! remembered value, keyed by panel serial number, whenever the monitor is
//! reconnected.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use gammakeeper::utils;

/// Main entry point for the application
fn main() -> Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Run { .. }) {
        utils::init_logging().context("Failed to initialize logging system")?;
    } else {
        utils::init_console_logging().context("Failed to initialize logging system")?;
    }

    cli::run_command(cli.command)
}
