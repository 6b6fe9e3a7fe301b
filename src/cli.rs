//! Command-line interface for the headless simulator.

use clap::Parser;
use std::path::PathBuf;

/// Tick-based grid combat ability simulator
#[derive(Parser, Debug)]
#[command(name = "gridstrike")]
#[command(about = "Tick-based grid combat ability simulator")]
#[command(version)]
pub struct Args {
    /// Scenario config file (JSON)
    pub scenario: PathBuf,

    /// Override the scenario's tick budget
    #[arg(long)]
    pub ticks: Option<u64>,

    /// Override the scenario's random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the combat log to this path (JSON)
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,
}

pub fn parse_args() -> Args {
    Args::parse()
}
