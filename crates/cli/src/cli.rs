//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Traffic Grid - Concurrent urban traffic simulation
#[derive(Parser, Debug)]
#[command(
    name = "traffic-grid",
    author,
    version,
    about = "Concurrent urban traffic grid simulation",
    long_about = "A concurrent traffic simulation on a square grid.\n\n\
                  Spawns a fleet of vehicle actors, cycles traffic lights, injects \n\
                  random street events, and publishes aggregate snapshots while running."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TRAFFIC_GRID_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "TRAFFIC_GRID_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the simulation
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when omitted
    #[arg(short, long, env = "TRAFFIC_GRID_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override grid side length from configuration
    #[arg(long, env = "TRAFFIC_GRID_SIZE")]
    pub grid_size: Option<usize>,

    /// Override initial vehicle count from configuration
    #[arg(long, env = "TRAFFIC_GRID_VEHICLES")]
    pub vehicles: Option<u32>,

    /// Override simulation speed multiplier from configuration
    #[arg(long, env = "TRAFFIC_GRID_SPEED")]
    pub speed: Option<f64>,

    /// How long to run, in seconds (0 = until Ctrl+C)
    #[arg(long, default_value = "0", env = "TRAFFIC_GRID_DURATION")]
    pub duration: u64,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "TRAFFIC_GRID_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "simulation.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file; defaults apply when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Output as canonical TOML
    #[arg(long, conflicts_with = "json")]
    pub toml: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
