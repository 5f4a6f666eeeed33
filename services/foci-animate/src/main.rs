//! foci-animate
//!
//! Contour-fill plots and animations of FOCI ocean-model output.
//!
//! ```text
//! foci-animate plot    --folder F --data NAME --var V [--projection P] [--time N | --mean] -o out.png
//! foci-animate animate --folder F --data NAME --var V [--projection P] [--frames N] -o out.mp4
//! foci-animate info    --folder F --data NAME [--var V] [--json]
//! ```

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use crate::commands::{AnimateArgs, InfoArgs, PlotArgs};
use crate::config::{load_config, LoggingConfig};

#[derive(Parser, Debug)]
#[command(name = "foci-animate")]
#[command(about = "Plot and animate FOCI ocean-model NetCDF output")]
#[command(version)]
struct Cli {
    /// Config file (default: ./foci-animate.yaml if present)
    #[arg(long, global = true, env = "FOCI_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plot one time step, or the time mean, to a PNG
    Plot(PlotArgs),
    /// Render every time step and encode a GIF, video or PNG sequence
    Animate(AnimateArgs),
    /// List the files and variables a data name resolves to
    Info(InfoArgs),
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let (config, config_file) = load_config(cli.config.as_deref())?;

    init_tracing(&config.logging, cli.log_level.as_deref(), cli.log_json)?;
    match &config_file {
        Some(path) => info!(path = %path.display(), "Loaded config"),
        None => debug!("No config file, using defaults"),
    }

    match cli.command {
        Command::Plot(args) => commands::plot(args, &config),
        Command::Animate(args) => commands::animate(args, &config),
        Command::Info(args) => commands::info(args),
    }
}

/// Install the global subscriber. `RUST_LOG` wins over flags and config.
fn init_tracing(logging: &LoggingConfig, level: Option<&str>, json: bool) -> Result<()> {
    let level = level.unwrap_or(&logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout is reserved for command output such as `info --json`
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr);
    let result = if json || logging.is_json() {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}
