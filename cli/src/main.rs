//! Reservoir CLI - scenario driver for the liquidity buffer engine
//!
//! Runs deterministic deposit/withdraw/update-target scenarios against an
//! in-memory reserve, logging every emitted event, so buffer behavior can be
//! inspected without a host runtime.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod scenario;

#[derive(Parser)]
#[command(name = "reservoir")]
#[command(about = "Liquidity buffer engine scenario driver", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose output (per-step event logging)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario file
    Run {
        /// Path to a TOML scenario
        file: PathBuf,
    },

    /// Run the built-in demonstration scenario
    Demo,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let report = match cli.command {
        Commands::Run { file } => scenario::run(&scenario::load(&file)?)?,
        Commands::Demo => scenario::run(&scenario::demo())?,
    };

    report.print();
    Ok(())
}
