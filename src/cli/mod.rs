//! Command-line interface.

pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "sagan",
    about = "Autonomous research pipeline with iterative statistical analysis",
    version
)]
pub struct Cli {
    /// Emit machine-readable JSON output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a research session end to end
    Run(commands::run::RunArgs),

    /// Show the effective configuration
    Config(commands::config::ConfigArgs),
}

/// Print a top-level error and exit nonzero.
pub fn handle_error(err: anyhow::Error, json: bool) {
    if json {
        let payload = serde_json::json!({ "error": format!("{err:#}") });
        eprintln!("{payload}");
    } else {
        eprintln!("error: {err:#}");
    }
    std::process::exit(1);
}
