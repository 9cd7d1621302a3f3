//! CLI command definitions.

pub mod bench;
pub mod todos;

use clap::{Parser, Subcommand, ValueEnum};

use crate::client::DEFAULT_BASE_URL;

/// CLI client for the todoapi service.
#[derive(Debug, Parser)]
#[command(name = "todoapi-client")]
#[command(about = "CLI client and latency benchmark for todoapi", long_about = None)]
pub struct Cli {
    /// Server base URL.
    #[arg(long, env = "TODOAPI_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Output format.
    #[arg(long, default_value = "pretty")]
    pub format: OutputFormat,

    /// Suppress non-essential output.
    #[arg(long)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Raw JSON output.
    Json,
    /// Human-readable output.
    #[default]
    Pretty,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// TODO management.
    Todos(todos::TodosCommand),
    /// Run `SELECT 1` on the server and show its timing.
    SelectOne,
    /// Database health check.
    Health,
    /// Measure CRUD latency.
    Bench(bench::BenchArgs),
}
