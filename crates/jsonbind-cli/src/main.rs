//! # jsonbind CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use jsonbind_cli::check::{run_check, CheckArgs};
use jsonbind_cli::describe::{run_describe, DescribeArgs};
use jsonbind_cli::normalize::{run_normalize, NormalizeArgs};

/// jsonbind: schema-driven JSON record mapping.
///
/// Checks JSON documents against record schemas, normalizes them through a
/// deserialize/serialize round-trip, and describes registered types.
#[derive(Parser, Debug)]
#[command(name = "jsonbind", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a mapping configuration file (YAML or JSON).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that a JSON file maps to a record type.
    Check(CheckArgs),

    /// Print a JSON file as the record type would serialize it.
    Normalize(NormalizeArgs),

    /// Print the field tables of a schema document.
    Describe(DescribeArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "jsonbind starting");

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Check(args) => run_check(&args, config),
        Commands::Normalize(args) => run_normalize(&args, config),
        Commands::Describe(args) => run_describe(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}
