//! # Normalize Subcommand
//!
//! Runs a JSON file through a deserialize/serialize round-trip and prints
//! the result. Properties outside the schema are dropped, property names
//! take their declared spelling, and optional nulls disappear.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use crate::{build_service, read_json, MappingArgs};

/// Arguments for the `jsonbind normalize` subcommand.
#[derive(Args, Debug)]
pub struct NormalizeArgs {
    #[command(flatten)]
    pub mapping: MappingArgs,

    /// Write the result to this file instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Execute the normalize subcommand.
pub fn run_normalize(args: &NormalizeArgs, config: Option<&Path>) -> Result<u8> {
    let service = build_service(&args.mapping, config)?;
    let input = read_json(&args.mapping.input)?;

    let normalized = service
        .deserialize(&input, &args.mapping.type_id)
        .and_then(|value| service.serialize(&value, Some(&args.mapping.type_id)));
    let normalized = match normalized {
        Ok(json) => json,
        Err(e) => {
            println!("FAIL: {}", args.mapping.input.display());
            println!("  at {}: {e}", e.path());
            return Ok(1);
        }
    };

    write_output(&normalized, args.output.as_deref())?;
    Ok(0)
}

fn write_output(json: &Value, output: Option<&Path>) -> Result<()> {
    let text = serde_json::to_string_pretty(json).context("failed to render JSON")?;
    match output {
        Some(path) => {
            std::fs::write(path, format!("{text}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote normalized output");
        }
        None => println!("{text}"),
    }
    Ok(())
}
