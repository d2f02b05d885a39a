//! # Check Subcommand
//!
//! Deserializes a JSON file as a record type (or an array of them) and
//! reports whether it maps cleanly.
//!
//! Exit codes: 0 when the input maps, 1 on a mapping error. Operational
//! failures (unreadable files, invalid schema) are returned as errors.

use std::path::Path;

use anyhow::Result;
use clap::Args;
use jsonbind_core::NativeValue;

use crate::{build_service, read_json, MappingArgs};

/// Arguments for the `jsonbind check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub mapping: MappingArgs,
}

/// Execute the check subcommand.
pub fn run_check(args: &CheckArgs, config: Option<&Path>) -> Result<u8> {
    let service = build_service(&args.mapping, config)?;
    let input = read_json(&args.mapping.input)?;

    match service.deserialize(&input, &args.mapping.type_id) {
        Ok(value) => {
            let count = match &value {
                NativeValue::List(items) => items.len(),
                NativeValue::Null => 0,
                _ => 1,
            };
            println!(
                "OK: {} ({} {} record(s))",
                args.mapping.input.display(),
                count,
                args.mapping.type_id
            );
            Ok(0)
        }
        Err(e) => {
            println!("FAIL: {}", args.mapping.input.display());
            println!("  at {}: {e}", e.path());
            Ok(1)
        }
    }
}
