//! # Describe Subcommand
//!
//! Prints the merged field table of each type in a schema document,
//! inherited fields included.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use jsonbind_schema::{SchemaRegistry, TypeRegistration};

use crate::load_registry;

/// Arguments for the `jsonbind describe` subcommand.
#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Schema document (YAML, or JSON with a `.json` extension).
    #[arg(long)]
    pub schema: PathBuf,

    /// Only describe this type.
    #[arg(long = "type", value_name = "TYPE_ID")]
    pub type_id: Option<String>,
}

/// Execute the describe subcommand.
pub fn run_describe(args: &DescribeArgs) -> Result<u8> {
    let registry = load_registry(&args.schema)?;
    match &args.type_id {
        Some(id) => match registry.get(id) {
            Some(registration) => print!("{}", describe_type(registration)),
            None => {
                println!("Type '{id}' is not declared in {}", args.schema.display());
                return Ok(1);
            }
        },
        None => print!("{}", describe_registry(&registry)),
    }
    Ok(0)
}

/// Render every registration in declaration order.
pub fn describe_registry(registry: &SchemaRegistry) -> String {
    let mut out = String::new();
    for registration in registry.registrations() {
        out.push_str(&describe_type(registration));
    }
    let dangling = registry.dangling_references();
    if !dangling.is_empty() {
        out.push_str("Unresolved references:\n");
        for d in dangling {
            let _ = writeln!(out, "  {}.{} -> {}", d.type_id, d.field, d.missing);
        }
    }
    out
}

/// Render one registration.
pub fn describe_type(registration: &TypeRegistration) -> String {
    let mut out = String::new();
    match registration.supertype() {
        Some(parent) => {
            let _ = writeln!(out, "{} extends {}", registration.type_id(), parent);
        }
        None => {
            let _ = writeln!(out, "{}", registration.type_id());
        }
    }
    for field in registration.fields() {
        let mut line = format!("  {}", field.field_name());
        if field.json_property() != field.field_name() {
            let _ = write!(line, " as \"{}\"", field.json_property());
        }
        let _ = write!(line, ": {}", field.shape());
        if field.is_optional() {
            line.push_str(" optional");
        }
        if field.exports_null() {
            line.push_str(" export-null");
        }
        if let Some(owner) = field.owner() {
            if owner != registration.type_id() {
                let _ = write!(line, " (from {owner})");
            }
        }
        let _ = writeln!(out, "{line}");
    }
    out
}
