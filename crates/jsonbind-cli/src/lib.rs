//! # jsonbind-cli — CLI Tool for jsonbind
//!
//! Provides the `jsonbind` command-line interface over the mapping service.
//!
//! ## Subcommands
//!
//! - `jsonbind check` — Deserialize a JSON file against a record type and
//!   report the first mapping error.
//! - `jsonbind normalize` — Deserialize then serialize back, printing the
//!   canonical JSON for the record type.
//! - `jsonbind describe` — Print the merged field table of every type in a
//!   schema document.
//!
//! ```bash
//! jsonbind check --schema schema.yaml --type Line line.json
//! jsonbind normalize --schema schema.yaml --type Line --case-insensitive line.json
//! jsonbind describe --schema schema.yaml
//! ```

pub mod check;
pub mod describe;
pub mod normalize;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use jsonbind_core::{MappingConfig, NullPolicy, PropertyMatching};
use jsonbind_mapper::JsonConvert;
use jsonbind_schema::{builtin_converters, SchemaDocument, SchemaRegistry};
use serde_json::Value;

/// Options shared by subcommands that run the mapping service.
#[derive(Args, Debug, Clone)]
pub struct MappingArgs {
    /// Schema document (YAML, or JSON with a `.json` extension).
    #[arg(long)]
    pub schema: PathBuf,

    /// Record type the input is mapped as.
    #[arg(long = "type", value_name = "TYPE_ID")]
    pub type_id: String,

    /// Match JSON property names case-insensitively.
    #[arg(long)]
    pub case_insensitive: bool,

    /// Treat every field as optional.
    #[arg(long)]
    pub ignore_required: bool,

    /// Accept null everywhere, primitives included.
    #[arg(long, conflicts_with = "disallow_null")]
    pub allow_null: bool,

    /// Reject null everywhere except untyped fields.
    #[arg(long)]
    pub disallow_null: bool,

    /// JSON input file.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
}

impl MappingArgs {
    /// Apply command-line overrides on top of `config`.
    pub fn apply(&self, mut config: MappingConfig) -> MappingConfig {
        if self.case_insensitive {
            config.property_matching = PropertyMatching::CaseInsensitive;
        }
        if self.ignore_required {
            config.ignore_required_check = true;
        }
        if self.allow_null {
            config.null_policy = NullPolicy::AllowNull;
        }
        if self.disallow_null {
            config.null_policy = NullPolicy::DisallowNull;
        }
        config
    }
}

/// Load a schema document into a registry with the built-in converters.
pub fn load_registry(schema: &Path) -> Result<SchemaRegistry> {
    let mut registry = SchemaRegistry::new();
    for (id, converter) in builtin_converters() {
        registry
            .register_converter(id, converter)
            .with_context(|| format!("failed to register converter '{id}'"))?;
    }
    let document = SchemaDocument::load(schema)
        .with_context(|| format!("failed to load schema {}", schema.display()))?;
    let declared = document
        .apply(&mut registry)
        .with_context(|| format!("invalid schema {}", schema.display()))?;
    tracing::info!(types = declared.len(), schema = %schema.display(), "loaded schema");

    for dangling in registry.dangling_references() {
        tracing::warn!(
            type_id = %dangling.type_id,
            field = %dangling.field,
            missing = %dangling.missing,
            "field references an unregistered type"
        );
    }
    Ok(registry)
}

/// Load a mapping configuration file. `.json` files are parsed as JSON,
/// anything else as YAML. No file means the defaults.
pub fn load_config(path: Option<&Path>) -> Result<MappingConfig> {
    let Some(path) = path else {
        return Ok(MappingConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => MappingConfig::from_json_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?,
        _ => MappingConfig::from_yaml_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?,
    };
    tracing::debug!(?config, "loaded mapping config");
    Ok(config)
}

/// Build the mapping service for `args`.
pub fn build_service(args: &MappingArgs, config_path: Option<&Path>) -> Result<JsonConvert> {
    let registry = load_registry(&args.schema)?;
    if !registry.contains(&args.type_id) {
        anyhow::bail!(
            "type '{}' is not declared in {}",
            args.type_id,
            args.schema.display()
        );
    }
    let config = args.apply(load_config(config_path)?);
    Ok(JsonConvert::with_config(Arc::new(registry), config))
}

/// Read and parse a JSON file.
pub fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path.display()))
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::path::PathBuf;

    pub const SCHEMA: &str = r#"
types:
  - id: Point
    fields:
      - { name: x, type: number }
      - { name: y, type: number }
  - id: Line
    fields:
      - { name: start, type: Point }
      - { name: end, type: Point }
      - { name: label, json: Label, type: string, optional: true }
"#;

    pub fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }
}
