//! # Mapping Configuration
//!
//! Options that govern a mapping call. The configuration is a small `Copy`
//! value: the mapping service takes one snapshot at the start of every
//! public call, so a concurrent reconfiguration is never observed halfway
//! through a call.
//!
//! Configurations can be loaded from YAML or JSON. Missing keys fall back to
//! the defaults below.
//!
//! ```yaml
//! operation_mode: verbose
//! null_policy: disallow_null
//! property_matching: case_insensitive
//! ```

use serde::{Deserialize, Serialize};

/// Default nesting limit for a single mapping call.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Whether the engine runs, and how loudly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationMode {
    /// No verification and no mapping by schema; inputs pass through structurally.
    Disabled,
    /// Normal operation.
    #[default]
    Enabled,
    /// Normal operation plus `info`-level trace of inputs, outputs and failures.
    Verbose,
}

/// Which positions may hold `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullPolicy {
    /// `null` is accepted everywhere.
    AllowNull,
    /// `null` is accepted for records and containers, rejected for primitives.
    #[default]
    AllowObjectNull,
    /// `null` is rejected everywhere except `Any` fields.
    DisallowNull,
}

/// How JSON property names are matched to declared names during deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyMatching {
    /// The JSON key must equal the declared name.
    #[default]
    Exact,
    /// Keys are compared after lowercasing. On collision the first key seen wins.
    CaseInsensitive,
}

/// Mapping service configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Whether the engine runs.
    pub operation_mode: OperationMode,
    /// Null acceptance policy.
    pub null_policy: NullPolicy,
    /// Accept primitives of the wrong kind instead of failing.
    pub ignore_primitive_checks: bool,
    /// JSON property matching rule.
    pub property_matching: PropertyMatching,
    /// Treat every field as optional.
    pub ignore_required_check: bool,
    /// Maximum nesting depth. `None` disables the limit.
    pub max_depth: Option<usize>,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            operation_mode: OperationMode::Enabled,
            null_policy: NullPolicy::AllowObjectNull,
            ignore_primitive_checks: false,
            property_matching: PropertyMatching::Exact,
            ignore_required_check: false,
            max_depth: Some(DEFAULT_MAX_DEPTH),
        }
    }
}

impl MappingConfig {
    /// Parse a configuration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns the parser error for malformed YAML or unknown enum values.
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Parse a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns the parser error for malformed JSON or unknown enum values.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Set the operation mode.
    #[must_use]
    pub fn with_operation_mode(mut self, mode: OperationMode) -> Self {
        self.operation_mode = mode;
        self
    }

    /// Set the null policy.
    #[must_use]
    pub fn with_null_policy(mut self, policy: NullPolicy) -> Self {
        self.null_policy = policy;
        self
    }

    /// Set whether primitive kind mismatches are tolerated.
    #[must_use]
    pub fn with_ignore_primitive_checks(mut self, ignore: bool) -> Self {
        self.ignore_primitive_checks = ignore;
        self
    }

    /// Set the property matching rule.
    #[must_use]
    pub fn with_property_matching(mut self, matching: PropertyMatching) -> Self {
        self.property_matching = matching;
        self
    }

    /// Set whether required-field checks are skipped.
    #[must_use]
    pub fn with_ignore_required_check(mut self, ignore: bool) -> Self {
        self.ignore_required_check = ignore;
        self
    }

    /// Set the nesting limit.
    #[must_use]
    pub fn with_max_depth(mut self, limit: Option<usize>) -> Self {
        self.max_depth = limit;
        self
    }

    /// Whether the engine is active.
    pub fn is_enabled(&self) -> bool {
        self.operation_mode != OperationMode::Disabled
    }

    /// Whether verbose tracing is on.
    pub fn is_verbose(&self) -> bool {
        self.operation_mode == OperationMode::Verbose
    }
}
