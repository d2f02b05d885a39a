//! # Custom Converters
//!
//! A converter is a paired serialize/deserialize function that replaces
//! shape verification for one field. The mapping service calls it instead of
//! the verifier; whatever it returns is written to the output unchecked.
//!
//! Converters are created once, when the schema is declared, and shared by
//! every mapping call through an `Arc`. They must therefore be `Send + Sync`
//! and should keep no per-call state.

use std::fmt;
use std::sync::Arc;

use jsonbind_core::{ConversionError, NativeValue};
use serde_json::Value;

/// Bidirectional conversion for a single field.
pub trait Converter: Send + Sync + fmt::Debug {
    /// Name used in diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Native value to JSON.
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`] when the value cannot be represented.
    fn serialize(&self, value: &NativeValue) -> Result<Value, ConversionError>;

    /// JSON to native value.
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`] when the JSON value is not accepted.
    fn deserialize(&self, json: &Value) -> Result<NativeValue, ConversionError>;
}

type SerializeFn = dyn Fn(&NativeValue) -> Result<Value, ConversionError> + Send + Sync;
type DeserializeFn = dyn Fn(&Value) -> Result<NativeValue, ConversionError> + Send + Sync;

/// Converter assembled from two closures.
pub struct FnConverter {
    name: String,
    serialize: Box<SerializeFn>,
    deserialize: Box<DeserializeFn>,
}

impl FnConverter {
    /// Build a converter named `name` from a serialize and a deserialize closure.
    pub fn new<S, D>(name: impl Into<String>, serialize: S, deserialize: D) -> Self
    where
        S: Fn(&NativeValue) -> Result<Value, ConversionError> + Send + Sync + 'static,
        D: Fn(&Value) -> Result<NativeValue, ConversionError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            serialize: Box::new(serialize),
            deserialize: Box::new(deserialize),
        }
    }

    /// Wrap in an `Arc` for registration.
    pub fn shared(self) -> Arc<dyn Converter> {
        Arc::new(self)
    }
}

impl fmt::Debug for FnConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnConverter")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Converter for FnConverter {
    fn name(&self) -> &str {
        &self.name
    }

    fn serialize(&self, value: &NativeValue) -> Result<Value, ConversionError> {
        (self.serialize)(value)
    }

    fn deserialize(&self, json: &Value) -> Result<NativeValue, ConversionError> {
        (self.deserialize)(json)
    }
}

// ─── Built-in Converters ─────────────────────────────────────────────

/// Numbers carried as decimal strings in JSON (`"42"` ↔ `42`).
///
/// Common for identifiers and amounts that exceed the safe integer range of
/// JSON consumers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberAsString;

impl NumberAsString {
    /// Identifier under which [`builtin_converters`] registers this converter.
    pub const ID: &'static str = "number-as-string";
}

impl Converter for NumberAsString {
    fn name(&self) -> &str {
        Self::ID
    }

    fn serialize(&self, value: &NativeValue) -> Result<Value, ConversionError> {
        match value {
            NativeValue::Number(n) => Ok(Value::String(n.to_string())),
            other => Err(ConversionError::new(format!(
                "expected number, got {}",
                other.type_name()
            ))),
        }
    }

    fn deserialize(&self, json: &Value) -> Result<NativeValue, ConversionError> {
        let text = json.as_str().ok_or_else(|| {
            ConversionError::new(format!(
                "expected numeric string, got {}",
                jsonbind_core::json_type_name(json)
            ))
        })?;
        let number: serde_json::Number = text
            .parse()
            .map_err(|_| ConversionError::new(format!("'{text}' is not a number")))?;
        Ok(NativeValue::Number(number))
    }
}

/// Converters available to schema documents without explicit registration.
pub fn builtin_converters() -> Vec<(&'static str, Arc<dyn Converter>)> {
    vec![(NumberAsString::ID, Arc::new(NumberAsString))]
}
