//! # Mapping Service
//!
//! [`JsonConvert`] is the public surface of the engine: six entry points
//! mapping records and arrays of records between [`NativeValue`] and JSON,
//! typed helpers for [`JsonRecord`] structs, and direct access to the
//! verifier for a single shape.
//!
//! ## Root Values
//!
//! | Entry point | Accepts | Rejects with `InvalidRootValue` |
//! |---|---|---|
//! | `serialize` / `deserialize` | object, array, `null` | primitives |
//! | `serialize_object` / `deserialize_object` | object, `null` | arrays, primitives |
//! | `serialize_array` / `deserialize_array` | array, `null` | objects, primitives |
//!
//! A root `null` maps to `null` unless the null policy is
//! [`NullPolicy::DisallowNull`](jsonbind_core::NullPolicy::DisallowNull).
//! In [`OperationMode::Disabled`](jsonbind_core::OperationMode::Disabled)
//! every entry point converts its input structurally and never fails.
//!
//! ## Thread Safety
//!
//! The registry is shared read-only through an `Arc`. The configuration sits
//! behind a `parking_lot::RwLock` and is copied once at the start of every
//! call, so a concurrent [`JsonConvert::set_config`] is never observed
//! halfway through a call.

use std::fmt;
use std::sync::Arc;

use jsonbind_core::{MappingConfig, MappingError, NativeValue, PathSegment, Shape};
use jsonbind_schema::{records_to_native, JsonRecord, SchemaRegistry};
use parking_lot::RwLock;
use serde_json::Value;

use crate::verify::{runtime_type, FromJson, Mapper, ToJson};

/// Emit at `info` in verbose mode, `debug` otherwise.
macro_rules! trace_event {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+)
        } else {
            tracing::debug!($($arg)+)
        }
    };
}

/// Maps records to and from JSON using a [`SchemaRegistry`].
pub struct JsonConvert {
    registry: Arc<SchemaRegistry>,
    config: RwLock<MappingConfig>,
}

impl fmt::Debug for JsonConvert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonConvert")
            .field("types", &self.registry.len())
            .field("config", &*self.config.read())
            .finish()
    }
}

impl JsonConvert {
    /// Mapping service with the default configuration.
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self::with_config(registry, MappingConfig::default())
    }

    /// Mapping service with an explicit configuration.
    pub fn with_config(registry: Arc<SchemaRegistry>, config: MappingConfig) -> Self {
        Self {
            registry,
            config: RwLock::new(config),
        }
    }

    /// The schema registry.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> MappingConfig {
        *self.config.read()
    }

    /// Replace the configuration. Calls already running keep their snapshot.
    pub fn set_config(&self, config: MappingConfig) {
        *self.config.write() = config;
    }

    /// Modify the configuration in place.
    pub fn update_config(&self, update: impl FnOnce(&mut MappingConfig)) {
        update(&mut *self.config.write());
    }

    // ─── Serialize ───────────────────────────────────────────────────

    /// Serialize a record, or an array of records, to JSON.
    ///
    /// # Errors
    ///
    /// [`MappingError::InvalidRootValue`] for a primitive root, otherwise as
    /// [`JsonConvert::serialize_object`] or [`JsonConvert::serialize_array`].
    pub fn serialize(&self, data: &NativeValue, type_id: Option<&str>) -> Result<Value, MappingError> {
        self.run("serialize", type_id, data, |m| match data {
            _ if !m.config().is_enabled() => Ok(data.to_json()),
            NativeValue::List(_) => serialize_array(m, data, type_id, "serialize"),
            NativeValue::Record(_) | NativeValue::Map(_) | NativeValue::Null => {
                serialize_object(m, data, type_id, "serialize")
            }
            other => Err(invalid_root("serialize", "object or array", other.type_name())),
        })
    }

    /// Serialize one record to a JSON object.
    ///
    /// With `type_id` given, the declared type drives the mapping and only its
    /// fields are emitted. Otherwise `data` must be a record instance and its
    /// own type is used.
    ///
    /// # Errors
    ///
    /// - [`MappingError::InvalidRootValue`] if `data` is not a record or map.
    /// - [`MappingError::UnregisteredType`] if the type has no registration.
    /// - Any field-level error, with its path.
    pub fn serialize_object(
        &self,
        data: &NativeValue,
        type_id: Option<&str>,
    ) -> Result<Value, MappingError> {
        self.run("serialize_object", type_id, data, |m| {
            serialize_object(m, data, type_id, "serialize_object")
        })
    }

    /// Serialize a list of records to a JSON array.
    ///
    /// # Errors
    ///
    /// - [`MappingError::InvalidRootValue`] if `data` is not a list.
    /// - The first element error, with the element index in its path.
    pub fn serialize_array(
        &self,
        data: &NativeValue,
        type_id: Option<&str>,
    ) -> Result<Value, MappingError> {
        self.run("serialize_array", type_id, data, |m| {
            serialize_array(m, data, type_id, "serialize_array")
        })
    }

    // ─── Deserialize ─────────────────────────────────────────────────

    /// Deserialize a JSON object or array into records of type `type_id`.
    ///
    /// # Errors
    ///
    /// [`MappingError::InvalidRootValue`] for a primitive root, otherwise as
    /// [`JsonConvert::deserialize_object`] or [`JsonConvert::deserialize_array`].
    pub fn deserialize(&self, json: &Value, type_id: &str) -> Result<NativeValue, MappingError> {
        self.run("deserialize", Some(type_id), json, |m| match json {
            _ if !m.config().is_enabled() => Ok(NativeValue::from_json(json)),
            Value::Array(_) => deserialize_array(m, json, type_id, "deserialize"),
            Value::Object(_) | Value::Null => deserialize_object(m, json, type_id, "deserialize"),
            other => Err(invalid_root(
                "deserialize",
                "object or array",
                jsonbind_core::json_type_name(other).to_string(),
            )),
        })
    }

    /// Deserialize a JSON object into a fresh instance of `type_id`.
    ///
    /// Returns [`NativeValue::Record`], or [`NativeValue::Null`] for a
    /// permitted `null` root.
    ///
    /// # Errors
    ///
    /// - [`MappingError::InvalidRootValue`] if `json` is not an object.
    /// - [`MappingError::UnregisteredType`] if `type_id` has no registration.
    /// - Any field-level error, with its path.
    pub fn deserialize_object(&self, json: &Value, type_id: &str) -> Result<NativeValue, MappingError> {
        self.run("deserialize_object", Some(type_id), json, |m| {
            deserialize_object(m, json, type_id, "deserialize_object")
        })
    }

    /// Deserialize a JSON array of objects into a list of `type_id` instances.
    ///
    /// # Errors
    ///
    /// - [`MappingError::InvalidRootValue`] if `json` is not an array.
    /// - The first element error, with the element index in its path.
    pub fn deserialize_array(&self, json: &Value, type_id: &str) -> Result<NativeValue, MappingError> {
        self.run("deserialize_array", Some(type_id), json, |m| {
            deserialize_array(m, json, type_id, "deserialize_array")
        })
    }

    // ─── Typed Records ───────────────────────────────────────────────

    /// Serialize a typed record.
    ///
    /// # Errors
    ///
    /// As [`JsonConvert::serialize_object`].
    pub fn serialize_record<T: JsonRecord>(&self, record: &T) -> Result<Value, MappingError> {
        self.serialize_object(&record.to_native(), Some(T::TYPE_ID))
    }

    /// Serialize a slice of typed records to a JSON array.
    ///
    /// # Errors
    ///
    /// As [`JsonConvert::serialize_array`].
    pub fn serialize_records<T: JsonRecord>(&self, records: &[T]) -> Result<Value, MappingError> {
        self.serialize_array(&records_to_native(records), Some(T::TYPE_ID))
    }

    /// Deserialize a JSON object into a typed record.
    ///
    /// # Errors
    ///
    /// As [`JsonConvert::deserialize_object`], plus any error of
    /// [`JsonRecord::from_instance`]. A `null` root is a type mismatch.
    pub fn deserialize_record<T: JsonRecord>(&self, json: &Value) -> Result<T, MappingError> {
        T::from_native(&self.deserialize_object(json, T::TYPE_ID)?)
    }

    /// Deserialize a JSON array into typed records.
    ///
    /// # Errors
    ///
    /// As [`JsonConvert::deserialize_array`], plus any element error of
    /// [`JsonRecord::from_instance`] tagged with its index.
    pub fn deserialize_records<T: JsonRecord>(&self, json: &Value) -> Result<Vec<T>, MappingError> {
        let value = self.deserialize_array(json, T::TYPE_ID)?;
        let items = value.as_list().ok_or_else(|| {
            MappingError::mismatch(
                format!("[{}]", T::TYPE_ID),
                value.type_name(),
                "expected an array of records",
            )
        })?;
        items
            .iter()
            .enumerate()
            .map(|(i, item)| T::from_native(item).map_err(|e| e.at(PathSegment::Index(i))))
            .collect()
    }

    // ─── Shapes ──────────────────────────────────────────────────────

    /// Verify a JSON value against `shape` and map it to a native value.
    ///
    /// # Errors
    ///
    /// The first [`MappingError`] found.
    pub fn verify_json(&self, shape: &Shape, json: &Value) -> Result<NativeValue, MappingError> {
        self.run("verify_json", None, json, |m| {
            if !m.config().is_enabled() {
                return Ok(NativeValue::from_json(json));
            }
            m.verify::<FromJson>(shape, json, 0)
        })
    }

    /// Verify a native value against `shape` and map it to JSON.
    ///
    /// # Errors
    ///
    /// The first [`MappingError`] found.
    pub fn verify_native(&self, shape: &Shape, data: &NativeValue) -> Result<Value, MappingError> {
        self.run("verify_native", None, data, |m| {
            if !m.config().is_enabled() {
                return Ok(data.to_json());
            }
            m.verify::<ToJson>(shape, data, 0)
        })
    }

    /// Run one public call against a fresh configuration snapshot.
    fn run<I, O>(
        &self,
        entry_point: &'static str,
        type_id: Option<&str>,
        input: &I,
        call: impl FnOnce(&Mapper<'_>) -> Result<O, MappingError>,
    ) -> Result<O, MappingError>
    where
        I: fmt::Display + ?Sized,
        O: fmt::Display,
    {
        let mapper = Mapper::new(&self.registry, self.config());
        let verbose = mapper.config().is_verbose();

        trace_event!(verbose, entry_point, type_id = ?type_id, input = %input, "received input");
        let result = call(&mapper);
        match &result {
            Ok(output) => {
                trace_event!(verbose, entry_point, type_id = ?type_id, output = %output, "mapping succeeded");
            }
            Err(e) => {
                trace_event!(verbose, entry_point, type_id = ?type_id, path = %e.path(), error = %e, "mapping failed");
            }
        }
        result
    }
}

// ─── Root Handling ───────────────────────────────────────────────────

fn invalid_root(entry_point: &'static str, expected: &'static str, actual: String) -> MappingError {
    MappingError::InvalidRootValue {
        entry_point,
        expected,
        actual,
    }
}

fn null_record<O>(m: &Mapper<'_>, type_id: Option<&str>, null: O) -> Result<O, MappingError> {
    if m.allows_object_null() {
        Ok(null)
    } else {
        Err(MappingError::null_not_allowed(type_id.unwrap_or("record")))
    }
}

/// Serialize one record value at `depth`, resolving its type.
fn serialize_record_value(
    m: &Mapper<'_>,
    value: &NativeValue,
    type_id: Option<&str>,
    depth: usize,
) -> Result<Value, MappingError> {
    if value.is_null() {
        return null_record(m, type_id, Value::Null);
    }
    let resolved = type_id.or_else(|| runtime_type(value).map(|id| id.as_str()));
    let Some(resolved) = resolved else {
        return Err(MappingError::mismatch(
            "record",
            value.type_name(),
            "no record type to map with",
        ));
    };
    let registration = m.registration(resolved)?;
    m.serialize_fields(&registration, value, m.enter(depth)?)
}

fn serialize_object(
    m: &Mapper<'_>,
    data: &NativeValue,
    type_id: Option<&str>,
    entry_point: &'static str,
) -> Result<Value, MappingError> {
    if !m.config().is_enabled() {
        return Ok(data.to_json());
    }
    match data {
        NativeValue::Record(_) | NativeValue::Null => serialize_record_value(m, data, type_id, 0),
        NativeValue::Map(_) if type_id.is_some() => serialize_record_value(m, data, type_id, 0),
        NativeValue::Map(_) => Err(invalid_root(
            entry_point,
            "record instance, or a map with an explicit type id",
            data.type_name(),
        )),
        other => Err(invalid_root(entry_point, "record instance", other.type_name())),
    }
}

fn serialize_array(
    m: &Mapper<'_>,
    data: &NativeValue,
    type_id: Option<&str>,
    entry_point: &'static str,
) -> Result<Value, MappingError> {
    if !m.config().is_enabled() {
        return Ok(data.to_json());
    }
    match data {
        NativeValue::Null => null_record(m, type_id, Value::Null),
        NativeValue::List(items) => {
            let depth = m.enter(0)?;
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let mapped = serialize_record_value(m, item, type_id, depth)
                    .map_err(|e| e.at(PathSegment::Index(i)))?;
                out.push(mapped);
            }
            Ok(Value::Array(out))
        }
        other => Err(invalid_root(entry_point, "array", other.type_name())),
    }
}

/// Deserialize one JSON object at `depth` into an instance of `type_id`.
fn deserialize_record_value(
    m: &Mapper<'_>,
    json: &Value,
    type_id: &str,
    depth: usize,
) -> Result<NativeValue, MappingError> {
    if json.is_null() {
        return null_record(m, Some(type_id), NativeValue::Null);
    }
    let registration = m.registration(type_id)?;
    m.deserialize_fields(&registration, json, m.enter(depth)?)
}

fn deserialize_object(
    m: &Mapper<'_>,
    json: &Value,
    type_id: &str,
    entry_point: &'static str,
) -> Result<NativeValue, MappingError> {
    if !m.config().is_enabled() {
        return Ok(NativeValue::from_json(json));
    }
    match json {
        Value::Object(_) | Value::Null => deserialize_record_value(m, json, type_id, 0),
        other => Err(invalid_root(
            entry_point,
            "object",
            jsonbind_core::json_type_name(other).to_string(),
        )),
    }
}

fn deserialize_array(
    m: &Mapper<'_>,
    json: &Value,
    type_id: &str,
    entry_point: &'static str,
) -> Result<NativeValue, MappingError> {
    if !m.config().is_enabled() {
        return Ok(NativeValue::from_json(json));
    }
    match json {
        Value::Null => null_record(m, Some(type_id), NativeValue::Null),
        Value::Array(items) => {
            let depth = m.enter(0)?;
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let mapped = deserialize_record_value(m, item, type_id, depth)
                    .map_err(|e| e.at(PathSegment::Index(i)))?;
                out.push(mapped);
            }
            Ok(NativeValue::List(out))
        }
        other => Err(invalid_root(
            entry_point,
            "array",
            jsonbind_core::json_type_name(other).to_string(),
        )),
    }
}
