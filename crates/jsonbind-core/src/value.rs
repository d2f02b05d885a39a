//! # Native Value Model
//!
//! The in-memory, application-side representation the engine maps JSON to
//! and from. A [`NativeValue`] is a tree of primitives, lists, string-keyed
//! maps and record [`Instance`]s. An instance carries its record type id and
//! a table of field values; a field missing from the table is an absent
//! (never assigned) field, distinct from a field holding `Null`.
//!
//! Typed Rust structs move in and out of this model through the
//! [`FromNative`] trait and the `From` conversions defined here.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Number, Value};

use crate::error::MappingError;
use crate::identity::{FieldPath, PathSegment, RecordTypeId};

/// An application-side value.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    /// Explicit null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Number, integer or floating point.
    Number(Number),
    /// String.
    String(String),
    /// Instance of a registered record type.
    Record(Instance),
    /// Ordered sequence.
    List(Vec<NativeValue>),
    /// String-keyed mapping.
    Map(BTreeMap<String, NativeValue>),
}

impl NativeValue {
    /// Whether this is [`NativeValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Runtime type description used in diagnostics. Records report their type id.
    pub fn type_name(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(_) => "boolean".to_string(),
            Self::Number(_) => "number".to_string(),
            Self::String(_) => "string".to_string(),
            Self::Record(instance) => instance.type_id().to_string(),
            Self::List(_) => "array".to_string(),
            Self::Map(_) => "object".to_string(),
        }
    }

    /// Structural conversion from JSON. Objects become maps, never records.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::Number(n.clone()),
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Structural conversion to JSON. Records become objects keyed by native
    /// field name, without consulting any schema.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<String, Value>>(),
            ),
            Self::Record(instance) => Value::Object(
                instance
                    .fields()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }

    /// The boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The number as `f64`, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// The number as `i64`, if this is an integer that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// The record instance, if this is one.
    pub fn as_record(&self) -> Option<&Instance> {
        match self {
            Self::Record(instance) => Some(instance),
            _ => None,
        }
    }

    /// The list, if this is one.
    pub fn as_list(&self) -> Option<&[NativeValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// The map, if this is one.
    pub fn as_map(&self) -> Option<&BTreeMap<String, NativeValue>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl fmt::Display for NativeValue {
    /// Compact JSON text of the structural conversion.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// Runtime type description of a JSON value.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ─── Record Instances ────────────────────────────────────────────────

/// An instance of a record type: its type id plus assigned field values.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    type_id: RecordTypeId,
    fields: BTreeMap<String, NativeValue>,
}

impl Instance {
    /// A fresh instance with no fields assigned.
    pub fn new(type_id: RecordTypeId) -> Self {
        Self {
            type_id,
            fields: BTreeMap::new(),
        }
    }

    /// The record type this instance belongs to.
    pub fn type_id(&self) -> &RecordTypeId {
        &self.type_id
    }

    /// Value of a field; `None` if the field was never assigned.
    pub fn get(&self, field: &str) -> Option<&NativeValue> {
        self.fields.get(field)
    }

    /// Whether a field has been assigned (possibly to `Null`).
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Assign a field, returning the previous value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<NativeValue>) -> Option<NativeValue> {
        self.fields.insert(field.into(), value.into())
    }

    /// Builder-style [`Instance::set`].
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<NativeValue>) -> Self {
        self.set(field, value);
        self
    }

    /// Unassign a field, returning its value.
    pub fn remove(&mut self, field: &str) -> Option<NativeValue> {
        self.fields.remove(field)
    }

    /// Assigned fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &NativeValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of assigned fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field is assigned.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Extract a typed field value.
    ///
    /// An unassigned field yields `T`'s absent value (`None` for `Option<T>`)
    /// or [`MappingError::RequiredFieldMissing`] when `T` has none.
    ///
    /// # Errors
    ///
    /// Propagates [`FromNative`] errors with the field name prepended to the path.
    pub fn read<T: FromNative>(&self, field: &str) -> Result<T, MappingError> {
        match self.fields.get(field) {
            Some(value) => {
                T::from_native(value).map_err(|e| e.at(PathSegment::Field(field.to_string())))
            }
            None => T::from_absent().ok_or_else(|| MappingError::RequiredFieldMissing {
                path: FieldPath::from(vec![PathSegment::Field(field.to_string())]),
                type_id: self.type_id.to_string(),
                field: field.to_string(),
                json_name: field.to_string(),
            }),
        }
    }
}

// ─── Conversions Into the Native Model ───────────────────────────────

impl From<bool> for NativeValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for NativeValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for NativeValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Number> for NativeValue {
    fn from(n: Number) -> Self {
        Self::Number(n)
    }
}

macro_rules! native_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for NativeValue {
                fn from(n: $t) -> Self {
                    Self::Number(Number::from(n))
                }
            }
        )*
    };
}

native_from_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl From<f64> for NativeValue {
    /// Non-finite floats have no JSON representation and become `Null`.
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(Self::Null, Self::Number)
    }
}

impl From<f32> for NativeValue {
    fn from(n: f32) -> Self {
        Self::from(f64::from(n))
    }
}

impl From<Instance> for NativeValue {
    fn from(instance: Instance) -> Self {
        Self::Record(instance)
    }
}

impl<T: Into<NativeValue>> From<Vec<T>> for NativeValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<NativeValue>> From<BTreeMap<String, T>> for NativeValue {
    fn from(map: BTreeMap<String, T>) -> Self {
        Self::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<NativeValue>> From<Option<T>> for NativeValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

// ─── Conversions Out of the Native Model ─────────────────────────────

/// Typed extraction from a [`NativeValue`].
pub trait FromNative: Sized {
    /// Convert a present value.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::TypeMismatch`] when the value has the wrong kind.
    fn from_native(value: &NativeValue) -> Result<Self, MappingError>;

    /// Value to use when the field is absent. `None` makes the field required.
    fn from_absent() -> Option<Self> {
        None
    }
}

fn wrong_kind(expected: &str, value: &NativeValue) -> MappingError {
    MappingError::mismatch(expected, value.type_name(), "native value has a different kind")
}

impl FromNative for NativeValue {
    fn from_native(value: &NativeValue) -> Result<Self, MappingError> {
        Ok(value.clone())
    }
}

impl FromNative for bool {
    fn from_native(value: &NativeValue) -> Result<Self, MappingError> {
        value.as_bool().ok_or_else(|| wrong_kind("boolean", value))
    }
}

impl FromNative for String {
    fn from_native(value: &NativeValue) -> Result<Self, MappingError> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| wrong_kind("string", value))
    }
}

impl FromNative for f64 {
    fn from_native(value: &NativeValue) -> Result<Self, MappingError> {
        value.as_f64().ok_or_else(|| wrong_kind("number", value))
    }
}

macro_rules! from_native_int {
    ($($t:ty),*) => {
        $(
            impl FromNative for $t {
                fn from_native(value: &NativeValue) -> Result<Self, MappingError> {
                    let NativeValue::Number(n) = value else {
                        return Err(wrong_kind("number", value));
                    };
                    n.as_i64()
                        .and_then(|i| <$t>::try_from(i).ok())
                        .or_else(|| n.as_u64().and_then(|u| <$t>::try_from(u).ok()))
                        .ok_or_else(|| {
                            MappingError::mismatch(
                                stringify!($t),
                                format!("number {n}"),
                                "number is not an integer in range",
                            )
                        })
                }
            }
        )*
    };
}

from_native_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl FromNative for Instance {
    fn from_native(value: &NativeValue) -> Result<Self, MappingError> {
        value
            .as_record()
            .cloned()
            .ok_or_else(|| wrong_kind("record", value))
    }
}

impl<T: FromNative> FromNative for Option<T> {
    fn from_native(value: &NativeValue) -> Result<Self, MappingError> {
        match value {
            NativeValue::Null => Ok(None),
            other => T::from_native(other).map(Some),
        }
    }

    fn from_absent() -> Option<Self> {
        Some(None)
    }
}

impl<T: FromNative> FromNative for Vec<T> {
    fn from_native(value: &NativeValue) -> Result<Self, MappingError> {
        let items = value.as_list().ok_or_else(|| wrong_kind("array", value))?;
        items
            .iter()
            .enumerate()
            .map(|(i, item)| T::from_native(item).map_err(|e| e.at(PathSegment::Index(i))))
            .collect()
    }
}

impl<T: FromNative> FromNative for BTreeMap<String, T> {
    fn from_native(value: &NativeValue) -> Result<Self, MappingError> {
        let map = value.as_map().ok_or_else(|| wrong_kind("object", value))?;
        map.iter()
            .map(|(k, v)| {
                T::from_native(v)
                    .map(|t| (k.clone(), t))
                    .map_err(|e| e.at(PathSegment::Key(k.clone())))
            })
            .collect()
    }
}
