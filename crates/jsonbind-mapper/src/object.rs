//! # Record Field Loops
//!
//! Per-field mapping of a single record in both directions. For each field
//! of the registration, in declaration order:
//!
//! 1. Look the value up (native field name when serializing, JSON property
//!    name under the configured matching rule when deserializing).
//! 2. Absent: skip if the field is optional or required checks are off,
//!    fail otherwise.
//! 3. `null` with `export_null`: write `null` through.
//! 4. `null` on an optional field: leave it out.
//! 5. Otherwise run the field's custom converter, or the verifier against
//!    its shape, and write the result.
//!
//! The first failure aborts the record. Its path gains the field's JSON
//! property name on the way out.

use std::collections::{BTreeMap, HashMap};

use jsonbind_core::{
    json_type_name, FieldPath, Instance, MappingError, NativeValue, PathSegment,
    PropertyMatching,
};
use jsonbind_schema::{FieldMapping, TypeRegistration};
use serde_json::{Map, Value};

use crate::verify::{FromJson, Mapper, ToJson};

/// Native fields of a value being serialized as a record.
enum NativeFields<'v> {
    Record(&'v Instance),
    Map(&'v BTreeMap<String, NativeValue>),
}

impl<'v> NativeFields<'v> {
    fn of(value: &'v NativeValue) -> Option<Self> {
        match value {
            NativeValue::Record(instance) => Some(Self::Record(instance)),
            NativeValue::Map(map) => Some(Self::Map(map)),
            _ => None,
        }
    }

    fn get(&self, field: &str) -> Option<&'v NativeValue> {
        match self {
            Self::Record(instance) => instance.get(field),
            Self::Map(map) => map.get(field),
        }
    }
}

/// JSON property lookup under a [`PropertyMatching`] rule.
struct PropertyLookup<'j> {
    object: &'j Map<String, Value>,
    folded: Option<HashMap<String, &'j str>>,
}

impl<'j> PropertyLookup<'j> {
    fn new(object: &'j Map<String, Value>, matching: PropertyMatching) -> Self {
        let folded = match matching {
            PropertyMatching::Exact => None,
            PropertyMatching::CaseInsensitive => {
                let mut index = HashMap::with_capacity(object.len());
                for key in object.keys() {
                    index.entry(key.to_lowercase()).or_insert(key.as_str());
                }
                Some(index)
            }
        };
        Self { object, folded }
    }

    /// An exact key always wins; the folded index is only consulted without one.
    fn get(&self, json_name: &str) -> Option<&'j Value> {
        if let Some(value) = self.object.get(json_name) {
            return Some(value);
        }
        self.folded
            .as_ref()?
            .get(&json_name.to_lowercase())
            .and_then(|key| self.object.get(*key))
    }
}

fn missing(registration: &TypeRegistration, field: &FieldMapping) -> MappingError {
    MappingError::RequiredFieldMissing {
        path: FieldPath::root(),
        type_id: registration.type_id().to_string(),
        field: field.field_name().to_string(),
        json_name: field.json_property().to_string(),
    }
}

fn converter_failed(id: &str, message: String) -> MappingError {
    MappingError::ConversionFailed {
        path: FieldPath::root(),
        converter: id.to_string(),
        message,
    }
}

impl Mapper<'_> {
    fn skips_absent(&self, field: &FieldMapping) -> bool {
        field.is_optional() || self.config.ignore_required_check
    }

    /// Serialize `value` as a record of type `registration`.
    ///
    /// Only the declared fields are emitted; extra fields of a runtime
    /// subtype are dropped.
    pub(crate) fn serialize_fields(
        &self,
        registration: &TypeRegistration,
        value: &NativeValue,
        depth: usize,
    ) -> Result<Value, MappingError> {
        let source = NativeFields::of(value).ok_or_else(|| {
            MappingError::mismatch(
                registration.type_id().as_str(),
                value.type_name(),
                "expected a record instance",
            )
        })?;

        let mut out = Map::new();
        for field in registration.fields() {
            let json_name = field.json_property();
            let native = match source.get(field.field_name()) {
                Some(native) => native,
                None if self.skips_absent(field) => continue,
                None => {
                    return Err(missing(registration, field)
                        .at(PathSegment::Field(json_name.to_string())))
                }
            };
            if native.is_null() {
                if field.exports_null() {
                    out.insert(json_name.to_string(), Value::Null);
                    continue;
                }
                if field.is_optional() {
                    continue;
                }
            }
            let mapped = match field.custom_converter() {
                Some(conv) => conv
                    .converter()
                    .serialize(native)
                    .map_err(|e| converter_failed(conv.id(), e.0)),
                None => self.verify::<ToJson>(field.shape(), native, depth),
            }
            .map_err(|e| e.at(PathSegment::Field(json_name.to_string())))?;
            out.insert(json_name.to_string(), mapped);
        }
        Ok(Value::Object(out))
    }

    /// Deserialize the JSON object `value` into a fresh instance of `registration`.
    pub(crate) fn deserialize_fields(
        &self,
        registration: &TypeRegistration,
        value: &Value,
        depth: usize,
    ) -> Result<NativeValue, MappingError> {
        let Value::Object(object) = value else {
            return Err(MappingError::mismatch(
                registration.type_id().as_str(),
                json_type_name(value),
                "expected a JSON object",
            ));
        };
        let lookup = PropertyLookup::new(object, self.config.property_matching);

        let mut instance = Instance::new(registration.type_id().clone());
        for field in registration.fields() {
            let json_name = field.json_property();
            let json = match lookup.get(json_name) {
                Some(json) => json,
                None if self.skips_absent(field) => continue,
                None => {
                    return Err(missing(registration, field)
                        .at(PathSegment::Field(json_name.to_string())))
                }
            };
            if json.is_null() {
                if field.exports_null() {
                    instance.set(field.field_name(), NativeValue::Null);
                    continue;
                }
                if field.is_optional() {
                    continue;
                }
            }
            let mapped = match field.custom_converter() {
                Some(conv) => conv
                    .converter()
                    .deserialize(json)
                    .map_err(|e| converter_failed(conv.id(), e.0)),
                None => self.verify::<FromJson>(field.shape(), json, depth),
            }
            .map_err(|e| e.at(PathSegment::Field(json_name.to_string())))?;
            instance.set(field.field_name(), mapped);
        }
        Ok(NativeValue::Record(instance))
    }
}
