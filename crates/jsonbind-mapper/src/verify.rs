//! # Type Verifier
//!
//! Checks one value against one [`Shape`] and produces the mapped value,
//! recursing through containers and nested records.
//!
//! The algorithm is written once and instantiated for both directions
//! through the [`Direction`] trait:
//!
//! | Direction | Input | Output |
//! |---|---|---|
//! | [`ToJson`] | [`NativeValue`] | [`serde_json::Value`] |
//! | [`FromJson`] | [`serde_json::Value`] | [`NativeValue`] |
//!
//! ## Rules
//!
//! - `Any` passes the value through, `null` included.
//! - `Primitive` accepts `null` only under [`NullPolicy::AllowNull`]. A
//!   value of the wrong kind fails unless primitive checks are disabled.
//! - `Record` and `Container` accept `null` unless the policy is
//!   [`NullPolicy::DisallowNull`].
//! - Containers follow the runtime value: a sequence is walked by index, a
//!   mapping by key, whatever arity was declared. Element shapes are taken
//!   positionally and the last one repeats when autofill is on.
//! - `Custom` shapes are dispatched by the field loop before the verifier
//!   runs. Reaching one here is a type mismatch.
//!
//! Errors are created with an empty path; each container frame prepends
//! its index or key as the error unwinds.

use jsonbind_core::{
    json_type_name, ContainerShape, MappingConfig, MappingError, NativeValue, NullPolicy,
    PathSegment, PrimitiveKind, RecordTypeId, Shape,
};
use jsonbind_schema::{SchemaRegistry, TypeRegistration};
use serde_json::Value;
use std::sync::Arc;

// ─── Directions ──────────────────────────────────────────────────────

/// Elements of a container value, in iteration order.
pub enum Elements<'v, I> {
    /// Array-like value.
    Sequence(&'v [I]),
    /// Map-like value.
    Mapping(Vec<(&'v str, &'v I)>),
}

/// One direction of the mapping: what goes in, what comes out.
pub trait Direction {
    /// Value being verified.
    type Input;
    /// Value produced.
    type Output;

    /// Name used in traces.
    const NAME: &'static str;

    /// Whether `value` is `null`.
    fn is_null(value: &Self::Input) -> bool;

    /// The output `null`.
    fn null() -> Self::Output;

    /// Runtime type description for diagnostics.
    fn type_name(value: &Self::Input) -> String;

    /// Whether `value` is a primitive of `kind`.
    fn is_kind(kind: PrimitiveKind, value: &Self::Input) -> bool;

    /// Structural conversion without verification.
    fn pass_through(value: &Self::Input) -> Self::Output;

    /// Container elements, or `None` for scalars.
    fn elements(value: &Self::Input) -> Option<Elements<'_, Self::Input>>;

    /// Assemble a sequence output.
    fn sequence(items: Vec<Self::Output>) -> Self::Output;

    /// Assemble a mapping output.
    fn mapping(entries: Vec<(String, Self::Output)>) -> Self::Output;

    /// Map a nested record of type `registration`.
    ///
    /// # Errors
    ///
    /// Any [`MappingError`] raised by the record's field loop.
    fn record(
        mapper: &Mapper<'_>,
        registration: &TypeRegistration,
        value: &Self::Input,
        depth: usize,
    ) -> Result<Self::Output, MappingError>;
}

/// Native values to JSON.
#[derive(Debug, Clone, Copy)]
pub struct ToJson;

/// JSON to native values.
#[derive(Debug, Clone, Copy)]
pub struct FromJson;

impl Direction for ToJson {
    type Input = NativeValue;
    type Output = Value;

    const NAME: &'static str = "serialize";

    fn is_null(value: &NativeValue) -> bool {
        value.is_null()
    }

    fn null() -> Value {
        Value::Null
    }

    fn type_name(value: &NativeValue) -> String {
        value.type_name()
    }

    fn is_kind(kind: PrimitiveKind, value: &NativeValue) -> bool {
        matches!(
            (kind, value),
            (PrimitiveKind::String, NativeValue::String(_))
                | (PrimitiveKind::Number, NativeValue::Number(_))
                | (PrimitiveKind::Boolean, NativeValue::Bool(_))
        )
    }

    fn pass_through(value: &NativeValue) -> Value {
        value.to_json()
    }

    fn elements(value: &NativeValue) -> Option<Elements<'_, NativeValue>> {
        match value {
            NativeValue::List(items) => Some(Elements::Sequence(items)),
            NativeValue::Map(map) => Some(Elements::Mapping(
                map.iter().map(|(k, v)| (k.as_str(), v)).collect(),
            )),
            NativeValue::Record(instance) => Some(Elements::Mapping(instance.fields().collect())),
            _ => None,
        }
    }

    fn sequence(items: Vec<Value>) -> Value {
        Value::Array(items)
    }

    fn mapping(entries: Vec<(String, Value)>) -> Value {
        Value::Object(entries.into_iter().collect())
    }

    fn record(
        mapper: &Mapper<'_>,
        registration: &TypeRegistration,
        value: &NativeValue,
        depth: usize,
    ) -> Result<Value, MappingError> {
        mapper.serialize_fields(registration, value, depth)
    }
}

impl Direction for FromJson {
    type Input = Value;
    type Output = NativeValue;

    const NAME: &'static str = "deserialize";

    fn is_null(value: &Value) -> bool {
        value.is_null()
    }

    fn null() -> NativeValue {
        NativeValue::Null
    }

    fn type_name(value: &Value) -> String {
        json_type_name(value).to_string()
    }

    fn is_kind(kind: PrimitiveKind, value: &Value) -> bool {
        matches!(
            (kind, value),
            (PrimitiveKind::String, Value::String(_))
                | (PrimitiveKind::Number, Value::Number(_))
                | (PrimitiveKind::Boolean, Value::Bool(_))
        )
    }

    fn pass_through(value: &Value) -> NativeValue {
        NativeValue::from_json(value)
    }

    fn elements(value: &Value) -> Option<Elements<'_, Value>> {
        match value {
            Value::Array(items) => Some(Elements::Sequence(items)),
            Value::Object(map) => Some(Elements::Mapping(
                map.iter().map(|(k, v)| (k.as_str(), v)).collect(),
            )),
            _ => None,
        }
    }

    fn sequence(items: Vec<NativeValue>) -> NativeValue {
        NativeValue::List(items)
    }

    fn mapping(entries: Vec<(String, NativeValue)>) -> NativeValue {
        NativeValue::Map(entries.into_iter().collect())
    }

    fn record(
        mapper: &Mapper<'_>,
        registration: &TypeRegistration,
        value: &Value,
        depth: usize,
    ) -> Result<NativeValue, MappingError> {
        mapper.deserialize_fields(registration, value, depth)
    }
}

// ─── Mapper ──────────────────────────────────────────────────────────

/// State of one mapping call: the registry and a configuration snapshot.
///
/// Created by the mapping service at the start of every public call and
/// dropped when the call returns.
#[derive(Debug, Clone, Copy)]
pub struct Mapper<'a> {
    pub(crate) registry: &'a SchemaRegistry,
    pub(crate) config: MappingConfig,
}

impl<'a> Mapper<'a> {
    pub(crate) fn new(registry: &'a SchemaRegistry, config: MappingConfig) -> Self {
        Self { registry, config }
    }

    /// The configuration snapshot this call runs with.
    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    /// Verify `value` against `shape`, mapping it in direction `D`.
    ///
    /// `depth` is the number of records and containers already entered.
    ///
    /// # Errors
    ///
    /// The first [`MappingError`] found, with its path relative to `value`.
    pub fn verify<D: Direction>(
        &self,
        shape: &Shape,
        value: &D::Input,
        depth: usize,
    ) -> Result<D::Output, MappingError> {
        if shape.is_object_like() && D::is_null(value) {
            return self.object_null::<D>(shape);
        }
        match shape {
            Shape::Any => Ok(D::pass_through(value)),
            Shape::Primitive(kind) => self.verify_primitive::<D>(*kind, value),
            Shape::Record(type_id) => {
                let registration = self.registration(type_id.as_str())?;
                D::record(self, &registration, value, self.enter(depth)?)
            }
            Shape::Container(container) => {
                self.verify_container::<D>(shape, container, value, depth)
            }
            Shape::Custom(id) => Err(MappingError::mismatch(
                shape.to_string(),
                D::type_name(value),
                format!("unrecognized shape: converter '{id}' is only applied to record fields"),
            )),
        }
    }

    fn verify_primitive<D: Direction>(
        &self,
        kind: PrimitiveKind,
        value: &D::Input,
    ) -> Result<D::Output, MappingError> {
        if D::is_null(value) {
            return match self.config.null_policy {
                NullPolicy::AllowNull => Ok(D::null()),
                _ => Err(MappingError::null_not_allowed(kind.as_str())),
            };
        }
        if D::is_kind(kind, value) || self.config.ignore_primitive_checks {
            return Ok(D::pass_through(value));
        }
        Err(MappingError::mismatch(
            kind.as_str(),
            D::type_name(value),
            "primitive kind differs",
        ))
    }

    fn verify_container<D: Direction>(
        &self,
        shape: &Shape,
        container: &ContainerShape,
        value: &D::Input,
        depth: usize,
    ) -> Result<D::Output, MappingError> {
        let Some(elements) = D::elements(value) else {
            return Err(MappingError::mismatch(
                shape.to_string(),
                D::type_name(value),
                "expected array or map, got scalar",
            ));
        };
        if container.is_opaque() {
            return Ok(D::pass_through(value));
        }
        let depth = self.enter(depth)?;

        match elements {
            Elements::Sequence(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let mapped = self
                        .verify_element::<D>(shape, container, i, item, depth)
                        .map_err(|e| e.at(PathSegment::Index(i)))?;
                    out.push(mapped);
                }
                Ok(D::sequence(out))
            }
            Elements::Mapping(entries) => {
                let mut out = Vec::with_capacity(entries.len());
                for (i, (key, item)) in entries.into_iter().enumerate() {
                    let mapped = self
                        .verify_element::<D>(shape, container, i, item, depth)
                        .map_err(|e| e.at(PathSegment::Key(key.to_string())))?;
                    out.push((key.to_string(), mapped));
                }
                Ok(D::mapping(out))
            }
        }
    }

    fn verify_element<D: Direction>(
        &self,
        shape: &Shape,
        container: &ContainerShape,
        position: usize,
        item: &D::Input,
        depth: usize,
    ) -> Result<D::Output, MappingError> {
        match container.shape_for(position) {
            Some(element) => self.verify::<D>(element, item, depth),
            None => Err(MappingError::mismatch(
                shape.to_string(),
                D::type_name(item),
                "container has more elements than declared shapes",
            )),
        }
    }

    fn object_null<D: Direction>(&self, shape: &Shape) -> Result<D::Output, MappingError> {
        match self.config.null_policy {
            NullPolicy::DisallowNull => Err(MappingError::null_not_allowed(shape.to_string())),
            NullPolicy::AllowNull | NullPolicy::AllowObjectNull => Ok(D::null()),
        }
    }

    /// Whether the null policy admits `null` for a record or container.
    pub(crate) fn allows_object_null(&self) -> bool {
        self.config.null_policy != NullPolicy::DisallowNull
    }

    /// Look up a registration, failing for unregistered types.
    pub(crate) fn registration(
        &self,
        type_id: &str,
    ) -> Result<Arc<TypeRegistration>, MappingError> {
        self.registry
            .get(type_id)
            .cloned()
            .ok_or_else(|| MappingError::UnregisteredType {
                path: Default::default(),
                type_id: type_id.to_string(),
            })
    }

    /// Step one level deeper, enforcing the configured depth limit.
    pub(crate) fn enter(&self, depth: usize) -> Result<usize, MappingError> {
        let next = depth + 1;
        match self.config.max_depth {
            Some(limit) if next > limit => Err(MappingError::DepthLimitExceeded {
                path: Default::default(),
                limit,
            }),
            _ => Ok(next),
        }
    }
}

/// Record type named by a record value, if it carries one.
pub(crate) fn runtime_type(value: &NativeValue) -> Option<&RecordTypeId> {
    value.as_record().map(|instance| instance.type_id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonbind_core::{ErrorKind, OperationMode};
    use jsonbind_schema::{FieldMapping, TypeDeclaration};
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry
            .declare(
                TypeDeclaration::new("Point")
                    .field(FieldMapping::new("x", Shape::number()))
                    .field(FieldMapping::new("y", Shape::number())),
            )
            .unwrap();
        registry
    }

    fn with<R>(config: MappingConfig, f: impl FnOnce(&Mapper<'_>) -> R) -> R {
        let registry = registry();
        f(&Mapper::new(&registry, config))
    }

    fn point() -> Shape {
        Shape::record_named("Point").unwrap()
    }

    #[test]
    fn test_any_passes_everything() {
        with(MappingConfig::default(), |m| {
            let v = json!([1, "two", null, {"x": 3}]);
            let out = m.verify::<FromJson>(&Shape::Any, &v, 0).unwrap();
            assert_eq!(out.to_json(), v);
            assert!(m.verify::<FromJson>(&Shape::Any, &Value::Null, 0).unwrap().is_null());
        });
    }

    #[test]
    fn test_primitive_kind_mismatch() {
        with(MappingConfig::default(), |m| {
            let err = m
                .verify::<FromJson>(&Shape::number(), &json!("1"), 0)
                .unwrap_err();
            assert_eq!(
                err,
                MappingError::mismatch("number", "string", "primitive kind differs")
            );
        });
    }

    #[test]
    fn test_ignore_primitive_checks() {
        let config = MappingConfig::default().with_ignore_primitive_checks(true);
        with(config, |m| {
            let out = m.verify::<FromJson>(&Shape::number(), &json!("1"), 0).unwrap();
            assert_eq!(out, NativeValue::from("1"));
        });
    }

    #[test]
    fn test_primitive_null_depends_on_policy() {
        for (policy, allowed) in [
            (NullPolicy::AllowNull, true),
            (NullPolicy::AllowObjectNull, false),
            (NullPolicy::DisallowNull, false),
        ] {
            let config = MappingConfig::default().with_null_policy(policy);
            with(config, |m| {
                let result = m.verify::<ToJson>(&Shape::string(), &NativeValue::Null, 0);
                assert_eq!(result.is_ok(), allowed, "{policy:?}");
            });
        }
    }

    #[test]
    fn test_record_null_rejected_only_by_disallow() {
        for (policy, allowed) in [
            (NullPolicy::AllowNull, true),
            (NullPolicy::AllowObjectNull, true),
            (NullPolicy::DisallowNull, false),
        ] {
            let config = MappingConfig::default().with_null_policy(policy);
            with(config, |m| {
                let record = m.verify::<FromJson>(&point(), &Value::Null, 0);
                let list = m.verify::<FromJson>(&Shape::array_of(Shape::number()), &Value::Null, 0);
                assert_eq!(record.is_ok(), allowed);
                assert_eq!(list.is_ok(), allowed);
                if !allowed {
                    assert_eq!(record.unwrap_err().kind(), ErrorKind::NullNotAllowed);
                }
            });
        }
    }

    #[test]
    fn test_object_null_policy_covers_nested_positions_both_ways() {
        let grid = Shape::array_of(Shape::array_of(Shape::number()));
        let config = MappingConfig::default().with_null_policy(NullPolicy::AllowObjectNull);
        with(config, |m| {
            let out = m.verify::<FromJson>(&grid, &json!([[1], null]), 0).unwrap();
            assert_eq!(out.to_json(), json!([[1], null]));
            let native = NativeValue::List(vec![NativeValue::Null]);
            assert_eq!(m.verify::<ToJson>(&grid, &native, 0).unwrap(), json!([null]));
            let err = m.verify::<FromJson>(&grid, &json!([[1, null]]), 0).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NullNotAllowed);
            assert_eq!(err.path().to_string(), "[0][1]");
        });
        let config = MappingConfig::default().with_null_policy(NullPolicy::DisallowNull);
        with(config, |m| {
            let native = NativeValue::List(vec![NativeValue::Null]);
            let err = m.verify::<ToJson>(&grid, &native, 0).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NullNotAllowed);
            assert_eq!(err.path().to_string(), "[0]");
        });
    }

    #[test]
    fn test_container_rejects_scalar() {
        with(MappingConfig::default(), |m| {
            let err = m
                .verify::<FromJson>(&Shape::array_of(Shape::number()), &json!(5), 0)
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::TypeMismatch);
            assert!(err.to_string().contains("got scalar"));
        });
    }

    #[test]
    fn test_empty_container_keeps_runtime_arity() {
        with(MappingConfig::default(), |m| {
            let shape = Shape::array_of(Shape::number());
            assert_eq!(
                m.verify::<FromJson>(&shape, &json!({}), 0).unwrap(),
                NativeValue::Map(Default::default())
            );
            assert_eq!(
                m.verify::<FromJson>(&shape, &json!([]), 0).unwrap(),
                NativeValue::List(Vec::new())
            );
        });
    }

    #[test]
    fn test_autofill_positions() {
        with(MappingConfig::default(), |m| {
            let shape = Shape::tuple(vec![Shape::string(), Shape::number()]);
            assert!(m.verify::<FromJson>(&shape, &json!(["a", 1, 2, 3]), 0).is_ok());
            let err = m
                .verify::<FromJson>(&shape, &json!(["a", 1, "b"]), 0)
                .unwrap_err();
            assert_eq!(err.path().to_string(), "[2]");
        });
    }

    #[test]
    fn test_strict_tuple_overflow() {
        with(MappingConfig::default(), |m| {
            let shape = Shape::strict_tuple(vec![Shape::string(), Shape::number()]);
            assert!(m.verify::<FromJson>(&shape, &json!(["a", 1]), 0).is_ok());
            let err = m
                .verify::<FromJson>(&shape, &json!(["a", 1, 2]), 0)
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::TypeMismatch);
            assert!(err.to_string().contains("more elements than declared"));
        });
    }

    #[test]
    fn test_map_values_verified_by_key() {
        with(MappingConfig::default(), |m| {
            let shape = Shape::map_of(Shape::number());
            let err = m
                .verify::<FromJson>(&shape, &json!({"a": 1, "b": "x"}), 0)
                .unwrap_err();
            assert_eq!(err.path().to_string(), "[b]");
        });
    }

    #[test]
    fn test_array_shape_follows_runtime_map() {
        with(MappingConfig::default(), |m| {
            let out = m
                .verify::<ToJson>(
                    &Shape::array_of(Shape::number()),
                    &NativeValue::Map([("k".to_string(), NativeValue::from(1))].into()),
                    0,
                )
                .unwrap();
            assert_eq!(out, json!({"k": 1}));
        });
    }

    #[test]
    fn test_opaque_container_passes_through() {
        with(MappingConfig::default(), |m| {
            let v = json!([1, "two", {"x": 3}]);
            let out = m.verify::<FromJson>(&Shape::opaque_array(), &v, 0).unwrap();
            assert_eq!(out.to_json(), v);
        });
    }

    #[test]
    fn test_nested_record_in_container() {
        with(MappingConfig::default(), |m| {
            let shape = Shape::array_of(Shape::array_of(point()));
            let err = m
                .verify::<FromJson>(&shape, &json!([[{"x": 1, "y": 2}], [{"x": 1, "y": true}]]), 0)
                .unwrap_err();
            assert_eq!(err.path().to_string(), "[1][0].y");
        });
    }

    #[test]
    fn test_unregistered_record_type() {
        with(MappingConfig::default(), |m| {
            let shape = Shape::record_named("Nowhere").unwrap();
            let err = m.verify::<FromJson>(&shape, &json!({}), 0).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnregisteredType);
        });
    }

    #[test]
    fn test_nested_custom_shape_is_mismatch() {
        with(MappingConfig::default(), |m| {
            let shape = Shape::array_of(Shape::custom("number-as-string"));
            let err = m.verify::<FromJson>(&shape, &json!(["1"]), 0).unwrap_err();
            assert!(err.to_string().contains("unrecognized shape"));
        });
    }

    #[test]
    fn test_depth_limit() {
        let config = MappingConfig::default().with_max_depth(Some(2));
        with(config, |m| {
            let shape = Shape::array_of(Shape::array_of(Shape::array_of(Shape::number())));
            let err = m.verify::<FromJson>(&shape, &json!([[[1]]]), 0).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::DepthLimitExceeded);
            assert_eq!(err.path().to_string(), "[0][0]");
            assert!(m.verify::<FromJson>(&shape, &json!([[]]), 0).is_ok());
        });
    }

    #[test]
    fn test_mode_is_not_consulted_by_verifier() {
        let config = MappingConfig::default().with_operation_mode(OperationMode::Disabled);
        with(config, |m| {
            assert!(m.verify::<FromJson>(&Shape::number(), &json!("x"), 0).is_err());
        });
    }
}
