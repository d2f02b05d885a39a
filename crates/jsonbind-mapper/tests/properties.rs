//! Property tests for the mapping service: round-trips, null policy and
//! container autofill.

use std::sync::Arc;

use jsonbind_core::{
    ErrorKind, Instance, MappingConfig, NativeValue, NullPolicy, RecordTypeId, Shape,
};
use jsonbind_mapper::JsonConvert;
use jsonbind_schema::{FieldMapping, SchemaRegistry, TypeDeclaration};
use proptest::prelude::*;
use serde_json::{json, Value};

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
        .declare(
            TypeDeclaration::new("Shape")
                .field(FieldMapping::new("name", Shape::string()).json_name("shapeName"))
                .field(FieldMapping::new("closed", Shape::boolean()))
                .field(FieldMapping::new("note", Shape::string()).optional())
                .field(FieldMapping::new(
                    "outline",
                    Shape::array_of(Shape::record_named("Point").unwrap()),
                ))
                .field(FieldMapping::new(
                    "tiles",
                    Shape::array_of(Shape::array_of(Shape::number())),
                )),
        )
        .unwrap();
    registry
}

fn convert(config: MappingConfig) -> JsonConvert {
    JsonConvert::with_config(Arc::new(registry()), config)
}

fn type_id(id: &str) -> RecordTypeId {
    RecordTypeId::new(id).unwrap()
}

fn point() -> impl Strategy<Value = NativeValue> {
    (any::<i32>(), any::<i32>()).prop_map(|(x, y)| {
        Instance::new(type_id("Point"))
            .with("x", x)
            .with("y", y)
            .into()
    })
}

fn shape_record() -> impl Strategy<Value = NativeValue> {
    (
        "[a-zA-Z ]{0,12}",
        any::<bool>(),
        proptest::option::of("[a-z]{1,8}"),
        prop::collection::vec(point(), 0..5),
        prop::collection::vec(prop::collection::vec(any::<i64>(), 0..4), 0..4),
    )
        .prop_map(|(name, closed, note, outline, tiles)| {
            let mut instance = Instance::new(type_id("Shape"))
                .with("name", name)
                .with("closed", closed)
                .with("outline", outline)
                .with("tiles", tiles);
            if let Some(note) = note {
                instance.set("note", note);
            }
            instance.into()
        })
}

fn scalar_json() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z]{0,6}".prop_map(Value::from),
    ]
}

proptest! {
    /// Serializing then deserializing a well-formed record yields the same record.
    #[test]
    fn record_round_trip(record in shape_record()) {
        let svc = convert(MappingConfig::default());
        let json = svc.serialize_object(&record, None).unwrap();
        let back = svc.deserialize_object(&json, "Shape").unwrap();
        prop_assert_eq!(back, record);
    }

    /// Arrays of records round-trip element by element.
    #[test]
    fn array_round_trip(points in prop::collection::vec(point(), 0..8)) {
        let svc = convert(MappingConfig::default());
        let list = NativeValue::List(points);
        let json = svc.serialize_array(&list, Some("Point")).unwrap();
        prop_assert_eq!(json.as_array().map(Vec::len), list.as_list().map(<[_]>::len));
        let back = svc.deserialize_array(&json, "Point").unwrap();
        prop_assert_eq!(back, list);
    }

    /// Under DisallowNull, null is rejected for every shape kind.
    #[test]
    fn disallow_null_rejects_everywhere(field in 0usize..4) {
        let svc = convert(MappingConfig::default().with_null_policy(NullPolicy::DisallowNull));
        let mut json = json!({
            "shapeName": "s", "closed": true,
            "outline": [{"x": 1, "y": 2}], "tiles": [[1]]
        });
        match field {
            0 => json["shapeName"] = Value::Null,
            1 => json["outline"] = Value::Null,
            2 => json["outline"][0] = Value::Null,
            _ => json["tiles"][0] = Value::Null,
        }
        let err = svc.deserialize_object(&json, "Shape").unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::NullNotAllowed);
    }

    /// Under AllowNull, null never raises NullNotAllowed.
    #[test]
    fn allow_null_accepts_everywhere(field in 0usize..4) {
        let svc = convert(MappingConfig::default().with_null_policy(NullPolicy::AllowNull));
        let mut json = json!({
            "shapeName": "s", "closed": true,
            "outline": [{"x": 1, "y": 2}], "tiles": [[1]]
        });
        match field {
            0 => json["shapeName"] = Value::Null,
            1 => json["outline"] = Value::Null,
            2 => json["outline"][0] = Value::Null,
            _ => json["tiles"][0] = Value::Null,
        }
        prop_assert!(svc.deserialize_object(&json, "Shape").is_ok());
    }

    /// The intermediate policy accepts null records and containers but not primitives.
    #[test]
    fn object_null_policy_splits_on_shape(field in 0usize..4) {
        let svc = convert(MappingConfig::default());
        let mut json = json!({
            "shapeName": "s", "closed": true,
            "outline": [{"x": 1, "y": 2}], "tiles": [[1]]
        });
        match field {
            0 => json["shapeName"] = Value::Null,
            1 => json["outline"] = Value::Null,
            2 => json["outline"][0] = Value::Null,
            _ => json["tiles"][0] = Value::Null,
        }
        let result = svc.deserialize_object(&json, "Shape");
        if field == 0 {
            prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::NullNotAllowed);
        } else {
            prop_assert!(result.is_ok());
        }
    }

    /// One declared element shape checks every element; a bad element is
    /// reported at its own index.
    #[test]
    fn autofill_checks_every_position(len in 1usize..12, bad in 0usize..12) {
        let svc = convert(MappingConfig::default());
        let shape = Shape::array_of(Shape::number());
        let mut items: Vec<Value> = (0..len).map(|i| json!(i)).collect();
        prop_assert!(svc.verify_json(&shape, &Value::Array(items.clone())).is_ok());

        let bad = bad % len;
        items[bad] = json!("x");
        let err = svc.verify_json(&shape, &Value::Array(items)).unwrap_err();
        prop_assert_eq!(err.path().to_string(), format!("[{bad}]"));
    }

    /// Opaque containers return their input unchanged.
    #[test]
    fn opaque_container_is_identity(items in prop::collection::vec(scalar_json(), 0..8)) {
        let svc = convert(MappingConfig::default());
        let value = Value::Array(items);
        let out = svc.verify_json(&Shape::opaque_array(), &value).unwrap();
        prop_assert_eq!(out.to_json(), value);
    }
}
