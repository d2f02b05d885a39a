//! # Typed Records
//!
//! Bridges ordinary Rust structs and the reflective [`Instance`] model. A
//! struct implementing [`JsonRecord`] supplies its schema declaration and a
//! pair of conversions; the mapping service does the rest.
//!
//! ```ignore
//! struct Point { x: f64, y: f64 }
//!
//! impl JsonRecord for Point {
//!     const TYPE_ID: &'static str = "Point";
//!
//!     fn declare() -> TypeDeclaration {
//!         TypeDeclaration::new(Self::TYPE_ID)
//!             .field(FieldMapping::new("x", Shape::number()))
//!             .field(FieldMapping::new("y", Shape::number()))
//!     }
//!
//!     fn to_instance(&self) -> Instance {
//!         Self::new_instance().with("x", self.x).with("y", self.y)
//!     }
//!
//!     fn from_instance(instance: &Instance) -> Result<Self, MappingError> {
//!         Ok(Self { x: instance.read("x")?, y: instance.read("y")? })
//!     }
//! }
//! ```

use jsonbind_core::{FieldPath, Instance, MappingError, NativeValue, PathSegment, RecordTypeId};

use crate::registry::TypeDeclaration;

/// A Rust type with a registered JSON schema.
pub trait JsonRecord: Sized {
    /// Stable record type identifier.
    const TYPE_ID: &'static str;

    /// Schema declaration for this type.
    fn declare() -> TypeDeclaration;

    /// Convert to a native instance.
    fn to_instance(&self) -> Instance;

    /// Build from a native instance.
    ///
    /// # Errors
    ///
    /// Returns a [`MappingError`] when a field is missing or has the wrong kind.
    fn from_instance(instance: &Instance) -> Result<Self, MappingError>;

    /// The type identifier as a [`RecordTypeId`].
    fn record_type_id() -> RecordTypeId {
        RecordTypeId::from_static(Self::TYPE_ID)
    }

    /// A fresh, empty instance of this type.
    fn new_instance() -> Instance {
        Instance::new(Self::record_type_id())
    }

    /// Convert to a native value.
    fn to_native(&self) -> NativeValue {
        NativeValue::Record(self.to_instance())
    }

    /// Build from a native value. A map keyed by native field names is read
    /// as an instance of this type.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::TypeMismatch`] for values that are neither
    /// records nor maps.
    fn from_native(value: &NativeValue) -> Result<Self, MappingError> {
        match value {
            NativeValue::Record(instance) => Self::from_instance(instance),
            NativeValue::Map(map) => {
                let mut instance = Self::new_instance();
                for (field, value) in map {
                    instance.set(field.clone(), value.clone());
                }
                Self::from_instance(&instance)
            }
            other => Err(MappingError::mismatch(
                Self::TYPE_ID,
                other.type_name(),
                "expected a record instance",
            )),
        }
    }
}

fn in_field(field: &str) -> impl FnOnce(MappingError) -> MappingError + '_ {
    move |e| e.at(PathSegment::Field(field.to_string()))
}

fn missing(instance: &Instance, field: &str) -> MappingError {
    MappingError::RequiredFieldMissing {
        path: FieldPath::from(vec![PathSegment::Field(field.to_string())]),
        type_id: instance.type_id().to_string(),
        field: field.to_string(),
        json_name: field.to_string(),
    }
}

/// Read a required nested record field.
///
/// # Errors
///
/// [`MappingError::RequiredFieldMissing`] if unassigned, or the nested
/// conversion error with `field` prepended to its path.
pub fn read_record<T: JsonRecord>(instance: &Instance, field: &str) -> Result<T, MappingError> {
    let value = instance
        .get(field)
        .ok_or_else(|| missing(instance, field))?;
    T::from_native(value).map_err(in_field(field))
}

/// Read an optional nested record field. Absent and `null` both yield `None`.
///
/// # Errors
///
/// The nested conversion error with `field` prepended to its path.
pub fn read_optional_record<T: JsonRecord>(
    instance: &Instance,
    field: &str,
) -> Result<Option<T>, MappingError> {
    match instance.get(field) {
        None | Some(NativeValue::Null) => Ok(None),
        Some(value) => T::from_native(value).map(Some).map_err(in_field(field)),
    }
}

/// Read a required list-of-records field.
///
/// # Errors
///
/// [`MappingError::RequiredFieldMissing`] if unassigned,
/// [`MappingError::TypeMismatch`] if not a list, or the first element error.
pub fn read_records<T: JsonRecord>(instance: &Instance, field: &str) -> Result<Vec<T>, MappingError> {
    let value = instance
        .get(field)
        .ok_or_else(|| missing(instance, field))?;
    let items = value.as_list().ok_or_else(|| {
        MappingError::mismatch(
            format!("[{}]", T::TYPE_ID),
            value.type_name(),
            "expected a list of records",
        )
        .at(PathSegment::Field(field.to_string()))
    })?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            T::from_native(item)
                .map_err(|e| e.at(PathSegment::Index(i)).at(PathSegment::Field(field.to_string())))
        })
        .collect()
}

/// Convert a slice of records to a native list.
pub fn records_to_native<T: JsonRecord>(records: &[T]) -> NativeValue {
    NativeValue::List(records.iter().map(JsonRecord::to_native).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FieldMapping;
    use jsonbind_core::{ErrorKind, Shape};

    #[derive(Debug, Clone, PartialEq)]
    struct Point {
        x: i64,
        y: i64,
    }

    impl JsonRecord for Point {
        const TYPE_ID: &'static str = "Point";

        fn declare() -> TypeDeclaration {
            TypeDeclaration::new(Self::TYPE_ID)
                .field(FieldMapping::new("x", Shape::number()))
                .field(FieldMapping::new("y", Shape::number()))
        }

        fn to_instance(&self) -> Instance {
            Self::new_instance().with("x", self.x).with("y", self.y)
        }

        fn from_instance(instance: &Instance) -> Result<Self, MappingError> {
            Ok(Self {
                x: instance.read("x")?,
                y: instance.read("y")?,
            })
        }
    }

    fn holder() -> Instance {
        Instance::new(RecordTypeId::new("Holder").unwrap())
    }

    #[test]
    fn test_instance_round_trip() {
        let p = Point { x: 1, y: 2 };
        let instance = p.to_instance();
        assert_eq!(instance.type_id().as_str(), "Point");
        assert_eq!(Point::from_instance(&instance).unwrap(), p);
    }

    #[test]
    fn test_from_native_accepts_map() {
        let map = NativeValue::Map(
            [
                ("x".to_string(), NativeValue::from(7)),
                ("y".to_string(), NativeValue::from(8)),
            ]
            .into(),
        );
        assert_eq!(Point::from_native(&map).unwrap(), Point { x: 7, y: 8 });
        assert!(Point::from_native(&NativeValue::from(1)).is_err());
    }

    #[test]
    fn test_read_nested_record() {
        let h = holder().with("at", Point { x: 5, y: 6 }.to_native());
        let p: Point = read_record(&h, "at").unwrap();
        assert_eq!(p, Point { x: 5, y: 6 });
    }

    #[test]
    fn test_read_nested_record_missing() {
        let err = read_record::<Point>(&holder(), "at").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RequiredFieldMissing);
    }

    #[test]
    fn test_read_optional_record() {
        let none: Option<Point> = read_optional_record(&holder(), "at").unwrap();
        assert!(none.is_none());
        let h = holder().with("at", NativeValue::Null);
        assert!(read_optional_record::<Point>(&h, "at").unwrap().is_none());
    }

    #[test]
    fn test_read_records_reports_element_path() {
        let h = holder().with(
            "points",
            NativeValue::List(vec![
                Point { x: 1, y: 1 }.to_native(),
                NativeValue::from("oops"),
            ]),
        );
        let err = read_records::<Point>(&h, "points").unwrap_err();
        assert_eq!(err.path().to_string(), "points[1]");
    }

    #[test]
    fn test_records_to_native() {
        let list = records_to_native(&[Point { x: 1, y: 2 }, Point { x: 3, y: 4 }]);
        assert_eq!(list.as_list().unwrap().len(), 2);
    }
}
