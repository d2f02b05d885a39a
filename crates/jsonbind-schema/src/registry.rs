//! # Schema Registry
//!
//! Per-record-type field tables, populated once at startup and read by every
//! mapping call afterwards.
//!
//! ## Lifecycle
//!
//! ```text
//! TypeDeclaration ──declare()──▶ TypeRegistration (Arc, immutable)
//!        │                              │
//!   own fields                  ancestor fields merged in
//! ```
//!
//! Registration is eager: a declaration naming a supertype is merged with
//! the supertype's already-flattened field table the moment it is declared,
//! so a supertype must be declared before its subtypes. Parent fields keep
//! their position; a child field with the same native name replaces the
//! parent's mapping in place; new child fields are appended.
//!
//! ## Thread Safety
//!
//! Declaring takes `&mut self`. Once the registry is wrapped in an `Arc` and
//! handed to the mapping service it can only be read, which gives the
//! single-writer / many-reader discipline without a lock.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use jsonbind_core::{ConverterId, RecordTypeId, SchemaError, Shape};

use crate::converter::Converter;
use crate::record::JsonRecord;

// ─── Field Mappings ──────────────────────────────────────────────────

/// A converter attached to a field, with the identifier used in diagnostics.
#[derive(Clone)]
pub struct ConverterRef {
    id: String,
    converter: Arc<dyn Converter>,
}

impl ConverterRef {
    /// Identifier of the converter.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The converter itself.
    pub fn converter(&self) -> &dyn Converter {
        self.converter.as_ref()
    }
}

impl fmt::Debug for ConverterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConverterRef").field(&self.id).finish()
    }
}

/// How one native field maps to one JSON property.
#[derive(Debug, Clone)]
pub struct FieldMapping {
    owner: Option<RecordTypeId>,
    field_name: String,
    json_name: String,
    shape: Shape,
    optional: bool,
    export_null: bool,
    converter: Option<ConverterRef>,
}

impl FieldMapping {
    /// Map native field `field_name` to the JSON property of the same name.
    pub fn new(field_name: impl Into<String>, shape: Shape) -> Self {
        let field_name = field_name.into();
        Self {
            owner: None,
            json_name: field_name.clone(),
            field_name,
            shape,
            optional: false,
            export_null: false,
            converter: None,
        }
    }

    /// Map a field without verifying its shape.
    pub fn any(field_name: impl Into<String>) -> Self {
        Self::new(field_name, Shape::Any)
    }

    /// Use a different JSON property name.
    #[must_use]
    pub fn json_name(mut self, name: impl Into<String>) -> Self {
        self.json_name = name.into();
        self
    }

    /// The field may be absent, and a `null` value is dropped.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// A `null` value is written through as `null` in both directions.
    #[must_use]
    pub fn export_null(mut self) -> Self {
        self.export_null = true;
        self
    }

    /// Handle this field with `converter` instead of shape verification.
    #[must_use]
    pub fn converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.converter = Some(ConverterRef {
            id: converter.name().to_string(),
            converter,
        });
        self
    }

    /// Type that declared this mapping. Set once the mapping is registered.
    pub fn owner(&self) -> Option<&RecordTypeId> {
        self.owner.as_ref()
    }

    /// Native field name.
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// JSON property name.
    pub fn json_property(&self) -> &str {
        &self.json_name
    }

    /// Expected shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Whether the field is optional.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Whether `null` is exported as-is.
    pub fn exports_null(&self) -> bool {
        self.export_null
    }

    /// Custom converter, if any.
    pub fn custom_converter(&self) -> Option<&ConverterRef> {
        self.converter.as_ref()
    }
}

// ─── Declarations ────────────────────────────────────────────────────

/// A record type as written by the application, before registration.
#[derive(Debug, Clone)]
pub struct TypeDeclaration {
    type_id: String,
    supertype: Option<String>,
    fields: Vec<FieldMapping>,
}

impl TypeDeclaration {
    /// Start declaring type `type_id`. The identifier is validated by
    /// [`SchemaRegistry::declare`].
    pub fn new(type_id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            supertype: None,
            fields: Vec::new(),
        }
    }

    /// Inherit the field mappings of `supertype`.
    #[must_use]
    pub fn extends(mut self, supertype: impl Into<String>) -> Self {
        self.supertype = Some(supertype.into());
        self
    }

    /// Add a field mapping.
    #[must_use]
    pub fn field(mut self, mapping: FieldMapping) -> Self {
        self.fields.push(mapping);
        self
    }

    /// Declared type identifier.
    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    /// Declared supertype.
    pub fn supertype(&self) -> Option<&str> {
        self.supertype.as_deref()
    }
}

// ─── Registrations ───────────────────────────────────────────────────

/// A registered record type with its flattened field table.
#[derive(Debug)]
pub struct TypeRegistration {
    type_id: RecordTypeId,
    supertype: Option<RecordTypeId>,
    ancestors: Vec<RecordTypeId>,
    fields: Vec<FieldMapping>,
}

impl TypeRegistration {
    /// The type identifier.
    pub fn type_id(&self) -> &RecordTypeId {
        &self.type_id
    }

    /// Direct supertype.
    pub fn supertype(&self) -> Option<&RecordTypeId> {
        self.supertype.as_ref()
    }

    /// Supertype chain, nearest first.
    pub fn ancestors(&self) -> &[RecordTypeId] {
        &self.ancestors
    }

    /// All field mappings, ancestors merged, in declaration order.
    pub fn fields(&self) -> &[FieldMapping] {
        &self.fields
    }

    /// Mapping for native field `name`.
    pub fn field(&self, name: &str) -> Option<&FieldMapping> {
        self.fields.iter().find(|f| f.field_name == name)
    }
}

/// A shape that names a record type with no registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    /// Type declaring the field.
    pub type_id: RecordTypeId,
    /// Native field name.
    pub field: String,
    /// The unregistered record type.
    pub missing: RecordTypeId,
}

/// Table of registered record types and converters.
#[derive(Default)]
pub struct SchemaRegistry {
    types: HashMap<RecordTypeId, Arc<TypeRegistration>>,
    order: Vec<RecordTypeId>,
    converters: HashMap<ConverterId, Arc<dyn Converter>>,
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut converters: Vec<&str> = self.converters.keys().map(|k| k.as_str()).collect();
        converters.sort_unstable();
        f.debug_struct("SchemaRegistry")
            .field("types", &self.order)
            .field("converters", &converters)
            .finish()
    }
}

impl SchemaRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a converter that `Shape::Custom(id)` fields can refer to.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateConverter`] if `id` is taken.
    pub fn register_converter(
        &mut self,
        id: impl Into<String>,
        converter: Arc<dyn Converter>,
    ) -> Result<(), SchemaError> {
        let id = ConverterId(id.into());
        if self.converters.contains_key(&id) {
            return Err(SchemaError::DuplicateConverter {
                converter: id.0,
            });
        }
        self.converters.insert(id, converter);
        Ok(())
    }

    /// Registered converter by identifier.
    pub fn converter(&self, id: &str) -> Option<&Arc<dyn Converter>> {
        self.converters.get(id)
    }

    /// Register a record type.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::InvalidTypeId`] for a malformed type or supertype identifier.
    /// - [`SchemaError::DuplicateType`] if the type is already registered.
    /// - [`SchemaError::DuplicateField`] if a native field is mapped twice.
    /// - [`SchemaError::UnknownSupertype`] if the supertype is not registered.
    /// - [`SchemaError::UnknownConverter`] if a `Shape::Custom` field names an
    ///   unregistered converter.
    pub fn declare(
        &mut self,
        declaration: TypeDeclaration,
    ) -> Result<Arc<TypeRegistration>, SchemaError> {
        let type_id = RecordTypeId::new(declaration.type_id)?;
        if self.types.contains_key(&type_id) {
            return Err(SchemaError::DuplicateType {
                type_id: type_id.to_string(),
            });
        }

        let mut seen = HashSet::new();
        for field in &declaration.fields {
            if !seen.insert(field.field_name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    type_id: type_id.to_string(),
                    field: field.field_name.clone(),
                });
            }
        }

        let parent = match declaration.supertype {
            Some(supertype) => {
                let supertype = RecordTypeId::new(supertype)?;
                let parent = self.types.get(&supertype).cloned().ok_or_else(|| {
                    SchemaError::UnknownSupertype {
                        type_id: type_id.to_string(),
                        supertype: supertype.to_string(),
                    }
                })?;
                Some(parent)
            }
            None => None,
        };

        let mut own = Vec::with_capacity(declaration.fields.len());
        for mut field in declaration.fields {
            if field.converter.is_none() {
                if let Shape::Custom(id) = &field.shape {
                    let converter = self.converters.get(id).cloned().ok_or_else(|| {
                        SchemaError::UnknownConverter {
                            type_id: type_id.to_string(),
                            field: field.field_name.clone(),
                            converter: id.to_string(),
                        }
                    })?;
                    field.converter = Some(ConverterRef {
                        id: id.to_string(),
                        converter,
                    });
                }
            }
            field.owner = Some(type_id.clone());
            own.push(field);
        }

        let (fields, ancestors) = match &parent {
            Some(parent) => {
                let mut fields = parent.fields.clone();
                for field in own {
                    match fields.iter_mut().find(|f| f.field_name == field.field_name) {
                        Some(inherited) => *inherited = field,
                        None => fields.push(field),
                    }
                }
                let mut ancestors = Vec::with_capacity(parent.ancestors.len() + 1);
                ancestors.push(parent.type_id.clone());
                ancestors.extend(parent.ancestors.iter().cloned());
                (fields, ancestors)
            }
            None => (own, Vec::new()),
        };

        let registration = Arc::new(TypeRegistration {
            supertype: parent.as_ref().map(|p| p.type_id.clone()),
            type_id: type_id.clone(),
            ancestors,
            fields,
        });

        tracing::debug!(
            type_id = %type_id,
            fields = registration.fields.len(),
            supertype = ?registration.supertype.as_ref().map(RecordTypeId::as_str),
            "registered record type"
        );

        self.types.insert(type_id.clone(), Arc::clone(&registration));
        self.order.push(type_id);
        Ok(registration)
    }

    /// Register the declaration of a typed record.
    ///
    /// # Errors
    ///
    /// Same as [`SchemaRegistry::declare`].
    pub fn declare_record<T: JsonRecord>(&mut self) -> Result<Arc<TypeRegistration>, SchemaError> {
        self.declare(T::declare())
    }

    /// Registration of `type_id`.
    pub fn get(&self, type_id: &str) -> Option<&Arc<TypeRegistration>> {
        self.types.get(type_id)
    }

    /// Whether `type_id` is registered.
    pub fn contains(&self, type_id: &str) -> bool {
        self.types.contains_key(type_id)
    }

    /// Registered type identifiers in declaration order.
    pub fn type_ids(&self) -> impl Iterator<Item = &RecordTypeId> {
        self.order.iter()
    }

    /// Registrations in declaration order.
    pub fn registrations(&self) -> impl Iterator<Item = &Arc<TypeRegistration>> {
        self.order.iter().filter_map(|id| self.types.get(id))
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no type is registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Supertype chain of `type_id`, nearest first.
    pub fn ancestors(&self, type_id: &str) -> Option<&[RecordTypeId]> {
        self.types.get(type_id).map(|r| r.ancestors())
    }

    /// Record shapes that reference unregistered types.
    ///
    /// Mapping does not require a complete schema; such references only fail
    /// when a value actually reaches them. This lists them ahead of time.
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        let mut dangling = Vec::new();
        for registration in self.registrations() {
            for field in registration.fields() {
                if field.owner.as_ref() != Some(&registration.type_id) {
                    continue;
                }
                let mut missing = Vec::new();
                self.collect_missing(&field.shape, &mut missing);
                dangling.extend(missing.into_iter().map(|missing| DanglingReference {
                    type_id: registration.type_id.clone(),
                    field: field.field_name.clone(),
                    missing,
                }));
            }
        }
        dangling
    }

    fn collect_missing(&self, shape: &Shape, out: &mut Vec<RecordTypeId>) {
        match shape {
            Shape::Record(id) if !self.types.contains_key(id) => out.push(id.clone()),
            Shape::Container(container) => {
                for element in &container.elements {
                    self.collect_missing(element, out);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::{FnConverter, NumberAsString};

    fn point_decl() -> TypeDeclaration {
        TypeDeclaration::new("Point")
            .field(FieldMapping::new("x", Shape::number()))
            .field(FieldMapping::new("y", Shape::number()))
    }

    #[test]
    fn test_declare_simple_type() {
        let mut registry = SchemaRegistry::new();
        let reg = registry.declare(point_decl()).unwrap();
        assert_eq!(reg.type_id().as_str(), "Point");
        assert_eq!(reg.fields().len(), 2);
        assert_eq!(reg.fields()[0].owner().unwrap().as_str(), "Point");
        assert!(registry.contains("Point"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let mut registry = SchemaRegistry::new();
        let decl = point_decl().field(FieldMapping::new("x", Shape::string()));
        let err = registry.declare(decl).unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateField {
                type_id: "Point".into(),
                field: "x".into()
            }
        );
        assert!(!registry.contains("Point"));
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let mut registry = SchemaRegistry::new();
        registry.declare(point_decl()).unwrap();
        let err = registry.declare(point_decl()).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateType { .. }));
    }

    #[test]
    fn test_invalid_type_id_rejected() {
        let mut registry = SchemaRegistry::new();
        let err = registry.declare(TypeDeclaration::new("")).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidTypeId { .. }));
    }

    #[test]
    fn test_unknown_supertype_rejected() {
        let mut registry = SchemaRegistry::new();
        let err = registry
            .declare(TypeDeclaration::new("Point3").extends("Point"))
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownSupertype {
                type_id: "Point3".into(),
                supertype: "Point".into()
            }
        );
    }

    #[test]
    fn test_inheritance_merge_extends_and_overrides() {
        let mut registry = SchemaRegistry::new();
        registry.declare(point_decl()).unwrap();
        let child = registry
            .declare(
                TypeDeclaration::new("Point3")
                    .extends("Point")
                    .field(FieldMapping::new("z", Shape::number()))
                    .field(FieldMapping::new("x", Shape::string()).json_name("X")),
            )
            .unwrap();

        let names: Vec<&str> = child.fields().iter().map(|f| f.field_name()).collect();
        assert_eq!(names, vec!["x", "y", "z"]);

        let x = child.field("x").unwrap();
        assert_eq!(x.json_property(), "X");
        assert_eq!(x.shape(), &Shape::string());
        assert_eq!(x.owner().unwrap().as_str(), "Point3");
        assert_eq!(child.field("y").unwrap().owner().unwrap().as_str(), "Point");

        // The parent registration is untouched by the child's override.
        let parent = registry.get("Point").unwrap();
        assert_eq!(parent.field("x").unwrap().shape(), &Shape::number());
    }

    #[test]
    fn test_ancestor_chain() {
        let mut registry = SchemaRegistry::new();
        registry.declare(point_decl()).unwrap();
        registry
            .declare(TypeDeclaration::new("Point3").extends("Point"))
            .unwrap();
        registry
            .declare(TypeDeclaration::new("Point4").extends("Point3"))
            .unwrap();
        let ancestors: Vec<&str> = registry
            .ancestors("Point4")
            .unwrap()
            .iter()
            .map(RecordTypeId::as_str)
            .collect();
        assert_eq!(ancestors, vec!["Point3", "Point"]);
        let reg = registry.get("Point4").unwrap();
        assert_eq!(reg.supertype().map(RecordTypeId::as_str), Some("Point3"));
        assert_eq!(reg.fields().len(), 2);
    }

    #[test]
    fn test_custom_shape_resolves_registered_converter() {
        let mut registry = SchemaRegistry::new();
        registry
            .register_converter(NumberAsString::ID, Arc::new(NumberAsString))
            .unwrap();
        let reg = registry
            .declare(
                TypeDeclaration::new("Account")
                    .field(FieldMapping::new("balance", Shape::custom(NumberAsString::ID))),
            )
            .unwrap();
        let conv = reg.field("balance").unwrap().custom_converter().unwrap();
        assert_eq!(conv.id(), NumberAsString::ID);
    }

    #[test]
    fn test_custom_shape_unknown_converter() {
        let mut registry = SchemaRegistry::new();
        let err = registry
            .declare(
                TypeDeclaration::new("Account")
                    .field(FieldMapping::new("balance", Shape::custom("nope"))),
            )
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownConverter { .. }));
    }

    #[test]
    fn test_duplicate_converter_rejected() {
        let mut registry = SchemaRegistry::new();
        registry
            .register_converter("c", Arc::new(NumberAsString))
            .unwrap();
        let err = registry
            .register_converter("c", Arc::new(NumberAsString))
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateConverter { .. }));
    }

    #[test]
    fn test_inline_converter_takes_its_name() {
        let conv = FnConverter::new("identity", |v| Ok(v.to_json()), |j| {
            Ok(jsonbind_core::NativeValue::from_json(j))
        });
        let mapping = FieldMapping::any("blob").converter(conv.shared());
        assert_eq!(mapping.custom_converter().unwrap().id(), "identity");
    }

    #[test]
    fn test_dangling_references() {
        let mut registry = SchemaRegistry::new();
        registry
            .declare(
                TypeDeclaration::new("Line")
                    .field(FieldMapping::new("start", Shape::record_named("Point").unwrap()))
                    .field(FieldMapping::new(
                        "waypoints",
                        Shape::array_of(Shape::record_named("Point").unwrap()),
                    )),
            )
            .unwrap();
        let dangling = registry.dangling_references();
        assert_eq!(dangling.len(), 2);
        assert_eq!(dangling[0].missing.as_str(), "Point");

        registry.declare(point_decl()).unwrap();
        assert!(registry.dangling_references().is_empty());
    }

    #[test]
    fn test_type_ids_in_declaration_order() {
        let mut registry = SchemaRegistry::new();
        registry.declare(TypeDeclaration::new("B")).unwrap();
        registry.declare(TypeDeclaration::new("A")).unwrap();
        let ids: Vec<&str> = registry.type_ids().map(RecordTypeId::as_str).collect();
        assert_eq!(ids, vec!["B", "A"]);
    }
}
