//! # Schema Documents
//!
//! Record types declared in YAML or JSON instead of Rust code. Used by the
//! CLI and by applications that keep their schemas next to their data.
//!
//! ```yaml
//! types:
//!   - id: Point
//!     fields:
//!       - { name: x, type: number }
//!       - { name: y, type: number }
//!   - id: Route
//!     fields:
//!       - { name: name, type: string }
//!       - { name: stops, type: [Point] }
//!       - { name: labels, type: { map: string }, optional: true }
//!       - { name: distance, json: distanceKm, converter: number-as-string }
//! ```
//!
//! Shape notation: `any`, `string`, `number`, `boolean`, a record type id,
//! `[shape, ...]` for an array (the last shape repeats), `[]` for an opaque
//! array, `{ map: shape }` for a map, `{ tuple: [..], strict: true }` for an
//! array without repetition.

use std::path::Path;

use jsonbind_core::{PrimitiveKind, RecordTypeId, SchemaError, Shape};
use serde::{Deserialize, Serialize};

use crate::registry::{FieldMapping, SchemaRegistry, TypeDeclaration};

/// Shape written in document notation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShapeSpec {
    /// Primitive kind, `any`, or record type id.
    Name(String),
    /// Array with positional element shapes; the last repeats.
    List(Vec<ShapeSpec>),
    /// Map whose values all have one shape.
    Map {
        /// Value shape.
        map: Box<ShapeSpec>,
    },
    /// Array with positional element shapes.
    Tuple {
        /// Element shapes.
        tuple: Vec<ShapeSpec>,
        /// Reject elements past the declared list.
        #[serde(default)]
        strict: bool,
    },
}

impl ShapeSpec {
    /// Resolve to a [`Shape`].
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidTypeId`] for a malformed record name.
    pub fn to_shape(&self) -> Result<Shape, SchemaError> {
        match self {
            Self::Name(name) => Ok(match name.as_str() {
                "any" => Shape::Any,
                "string" => Shape::Primitive(PrimitiveKind::String),
                "number" => Shape::Primitive(PrimitiveKind::Number),
                "boolean" => Shape::Primitive(PrimitiveKind::Boolean),
                other => Shape::Record(RecordTypeId::new(other)?),
            }),
            Self::List(elements) => Ok(Shape::tuple(Self::resolve_all(elements)?)),
            Self::Map { map } => Ok(Shape::map_of(map.to_shape()?)),
            Self::Tuple { tuple, strict } => {
                let elements = Self::resolve_all(tuple)?;
                Ok(if *strict {
                    Shape::strict_tuple(elements)
                } else {
                    Shape::tuple(elements)
                })
            }
        }
    }

    fn resolve_all(specs: &[ShapeSpec]) -> Result<Vec<Shape>, SchemaError> {
        specs.iter().map(ShapeSpec::to_shape).collect()
    }
}

fn default_shape() -> ShapeSpec {
    ShapeSpec::Name("any".to_string())
}

/// One field in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    /// Native field name.
    pub name: String,
    /// JSON property name, defaults to `name`.
    #[serde(default)]
    pub json: Option<String>,
    /// Expected shape, defaults to `any`.
    #[serde(rename = "type", default = "default_shape")]
    pub shape: ShapeSpec,
    /// Field may be absent.
    #[serde(default)]
    pub optional: bool,
    /// `null` passes through as `null`.
    #[serde(default)]
    pub export_null: bool,
    /// Registered converter handling this field.
    #[serde(default)]
    pub converter: Option<String>,
}

impl FieldSpec {
    fn to_mapping(&self) -> Result<FieldMapping, SchemaError> {
        let shape = match &self.converter {
            Some(converter) => Shape::custom(converter.clone()),
            None => self.shape.to_shape()?,
        };
        let mut mapping = FieldMapping::new(self.name.clone(), shape);
        if let Some(json) = &self.json {
            mapping = mapping.json_name(json.clone());
        }
        if self.optional {
            mapping = mapping.optional();
        }
        if self.export_null {
            mapping = mapping.export_null();
        }
        Ok(mapping)
    }
}

/// One record type in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeSpec {
    /// Type identifier.
    pub id: String,
    /// Supertype identifier.
    #[serde(default)]
    pub extends: Option<String>,
    /// Own fields.
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl TypeSpec {
    /// Convert to a registry declaration.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidTypeId`] for a malformed record shape name.
    pub fn to_declaration(&self) -> Result<TypeDeclaration, SchemaError> {
        let mut declaration = TypeDeclaration::new(self.id.clone());
        if let Some(parent) = &self.extends {
            declaration = declaration.extends(parent.clone());
        }
        for field in &self.fields {
            declaration = declaration.field(field.to_mapping()?);
        }
        Ok(declaration)
    }
}

/// A set of record type declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    /// Declared types, in any order.
    #[serde(default)]
    pub types: Vec<TypeSpec>,
}

impl SchemaDocument {
    /// Parse a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Document`] if the text is not a valid document.
    pub fn from_yaml_str(text: &str) -> Result<Self, SchemaError> {
        serde_yaml::from_str(text).map_err(|e| SchemaError::Document {
            reason: format!("invalid YAML: {e}"),
        })
    }

    /// Parse a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Document`] if the text is not a valid document.
    pub fn from_json_str(text: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(text).map_err(|e| SchemaError::Document {
            reason: format!("invalid JSON: {e}"),
        })
    }

    /// Load a document from disk. `.json` files are parsed as JSON, anything
    /// else as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Document`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::Document {
            reason: format!("cannot read {}: {e}", path.display()),
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    /// Declare every type in the document, supertypes before subtypes.
    ///
    /// Returns the declared type ids in declaration order.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::SupertypeCycle`] if document types extend each other cyclically.
    /// - Any error of [`SchemaRegistry::declare`].
    pub fn apply(&self, registry: &mut SchemaRegistry) -> Result<Vec<RecordTypeId>, SchemaError> {
        let mut declared = Vec::with_capacity(self.types.len());
        let mut pending: Vec<&TypeSpec> = self.types.iter().collect();

        while !pending.is_empty() {
            let before = pending.len();
            let mut deferred = Vec::new();
            for spec in pending {
                let ready = match &spec.extends {
                    None => true,
                    Some(parent) => {
                        registry.contains(parent) || !self.types.iter().any(|t| &t.id == parent)
                    }
                };
                if ready {
                    let registration = registry.declare(spec.to_declaration()?)?;
                    declared.push(registration.type_id().clone());
                } else {
                    deferred.push(spec);
                }
            }
            if deferred.len() == before {
                return Err(SchemaError::SupertypeCycle {
                    type_id: deferred[0].id.clone(),
                });
            }
            pending = deferred;
        }

        tracing::debug!(types = declared.len(), "applied schema document");
        Ok(declared)
    }
}
