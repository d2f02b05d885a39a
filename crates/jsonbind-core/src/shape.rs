//! # Shape Descriptors
//!
//! A [`Shape`] says what the JSON representation of a field should look like.
//! It is a closed set of variants fixed when the field is declared:
//!
//! ```text
//! Shape
//!  ├── Any                       pass-through, null included
//!  ├── Primitive(kind)           string | number | boolean
//!  ├── Record(type id)           nested registered record
//!  ├── Container(ContainerShape) positional element shapes, recursive
//!  └── Custom(converter id)      handled by a custom converter
//! ```
//!
//! Containers nest arbitrarily (`[[Point]]`). A container with no element
//! shapes is opaque: its value passes through without per-element checks.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::identity::{ConverterId, RecordTypeId};

/// Kind of a JSON primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    /// JSON string.
    String,
    /// JSON number.
    Number,
    /// JSON boolean.
    Boolean,
}

impl PrimitiveKind {
    /// Lowercase name used in diagnostics and schema documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a container was declared as array-like or map-like.
///
/// Descriptive only. The verifier follows the runtime value's actual shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerArity {
    /// Sequence of elements.
    #[default]
    ArrayLike,
    /// String-keyed mapping of elements.
    MapLike,
}

/// Element shapes of a container, taken positionally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerShape {
    /// Declared element shapes. Empty means opaque.
    pub elements: Vec<Shape>,
    /// Declared arity.
    pub arity: ContainerArity,
    /// Reuse the last declared shape for positions past the end of `elements`.
    pub autofill: bool,
}

impl ContainerShape {
    /// Whether the container declares no element shapes.
    pub fn is_opaque(&self) -> bool {
        self.elements.is_empty()
    }

    /// Shape expected at `position`.
    ///
    /// Positions past the declared list reuse the last shape when `autofill`
    /// is set. Returns `None` for an opaque container, or for an overflowing
    /// position with autofill disabled.
    pub fn shape_for(&self, position: usize) -> Option<&Shape> {
        match self.elements.get(position) {
            Some(shape) => Some(shape),
            None if self.autofill => self.elements.last(),
            None => None,
        }
    }
}

/// Expected JSON representation of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// No verification; value passes through unchanged.
    Any,
    /// A JSON primitive of the given kind.
    Primitive(PrimitiveKind),
    /// A nested record of a registered type.
    Record(RecordTypeId),
    /// An array-like or map-like container.
    Container(ContainerShape),
    /// Handled by the registered converter with this identifier.
    Custom(ConverterId),
}

impl Shape {
    /// `Primitive(String)`.
    pub fn string() -> Self {
        Self::Primitive(PrimitiveKind::String)
    }

    /// `Primitive(Number)`.
    pub fn number() -> Self {
        Self::Primitive(PrimitiveKind::Number)
    }

    /// `Primitive(Boolean)`.
    pub fn boolean() -> Self {
        Self::Primitive(PrimitiveKind::Boolean)
    }

    /// Nested record of type `id`.
    pub fn record(id: RecordTypeId) -> Self {
        Self::Record(id)
    }

    /// Nested record, validating the identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidTypeId`] for a malformed identifier.
    pub fn record_named(id: &str) -> Result<Self, SchemaError> {
        Ok(Self::Record(RecordTypeId::new(id)?))
    }

    /// Array whose every element has shape `element`.
    pub fn array_of(element: Shape) -> Self {
        Self::tuple(vec![element])
    }

    /// Map whose every value has shape `element`.
    pub fn map_of(element: Shape) -> Self {
        Self::Container(ContainerShape {
            elements: vec![element],
            arity: ContainerArity::MapLike,
            autofill: true,
        })
    }

    /// Array with positional element shapes; the last shape repeats.
    pub fn tuple(elements: Vec<Shape>) -> Self {
        Self::Container(ContainerShape {
            elements,
            arity: ContainerArity::ArrayLike,
            autofill: true,
        })
    }

    /// Array with positional element shapes and no repetition; extra
    /// elements are a type mismatch.
    pub fn strict_tuple(elements: Vec<Shape>) -> Self {
        Self::Container(ContainerShape {
            elements,
            arity: ContainerArity::ArrayLike,
            autofill: false,
        })
    }

    /// Array whose elements are not verified.
    pub fn opaque_array() -> Self {
        Self::tuple(Vec::new())
    }

    /// Field handled by converter `id`.
    pub fn custom(id: impl Into<String>) -> Self {
        Self::Custom(ConverterId(id.into()))
    }

    /// Whether this is a nullable position under the `AllowObjectNull` policy.
    pub fn is_object_like(&self) -> bool {
        matches!(self, Self::Record(_) | Self::Container(_))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Primitive(kind) => write!(f, "{kind}"),
            Self::Record(id) => write!(f, "{id}"),
            Self::Custom(id) => write!(f, "custom({id})"),
            Self::Container(container) => {
                let (open, close) = match container.arity {
                    ContainerArity::ArrayLike => ('[', ']'),
                    ContainerArity::MapLike => ('{', '}'),
                };
                write!(f, "{open}")?;
                for (i, element) in container.elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, "{close}")
            }
        }
    }
}
