//! # Identifiers and Field Paths
//!
//! Newtype wrappers for the names the engine passes around. A
//! [`RecordTypeId`] names a registered record type, a [`ConverterId`] names a
//! registered custom converter. They are distinct types so one can never be
//! looked up in the other's table.
//!
//! [`FieldPath`] locates a value inside a nested document. Errors raised deep
//! inside the verifier start with an empty path and gain one segment per
//! enclosing frame as they unwind.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Stable identifier of a record type.
///
/// Non-empty and free of whitespace. Stable across the lifetime of the type;
/// two registrations can never share one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordTypeId(String);

impl RecordTypeId {
    /// Build a type identifier, rejecting empty or whitespace-bearing names.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidTypeId`] if `id` is empty or contains
    /// whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, SchemaError> {
        let id = id.into();
        if id.is_empty() {
            return Err(SchemaError::InvalidTypeId {
                id,
                reason: "type identifier must not be empty".to_string(),
            });
        }
        if id.chars().any(char::is_whitespace) {
            return Err(SchemaError::InvalidTypeId {
                id,
                reason: "type identifier must not contain whitespace".to_string(),
            });
        }
        Ok(Self(id))
    }

    /// Build a type identifier from a compile-time constant.
    ///
    /// # Panics
    ///
    /// Panics if `id` is malformed. Intended for `const` identifiers such as
    /// `JsonRecord::TYPE_ID`, where a bad value is a programming error.
    pub fn from_static(id: &'static str) -> Self {
        match Self::new(id) {
            Ok(id) => id,
            Err(e) => panic!("{e}"),
        }
    }

    /// Access the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RecordTypeId {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for RecordTypeId {
    type Error = SchemaError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecordTypeId> for String {
    fn from(id: RecordTypeId) -> Self {
        id.0
    }
}

impl Borrow<str> for RecordTypeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a registered custom converter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConverterId(pub String);

impl ConverterId {
    /// Access the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConverterId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Borrow<str> for ConverterId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConverterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── Field Paths ─────────────────────────────────────────────────────

/// One step from a container value to one of its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A record field, named by its JSON property name.
    Field(String),
    /// A position in an array-like value.
    Index(usize),
    /// A key in a map-like value.
    Key(String),
}

/// Location of a value relative to the root of a mapping call.
///
/// Rendered with dot notation for record fields and bracket notation for
/// array indices and map keys: `lines[2].end.x`, `labels[en]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// The empty path, denoting the root value.
    pub fn root() -> Self {
        Self::default()
    }

    /// Whether this path denotes the root value.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The segments from root to leaf.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Insert `segment` in front of the existing segments.
    pub fn prepend(&mut self, segment: PathSegment) {
        self.segments.insert(0, segment);
    }

    /// Return a copy of this path extended by `segment` at the leaf end.
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }
}

impl From<Vec<PathSegment>> for FieldPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("(root)");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => write!(f, "{name}")?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
                PathSegment::Key(key) => write!(f, "[{key}]")?,
            }
        }
        Ok(())
    }
}
