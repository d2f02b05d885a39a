//! # Error Types — Structured Error Hierarchy
//!
//! Two families, split by when they can happen:
//!
//! - [`SchemaError`] is raised while record types are declared to the
//!   registry. A schema that produces one is never used for mapping.
//! - [`MappingError`] is raised by a serialize or deserialize call. Every
//!   variant is fatal to the call; there is no partial result.
//!
//! ## Design
//!
//! - Errors are raised where they are detected and unwind through every
//!   enclosing frame. Frames never wrap an error in a new variant; they only
//!   prepend their own [`PathSegment`] through [`MappingError::at`], so the
//!   final error names the path from root to the failing leaf.
//! - Expected shape and actual runtime type are kept as separate fields.
//!   The `Display` text is derived from them.

use thiserror::Error;

use crate::identity::{FieldPath, PathSegment};

/// Error raised while declaring record types to the registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The type identifier is malformed.
    #[error("invalid type identifier '{id}': {reason}")]
    InvalidTypeId {
        /// The rejected identifier.
        id: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The same native field was mapped twice within one declaration.
    #[error("field '{field}' of type '{type_id}' is mapped more than once")]
    DuplicateField {
        /// Declaring type.
        type_id: String,
        /// Native field name.
        field: String,
    },

    /// A type with this identifier is already registered.
    #[error("type '{type_id}' is already registered")]
    DuplicateType {
        /// The identifier declared twice.
        type_id: String,
    },

    /// The declared supertype has not been registered.
    #[error("type '{type_id}' extends unknown type '{supertype}'")]
    UnknownSupertype {
        /// Declaring type.
        type_id: String,
        /// Supertype that could not be found.
        supertype: String,
    },

    /// Supertype links form a cycle.
    #[error("supertype chain of '{type_id}' is cyclic")]
    SupertypeCycle {
        /// A type on the cycle.
        type_id: String,
    },

    /// A field references a converter that has not been registered.
    #[error("field '{field}' of type '{type_id}' references unknown converter '{converter}'")]
    UnknownConverter {
        /// Declaring type.
        type_id: String,
        /// Native field name.
        field: String,
        /// Converter identifier.
        converter: String,
    },

    /// A converter with this identifier is already registered.
    #[error("converter '{converter}' is already registered")]
    DuplicateConverter {
        /// The identifier registered twice.
        converter: String,
    },

    /// A schema document could not be read or parsed.
    #[error("schema document error: {reason}")]
    Document {
        /// Parser or IO message.
        reason: String,
    },
}

/// Machine-readable classification of a [`MappingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Root value has the wrong kind for the entry point.
    InvalidRootValue,
    /// `null` where the active null policy forbids it.
    NullNotAllowed,
    /// A required field is absent.
    RequiredFieldMissing,
    /// Runtime value does not match the declared shape.
    TypeMismatch,
    /// A custom converter rejected the value.
    ConversionFailed,
    /// A record type was referenced at mapping time but never registered.
    UnregisteredType,
    /// Nesting exceeded the configured depth limit.
    DepthLimitExceeded,
}

/// Error raised by a mapping call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MappingError {
    /// The value handed to an entry point is not one it can map.
    #[error("invalid root value for {entry_point}: expected {expected}, got {actual}")]
    InvalidRootValue {
        /// Name of the public entry point.
        entry_point: &'static str,
        /// What the entry point accepts.
        expected: &'static str,
        /// Runtime type of the value given.
        actual: String,
    },

    /// A `null` was found where the null policy forbids it.
    #[error("null not allowed at {path}: expected {expected}")]
    NullNotAllowed {
        /// Location of the null.
        path: FieldPath,
        /// Description of the expected shape.
        expected: String,
    },

    /// A required field has no value in the source.
    #[error("required field '{field}' (JSON property '{json_name}') of type '{type_id}' is missing at {path}")]
    RequiredFieldMissing {
        /// Location of the field.
        path: FieldPath,
        /// Record type declaring the field.
        type_id: String,
        /// Native field name.
        field: String,
        /// JSON property name.
        json_name: String,
    },

    /// The runtime value does not have the declared shape.
    #[error("type mismatch at {path}: expected {expected}, got {actual}: {reason}")]
    TypeMismatch {
        /// Location of the value.
        path: FieldPath,
        /// Description of the expected shape.
        expected: String,
        /// Runtime type of the value.
        actual: String,
        /// Which rule rejected the value.
        reason: String,
    },

    /// A custom converter returned an error.
    #[error("converter '{converter}' failed at {path}: {message}")]
    ConversionFailed {
        /// Location of the value.
        path: FieldPath,
        /// Converter identifier.
        converter: String,
        /// Message reported by the converter.
        message: String,
    },

    /// A record type was referenced but has no registration.
    #[error("type '{type_id}' is not registered (at {path})")]
    UnregisteredType {
        /// Location of the value.
        path: FieldPath,
        /// The missing type identifier.
        type_id: String,
    },

    /// The value nests deeper than the configured limit.
    #[error("nesting depth limit of {limit} exceeded at {path}")]
    DepthLimitExceeded {
        /// Location where the limit was hit.
        path: FieldPath,
        /// Configured limit.
        limit: usize,
    },
}

impl MappingError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRootValue { .. } => ErrorKind::InvalidRootValue,
            Self::NullNotAllowed { .. } => ErrorKind::NullNotAllowed,
            Self::RequiredFieldMissing { .. } => ErrorKind::RequiredFieldMissing,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::ConversionFailed { .. } => ErrorKind::ConversionFailed,
            Self::UnregisteredType { .. } => ErrorKind::UnregisteredType,
            Self::DepthLimitExceeded { .. } => ErrorKind::DepthLimitExceeded,
        }
    }

    /// Path from the root to the failing value. Root errors report the empty path.
    pub fn path(&self) -> FieldPath {
        match self {
            Self::InvalidRootValue { .. } => FieldPath::root(),
            Self::NullNotAllowed { path, .. }
            | Self::RequiredFieldMissing { path, .. }
            | Self::TypeMismatch { path, .. }
            | Self::ConversionFailed { path, .. }
            | Self::UnregisteredType { path, .. }
            | Self::DepthLimitExceeded { path, .. } => path.clone(),
        }
    }

    /// Prepend `segment` to the error's path.
    ///
    /// Called by each enclosing frame as the error unwinds.
    #[must_use]
    pub fn at(mut self, segment: PathSegment) -> Self {
        match &mut self {
            Self::InvalidRootValue { .. } => {}
            Self::NullNotAllowed { path, .. }
            | Self::RequiredFieldMissing { path, .. }
            | Self::TypeMismatch { path, .. }
            | Self::ConversionFailed { path, .. }
            | Self::UnregisteredType { path, .. }
            | Self::DepthLimitExceeded { path, .. } => path.prepend(segment),
        }
        self
    }

    /// Shorthand for a [`MappingError::TypeMismatch`] at the current (leaf) position.
    pub fn mismatch(
        expected: impl Into<String>,
        actual: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            path: FieldPath::root(),
            expected: expected.into(),
            actual: actual.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`MappingError::NullNotAllowed`] at the current position.
    pub fn null_not_allowed(expected: impl Into<String>) -> Self {
        Self::NullNotAllowed {
            path: FieldPath::root(),
            expected: expected.into(),
        }
    }
}

/// Error returned by a custom converter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ConversionError(pub String);

impl ConversionError {
    /// Build a conversion error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
