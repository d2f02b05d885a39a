//! # jsonbind-core — Foundational Types for jsonbind
//!
//! This crate is the leaf of the jsonbind workspace. It defines the
//! vocabulary every other crate speaks: what a record type is called, what
//! shape a field is expected to have, how a native record instance is
//! represented, how the mapping engine is configured, and how failures are
//! reported.
//!
//! ## Key Design Principles
//!
//! 1. **Validated identifiers.** A [`RecordTypeId`] can only be built through
//!    a checked constructor. Empty or whitespace-bearing identifiers never
//!    reach the registry.
//!
//! 2. **Closed shape descriptor.** [`Shape`] is a tagged union resolved at
//!    declaration time. The verifier never inspects runtime markers to decide
//!    whether a field is a primitive, a nested record or a container.
//!
//! 3. **Structured errors.** Every [`MappingError`] carries the full
//!    [`FieldPath`] from root to the failing leaf, the expected shape and the
//!    actual runtime type. Message text is derived from those fields.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `jsonbind-*` crates.
//! - No `unsafe` code.
//! - No `.unwrap()` outside tests. `RecordTypeId::from_static` is the only
//!   function that panics, and only on a malformed constant.

pub mod config;
pub mod error;
pub mod identity;
pub mod shape;
pub mod value;

pub use config::{MappingConfig, NullPolicy, OperationMode, PropertyMatching};
pub use error::{ConversionError, ErrorKind, MappingError, SchemaError};
pub use identity::{ConverterId, FieldPath, PathSegment, RecordTypeId};
pub use shape::{ContainerArity, ContainerShape, PrimitiveKind, Shape};
pub use value::{json_type_name, FromNative, Instance, NativeValue};
