//! # jsonbind-schema — Record Type Registry
//!
//! Holds the per-record-type field tables the mapping service reads.
//!
//! ## Modules
//!
//! - **Registry** ([`registry`]): [`FieldMapping`], [`TypeDeclaration`] and
//!   the [`SchemaRegistry`] that validates declarations, merges inherited
//!   fields and resolves custom converters.
//!
//! - **Converters** ([`converter`]): the [`Converter`] trait, closure-based
//!   [`FnConverter`], and the built-in converters schema documents may name.
//!
//! - **Typed Records** ([`record`]): the [`JsonRecord`] trait connecting Rust
//!   structs to registered types.
//!
//! - **Documents** ([`document`]): YAML/JSON schema files.
//!
//! ## Crate Policy
//!
//! - Depends only on `jsonbind-core` within the workspace.
//! - Registrations are immutable once declared.

pub mod converter;
pub mod document;
pub mod record;
pub mod registry;

pub use converter::{builtin_converters, Converter, FnConverter, NumberAsString};
pub use document::{FieldSpec, SchemaDocument, ShapeSpec, TypeSpec};
pub use record::{
    read_optional_record, read_record, read_records, records_to_native, JsonRecord,
};
pub use registry::{
    ConverterRef, DanglingReference, FieldMapping, SchemaRegistry, TypeDeclaration,
    TypeRegistration,
};
