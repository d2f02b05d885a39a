//! # jsonbind-mapper — Type Verifier and Mapping Service
//!
//! Converts between [`serde_json::Value`] and record instances described by
//! a [`SchemaRegistry`](jsonbind_schema::SchemaRegistry).
//!
//! ```text
//! JsonConvert::serialize / deserialize          (service)
//!        │  root checks, config snapshot, tracing
//!        ▼
//! Mapper::serialize_fields / deserialize_fields (object)
//!        │  per-field: absent / null / converter policy
//!        ▼
//! Mapper::verify::<ToJson | FromJson>           (verify)
//!        │  shape check, recursion into records and containers
//!        └──────────────▶ back to the field loop for nested records
//! ```
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use jsonbind_core::Shape;
//! use jsonbind_mapper::JsonConvert;
//! use jsonbind_schema::{FieldMapping, SchemaRegistry, TypeDeclaration};
//! use serde_json::json;
//!
//! let mut registry = SchemaRegistry::new();
//! registry
//!     .declare(
//!         TypeDeclaration::new("Point")
//!             .field(FieldMapping::new("x", Shape::number()))
//!             .field(FieldMapping::new("y", Shape::number())),
//!     )
//!     .unwrap();
//!
//! let convert = JsonConvert::new(Arc::new(registry));
//! let point = convert.deserialize_object(&json!({"x": 1, "y": 2}), "Point").unwrap();
//! assert_eq!(convert.serialize_object(&point, None).unwrap(), json!({"x": 1, "y": 2}));
//! ```

mod object;
pub mod service;
mod verify;

pub use service::JsonConvert;
