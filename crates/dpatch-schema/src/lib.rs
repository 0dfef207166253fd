//! Patch schema and node type registry.
//!
//! The patch generator never guesses which parts of a document are
//! meaningful. It reads them from two read-only tables defined here:
//!
//! - [`PatchSchema`] -- document layout (which field holds the item tree, which
//!   fields are ids, children, types) and the field lists compared at the
//!   document, item, and nested-collection level.
//! - [`TypeRegistry`] / [`NodeType`] -- per item type, the type-specific
//!   properties (with their [`PropertyKind`]) and the named text slots.
//!
//! Both load from TOML or JSON and have built-in defaults for diagram documents.

pub mod config;
pub mod error;
pub mod registry;

pub use config::{CollectionSchema, PatchSchema};
pub use error::{SchemaError, SchemaResult};
pub use registry::{NodeType, PropertyDef, PropertyKind, TypeRegistry};
