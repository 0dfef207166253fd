//! Wire types for document patches.
//!
//! A [`Patch`] describes how one snapshot of a diagram document turns into
//! another: document-level field changes plus identity-keyed operations on the
//! document's item tree. Every other dpatch crate depends on `dpatch-types`.
//!
//! # Key Types
//!
//! - [`Patch`] -- Top-level patch value (`version`, `protocol`, `doc`, `items`)
//! - [`FieldChange`] / [`FieldChangeKind`] -- A change at a field path
//! - [`SetChange`] -- Element added to or removed from an unordered string set
//! - [`ItemOp`] / [`ItemOpKind`] -- Add, delete, reorder, mount, demount, modify
//! - [`Scope`] -- The parent scope of an item (document root or a parent item)

pub mod change;
pub mod error;
pub mod op;
pub mod patch;
pub mod scope;

pub use change::{FieldChange, FieldChangeKind, SetChange};
pub use error::TypeError;
pub use op::{ItemOp, ItemOpKind};
pub use patch::{Patch, PATCH_PROTOCOL, PATCH_VERSION};
pub use scope::Scope;
