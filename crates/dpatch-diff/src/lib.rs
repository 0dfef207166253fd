//! Patch generator for structured diagram documents.
//!
//! Compares two snapshots of a document and produces a [`Patch`]: changes to
//! document-level fields plus identity-keyed operations on the item tree
//! (add, delete, reorder, mount, demount, modify). Items are matched by id,
//! so moves and reparenting are reported as such rather than as a delete
//! followed by an add.
//!
//! # Key Types
//!
//! - [`PatchGenerator`] / [`generate_patch`] -- Entry point: document in, patch out
//! - [`FieldChangeDetector`] -- Declared-field comparison of one item
//! - [`reconcile`] / [`ScopedOps`] -- Id-keyed reconciliation of an item collection
//! - [`DocumentIndex`] / [`TreeLayout`] -- Id-keyed index of one snapshot
//! - [`diff_values`] / [`ValueDiff`] -- Modified leaves of two JSON values
//! - [`diff_set`] -- Unordered string-set diff
//! - [`PatchStats`] / [`PatchIndex`] -- What a patch touches
//!
//! [`Patch`]: dpatch_types::Patch

pub mod assemble;
pub mod error;
pub mod fields;
pub mod generate;
pub mod index;
pub mod reconcile;
pub mod set_diff;
pub mod stats;
pub mod value_diff;

pub use assemble::{PendingKind, PendingOp, ScopedOps};
pub use error::{DiffError, DiffResult, Snapshot};
pub use fields::FieldChangeDetector;
pub use generate::{generate_patch, PatchGenerator};
pub use index::{DocumentIndex, IndexEntry, TreeLayout};
pub use reconcile::reconcile;
pub use set_diff::{diff_set, diff_set_values};
pub use stats::{PatchIndex, PatchStats};
pub use value_diff::{diff_values, DiffOptions, ValueChange, ValueDiff};
