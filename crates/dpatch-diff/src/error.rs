//! Error types for the diff crate.

use std::fmt;

use dpatch_types::Scope;

/// Which of the two compared snapshots an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Snapshot {
    Origin,
    Modified,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Origin => write!(f, "origin"),
            Self::Modified => write!(f, "modified"),
        }
    }
}

/// Errors that can occur while generating a patch.
///
/// All of them report malformed input; well-formed documents always diff.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// The snapshot is not a JSON object.
    #[error("{0} document is not an object")]
    NotADocument(Snapshot),

    /// Two items of one collection share an id.
    #[error("duplicate item id {id:?} in {snapshot} snapshot")]
    DuplicateId { id: String, snapshot: Snapshot },

    /// An item of an id-keyed collection has no string id.
    #[error("item at position {position} under {scope} in {snapshot} snapshot has no id")]
    MissingId {
        snapshot: Snapshot,
        scope: Scope,
        position: usize,
    },

    /// A field expected to hold an item list holds something else.
    #[error("field {field:?} in {snapshot} snapshot is not an array")]
    NotACollection { snapshot: Snapshot, field: String },
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
