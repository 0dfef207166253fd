//! Field-level changes: replacements, set patches, and nested id-array patches.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::op::ItemOp;

/// A change at a field path of a document or item.
///
/// Serialized as a flat object whose `op` member selects the kind:
/// `{"path": [...], "op": "replace", "value": ...}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Path segments from the changed object down to the field.
    pub path: Vec<String>,
    #[serde(flatten)]
    pub kind: FieldChangeKind,
}

/// The operation carried by a [`FieldChange`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum FieldChangeKind {
    /// The value at `path` is replaced wholesale.
    #[serde(rename = "replace")]
    Replace { value: Value },
    /// The unordered string set at `path` gains or loses elements.
    #[serde(rename = "setPatch")]
    SetPatch { changes: Vec<SetChange> },
    /// The ordered, id-keyed collection at `path` is reconciled item by item.
    #[serde(rename = "idArrayPatch")]
    IdArrayPatch { changes: Vec<ItemOp> },
}

impl FieldChange {
    /// A `replace` change.
    pub fn replace(path: Vec<String>, value: Value) -> Self {
        Self {
            path,
            kind: FieldChangeKind::Replace { value },
        }
    }

    /// A `setPatch` change.
    pub fn set_patch(path: Vec<String>, changes: Vec<SetChange>) -> Self {
        Self {
            path,
            kind: FieldChangeKind::SetPatch { changes },
        }
    }

    /// An `idArrayPatch` change.
    pub fn id_array_patch(path: Vec<String>, changes: Vec<ItemOp>) -> Self {
        Self {
            path,
            kind: FieldChangeKind::IdArrayPatch { changes },
        }
    }

    /// The wire name of this change's operation.
    pub fn op_name(&self) -> &'static str {
        match self.kind {
            FieldChangeKind::Replace { .. } => "replace",
            FieldChangeKind::SetPatch { .. } => "setPatch",
            FieldChangeKind::IdArrayPatch { .. } => "idArrayPatch",
        }
    }

    /// The path joined with `.`, e.g. `settings.screen.draggable`.
    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }
}

/// One element change of a set patch.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum SetChange {
    Add { value: String },
    Delete { value: String },
}

impl SetChange {
    /// The element this change adds or removes.
    pub fn value(&self) -> &str {
        match self {
            Self::Add { value } | Self::Delete { value } => value,
        }
    }
}
