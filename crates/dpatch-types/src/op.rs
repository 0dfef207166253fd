//! Operations on ordered, identity-keyed item collections.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::change::FieldChange;
use crate::scope::Scope;

/// One operation on an item of an id-keyed collection.
///
/// Serialized as a flat object: `{"id": ..., "op": "reorder", "parentId": ..., "sortOrder": ...}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemOp {
    /// Id of the item the operation applies to.
    pub id: String,
    #[serde(flatten)]
    pub kind: ItemOpKind,
}

/// The operation carried by an [`ItemOp`].
///
/// `parent_id` is `None` on `add` and `reorder` inside collections that have
/// no nesting (event lists, link lists), where the field is omitted from the
/// wire entirely. In item trees it is always present, `null` meaning the
/// document root.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum ItemOpKind {
    /// A new item is inserted at `sort_order` in its parent scope.
    Add {
        #[serde(
            rename = "parentId",
            default,
            skip_serializing_if = "Option::is_none",
            deserialize_with = "crate::scope::present"
        )]
        parent_id: Option<Scope>,
        #[serde(rename = "sortOrder")]
        sort_order: usize,
        value: Value,
    },
    /// The item is removed.
    Delete,
    /// The item moves to `sort_order` within its scope.
    Reorder {
        #[serde(
            rename = "parentId",
            default,
            skip_serializing_if = "Option::is_none",
            deserialize_with = "crate::scope::present"
        )]
        parent_id: Option<Scope>,
        #[serde(rename = "sortOrder")]
        sort_order: usize,
    },
    /// The item is attached to a new parent, keeping its identity.
    Mount {
        #[serde(rename = "parentId")]
        parent_id: Scope,
        #[serde(rename = "sortOrder")]
        sort_order: usize,
    },
    /// The item is detached from its previous parent.
    Demount {
        #[serde(rename = "parentId")]
        parent_id: Scope,
    },
    /// Fields of the item changed.
    Modify { changes: Vec<FieldChange> },
}

impl ItemOp {
    pub fn add(id: impl Into<String>, parent_id: Option<Scope>, sort_order: usize, value: Value) -> Self {
        Self {
            id: id.into(),
            kind: ItemOpKind::Add {
                parent_id,
                sort_order,
                value,
            },
        }
    }

    pub fn delete(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ItemOpKind::Delete,
        }
    }

    pub fn reorder(id: impl Into<String>, parent_id: Option<Scope>, sort_order: usize) -> Self {
        Self {
            id: id.into(),
            kind: ItemOpKind::Reorder {
                parent_id,
                sort_order,
            },
        }
    }

    pub fn mount(id: impl Into<String>, parent_id: Scope, sort_order: usize) -> Self {
        Self {
            id: id.into(),
            kind: ItemOpKind::Mount {
                parent_id,
                sort_order,
            },
        }
    }

    pub fn demount(id: impl Into<String>, parent_id: Scope) -> Self {
        Self {
            id: id.into(),
            kind: ItemOpKind::Demount { parent_id },
        }
    }

    pub fn modify(id: impl Into<String>, changes: Vec<FieldChange>) -> Self {
        Self {
            id: id.into(),
            kind: ItemOpKind::Modify { changes },
        }
    }

    /// The wire name of this operation.
    pub fn op_name(&self) -> &'static str {
        match self.kind {
            ItemOpKind::Add { .. } => "add",
            ItemOpKind::Delete => "delete",
            ItemOpKind::Reorder { .. } => "reorder",
            ItemOpKind::Mount { .. } => "mount",
            ItemOpKind::Demount { .. } => "demount",
            ItemOpKind::Modify { .. } => "modify",
        }
    }

    /// Returns `true` for `modify` operations.
    pub fn is_modify(&self) -> bool {
        matches!(self.kind, ItemOpKind::Modify { .. })
    }
}
