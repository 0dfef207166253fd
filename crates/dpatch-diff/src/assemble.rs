//! Patch assembler: order per-scope operations and shape them for the wire.

use dpatch_types::{FieldChange, ItemOp, Scope};
use indexmap::IndexMap;
use serde_json::Value;

/// An item operation before ordering and field stripping.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingOp {
    pub id: String,
    pub kind: PendingKind,
}

/// Operation payload. Positions are kept on every structural kind so they
/// can be used as the ordering key.
#[derive(Clone, Debug, PartialEq)]
pub enum PendingKind {
    Add {
        parent: Scope,
        position: usize,
        value: Value,
    },
    /// `position` is the item's origin position.
    Delete { position: usize },
    Reorder { parent: Scope, position: usize },
    Mount { parent: Scope, position: usize },
    /// `parent` is the scope the item leaves, `position` its origin position.
    Demount { parent: Scope, position: usize },
    Modify { changes: Vec<FieldChange> },
}

impl PendingOp {
    pub fn new(id: &str, kind: PendingKind) -> Self {
        Self {
            id: id.to_string(),
            kind,
        }
    }

    /// Ordering key within a scope, `None` for `modify`.
    pub fn sort_key(&self) -> Option<usize> {
        match &self.kind {
            PendingKind::Add { position, .. }
            | PendingKind::Delete { position }
            | PendingKind::Reorder { position, .. }
            | PendingKind::Mount { position, .. }
            | PendingKind::Demount { position, .. } => Some(*position),
            PendingKind::Modify { .. } => None,
        }
    }

    /// Strip to the wire shape. Without reparenting, `parentId` is dropped.
    fn into_item_op(self, reparenting: bool) -> ItemOp {
        let parent_id = |parent: Scope| reparenting.then_some(parent);
        match self.kind {
            PendingKind::Add {
                parent,
                position,
                value,
            } => ItemOp::add(self.id, parent_id(parent), position, value),
            PendingKind::Delete { .. } => ItemOp::delete(self.id),
            PendingKind::Reorder { parent, position } => {
                ItemOp::reorder(self.id, parent_id(parent), position)
            }
            PendingKind::Mount { parent, position } => ItemOp::mount(self.id, parent, position),
            PendingKind::Demount { parent, .. } => ItemOp::demount(self.id, parent),
            PendingKind::Modify { changes } => ItemOp::modify(self.id, changes),
        }
    }
}

/// Operations grouped by the scope they were registered in.
///
/// Scopes keep first-registration order; operations keep registration order
/// until [`ScopedOps::into_item_ops`] sorts them.
#[derive(Clone, Debug, Default)]
pub struct ScopedOps {
    scopes: IndexMap<Scope, Vec<PendingOp>>,
}

impl ScopedOps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, scope: Scope, op: PendingOp) {
        self.scopes.entry(scope).or_default().push(op);
    }

    /// Operations registered in `scope`, in registration order.
    pub fn ops_in(&self, scope: &Scope) -> &[PendingOp] {
        self.scopes.get(scope).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of scopes with at least one operation.
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Total number of operations.
    pub fn len(&self) -> usize {
        self.scopes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Flatten into wire operations.
    ///
    /// Per scope, structural operations come first, stably sorted by their
    /// position; `modify` operations follow in registration order.
    pub fn into_item_ops(self, reparenting: bool) -> Vec<ItemOp> {
        let mut ops = Vec::with_capacity(self.len());
        for (_, scope_ops) in self.scopes {
            let (mut structural, modified): (Vec<_>, Vec<_>) =
                scope_ops.into_iter().partition(|op| op.sort_key().is_some());
            structural.sort_by_key(PendingOp::sort_key);
            ops.extend(
                structural
                    .into_iter()
                    .chain(modified)
                    .map(|op| op.into_item_op(reparenting)),
            );
        }
        ops
    }
}
