//! Patch statistics: which document fields and items a patch touches.

use dpatch_types::{FieldChange, FieldChangeKind, ItemOp, ItemOpKind, Patch};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// Summary of a patch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PatchStats {
    pub document: DocumentStats,
    pub items: ItemStats,
}

/// Document-level changes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStats {
    pub field_changes: usize,
    /// Changed paths joined with `.`.
    pub fields: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ItemStats {
    pub added: IdStats,
    pub deleted: IdStats,
    pub modified: ModifiedStats,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IdStats {
    pub count: usize,
    pub items: Vec<String>,
}

/// Items changed in place. `count` is the number of distinct changed fields
/// across all items, plus one per item changed only structurally.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ModifiedStats {
    pub count: usize,
    pub items: Vec<ModifiedItem>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ModifiedItem {
    pub id: String,
    /// Changed field paths joined with `.`; nested collection entries
    /// contribute their id as a path segment.
    pub fields: Vec<String>,
}

impl PatchStats {
    pub fn from_patch(patch: &Patch) -> Self {
        let mut stats = Self::default();
        for change in &patch.doc {
            stats.document.field_changes += 1;
            stats.document.fields.push(change.dotted_path());
        }

        let mut modified = ModifiedCollector::default();
        for op in &patch.items {
            match op.kind {
                ItemOpKind::Add { .. } => {
                    stats.items.added.count += 1;
                    stats.items.added.items.push(op.id.clone());
                }
                ItemOpKind::Delete => {
                    stats.items.deleted.count += 1;
                    stats.items.deleted.items.push(op.id.clone());
                }
                _ => modified.op(&op.id, op, &[]),
            }
        }
        stats.items.modified = modified.finish();
        stats
    }

    /// Returns `true` if the patch touches nothing.
    pub fn is_empty(&self) -> bool {
        self.document.field_changes == 0
            && self.items.added.count == 0
            && self.items.deleted.count == 0
            && self.items.modified.count == 0
    }
}

/// Modified items keyed by id, in first-seen order.
#[derive(Default)]
struct ModifiedCollector {
    items: IndexMap<String, ModifiedItem>,
    seen: IndexSet<(String, String)>,
}

impl ModifiedCollector {
    fn op(&mut self, item_id: &str, op: &ItemOp, path: &[String]) {
        match &op.kind {
            ItemOpKind::Modify { changes } if !changes.is_empty() => {
                for change in changes {
                    self.change(item_id, change, path);
                }
            }
            _ => self.leaf(item_id, path),
        }
    }

    fn change(&mut self, item_id: &str, change: &FieldChange, path: &[String]) {
        let mut path = path.to_vec();
        path.extend(change.path.iter().cloned());
        match &change.kind {
            FieldChangeKind::IdArrayPatch { changes } if !changes.is_empty() => {
                for op in changes {
                    path.push(op.id.clone());
                    self.op(item_id, op, &path);
                    path.pop();
                }
            }
            _ => self.leaf(item_id, &path),
        }
    }

    fn leaf(&mut self, item_id: &str, path: &[String]) {
        let field = path.join(".");
        if !self.seen.insert((item_id.to_string(), field.clone())) {
            return;
        }
        let item = self
            .items
            .entry(item_id.to_string())
            .or_insert_with(|| ModifiedItem {
                id: item_id.to_string(),
                fields: Vec::new(),
            });
        if !field.is_empty() {
            item.fields.push(field);
        }
    }

    fn finish(self) -> ModifiedStats {
        ModifiedStats {
            count: self.seen.len(),
            items: self.items.into_values().collect(),
        }
    }
}

/// Flat lookup sets derived from [`PatchStats`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatchIndex {
    pub added_items: IndexSet<String>,
    pub deleted_items: IndexSet<String>,
    pub modified_items: IndexSet<String>,
    /// Document fields as-is, item fields as `items.<id>.<field>`.
    pub modified_fields: IndexSet<String>,
}

impl PatchIndex {
    pub fn from_stats(stats: &PatchStats) -> Self {
        let mut index = Self::default();
        index.modified_fields.extend(stats.document.fields.iter().cloned());
        index.added_items.extend(stats.items.added.items.iter().cloned());
        index.deleted_items.extend(stats.items.deleted.items.iter().cloned());
        for item in &stats.items.modified.items {
            index.modified_items.insert(item.id.clone());
            for field in &item.fields {
                index.modified_fields.insert(format!("items.{}.{field}", item.id));
            }
        }
        index
    }

    pub fn from_patch(patch: &Patch) -> Self {
        Self::from_stats(&PatchStats::from_patch(patch))
    }
}
