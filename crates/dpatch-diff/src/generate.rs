//! Patch generator: document-level changes plus the reconciled item tree.

use dpatch_schema::{PatchSchema, TypeRegistry};
use dpatch_types::{FieldChange, ItemOp, Patch};
use serde_json::Value;
use tracing::debug;

use crate::error::{DiffError, DiffResult, Snapshot};
use crate::fields::FieldChangeDetector;
use crate::index::{collection, TreeLayout};
use crate::reconcile::reconcile;
use crate::set_diff::set_patch;
use crate::value_diff::{diff_values, DiffOptions};

/// Generates patches between two snapshots of a document.
#[derive(Clone, Copy, Debug)]
pub struct PatchGenerator<'s> {
    schema: &'s PatchSchema,
    registry: &'s TypeRegistry,
}

impl<'s> PatchGenerator<'s> {
    pub fn new(schema: &'s PatchSchema, registry: &'s TypeRegistry) -> Self {
        Self { schema, registry }
    }

    /// Compute the patch turning `origin` into `modified`.
    ///
    /// Both documents must be JSON objects. The result is empty when the
    /// documents are equal in every compared field.
    pub fn generate(&self, origin: &Value, modified: &Value) -> DiffResult<Patch> {
        if !origin.is_object() {
            return Err(DiffError::NotADocument(Snapshot::Origin));
        }
        if !modified.is_object() {
            return Err(DiffError::NotADocument(Snapshot::Modified));
        }

        let doc = self.diff_document(origin, modified);
        let items = self.diff_items(origin, modified)?;
        debug!(doc_changes = doc.len(), item_ops = items.len(), "generated patch");
        Ok(Patch::new(doc, items))
    }

    /// Changes to the whitelisted document fields. Set fields are excluded
    /// from the value diff and reported as set patches after it.
    fn diff_document(&self, origin: &Value, modified: &Value) -> Vec<FieldChange> {
        let set_fields = &self.schema.doc_set_fields;
        let not_a_set = |path: &[String]| path.first().map_or(true, |f| !set_fields.contains(f));
        let options = DiffOptions::new()
            .with_whitelist(&self.schema.doc_fields)
            .with_field_check(&not_a_set);

        let mut changes = diff_values(origin, modified, &options).into_field_changes();
        for field in set_fields {
            changes.extend(set_patch(
                vec![field.clone()],
                origin.get(field),
                modified.get(field),
            ));
        }
        changes
    }

    fn diff_items(&self, origin: &Value, modified: &Value) -> DiffResult<Vec<ItemOp>> {
        let schema = self.schema;
        let origin_items = collection(origin.get(&schema.items_field), &schema.items_field, Snapshot::Origin)?;
        let modified_items =
            collection(modified.get(&schema.items_field), &schema.items_field, Snapshot::Modified)?;

        let layout = TreeLayout::tree(&schema.id_field, &schema.children_field);
        let detector = FieldChangeDetector::new(schema, self.registry);
        let ops = reconcile(origin_items, modified_items, &layout, |o, m| detector.detect(o, m))?;
        Ok(ops.into_item_ops(true))
    }
}

/// Compute the patch turning `origin` into `modified`.
///
/// Shorthand for [`PatchGenerator::generate`].
pub fn generate_patch(
    origin: &Value,
    modified: &Value,
    schema: &PatchSchema,
    registry: &TypeRegistry,
) -> DiffResult<Patch> {
    PatchGenerator::new(schema, registry).generate(origin, modified)
}
