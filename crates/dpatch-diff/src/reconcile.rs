//! Tree reconciler: match items of two snapshots by id and derive the
//! structural operations (add, delete, reorder, mount, demount) plus
//! per-item field changes.

use dpatch_types::{FieldChange, Scope};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, trace};

use crate::assemble::{PendingKind, PendingOp, ScopedOps};
use crate::error::{DiffResult, Snapshot};
use crate::index::{DocumentIndex, TreeLayout};

/// Reconcile two snapshots of an id-keyed collection.
///
/// `detect` computes the field changes of an item present in both
/// snapshots; a non-empty result becomes a `modify` operation.
///
/// Operations are registered per scope. Reparenting is only detected when
/// `layout` has a children field; a flat layout has the root as its only
/// scope.
pub fn reconcile<'a, F>(
    origin_nodes: &'a [Value],
    modified_nodes: &'a [Value],
    layout: &TreeLayout,
    mut detect: F,
) -> DiffResult<ScopedOps>
where
    F: FnMut(&'a Value, &'a Value) -> DiffResult<Vec<FieldChange>>,
{
    let origin = DocumentIndex::build(origin_nodes, layout, Snapshot::Origin)?;
    let modified = DocumentIndex::build(modified_nodes, layout, Snapshot::Modified)?;

    let mut reconciler = Reconciler {
        origin: &origin,
        modified: &modified,
        layout,
        detect: &mut detect,
        additions: IndexMap::new(),
        ops: ScopedOps::new(),
    };
    reconciler.collect_additions()?;
    reconciler.reconcile_scope(None)?;

    let ops = reconciler.ops;
    debug!(
        origin = origin.len(),
        modified = modified.len(),
        scopes = ops.scope_count(),
        ops = ops.len(),
        "reconciled collection"
    );
    Ok(ops)
}

struct Reconciler<'r, 'a, F> {
    origin: &'r DocumentIndex<'a>,
    modified: &'r DocumentIndex<'a>,
    layout: &'r TreeLayout,
    detect: &'r mut F,
    /// Items that are new to a scope, keyed by their modified parent.
    additions: IndexMap<Option<&'a str>, Vec<&'a str>>,
    ops: ScopedOps,
}

/// An item of the merged working list of one scope that changed place.
struct Move<'a> {
    id: &'a str,
    old_position: usize,
    new_position: usize,
    new_parent: Option<&'a str>,
}

impl<'r, 'a, F> Reconciler<'r, 'a, F>
where
    F: FnMut(&'a Value, &'a Value) -> DiffResult<Vec<FieldChange>>,
{
    /// Register `add` for new items and `mount`/`demount` for moved ones,
    /// remembering both as additions to their new scope.
    fn collect_additions(&mut self) -> DiffResult<()> {
        let (origin, modified) = (self.origin, self.modified);
        for (id, entry) in modified.iter() {
            let previous = origin.get(id);
            if previous.is_some_and(|o| o.parent == entry.parent) {
                continue;
            }
            self.additions.entry(entry.parent).or_default().push(id);

            let scope = Scope::from_parent(entry.parent);
            match previous {
                None => {
                    let value = self.layout.detached(entry.node);
                    let kind = PendingKind::Add {
                        parent: scope.clone(),
                        position: entry.position,
                        value,
                    };
                    self.ops.register(scope, PendingOp::new(id, kind));
                }
                Some(old) => {
                    let old_scope = Scope::from_parent(old.parent);
                    trace!(id, from = %old_scope, to = %scope, "item reparented");
                    let mount = PendingKind::Mount {
                        parent: scope.clone(),
                        position: entry.position,
                    };
                    self.ops.register(scope.clone(), PendingOp::new(id, mount));
                    let demount = PendingKind::Demount {
                        parent: old_scope.clone(),
                        position: old.position,
                    };
                    self.ops.register(old_scope, PendingOp::new(id, demount));

                    let changes = (self.detect)(old.node, entry.node)?;
                    if !changes.is_empty() {
                        self.ops.register(scope, PendingOp::new(id, PendingKind::Modify { changes }));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walk the origin children of `parent`: register deletions and field
    /// changes, descend, then derive the reorders of this scope.
    fn reconcile_scope(&mut self, parent: Option<&'a str>) -> DiffResult<()> {
        let (origin, modified) = (self.origin, self.modified);
        let scope = Scope::from_parent(parent);

        let mut merged: Vec<&'a str> = Vec::new();
        for &id in origin.children(parent) {
            let Some(old) = origin.get(id) else { continue };
            match modified.get(id) {
                Some(new) if new.parent == old.parent => {
                    merged.push(id);
                    let changes = (self.detect)(old.node, new.node)?;
                    if !changes.is_empty() {
                        self.ops
                            .register(scope.clone(), PendingOp::new(id, PendingKind::Modify { changes }));
                    }
                }
                Some(_) => {}
                None => {
                    let kind = PendingKind::Delete {
                        position: old.position,
                    };
                    self.ops.register(scope.clone(), PendingOp::new(id, kind));
                }
            }
            if self.layout.supports_reparenting() {
                self.reconcile_scope(Some(id))?;
            }
        }

        if let Some(added) = self.additions.get(&parent) {
            for &id in added {
                let position = modified.get(id).map_or(0, |e| e.position);
                merged.insert(position.min(merged.len()), id);
            }
        }

        let mut moves = Vec::new();
        for (i, &id) in merged.iter().enumerate() {
            let Some(new) = modified.get(id) else { continue };
            let old_previous = i.checked_sub(1).map(|p| merged[p]);
            if (old_previous != new.previous && i != new.position) || parent != new.parent {
                moves.push(Move {
                    id,
                    old_position: i,
                    new_position: new.position,
                    new_parent: new.parent,
                });
            }
        }
        moves.sort_by_key(|m| m.new_position);

        // A move into the slot vacated by the previous move is a side effect
        // of that move, not a reorder of its own.
        let cascaded: Vec<bool> = (0..moves.len())
            .map(|i| {
                i > 0
                    && moves[i].old_position == moves[i - 1].new_position
                    && moves[i].new_position == moves[i].old_position + 1
                    && parent == moves[i].new_parent
            })
            .collect();

        let mut reorders = 0;
        for (m, cascaded) in moves.iter().zip(cascaded) {
            if cascaded {
                continue;
            }
            let kind = PendingKind::Reorder {
                parent: Scope::from_parent(m.new_parent),
                position: m.new_position,
            };
            self.ops.register(scope.clone(), PendingOp::new(m.id, kind));
            reorders += 1;
        }
        if reorders > 0 {
            trace!(scope = %scope, candidates = moves.len(), reorders, "scope reordered");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpatch_types::ItemOp;
    use serde_json::json;

    fn ids(list: &[&str]) -> Vec<Value> {
        list.iter().map(|id| json!({"id": id})).collect()
    }

    fn no_fields(_: &Value, _: &Value) -> DiffResult<Vec<FieldChange>> {
        Ok(Vec::new())
    }

    fn tree_ops(origin: &[Value], modified: &[Value]) -> Vec<ItemOp> {
        let layout = TreeLayout::tree("id", "childItems");
        reconcile(origin, modified, &layout, no_fields)
            .unwrap()
            .into_item_ops(true)
    }

    #[test]
    fn identical_collections_no_ops() {
        let items = ids(&["q1", "q2", "q3"]);
        assert!(tree_ops(&items, &items).is_empty());
    }

    #[test]
    fn single_move_to_front() {
        let ops = tree_ops(&ids(&["q1", "q2", "q3"]), &ids(&["q3", "q1", "q2"]));
        assert_eq!(ops, vec![ItemOp::reorder("q3", Some(Scope::Root), 0)]);
    }

    #[test]
    fn move_to_back_also_reorders_displaced_item() {
        let ops = tree_ops(&ids(&["q1", "q2", "q3"]), &ids(&["q2", "q3", "q1"]));
        assert_eq!(
            ops,
            vec![
                ItemOp::reorder("q2", Some(Scope::Root), 0),
                ItemOp::reorder("q1", Some(Scope::Root), 2),
            ]
        );
    }

    #[test]
    fn add_delete_and_reorder() {
        let origin = vec![
            json!({"id": "q1", "name": "item1"}),
            json!({"id": "q2", "name": "item2"}),
            json!({"id": "q3", "name": "item3"}),
            json!({"id": "q4", "name": "item4"}),
        ];
        let modified = vec![
            origin[0].clone(),
            json!({"id": "q5", "name": "item5"}),
            origin[3].clone(),
            origin[2].clone(),
        ];
        let ops = tree_ops(&origin, &modified);
        assert_eq!(
            ops,
            vec![
                ItemOp::add("q5", Some(Scope::Root), 1, json!({"id": "q5", "name": "item5"})),
                ItemOp::delete("q2"),
                ItemOp::reorder("q4", Some(Scope::Root), 2),
            ]
        );
    }

    #[test]
    fn additions_never_reordered() {
        let ops = tree_ops(&ids(&["a", "b", "c"]), &ids(&["x", "c", "y", "a", "b", "z"]));
        let reordered: Vec<&str> = ops
            .iter()
            .filter(|op| op.op_name() == "reorder")
            .map(|op| op.id.as_str())
            .collect();
        assert_eq!(reordered, vec!["c", "a"]);
        let added: Vec<&str> = ops
            .iter()
            .filter(|op| op.op_name() == "add")
            .map(|op| op.id.as_str())
            .collect();
        assert_eq!(added, vec!["x", "y", "z"]);
    }

    #[test]
    fn added_subtree_reports_each_item() {
        let origin = ids(&["q1"]);
        let modified = vec![
            json!({"id": "q1"}),
            json!({"id": "q2", "childItems": [{"id": "q2.1"}]}),
        ];
        let ops = tree_ops(&origin, &modified);
        assert_eq!(
            ops,
            vec![
                ItemOp::add("q2", Some(Scope::Root), 1, json!({"id": "q2"})),
                ItemOp::add("q2.1", Some(Scope::Node("q2".into())), 0, json!({"id": "q2.1"})),
            ]
        );
    }

    #[test]
    fn deleted_subtree_reports_each_item() {
        let origin = vec![json!({"id": "q1", "childItems": [{"id": "q1.1"}, {"id": "q1.2"}]})];
        let ops = tree_ops(&origin, &[]);
        assert_eq!(
            ops,
            vec![ItemOp::delete("q1"), ItemOp::delete("q1.1"), ItemOp::delete("q1.2")]
        );
    }

    #[test]
    fn reparenting_mounts_and_demounts() {
        let origin = vec![
            json!({"id": "qwe1", "childItems": [{"id": "sub1.1"}, {"id": "sub1.2"}]}),
            json!({"id": "qwe3", "childItems": [{"id": "sub3.1"}, {"id": "sub3.2"}]}),
        ];
        let modified = vec![
            json!({"id": "qwe1", "childItems": [{"id": "sub1.1"}, {"id": "sub3.2"}, {"id": "sub1.2"}]}),
            json!({"id": "qwe3", "childItems": [{"id": "sub3.1"}]}),
        ];
        let ops = tree_ops(&origin, &modified);
        assert_eq!(
            ops,
            vec![
                ItemOp::mount("sub3.2", Scope::Node("qwe1".into()), 1),
                ItemOp::demount("sub3.2", Scope::Node("qwe3".into())),
            ]
        );
    }

    #[test]
    fn reparented_item_field_changes_in_new_scope() {
        let origin = vec![
            json!({"id": "a", "childItems": [{"id": "x", "name": "old"}]}),
            json!({"id": "b"}),
        ];
        let modified = vec![
            json!({"id": "a"}),
            json!({"id": "b", "childItems": [{"id": "x", "name": "new"}]}),
        ];
        let layout = TreeLayout::tree("id", "childItems");
        let ops = reconcile(&origin, &modified, &layout, |o, m| {
            Ok(if o.get("name") != m.get("name") {
                vec![FieldChange::replace(vec!["name".into()], m["name"].clone())]
            } else {
                Vec::new()
            })
        })
        .unwrap();
        let b = Scope::Node("b".into());
        let in_b: Vec<&str> = ops.ops_in(&b).iter().map(|op| op.id.as_str()).collect();
        assert_eq!(in_b, vec!["x", "x"]);
        assert!(matches!(ops.ops_in(&b)[1].kind, PendingKind::Modify { .. }));
    }

    #[test]
    fn modify_registered_in_parent_scope() {
        let origin = vec![json!({"id": "p", "childItems": [{"id": "c", "name": "a"}]})];
        let modified = vec![json!({"id": "p", "childItems": [{"id": "c", "name": "b"}]})];
        let layout = TreeLayout::tree("id", "childItems");
        let ops = reconcile(&origin, &modified, &layout, |o, m| {
            Ok(if o == m {
                Vec::new()
            } else {
                vec![FieldChange::replace(vec!["name".into()], m["name"].clone())]
            })
        })
        .unwrap();
        let in_p = ops.ops_in(&Scope::Node("p".into()));
        assert_eq!(in_p.len(), 1);
        assert_eq!(in_p[0].id, "c");
        // p itself differs only in its children, which the detector sees as a change
        assert_eq!(ops.ops_in(&Scope::Root).len(), 1);
    }

    #[test]
    fn flat_layout_never_reparents() {
        let layout = TreeLayout::flat("id");
        let origin = ids(&["e1", "e2", "e3", "e4"]);
        let modified = ids(&["e3", "e2", "e4", "e5"]);
        let ops = reconcile(&origin, &modified, &layout, no_fields)
            .unwrap()
            .into_item_ops(false);
        assert_eq!(
            ops,
            vec![
                ItemOp::delete("e1"),
                ItemOp::reorder("e3", None, 0),
                ItemOp::add("e5", None, 3, json!({"id": "e5"})),
            ]
        );
    }

    #[test]
    fn detector_errors_propagate() {
        let items = ids(&["q1"]);
        let layout = TreeLayout::flat("id");
        let result = reconcile(&items, &items, &layout, |_, _| {
            Err(crate::error::DiffError::NotACollection {
                snapshot: Snapshot::Origin,
                field: "links".into(),
            })
        });
        assert!(result.is_err());
    }
}
