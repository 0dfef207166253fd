//! Document indexer: flatten an item tree into an id-keyed index.

use dpatch_types::Scope;
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::{DiffError, DiffResult, Snapshot};

/// How items of a collection are identified and nested.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeLayout {
    /// Field holding each item's id.
    pub id_field: String,
    /// Field holding child items. `Some` means items can move between parents.
    pub children_field: Option<String>,
}

impl TreeLayout {
    /// A nested tree whose items can be reparented.
    pub fn tree(id_field: &str, children_field: &str) -> Self {
        Self {
            id_field: id_field.to_string(),
            children_field: Some(children_field.to_string()),
        }
    }

    /// A flat list with a single implicit scope.
    pub fn flat(id_field: &str) -> Self {
        Self {
            id_field: id_field.to_string(),
            children_field: None,
        }
    }

    pub fn supports_reparenting(&self) -> bool {
        self.children_field.is_some()
    }

    /// The item without its children field, as carried by an `add` operation.
    pub fn detached(&self, node: &Value) -> Value {
        match (&self.children_field, node.as_object()) {
            (Some(children), Some(fields)) => Value::Object(
                fields
                    .iter()
                    .filter(|(key, _)| *key != children)
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect::<Map<String, Value>>(),
            ),
            _ => node.clone(),
        }
    }
}

/// Where an item sits in its snapshot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IndexEntry<'a> {
    pub node: &'a Value,
    /// Parent item id, `None` at the top level.
    pub parent: Option<&'a str>,
    /// Id of the preceding sibling, `None` for the first child.
    pub previous: Option<&'a str>,
    /// 0-based index among the parent's children.
    pub position: usize,
}

/// Id-keyed index of one snapshot of a collection.
///
/// Entries iterate in depth-first document order: an item, then its
/// children, then its next sibling.
#[derive(Clone, Debug, Default)]
pub struct DocumentIndex<'a> {
    entries: IndexMap<&'a str, IndexEntry<'a>>,
    roots: Vec<&'a str>,
    children: IndexMap<&'a str, Vec<&'a str>>,
}

impl<'a> DocumentIndex<'a> {
    /// Index `nodes` (the top-level items) and everything nested below them.
    pub fn build(nodes: &'a [Value], layout: &TreeLayout, snapshot: Snapshot) -> DiffResult<Self> {
        let mut index = Self::default();
        index.visit(nodes, None, layout, snapshot)?;
        Ok(index)
    }

    fn visit(
        &mut self,
        nodes: &'a [Value],
        parent: Option<&'a str>,
        layout: &TreeLayout,
        snapshot: Snapshot,
    ) -> DiffResult<()> {
        let mut previous = None;
        for (position, node) in nodes.iter().enumerate() {
            let id = node_id(node, &layout.id_field).ok_or_else(|| DiffError::MissingId {
                snapshot,
                scope: Scope::from_parent(parent),
                position,
            })?;
            if self.entries.contains_key(id) {
                return Err(DiffError::DuplicateId {
                    id: id.to_string(),
                    snapshot,
                });
            }
            self.entries.insert(
                id,
                IndexEntry {
                    node,
                    parent,
                    previous,
                    position,
                },
            );
            match parent {
                Some(parent) => self.children.entry(parent).or_default().push(id),
                None => self.roots.push(id),
            }

            if let Some(field) = &layout.children_field {
                let nested = collection(node.get(field), field, snapshot)?;
                self.visit(nested, Some(id), layout, snapshot)?;
            }
            previous = Some(id);
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&IndexEntry<'a>> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Ids of the direct children of `parent` (`None` for the top level), in order.
    pub fn children(&self, parent: Option<&str>) -> &[&'a str] {
        match parent {
            None => &self.roots,
            Some(id) => self.children.get(id).map(Vec::as_slice).unwrap_or_default(),
        }
    }

    /// Entries in depth-first document order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &IndexEntry<'a>)> + '_ {
        self.entries.iter().map(|(id, entry)| (*id, entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The string id of `node`, if it has one.
pub fn node_id<'a>(node: &'a Value, id_field: &str) -> Option<&'a str> {
    node.get(id_field).and_then(Value::as_str)
}

/// Read a collection field. Missing and `null` are empty; other non-arrays fail.
pub fn collection<'a>(value: Option<&'a Value>, field: &str, snapshot: Snapshot) -> DiffResult<&'a [Value]> {
    match value {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(DiffError::NotACollection {
            snapshot,
            field: field.to_string(),
        }),
    }
}
