//! Field-change detector: which declared fields of one item changed.

use dpatch_schema::{CollectionSchema, NodeType, PatchSchema, PropertyDef, TypeRegistry};
use dpatch_types::FieldChange;
use serde_json::Value;
use tracing::trace;

use crate::error::{DiffResult, Snapshot};
use crate::index::{collection, TreeLayout};
use crate::reconcile::reconcile;
use crate::set_diff::set_patch;
use crate::value_diff::diff_values_at;

/// Computes the field changes of an item present in both snapshots.
///
/// Only declared fields are compared: the schema's common item fields, the
/// properties and text slots of the item's type, set fields, and nested
/// collections. Anything else an item carries is ignored.
///
/// Common fields go through the value differ leaf by leaf. Type properties
/// are single values and are replaced whole. Text slots and nested entry
/// fields are compared key by key over both sides, each key replaced whole.
#[derive(Clone, Copy, Debug)]
pub struct FieldChangeDetector<'s> {
    schema: &'s PatchSchema,
    registry: &'s TypeRegistry,
}

impl<'s> FieldChangeDetector<'s> {
    pub fn new(schema: &'s PatchSchema, registry: &'s TypeRegistry) -> Self {
        Self { schema, registry }
    }

    /// Field changes between two versions of an item, in this order: common
    /// fields, type properties, set fields, text slots, nested collections.
    pub fn detect(&self, origin: &Value, modified: &Value) -> DiffResult<Vec<FieldChange>> {
        let schema = self.schema;
        let mut changes = Vec::new();

        for field in &schema.node_fields {
            diff_declared(
                vec![field.clone()],
                origin.get(field),
                modified.get(field),
                &mut changes,
            );
        }

        let types = self.declared_types(origin, modified);
        if !types.is_empty() {
            let origin_props = origin.get(&schema.properties_field);
            let modified_props = modified.get(&schema.properties_field);
            for prop in declared_properties(&types) {
                let new = modified_props.and_then(|p| p.get(&prop.name));
                if new.is_some_and(|v| !prop.kind.accepts(v)) {
                    trace!(property = %prop.name, kind = ?prop.kind, "ignoring value of wrong kind");
                    continue;
                }
                replace_whole(
                    vec![schema.properties_field.clone(), prop.name.clone()],
                    origin_props.and_then(|p| p.get(&prop.name)),
                    new,
                    &mut changes,
                );
            }
        }

        for field in &schema.node_set_fields {
            changes.extend(set_patch(
                vec![field.clone()],
                origin.get(field),
                modified.get(field),
            ));
        }

        if !types.is_empty() {
            let origin_slots = origin.get(&schema.text_slots_field);
            let modified_slots = modified.get(&schema.text_slots_field);
            for slot in declared_slots(&types) {
                diff_keyed(
                    vec![schema.text_slots_field.clone(), slot.clone()],
                    origin_slots.and_then(|s| s.get(slot)),
                    modified_slots.and_then(|s| s.get(slot)),
                    &mut changes,
                );
            }
        }

        for nested in &schema.node_collections {
            changes.extend(self.diff_collection(nested, origin, modified)?);
        }
        Ok(changes)
    }

    /// Field changes between two versions of an entry of a nested collection.
    pub fn detect_entry(
        &self,
        collection: &CollectionSchema,
        origin: &Value,
        modified: &Value,
    ) -> DiffResult<Vec<FieldChange>> {
        let mut changes = Vec::new();
        for field in &collection.fields {
            diff_keyed(
                vec![field.clone()],
                origin.get(field),
                modified.get(field),
                &mut changes,
            );
        }
        for nested in &collection.collections {
            changes.extend(self.diff_collection(nested, origin, modified)?);
        }
        Ok(changes)
    }

    /// Types whose declarations are compared: the modified item's type, then
    /// the origin item's type when the type changed. Empty when the modified
    /// type is unknown.
    fn declared_types(&self, origin: &Value, modified: &Value) -> Vec<&'s NodeType> {
        let Some(current) = self.node_type(modified) else {
            return Vec::new();
        };
        let mut types = vec![current];
        let type_field = &self.schema.type_field;
        if origin.get(type_field) != modified.get(type_field) {
            types.extend(self.node_type(origin));
        }
        types
    }

    fn node_type(&self, node: &Value) -> Option<&'s NodeType> {
        let name = node.get(&self.schema.type_field)?.as_str()?;
        let node_type = self.registry.get(name);
        if node_type.is_none() {
            trace!(node_type = name, "unknown item type, comparing common fields only");
        }
        node_type
    }

    /// Reconcile the collection at `schema.path` of two owners into one
    /// `idArrayPatch` change.
    fn diff_collection(
        &self,
        schema: &CollectionSchema,
        origin: &Value,
        modified: &Value,
    ) -> DiffResult<Option<FieldChange>> {
        let path = schema.segments();
        let origin_items = collection(lookup(origin, &path), &schema.path, Snapshot::Origin)?;
        let modified_items = collection(lookup(modified, &path), &schema.path, Snapshot::Modified)?;
        if origin_items.is_empty() && modified_items.is_empty() {
            return Ok(None);
        }

        let layout = TreeLayout::flat(&self.schema.id_field);
        let ops = reconcile(origin_items, modified_items, &layout, |o, m| {
            self.detect_entry(schema, o, m)
        })?
        .into_item_ops(false);
        Ok((!ops.is_empty()).then(|| FieldChange::id_array_patch(path, ops)))
    }
}

/// Properties of all `types`, first declaration of a name wins.
fn declared_properties<'s>(types: &[&'s NodeType]) -> Vec<&'s PropertyDef> {
    let mut props: Vec<&PropertyDef> = Vec::new();
    for prop in types.iter().copied().flat_map(|t| &t.properties) {
        if !props.iter().any(|p| p.name == prop.name) {
            props.push(prop);
        }
    }
    props
}

fn declared_slots<'s>(types: &[&'s NodeType]) -> Vec<&'s String> {
    let mut slots: Vec<&String> = Vec::new();
    for slot in types.iter().copied().flat_map(|t| &t.text_slots) {
        if !slots.contains(&slot) {
            slots.push(slot);
        }
    }
    slots
}

/// Compare one declared field leaf by leaf. A field present on one side only
/// is replaced wholesale (with `null` when it disappeared).
fn diff_declared(
    path: Vec<String>,
    origin: Option<&Value>,
    modified: Option<&Value>,
    out: &mut Vec<FieldChange>,
) {
    match (origin, modified) {
        (Some(old), Some(new)) => {
            out.extend(diff_values_at(&path, old, new).into_field_changes());
        }
        _ => replace_whole(path, origin, modified, out),
    }
}

/// Compare two objects over the union of their keys (origin order, then keys
/// new in `modified`), replacing each changed key whole. Anything that is not
/// an object on both sides is replaced whole.
fn diff_keyed(
    path: Vec<String>,
    origin: Option<&Value>,
    modified: Option<&Value>,
    out: &mut Vec<FieldChange>,
) {
    let (Some(Value::Object(old)), Some(Value::Object(new))) = (origin, modified) else {
        return replace_whole(path, origin, modified, out);
    };
    let added = new.keys().filter(|key| !old.contains_key(*key));
    for key in old.keys().chain(added) {
        let mut key_path = path.clone();
        key_path.push(key.clone());
        replace_whole(key_path, old.get(key), new.get(key), out);
    }
}

/// Replace the value at `path` when the two sides differ structurally. A
/// missing side counts as `null`.
fn replace_whole(
    path: Vec<String>,
    origin: Option<&Value>,
    modified: Option<&Value>,
    out: &mut Vec<FieldChange>,
) {
    let old = origin.filter(|v| !v.is_null());
    let new = modified.filter(|v| !v.is_null());
    if old != new {
        out.push(FieldChange::replace(path, new.cloned().unwrap_or(Value::Null)));
    }
}

fn lookup<'v>(value: &'v Value, path: &[String]) -> Option<&'v Value> {
    path.iter().try_fold(value, |v, segment| v.get(segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpatch_types::{FieldChangeKind, ItemOp, ItemOpKind, SetChange};
    use serde_json::json;

    fn detect(origin: Value, modified: Value) -> Vec<FieldChange> {
        let schema = PatchSchema::default();
        let registry = TypeRegistry::builtin();
        FieldChangeDetector::new(&schema, &registry)
            .detect(&origin, &modified)
            .unwrap()
    }

    fn replaced(change: &FieldChange) -> (String, Value) {
        match &change.kind {
            FieldChangeKind::Replace { value } => (change.dotted_path(), value.clone()),
            other => panic!("expected replace, got {other:?}"),
        }
    }

    fn nested_ops(change: &FieldChange) -> &[ItemOp] {
        match &change.kind {
            FieldChangeKind::IdArrayPatch { changes } => changes,
            other => panic!("expected idArrayPatch, got {other:?}"),
        }
    }

    #[test]
    fn unchanged_item() {
        let item = json!({"id": "a", "name": "x", "shape": "rect", "shapeProps": {"fill": {"type": "none"}}});
        assert!(detect(item.clone(), item).is_empty());
    }

    #[test]
    fn common_field_replace() {
        let changes = detect(
            json!({"id": "qwe1", "name": "item1", "shape": "rect"}),
            json!({"id": "qwe1", "name": "item1-changed", "shape": "rect"}),
        );
        assert_eq!(changes.len(), 1);
        assert_eq!(replaced(&changes[0]), ("name".into(), json!("item1-changed")));
    }

    #[test]
    fn area_changes_per_leaf() {
        let changes = detect(
            json!({"id": "a", "area": {"x": 0, "y": 0, "w": 100, "h": 50}}),
            json!({"id": "a", "area": {"x": 10, "y": 0, "w": 100, "h": 60}}),
        );
        let paths: Vec<String> = changes.iter().map(FieldChange::dotted_path).collect();
        assert_eq!(paths, vec!["area.x", "area.h"]);
    }

    #[test]
    fn appearing_and_disappearing_fields() {
        let changes = detect(
            json!({"id": "a", "description": "old"}),
            json!({"id": "a", "cursor": "pointer"}),
        );
        let pairs: Vec<(String, Value)> = changes.iter().map(replaced).collect();
        assert_eq!(
            pairs,
            vec![
                ("description".into(), Value::Null),
                ("cursor".into(), json!("pointer")),
            ]
        );
    }

    #[test]
    fn undeclared_fields_ignored() {
        let changes = detect(
            json!({"id": "a", "meta": {"x": 1}, "locked": false}),
            json!({"id": "a", "meta": {"x": 2}, "locked": true}),
        );
        assert!(changes.is_empty());
    }

    #[test]
    fn shape_prop_replace() {
        let changes = detect(
            json!({"id": "a", "shape": "rect", "shapeProps": {"strokeColor": "#fff", "strokeSize": 1}}),
            json!({"id": "a", "shape": "rect", "shapeProps": {"strokeColor": "#000", "strokeSize": 1}}),
        );
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, vec!["shapeProps", "strokeColor"]);
    }

    #[test]
    fn shape_prop_of_wrong_kind_ignored() {
        let changes = detect(
            json!({"id": "a", "shape": "rect", "shapeProps": {"strokeColor": "#fff"}}),
            json!({"id": "a", "shape": "rect", "shapeProps": {"strokeColor": 45}}),
        );
        assert!(changes.is_empty());
    }

    #[test]
    fn unknown_type_compares_common_fields() {
        let changes = detect(
            json!({"id": "a", "shape": "blob", "name": "x", "shapeProps": {"fill": "a"}, "textSlots": {"body": {"text": "a"}}}),
            json!({"id": "a", "shape": "blob", "name": "y", "shapeProps": {"fill": "b"}, "textSlots": {"body": {"text": "b"}}}),
        );
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, vec!["name"]);
    }

    #[test]
    fn set_fields_patch() {
        let changes = detect(
            json!({"id": "a", "tags": ["a", "b", "c", "d"], "groups": ["g1"]}),
            json!({"id": "a", "tags": ["a", "c", "d", "g", "e"], "groups": ["g1"]}),
        );
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, vec!["tags"]);
        assert_eq!(
            changes[0].kind,
            FieldChangeKind::SetPatch {
                changes: vec![
                    SetChange::Add { value: "g".into() },
                    SetChange::Add { value: "e".into() },
                    SetChange::Delete { value: "b".into() },
                ]
            }
        );
    }

    #[test]
    fn text_slots_in_origin_order() {
        let origin = json!({"id": "a", "shape": "rect", "textSlots": {"body": {
            "text": "hello", "color": "#000", "valign": "middle", "fontSize": 14
        }}});
        let modified = json!({"id": "a", "shape": "rect", "textSlots": {"body": {
            "fontSize": 16, "valign": "top", "color": "#000", "text": "hi"
        }}});
        let paths: Vec<String> = detect(origin, modified).iter().map(FieldChange::dotted_path).collect();
        assert_eq!(
            paths,
            vec!["textSlots.body.text", "textSlots.body.valign", "textSlots.body.fontSize"]
        );
    }

    #[test]
    fn undeclared_text_slot_ignored() {
        let changes = detect(
            json!({"id": "a", "shape": "rect", "textSlots": {"caption": {"text": "a"}}}),
            json!({"id": "a", "shape": "rect", "textSlots": {"caption": {"text": "b"}}}),
        );
        assert!(changes.is_empty());
    }

    #[test]
    fn links_collection() {
        let origin = json!({"id": "a", "links": [
            {"id": "l1", "title": "One", "url": "http://one", "type": "default"},
            {"id": "l2", "title": "Two", "url": "http://two", "type": "default"},
            {"id": "l3", "title": "Three", "url": "http://three", "type": "default"},
            {"id": "l4", "title": "Four", "url": "http://four", "type": "default"}
        ]});
        let modified = json!({"id": "a", "links": [
            {"id": "l1", "title": "One", "url": "http://one", "type": "default"},
            {"id": "l4", "title": "Four", "url": "http://four", "type": "default"},
            {"id": "l3", "title": "Three!", "url": "http://3", "type": "logs"},
            {"id": "l5", "title": "Five", "url": "http://five", "type": "default"}
        ]});
        let changes = detect(origin, modified);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, vec!["links"]);

        let ops = nested_ops(&changes[0]);
        let names: Vec<(&str, &str)> = ops.iter().map(|op| (op.id.as_str(), op.op_name())).collect();
        assert_eq!(
            names,
            vec![("l2", "delete"), ("l4", "reorder"), ("l5", "add"), ("l3", "modify")]
        );
        assert_eq!(ops[1], ItemOp::reorder("l4", None, 1));
        let ItemOpKind::Modify { changes } = &ops[3].kind else {
            panic!("expected modify");
        };
        let paths: Vec<String> = changes.iter().map(FieldChange::dotted_path).collect();
        assert_eq!(paths, vec!["title", "url", "type"]);
    }

    #[test]
    fn nested_actions_inside_events() {
        let origin = json!({"id": "a", "behavior": {"events": [{"id": "e1", "event": "click", "actions": [
            {"id": "a1", "element": "self", "method": "show", "args": {}},
            {"id": "a2", "element": "self", "method": "hide", "args": {}}
        ]}]}});
        let modified = json!({"id": "a", "behavior": {"events": [{"id": "e1", "event": "click", "actions": [
            {"id": "a1", "element": "self", "method": "show", "args": {"animated": true}}
        ]}]}});
        let changes = detect(origin, modified);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, vec!["behavior", "events"]);

        let events = nested_ops(&changes[0]);
        assert_eq!(events.len(), 1);
        let ItemOpKind::Modify { changes } = &events[0].kind else {
            panic!("expected modify");
        };
        assert_eq!(changes[0].path, vec!["actions"]);
        assert_eq!(
            nested_ops(&changes[0]),
            &[
                ItemOp::delete("a2"),
                ItemOp::modify(
                    "a1",
                    vec![FieldChange::replace(vec!["args".into(), "animated".into()], json!(true))]
                ),
            ]
        );
    }

    #[test]
    fn actions_added_deleted_reordered_modified() {
        let stroke = |value: &str| json!({"field": "shapeProps.strokeColor", "value": value});
        let fill = json!({"field": "shapeProps.fill", "value": {"type": "solid", "color": "rgba(225, 44, 44, 1)"}});
        let blink = json!({"fade": true, "color": "#fff", "inBackground": true});
        let origin = json!({"id": "qwe1", "behavior": {"events": [{"id": "e1", "event": "click", "actions": [
            {"id": "a1", "element": "self", "method": "blinkEffect", "args": blink},
            {"id": "a2", "element": "self", "method": "crawlEffect", "args": {}},
            {"id": "a3", "element": "self", "method": "set", "args": fill},
            {"id": "a4", "element": "self", "method": "set", "args": stroke("rgba(225, 44, 44, 1)")}
        ]}]}});
        let a5 = json!({"id": "a5", "element": "self", "method": "particleEffect", "args": {}});
        let modified = json!({"id": "qwe1", "behavior": {"events": [{"id": "e1", "event": "click", "actions": [
            {"id": "a3", "element": "self", "method": "set", "args": fill},
            {"id": "a1", "element": "self", "method": "blinkEffect", "args": blink},
            {"id": "a4", "element": "asd", "method": "set", "args": stroke("#000")},
            a5
        ]}]}});

        let changes = detect(origin, modified);
        assert_eq!(changes.len(), 1);
        let events = nested_ops(&changes[0]);
        assert_eq!(events.len(), 1);
        let ItemOpKind::Modify { changes } = &events[0].kind else {
            panic!("expected modify");
        };
        assert_eq!(
            nested_ops(&changes[0]),
            &[
                ItemOp::reorder("a3", None, 0),
                ItemOp::delete("a2"),
                ItemOp::add("a5", None, 3, a5.clone()),
                ItemOp::modify(
                    "a4",
                    vec![
                        FieldChange::replace(vec!["element".into()], json!("asd")),
                        FieldChange::replace(vec!["args".into(), "value".into()], json!("#000")),
                    ]
                ),
            ]
        );
    }

    #[test]
    fn shrinking_array_property_replaced_whole() {
        let changes = detect(
            json!({"id": "c", "shape": "connector", "shapeProps": {"points": [{"x": 0}, {"x": 1}, {"x": 2}]}}),
            json!({"id": "c", "shape": "connector", "shapeProps": {"points": [{"x": 0}, {"x": 1}]}}),
        );
        let pairs: Vec<(String, Value)> = changes.iter().map(replaced).collect();
        assert_eq!(
            pairs,
            vec![("shapeProps.points".into(), json!([{"x": 0}, {"x": 1}]))]
        );
    }

    #[test]
    fn fill_with_different_keys_replaced_whole() {
        let changes = detect(
            json!({"id": "a", "shape": "rect", "shapeProps": {"fill": {"type": "solid", "color": "red"}}}),
            json!({"id": "a", "shape": "rect", "shapeProps": {"fill": {"type": "image", "image": "x.png"}}}),
        );
        let pairs: Vec<(String, Value)> = changes.iter().map(replaced).collect();
        assert_eq!(
            pairs,
            vec![("shapeProps.fill".into(), json!({"type": "image", "image": "x.png"}))]
        );
    }

    #[test]
    fn text_slot_keys_added_and_removed() {
        let changes = detect(
            json!({"id": "a", "shape": "rect", "textSlots": {"body": {"text": "hi", "font": "Arial"}}}),
            json!({"id": "a", "shape": "rect", "textSlots": {"body": {"text": "hi", "color": "#000"}}}),
        );
        let pairs: Vec<(String, Value)> = changes.iter().map(replaced).collect();
        assert_eq!(
            pairs,
            vec![
                ("textSlots.body.font".into(), Value::Null),
                ("textSlots.body.color".into(), json!("#000")),
            ]
        );
    }

    #[test]
    fn type_change_compares_properties_of_both_types() {
        let changes = detect(
            json!({"id": "a", "shape": "rect", "shapeProps": {"cornerRadius": 4, "strokeSize": 1}}),
            json!({"id": "a", "shape": "connector", "shapeProps": {"strokeSize": 1, "points": []}}),
        );
        let pairs: Vec<(String, Value)> = changes.iter().map(replaced).collect();
        assert_eq!(
            pairs,
            vec![
                ("shape".into(), json!("connector")),
                ("shapeProps.points".into(), json!([])),
                ("shapeProps.cornerRadius".into(), Value::Null),
            ]
        );
    }

    #[test]
    fn empty_collections_produce_nothing() {
        let changes = detect(
            json!({"id": "a", "links": []}),
            json!({"id": "a", "behavior": {"events": null}}),
        );
        assert!(changes.is_empty());
    }

    #[test]
    fn malformed_collection_fails() {
        let schema = PatchSchema::default();
        let registry = TypeRegistry::builtin();
        let err = FieldChangeDetector::new(&schema, &registry)
            .detect(&json!({"id": "a", "links": "none"}), &json!({"id": "a"}))
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::DiffError::NotACollection { snapshot: Snapshot::Origin, .. }
        ));
    }
}
