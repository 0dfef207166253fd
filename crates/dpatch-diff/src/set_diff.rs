//! Unordered string-set diff, used for tag and group lists.

use dpatch_types::{FieldChange, SetChange};
use indexmap::IndexSet;
use serde_json::Value;

/// Compare two string lists as sets.
///
/// Elements of `modified` missing from `origin` are `add`s in first-appearance
/// order, then elements of `origin` missing from `modified` are `delete`s.
/// Duplicates are reported once.
pub fn diff_set<S: AsRef<str>>(origin: &[S], modified: &[S]) -> Vec<SetChange> {
    let origin: IndexSet<&str> = origin.iter().map(AsRef::as_ref).collect();
    let modified: IndexSet<&str> = modified.iter().map(AsRef::as_ref).collect();

    let added = modified
        .iter()
        .filter(|v| !origin.contains(*v))
        .map(|v| SetChange::Add {
            value: v.to_string(),
        });
    let deleted = origin
        .iter()
        .filter(|v| !modified.contains(*v))
        .map(|v| SetChange::Delete {
            value: v.to_string(),
        });
    added.chain(deleted).collect()
}

/// [`diff_set`] over JSON arrays.
///
/// A missing or `null` side is the empty set; non-string elements are ignored.
pub fn diff_set_values(origin: Option<&Value>, modified: Option<&Value>) -> Vec<SetChange> {
    diff_set(&strings(origin), &strings(modified))
}

/// A `setPatch` change at `path`, or `None` when the sets are equal.
pub fn set_patch(path: Vec<String>, origin: Option<&Value>, modified: Option<&Value>) -> Option<FieldChange> {
    let changes = diff_set_values(origin, modified);
    (!changes.is_empty()).then(|| FieldChange::set_patch(path, changes))
}

fn strings(value: Option<&Value>) -> Vec<&str> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}
