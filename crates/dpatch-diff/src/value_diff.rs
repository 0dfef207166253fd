//! Value-level diff: compare two JSON values and report modified leaves.
//!
//! Only modifications are reported. A field (or array index) is compared
//! when it exists on both sides; fields that appear or disappear are left to
//! the caller, which knows whether the field is declared.

use dpatch_types::FieldChange;
use serde_json::Value;

/// Options for [`diff_values`].
///
/// Both filters apply to top-level fields only.
#[derive(Clone, Copy, Default)]
pub struct DiffOptions<'a> {
    /// When set, only these top-level fields are compared.
    pub whitelist: Option<&'a [String]>,
    /// When set, a top-level field is skipped if this returns `false` for its path.
    pub field_check: Option<&'a dyn Fn(&[String]) -> bool>,
}

impl<'a> DiffOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_whitelist(mut self, fields: &'a [String]) -> Self {
        self.whitelist = Some(fields);
        self
    }

    pub fn with_field_check(mut self, check: &'a dyn Fn(&[String]) -> bool) -> Self {
        self.field_check = Some(check);
        self
    }

    fn admits(&self, path: &[String]) -> bool {
        let Some(field) = path.first() else {
            return true;
        };
        if let Some(whitelist) = self.whitelist {
            if !whitelist.contains(field) {
                return false;
            }
        }
        self.field_check.map_or(true, |check| check(path))
    }
}

/// The result of comparing two values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValueDiff {
    /// Modified leaves in origin field order.
    pub changes: Vec<ValueChange>,
}

impl ValueDiff {
    /// Create an empty value diff.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Convert every change into a `replace` field change.
    pub fn into_field_changes(self) -> Vec<FieldChange> {
        self.changes
            .into_iter()
            .map(|c| FieldChange::replace(c.path, c.value))
            .collect()
    }
}

/// A single modified leaf.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueChange {
    /// Path segments from the compared root; array indices are decimal strings.
    pub path: Vec<String>,
    pub old_value: Value,
    pub value: Value,
}

/// Compare `origin` with `modified`.
///
/// Objects recurse field by field in origin order, arrays index by index.
/// Any other pair (including a kind mismatch) is one change when the values
/// differ.
pub fn diff_values(origin: &Value, modified: &Value, options: &DiffOptions<'_>) -> ValueDiff {
    let mut diff = ValueDiff::new();
    let mut path = Vec::new();
    walk(origin, modified, &mut path, Some(options), &mut diff.changes);
    diff
}

/// Compare `origin` with `modified`, prefixing every reported path with `base`.
pub fn diff_values_at(base: &[String], origin: &Value, modified: &Value) -> ValueDiff {
    let mut diff = ValueDiff::new();
    let mut path = base.to_vec();
    walk(origin, modified, &mut path, None, &mut diff.changes);
    diff
}

fn walk(
    origin: &Value,
    modified: &Value,
    path: &mut Vec<String>,
    top: Option<&DiffOptions<'_>>,
    out: &mut Vec<ValueChange>,
) {
    match (origin, modified) {
        (Value::Object(o), Value::Object(m)) => {
            for (key, old) in o {
                let Some(new) = m.get(key) else { continue };
                path.push(key.clone());
                if top.map_or(true, |options| options.admits(path)) {
                    walk(old, new, path, None, out);
                }
                path.pop();
            }
        }
        (Value::Array(o), Value::Array(m)) => {
            for (i, (old, new)) in o.iter().zip(m).enumerate() {
                path.push(i.to_string());
                if top.map_or(true, |options| options.admits(path)) {
                    walk(old, new, path, None, out);
                }
                path.pop();
            }
        }
        _ => {
            if origin != modified {
                out.push(ValueChange {
                    path: path.clone(),
                    old_value: origin.clone(),
                    value: modified.clone(),
                });
            }
        }
    }
}
