use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The parent scope of an item: the document root or the item with the given id.
///
/// On the wire the root scope is `null` and an item scope is the parent's id
/// string, so `Scope` round-trips through the `parentId` field of item
/// operations.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Scope {
    /// Top level of the collection.
    #[default]
    Root,
    /// Children of the item with this id.
    Node(String),
}

impl Scope {
    /// Build a scope from an optional parent id (`None` is the root).
    pub fn from_parent(parent: Option<&str>) -> Self {
        match parent {
            Some(id) => Self::Node(id.to_string()),
            None => Self::Root,
        }
    }

    /// Returns `true` for the root scope.
    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }

    /// The parent id, or `None` for the root scope.
    pub fn parent_id(&self) -> Option<&str> {
        match self {
            Self::Root => None,
            Self::Node(id) => Some(id),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => write!(f, "<root>"),
            Self::Node(id) => write!(f, "{id}"),
        }
    }
}

impl Serialize for Scope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Root => serializer.serialize_none(),
            Self::Node(id) => serializer.serialize_str(id),
        }
    }
}

impl<'de> Deserialize<'de> for Scope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parent = Option::<String>::deserialize(deserializer)?;
        Ok(match parent {
            Some(id) => Self::Node(id),
            None => Self::Root,
        })
    }
}

/// Deserialize an optional field whose presence matters even when its value
/// is `null`: a missing field stays `None` (via `#[serde(default)]`) while an
/// explicit `null` becomes `Some(Scope::Root)`.
pub(crate) fn present<'de, D>(deserializer: D) -> Result<Option<Scope>, D::Error>
where
    D: Deserializer<'de>,
{
    Scope::deserialize(deserializer).map(Some)
}
