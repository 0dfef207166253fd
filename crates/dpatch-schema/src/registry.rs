//! Node type registry: per item type, which properties and text slots exist.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SchemaError, SchemaResult};

/// The kind of value a type-specific property holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    String,
    Number,
    Boolean,
    /// A color string such as `rgba(0,0,0,1.0)`.
    Color,
    Object,
    Array,
    Any,
}

impl PropertyKind {
    /// Whether `value` is a legal value for a property of this kind.
    ///
    /// `null` is accepted for every kind (a cleared property).
    pub fn accepts(&self, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        match self {
            Self::String | Self::Color => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::Any => true,
        }
    }
}

/// A declared type-specific property.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    pub kind: PropertyKind,
}

/// Metadata for one item type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeType {
    /// Type-specific properties, in declaration order.
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
    /// Named text slots the type renders, in declaration order.
    #[serde(default)]
    pub text_slots: Vec<String>,
}

impl NodeType {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, name: &str, kind: PropertyKind) -> Self {
        self.properties.push(PropertyDef {
            name: name.to_string(),
            kind,
        });
        self
    }

    pub fn with_text_slot(mut self, name: &str) -> Self {
        self.text_slots.push(name.to_string());
        self
    }

    /// Look up a declared property.
    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Whether the type declares a text slot with this name.
    pub fn has_text_slot(&self, name: &str) -> bool {
        self.text_slots.iter().any(|s| s == name)
    }
}

/// Read-only table of item types keyed by type name.
///
/// Passed explicitly to the patch generator; there is no process-wide
/// registry. In TOML each type is a table:
///
/// ```toml
/// [rect]
/// text_slots = ["body"]
/// properties = [{ name = "cornerRadius", kind = "number" }]
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeRegistry {
    types: IndexMap<String, NodeType>,
}

impl TypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the standard diagram shapes.
    pub fn builtin() -> Self {
        let standard = || {
            NodeType::new()
                .with_property("fill", PropertyKind::Object)
                .with_property("strokeColor", PropertyKind::Color)
                .with_property("strokeSize", PropertyKind::Number)
                .with_property("strokePattern", PropertyKind::String)
        };

        let mut types = IndexMap::new();
        types.insert("none".to_string(), NodeType::new().with_text_slot("body"));
        types.insert(
            "rect".to_string(),
            standard()
                .with_property("cornerRadius", PropertyKind::Number)
                .with_text_slot("body"),
        );
        types.insert("ellipse".to_string(), standard().with_text_slot("body"));
        types.insert(
            "trapezoid".to_string(),
            standard()
                .with_property("topRatio", PropertyKind::Number)
                .with_property("offset", PropertyKind::Number)
                .with_property("rounding", PropertyKind::Number)
                .with_text_slot("body"),
        );
        types.insert(
            "connector".to_string(),
            NodeType::new()
                .with_property("strokeColor", PropertyKind::Color)
                .with_property("strokeSize", PropertyKind::Number)
                .with_property("strokePattern", PropertyKind::String)
                .with_property("points", PropertyKind::Array)
                .with_property("sourceCap", PropertyKind::String)
                .with_property("destinationCap", PropertyKind::String)
                .with_property("fill", PropertyKind::Object),
        );
        Self { types }
    }

    /// Parse a registry from TOML.
    pub fn from_toml_str(s: &str) -> SchemaResult<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Parse a registry from JSON.
    pub fn from_json_str(s: &str) -> SchemaResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Register a new type. Fails if the name is taken.
    pub fn register(&mut self, name: &str, node_type: NodeType) -> SchemaResult<()> {
        if self.types.contains_key(name) {
            return Err(SchemaError::DuplicateType(name.to_string()));
        }
        self.types.insert(name.to_string(), node_type);
        Ok(())
    }

    /// Add every type of `other`, replacing types with the same name.
    pub fn merge(&mut self, other: TypeRegistry) {
        for (name, node_type) in other.types {
            self.types.insert(name, node_type);
        }
    }

    /// Look up a type by name.
    pub fn get(&self, name: &str) -> Option<&NodeType> {
        self.types.get(name)
    }

    /// Registered type names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
