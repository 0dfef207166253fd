use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, SchemaResult};

/// Layout of a diagram document and the fields the patch generator compares.
///
/// Every field has a default, so a config file only needs to name what it
/// changes. Field paths inside collections are dotted (`behavior.events`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchSchema {
    /// Document field holding the top-level item list.
    pub items_field: String,
    /// Item field holding the stable identity.
    pub id_field: String,
    /// Item field holding nested child items.
    pub children_field: String,
    /// Item field naming the item type looked up in the type registry.
    pub type_field: String,
    /// Item field holding the type-specific property bag.
    pub properties_field: String,
    /// Item field holding the named text slots.
    pub text_slots_field: String,
    /// Document fields compared with the value differ.
    pub doc_fields: Vec<String>,
    /// Document fields compared as unordered string sets.
    pub doc_set_fields: Vec<String>,
    /// Item fields common to every type, compared with the value differ.
    pub node_fields: Vec<String>,
    /// Item fields compared as unordered string sets.
    pub node_set_fields: Vec<String>,
    /// Ordered, id-keyed collections nested inside items.
    pub node_collections: Vec<CollectionSchema>,
}

impl Default for PatchSchema {
    fn default() -> Self {
        Self {
            items_field: "items".into(),
            id_field: "id".into(),
            children_field: "childItems".into(),
            type_field: "shape".into(),
            properties_field: "shapeProps".into(),
            text_slots_field: "textSlots".into(),
            doc_fields: names(&["name", "description", "settings", "style"]),
            doc_set_fields: names(&["tags"]),
            node_fields: names(&[
                "area",
                "name",
                "description",
                "opacity",
                "selfOpacity",
                "visible",
                "blendMode",
                "cursor",
                "shape",
                "clip",
                "interactionMode",
                "tooltipBackground",
                "tooltipColor",
            ]),
            node_set_fields: names(&["tags", "groups"]),
            node_collections: vec![
                CollectionSchema::new("behavior.events", &["event"]).with_collection(
                    CollectionSchema::new("actions", &["element", "method", "on", "args"]),
                ),
                CollectionSchema::new("links", &["title", "url", "type"]),
                CollectionSchema::new("effects", &["effect", "name", "args"]),
            ],
        }
    }
}

impl PatchSchema {
    /// Parse a schema from TOML and validate it.
    pub fn from_toml_str(s: &str) -> SchemaResult<Self> {
        let schema: Self = toml::from_str(s)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Parse a schema from JSON and validate it.
    pub fn from_json_str(s: &str) -> SchemaResult<Self> {
        let schema: Self = serde_json::from_str(s)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Render the schema as TOML.
    pub fn to_toml_string(&self) -> SchemaResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check that layout fields are named and collection paths are well formed.
    pub fn validate(&self) -> SchemaResult<()> {
        let layout = [
            ("items_field", &self.items_field),
            ("id_field", &self.id_field),
            ("children_field", &self.children_field),
            ("type_field", &self.type_field),
            ("properties_field", &self.properties_field),
            ("text_slots_field", &self.text_slots_field),
        ];
        for (name, value) in layout {
            if value.is_empty() {
                return Err(SchemaError::EmptyField(name));
            }
        }
        for collection in &self.node_collections {
            collection.validate()?;
        }
        Ok(())
    }
}

/// An ordered, id-keyed collection nested inside an item (event lists,
/// action lists, link lists).
///
/// Items of such a collection never move between parents, so they are
/// reconciled without mount/demount.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSchema {
    /// Dotted path from the owning object to the collection.
    pub path: String,
    /// Fields of each collection entry compared with the value differ.
    #[serde(default)]
    pub fields: Vec<String>,
    /// Collections nested inside each entry.
    #[serde(default)]
    pub collections: Vec<CollectionSchema>,
}

impl CollectionSchema {
    pub fn new(path: &str, fields: &[&str]) -> Self {
        Self {
            path: path.to_string(),
            fields: names(fields),
            collections: Vec::new(),
        }
    }

    /// Add a collection nested inside each entry.
    pub fn with_collection(mut self, collection: CollectionSchema) -> Self {
        self.collections.push(collection);
        self
    }

    /// The path split into segments.
    pub fn segments(&self) -> Vec<String> {
        self.path.split('.').map(str::to_string).collect()
    }

    fn validate(&self) -> SchemaResult<()> {
        if self.path.is_empty() || self.path.split('.').any(str::is_empty) {
            return Err(SchemaError::EmptyPath(self.path.clone()));
        }
        for nested in &self.collections {
            nested.validate()?;
        }
        Ok(())
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
