use serde::{Deserialize, Serialize};

use crate::change::FieldChange;
use crate::error::TypeError;
use crate::op::ItemOp;

/// Patch format version emitted by the generator.
pub const PATCH_VERSION: &str = "1";

/// Patch protocol identifier emitted by the generator.
pub const PATCH_PROTOCOL: &str = "schemio/patch";

/// A complete document patch.
///
/// `doc` holds changes to document-level fields; `items` holds operations on
/// the document's item tree, grouped by parent scope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub version: String,
    pub protocol: String,
    pub doc: Vec<FieldChange>,
    pub items: Vec<ItemOp>,
}

impl Default for Patch {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl Patch {
    /// Create a patch with the current version and protocol.
    pub fn new(doc: Vec<FieldChange>, items: Vec<ItemOp>) -> Self {
        Self {
            version: PATCH_VERSION.to_string(),
            protocol: PATCH_PROTOCOL.to_string(),
            doc,
            items,
        }
    }

    /// Returns `true` if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.doc.is_empty() && self.items.is_empty()
    }

    /// Number of top-level changes (document changes plus item operations).
    pub fn len(&self) -> usize {
        self.doc.len() + self.items.len()
    }

    /// Parse a patch from JSON, rejecting unknown protocols and versions.
    pub fn from_json_str(json: &str) -> Result<Self, TypeError> {
        let patch: Patch =
            serde_json::from_str(json).map_err(|e| TypeError::Serialization(e.to_string()))?;
        if patch.protocol != PATCH_PROTOCOL {
            return Err(TypeError::UnsupportedProtocol {
                expected: PATCH_PROTOCOL.to_string(),
                actual: patch.protocol,
            });
        }
        if patch.version != PATCH_VERSION {
            return Err(TypeError::UnsupportedVersion {
                expected: PATCH_VERSION.to_string(),
                actual: patch.version,
            });
        }
        Ok(patch)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, TypeError> {
        serde_json::to_string_pretty(self).map_err(|e| TypeError::Serialization(e.to_string()))
    }
}
