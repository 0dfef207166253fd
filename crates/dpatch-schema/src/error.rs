//! Error types for the schema crate.

/// Errors that can occur while loading or validating schema tables.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// TOML input could not be parsed.
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML output could not be produced.
    #[error("TOML serialization failed: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON input could not be parsed.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A required layout field name is empty.
    #[error("schema field `{0}` must not be empty")]
    EmptyField(&'static str),

    /// A collection path is empty or contains an empty segment.
    #[error("invalid collection path: {0:?}")]
    EmptyPath(String),

    /// A node type was registered twice.
    #[error("node type already registered: {0}")]
    DuplicateType(String),
}

/// Convenience alias for schema results.
pub type SchemaResult<T> = Result<T, SchemaError>;
