use thiserror::Error;

/// Errors produced when decoding patch values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("unsupported patch protocol: expected {expected}, got {actual}")]
    UnsupportedProtocol { expected: String, actual: String },

    #[error("unsupported patch version: expected {expected}, got {actual}")]
    UnsupportedVersion { expected: String, actual: String },
}
