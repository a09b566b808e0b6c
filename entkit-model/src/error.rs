//! Error types for the schema model.

use thiserror::Error;

/// Result type for schema model operations.
pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A schema with the same name is already registered.
    #[error("schema already registered: {0}")]
    AlreadyRegistered(String),

    /// Registration requires a non-blank name.
    #[error("cannot register a schema with an empty name")]
    EmptyName,
}
