use entkit_model::ModelError;
use entkit_sql::DeriveError;
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Failures reported by a [`SchemaProvider`](crate::SchemaProvider).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("schema not found: {0}")]
    NotFound(String),

    #[error("schema provider unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid engine configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("unknown SQL dialect '{0}'")]
    UnknownDialect(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("failed to derive entity '{entity}': {source}")]
    Derive {
        entity: String,
        #[source]
        source: DeriveError,
    },

    #[error("schema provider did not return '{0}'")]
    MissingSchema(String),
}
