//! Error types for table derivation and statement compilation.

use crate::ColumnCategory;
use entkit_model::DataType;
use thiserror::Error;

pub type DeriveResult<T> = Result<T, DeriveError>;
pub type SqlResult<T> = Result<T, SqlError>;

/// Schema-authoring problems found while deriving a [`DbEntity`](crate::DbEntity).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeriveError {
    #[error("entity name must not be empty")]
    EmptyEntityName,

    #[error("entity '{entity}' has a field with an empty name")]
    EmptyFieldName { entity: String },

    #[error("entity '{entity}' declares column '{column}' more than once")]
    DuplicateColumn { entity: String, column: String },

    #[error("unsupported field data type '{data_type}' for field '{field}'")]
    UnsupportedDataType { field: String, data_type: DataType },

    #[error("invalid option {option}='{value}' on field '{field}'")]
    InvalidTypeOption {
        field: String,
        option: String,
        value: String,
    },

    #[error("{column} must not be a tenant key because {existing} already is")]
    ConflictingTenantKey { column: String, existing: String },

    #[error("unique rule on entity '{entity}' references unknown column '{column}'")]
    UnknownUniqueColumn { entity: String, column: String },

    #[error("entity '{entity}' has no primary key")]
    MissingPrimaryKey { entity: String },
}

/// Caller mistakes found while compiling a statement.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SqlError {
    #[error("unknown column '{column}' on table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("nested field '{0}' is not supported")]
    NestedField(String),

    #[error("unsupported operator '{0}'")]
    UnsupportedOperator(String),

    #[error("operator '{operator}' cannot be used on {category} column '{column}'")]
    IncompatibleOperator {
        operator: String,
        column: String,
        category: ColumnCategory,
    },

    #[error("incompatible value type {found} for {category} column '{column}'")]
    IncompatibleValue {
        column: String,
        category: ColumnCategory,
        found: &'static str,
    },

    #[error("column '{column}' does not accept null")]
    NullNotAllowed { column: String },

    #[error("operator '{operator}' expects {expected} value(s), got {found}")]
    InvalidValueCount {
        operator: String,
        expected: &'static str,
        found: usize,
    },

    #[error("tenant key '{column}' is required")]
    MissingTenantKey { column: String },

    #[error("primary key '{column}' is required")]
    MissingPrimaryKey { column: String },

    #[error("no columns provided")]
    NoColumns,

    #[error("no rows provided")]
    EmptyBatch,

    #[error("row {row} does not have the same columns as the first row")]
    RaggedBatch { row: usize },

    #[error("no updatable columns provided")]
    NoUpdatableColumns,

    #[error("refusing to delete without a filter")]
    EmptyDeleteFilter,

    #[error("cannot render {0} as a SQL literal")]
    UnrenderableValue(String),
}
