//! Error types for value conversion and record marshaling.

use thiserror::Error;

/// Result type for marshaling operations.
pub type MarshalResult<T> = Result<T, MarshalError>;

/// Errors that can occur while converting values or records.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarshalError {
    /// The value's kind cannot be converted into the target type.
    #[error("cannot convert {found} into {expected}")]
    Incompatible {
        expected: &'static str,
        found: &'static str,
    },

    /// The value is of a usable kind but does not fit the target type.
    #[error("value {value} is out of range for {target}")]
    OutOfRange { target: &'static str, value: String },

    /// A textual value could not be parsed into the target type.
    #[error("cannot parse '{value}' as {target}")]
    Parse { target: &'static str, value: String },

    /// Conversion failed for a specific wire field.
    #[error("field '{field}': {source}")]
    Field {
        field: String,
        #[source]
        source: Box<MarshalError>,
    },
}

impl MarshalError {
    /// Wraps this error with the wire name of the field being converted.
    #[must_use]
    pub fn in_field(self, field: &str) -> Self {
        Self::Field {
            field: field.to_string(),
            source: Box::new(self),
        }
    }
}
