//! Column categories and the value checks that guard bound parameters.

use crate::{Column, SqlError, SqlResult};
use chrono::{DateTime, Utc};
use entkit_types::{parse_date_text, parse_time_text, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse classification of a column's SQL type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnCategory {
    String,
    Bool,
    Int,
    Numeric,
    Time,
    Json,
    Unknown,
}

impl ColumnCategory {
    /// Classifies a SQL type name by substring.
    #[must_use]
    pub fn of_sql_type(sql_type: &str) -> Self {
        let ty = sql_type.to_ascii_lowercase();
        let has = |needle: &str| ty.contains(needle);
        if has("json") {
            Self::Json
        } else if has("bool") {
            Self::Bool
        } else if has("char") || has("text") || has("uuid") || has("clob") {
            Self::String
        } else if has("timestamp") || has("date") || has("time") {
            Self::Time
        } else if has("int") || has("serial") {
            Self::Int
        } else if has("numeric")
            || has("decimal")
            || has("double")
            || has("real")
            || has("float")
            || has("money")
        {
            Self::Numeric
        } else {
            Self::Unknown
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Numeric => "numeric",
            Self::Time => "time",
            Self::Json => "json",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ColumnCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checks `value` against `column` and returns the value to bind.
///
/// Text bound to a time column is accepted when it parses as an RFC 3339
/// timestamp (converted), a calendar date or a time of day (kept as text).
pub(crate) fn convert_for_column(column: &Column, value: &Value) -> SqlResult<Value> {
    let category = column.category();
    let incompatible = || SqlError::IncompatibleValue {
        column: column.name.clone(),
        category,
        found: value.kind(),
    };

    if value.is_null() {
        return if column.nullable {
            Ok(Value::Null)
        } else {
            Err(SqlError::NullNotAllowed {
                column: column.name.clone(),
            })
        };
    }

    match (category, value) {
        (ColumnCategory::String, Value::Text(_))
        | (ColumnCategory::Bool, Value::Bool(_))
        | (ColumnCategory::Int, Value::Int(_) | Value::UInt(_))
        | (
            ColumnCategory::Numeric,
            Value::Int(_) | Value::UInt(_) | Value::Float(_) | Value::Decimal(_),
        )
        | (ColumnCategory::Time, Value::Timestamp(_))
        | (ColumnCategory::Json, Value::Map(_)) => Ok(value.clone()),
        (ColumnCategory::Time, Value::Text(text)) => {
            let text = text.trim();
            if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
                Ok(Value::Timestamp(ts.with_timezone(&Utc)))
            } else if parse_date_text(text).is_some() || parse_time_text(text).is_some() {
                Ok(Value::Text(text.to_string()))
            } else {
                Err(incompatible())
            }
        }
        _ => Err(incompatible()),
    }
}
