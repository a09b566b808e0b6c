//! SQL dialect strategies.
//!
//! A dialect answers three questions: which column type a field becomes,
//! how a bound parameter is written, and how a value is spelled as a
//! literal. Everything else in the compiler is dialect-neutral.

use crate::{DeriveError, DeriveResult, SqlError, SqlResult};
use entkit_model::{DataType, Field};
use entkit_types::Value;
use std::sync::Arc;

pub trait Dialect: Send + Sync {
    fn name(&self) -> &'static str;

    /// Resolves the column type for a field.
    fn resolve_db_type(&self, field: &Field) -> DeriveResult<String>;

    /// Placeholder for the 1-based parameter `index`.
    fn placeholder(&self, index: usize) -> String;

    /// Case-insensitive pattern match keyword.
    fn case_insensitive_like(&self) -> &'static str;

    /// Clause appended after a LIKE pattern so that `\` escapes wildcards.
    fn like_escape_clause(&self) -> &'static str {
        ""
    }

    /// Clause written before `OFFSET` when a select has no limit.
    fn unbounded_limit(&self) -> &'static str {
        ""
    }

    fn quote_identifier(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    fn quote_text(&self, text: &str) -> String {
        format!("'{}'", text.replace('\'', "''"))
    }

    /// Spells `value` as a SQL literal.
    fn render_literal(&self, value: &Value) -> SqlResult<String> {
        match value {
            Value::Null => Ok("NULL".to_string()),
            Value::Bool(true) => Ok("TRUE".to_string()),
            Value::Bool(false) => Ok("FALSE".to_string()),
            Value::Int(i) => Ok(i.to_string()),
            Value::UInt(u) => Ok(u.to_string()),
            Value::Float(f) if f.is_finite() => Ok(f.to_string()),
            Value::Float(f) => Err(SqlError::UnrenderableValue(f.to_string())),
            Value::Decimal(d) => Ok(d.to_string()),
            Value::Text(s) => Ok(self.quote_text(s)),
            Value::Timestamp(t) => Ok(self.quote_text(&t.to_rfc3339())),
            Value::List(_) | Value::Map(_) => Ok(self.quote_text(&value.to_string())),
        }
    }
}

/// PostgreSQL.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

/// SQLite.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn resolve_db_type(&self, field: &Field) -> DeriveResult<String> {
        postgres_type(field)
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn case_insensitive_like(&self) -> &'static str {
        "ILIKE"
    }
}

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn resolve_db_type(&self, field: &Field) -> DeriveResult<String> {
        sqlite_type(field)
    }

    fn placeholder(&self, index: usize) -> String {
        format!("?{index}")
    }

    fn case_insensitive_like(&self) -> &'static str {
        "LIKE"
    }

    fn like_escape_clause(&self) -> &'static str {
        " ESCAPE '\\'"
    }

    fn unbounded_limit(&self) -> &'static str {
        " LIMIT -1"
    }

    fn render_literal(&self, value: &Value) -> SqlResult<String> {
        match value {
            Value::Bool(b) => Ok(if *b { "1" } else { "0" }.to_string()),
            other => Postgres.render_literal(other),
        }
    }
}

/// Looks up a dialect by its configuration name.
#[must_use]
pub fn dialect_for(name: &str) -> Option<Arc<dyn Dialect>> {
    match name.trim().to_ascii_lowercase().as_str() {
        "postgres" | "postgresql" | "pg" => Some(Arc::new(Postgres)),
        "sqlite" | "sqlite3" => Some(Arc::new(Sqlite)),
        _ => None,
    }
}

fn parse_option(field: &Field, option: &str) -> DeriveResult<Option<u32>> {
    field
        .option(option)
        .map(|raw| {
            raw.trim().parse::<u32>().map_err(|_| DeriveError::InvalidTypeOption {
                field: field.name().to_string(),
                option: option.to_string(),
                value: raw.to_string(),
            })
        })
        .transpose()
}

fn is_wide_integer(field: &Field) -> DeriveResult<bool> {
    match parse_option(field, "size")? {
        None | Some(32) => Ok(false),
        Some(64) => Ok(true),
        Some(other) => Err(DeriveError::InvalidTypeOption {
            field: field.name().to_string(),
            option: "size".to_string(),
            value: other.to_string(),
        }),
    }
}

/// Column types for PostgreSQL.
pub fn postgres_type(field: &Field) -> DeriveResult<String> {
    let ty = match field.data_type() {
        DataType::Email
        | DataType::Phone
        | DataType::String
        | DataType::Secret
        | DataType::Url
        | DataType::EnumString => match field.length_rule() {
            Some((_, max)) if max > 0 => format!("character varying({max})"),
            _ => "character varying".to_string(),
        },
        DataType::Ulid => "character varying(26)".to_string(),
        DataType::CountryCode => "character(2)".to_string(),
        DataType::CurrencyCode => "character(3)".to_string(),
        DataType::Uuid => "uuid".to_string(),
        DataType::Integer | DataType::EnumNumber => {
            if is_wide_integer(field)? { "bigint" } else { "integer" }.to_string()
        }
        DataType::Float => match parse_option(field, "precision")? {
            Some(precision) => {
                let scale = parse_option(field, "scale")?.unwrap_or(0);
                format!("numeric({precision},{scale})")
            }
            None => "double precision".to_string(),
        },
        DataType::Boolean => "boolean".to_string(),
        DataType::Date => "date".to_string(),
        DataType::Time => "time without time zone".to_string(),
        DataType::DateTime => "timestamp with time zone".to_string(),
        DataType::LocalizedText => "jsonb".to_string(),
    };
    Ok(ty)
}

/// Column types for SQLite. Names are chosen so that both SQLite's type
/// affinity and [`ColumnCategory`](crate::ColumnCategory) read them right.
pub fn sqlite_type(field: &Field) -> DeriveResult<String> {
    let ty = match field.data_type() {
        DataType::Email
        | DataType::Phone
        | DataType::String
        | DataType::Secret
        | DataType::Url
        | DataType::Ulid
        | DataType::Uuid
        | DataType::EnumString
        | DataType::CountryCode
        | DataType::CurrencyCode => "TEXT",
        DataType::Integer | DataType::EnumNumber => {
            is_wide_integer(field)?;
            "INTEGER"
        }
        DataType::Float => match parse_option(field, "precision")? {
            Some(_) => "NUMERIC",
            None => "REAL",
        },
        DataType::Boolean => "BOOLEAN",
        DataType::Date => "DATE",
        DataType::Time => "TIME",
        DataType::DateTime => "DATETIME",
        DataType::LocalizedText => "JSON",
    };
    Ok(ty.to_string())
}
