//! SQL side of entkit.
//!
//! Turns a [`Schema`](entkit_model::Schema) into a physical table
//! description ([`DbEntity`]) and compiles the generic search DSL plus
//! row payloads into parameterized statements.
//!
//! # Architecture
//!
//! - A [`Dialect`] resolves column types and renders placeholders/literals;
//!   swapping it retargets everything without touching compiler logic
//! - [`DbEntity::new`] validates keys, tenant and unique groups once
//! - [`SqlCompiler`] checks every column reference and value against the
//!   derived entity before a single byte of SQL is returned
//! - Statements are built with placeholders and interpolated in one final
//!   pass, so quoting lives in exactly one place

mod builder;
mod compiler;
mod convert;
mod dialect;
mod entity;
mod error;
mod search;

pub use builder::Statement;
pub use compiler::SqlCompiler;
pub use convert::ColumnCategory;
pub use dialect::{dialect_for, postgres_type, sqlite_type, Dialect, Postgres, Sqlite};
pub use entity::{Column, DbEntity};
pub use error::{DeriveError, DeriveResult, SqlError, SqlResult};
pub use search::{Condition, Direction, Operator, OrderBy, SearchGraph, SearchNode};
