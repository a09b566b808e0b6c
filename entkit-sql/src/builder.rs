//! Statement assembly.
//!
//! Compilation writes SQL fragments and parameter slots into a [`SqlBuf`].
//! [`SqlBuf::finish`] numbers the placeholders and renders the
//! interpolated text in a single pass.

use crate::{Dialect, SqlResult};
use entkit_types::Value;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone)]
enum Part {
    Sql(String),
    Param(usize),
}

#[derive(Debug, Default)]
pub(crate) struct SqlBuf {
    parts: Vec<Part>,
    params: Vec<Value>,
}

impl SqlBuf {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, sql: impl AsRef<str>) -> &mut Self {
        match self.parts.last_mut() {
            Some(Part::Sql(last)) => last.push_str(sql.as_ref()),
            _ => self.parts.push(Part::Sql(sql.as_ref().to_string())),
        }
        self
    }

    pub(crate) fn bind(&mut self, value: Value) -> &mut Self {
        self.params.push(value);
        self.parts.push(Part::Param(self.params.len() - 1));
        self
    }

    /// Appends another buffer, renumbering its parameters.
    pub(crate) fn append(&mut self, other: SqlBuf) -> &mut Self {
        let base = self.params.len();
        self.params.extend(other.params);
        for part in other.parts {
            match part {
                Part::Sql(sql) => {
                    self.push(sql);
                }
                Part::Param(i) => self.parts.push(Part::Param(base + i)),
            }
        }
        self
    }

    pub(crate) fn finish(self, dialect: &dyn Dialect) -> SqlResult<Statement> {
        let mut parameterized = String::new();
        let mut sql = String::new();
        for part in &self.parts {
            match part {
                Part::Sql(text) => {
                    parameterized.push_str(text);
                    sql.push_str(text);
                }
                Part::Param(i) => {
                    parameterized.push_str(&dialect.placeholder(i + 1));
                    sql.push_str(&dialect.render_literal(&self.params[*i])?);
                }
            }
        }
        debug!(dialect = dialect.name(), params = self.params.len(), %parameterized, "compiled statement");
        Ok(Statement {
            parameterized,
            params: self.params,
            sql,
        })
    }
}

/// A compiled statement.
///
/// `parameterized` carries dialect placeholders matching `params` in order;
/// `sql` is the same statement with every parameter rendered as a literal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub parameterized: String,
    pub params: Vec<Value>,
    pub sql: String,
}

impl Statement {
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.params.len()
    }
}
