//! Statement compilation against a derived [`DbEntity`].

use crate::builder::SqlBuf;
use crate::convert::convert_for_column;
use crate::{
    Column, ColumnCategory, Condition, DbEntity, Dialect, Operator, SearchGraph, SearchNode,
    SqlError, SqlResult, Statement,
};
use entkit_types::{Record, Value};

/// Compiles statements for one entity in one dialect.
///
/// Every column reference and bound value is checked against the entity
/// before any SQL is produced; a failing check aborts the whole statement.
#[derive(Clone, Copy)]
pub struct SqlCompiler<'a> {
    entity: &'a DbEntity,
    dialect: &'a dyn Dialect,
}

/// A compiled predicate and whether it needs parentheses when nested.
struct Predicate {
    buf: SqlBuf,
    compound: bool,
}

impl<'a> SqlCompiler<'a> {
    #[must_use]
    pub fn new(entity: &'a DbEntity, dialect: &'a dyn Dialect) -> Self {
        Self { entity, dialect }
    }

    #[must_use]
    pub fn entity(&self) -> &'a DbEntity {
        self.entity
    }

    #[must_use]
    pub fn dialect(&self) -> &'a dyn Dialect {
        self.dialect
    }

    // ── Column resolution ───────────────────────────────────────

    fn resolve(&self, field: &str) -> SqlResult<&'a Column> {
        if field.contains('.') {
            return Err(SqlError::NestedField(field.to_string()));
        }
        self.entity
            .column(field)
            .ok_or_else(|| SqlError::UnknownColumn {
                table: self.entity.table_name().to_string(),
                column: field.to_string(),
            })
    }

    fn ident(&self, name: &str) -> String {
        self.dialect.quote_identifier(name)
    }

    fn table(&self) -> String {
        self.ident(self.entity.table_name())
    }

    fn require_tenant(&self, row: &Record) -> SqlResult<()> {
        match self.entity.tenant_key() {
            Some(tenant) if !row.contains_key(tenant) => Err(SqlError::MissingTenantKey {
                column: tenant.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Resolves every key of `row` and converts its value, in key order.
    fn bind_row(&self, row: &Record) -> SqlResult<Vec<(&'a Column, Value)>> {
        row.iter()
            .map(|(key, value)| {
                let column = self.resolve(key)?;
                Ok((column, convert_for_column(column, value)?))
            })
            .collect()
    }

    // ── DDL ─────────────────────────────────────────────────────

    /// `CREATE TABLE IF NOT EXISTS` with a composite primary key over the
    /// primary and tenant keys and one `UNIQUE` clause per group.
    pub fn create_table(&self) -> SqlResult<Statement> {
        let mut defs = Vec::with_capacity(self.entity.columns().len() + 2);
        for column in self.entity.columns() {
            let mut def = format!("{} {}", self.ident(&column.name), column.sql_type);
            if !column.nullable {
                def.push_str(" NOT NULL");
            }
            if let Some(default) = &column.default {
                def.push_str(" DEFAULT ");
                def.push_str(&self.dialect.render_literal(default)?);
            }
            defs.push(def);
        }
        defs.push(format!("PRIMARY KEY ({})", self.ident_list(self.entity.key_columns())));
        for group in self.entity.unique_keys() {
            defs.push(format!(
                "UNIQUE ({})",
                self.ident_list(group.iter().map(String::as_str))
            ));
        }

        let mut buf = SqlBuf::new();
        buf.push(format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.table(),
            defs.join(", ")
        ));
        buf.finish(self.dialect)
    }

    fn ident_list<'n>(&self, names: impl IntoIterator<Item = &'n str>) -> String {
        names
            .into_iter()
            .map(|n| self.ident(n))
            .collect::<Vec<_>>()
            .join(", ")
    }

    // ── Select ──────────────────────────────────────────────────

    /// Selects `projection` (every column when empty) filtered and ordered
    /// by `graph`.
    pub fn select(&self, projection: &[&str], graph: &SearchGraph) -> SqlResult<Statement> {
        let columns = if projection.is_empty() {
            "*".to_string()
        } else {
            for field in projection {
                self.resolve(field)?;
            }
            self.ident_list(projection.iter().copied())
        };

        let mut buf = SqlBuf::new();
        buf.push(format!("SELECT {columns} FROM {}", self.table()));

        if let Some(node) = &graph.filter {
            if let Some(predicate) = self.compile_node(node)? {
                buf.push(" WHERE ");
                buf.append(predicate.buf);
            }
        }

        if !graph.order.is_empty() {
            let mut order = Vec::with_capacity(graph.order.len());
            for item in &graph.order {
                let column = self.resolve(&item.field)?;
                order.push(format!(
                    "{} {}",
                    self.ident(&column.name),
                    item.direction.as_sql()
                ));
            }
            buf.push(format!(" ORDER BY {}", order.join(", ")));
        }

        match (graph.limit, graph.offset) {
            (Some(limit), offset) => {
                buf.push(format!(" LIMIT {limit}"));
                if let Some(offset) = offset {
                    buf.push(format!(" OFFSET {offset}"));
                }
            }
            (None, Some(offset)) => {
                buf.push(self.dialect.unbounded_limit());
                buf.push(format!(" OFFSET {offset}"));
            }
            (None, None) => {}
        }

        buf.finish(self.dialect)
    }

    /// Compiles a filter tree on its own. `None` means "match all".
    pub fn compile_filter(&self, node: &SearchNode) -> SqlResult<Option<Statement>> {
        self.compile_node(node)?
            .map(|predicate| predicate.buf.finish(self.dialect))
            .transpose()
    }

    fn compile_node(&self, node: &SearchNode) -> SqlResult<Option<Predicate>> {
        match node {
            SearchNode::Leaf(condition) => self.compile_condition(condition).map(|buf| {
                Some(Predicate {
                    buf,
                    compound: false,
                })
            }),
            SearchNode::All(children) => self.join(children, " AND "),
            SearchNode::Any(children) => self.join(children, " OR "),
        }
    }

    fn join(&self, children: &[SearchNode], separator: &str) -> SqlResult<Option<Predicate>> {
        let mut compiled = Vec::with_capacity(children.len());
        for child in children {
            if let Some(predicate) = self.compile_node(child)? {
                compiled.push(predicate);
            }
        }
        if compiled.len() <= 1 {
            return Ok(compiled.pop());
        }

        let mut buf = SqlBuf::new();
        for (i, predicate) in compiled.into_iter().enumerate() {
            if i > 0 {
                buf.push(separator);
            }
            if predicate.compound {
                buf.push("(");
                buf.append(predicate.buf);
                buf.push(")");
            } else {
                buf.append(predicate.buf);
            }
        }
        Ok(Some(Predicate {
            buf,
            compound: true,
        }))
    }

    fn compile_condition(&self, condition: &Condition) -> SqlResult<SqlBuf> {
        let column = self.resolve(&condition.field)?;
        let op = condition.operator;
        let values = &condition.values;
        let count_error = |expected: &'static str| SqlError::InvalidValueCount {
            operator: op.to_string(),
            expected,
            found: values.len(),
        };
        let target = self.ident(&column.name);
        let mut buf = SqlBuf::new();

        if op.is_presence() {
            if !values.is_empty() {
                return Err(count_error("0"));
            }
            let test = if op == Operator::IsSet { "IS NOT NULL" } else { "IS NULL" };
            buf.push(format!("{target} {test}"));
        } else if op.is_comparison() {
            let [value] = values.as_slice() else {
                return Err(count_error("1"));
            };
            self.compile_comparison(&mut buf, column, &target, op, value)?;
        } else if op.is_membership() {
            if values.is_empty() {
                return Err(count_error("at least 1"));
            }
            let keyword = if op == Operator::In { "IN" } else { "NOT IN" };
            buf.push(format!("{target} {keyword} ("));
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    buf.push(", ");
                }
                buf.bind(convert_for_column(column, value)?);
            }
            buf.push(")");
        } else {
            let [value] = values.as_slice() else {
                return Err(count_error("1"));
            };
            self.compile_pattern(&mut buf, column, &target, op, value)?;
        }
        Ok(buf)
    }

    fn compile_comparison(
        &self,
        buf: &mut SqlBuf,
        column: &Column,
        target: &str,
        op: Operator,
        value: &Value,
    ) -> SqlResult<()> {
        if value.is_null() && column.nullable {
            let test = match op {
                Operator::Equals => "IS NULL",
                Operator::NotEquals => "IS NOT NULL",
                _ => {
                    return Err(SqlError::IncompatibleValue {
                        column: column.name.clone(),
                        category: column.category(),
                        found: value.kind(),
                    });
                }
            };
            buf.push(format!("{target} {test}"));
            return Ok(());
        }
        let value = convert_for_column(column, value)?;
        buf.push(format!("{target} {} ", op.as_str()));
        buf.bind(value);
        Ok(())
    }

    fn compile_pattern(
        &self,
        buf: &mut SqlBuf,
        column: &Column,
        target: &str,
        op: Operator,
        value: &Value,
    ) -> SqlResult<()> {
        let category = column.category();
        if category != ColumnCategory::String {
            return Err(SqlError::IncompatibleOperator {
                operator: op.to_string(),
                column: column.name.clone(),
                category,
            });
        }
        let Value::Text(text) = value else {
            return Err(SqlError::IncompatibleValue {
                column: column.name.clone(),
                category,
                found: value.kind(),
            });
        };

        let escaped = escape_like(text);
        let (pattern, negated) = match op {
            Operator::Contains => (format!("%{escaped}%"), false),
            Operator::NotContains => (format!("%{escaped}%"), true),
            Operator::StartsWith => (format!("{escaped}%"), false),
            Operator::NotStartsWith => (format!("{escaped}%"), true),
            Operator::EndsWith => (format!("%{escaped}"), false),
            Operator::NotEndsWith => (format!("%{escaped}"), true),
            other => return Err(SqlError::UnsupportedOperator(other.to_string())),
        };

        if negated {
            buf.push("NOT (");
        }
        buf.push(format!("{target} {} ", self.dialect.case_insensitive_like()));
        buf.bind(Value::Text(pattern));
        buf.push(self.dialect.like_escape_clause());
        if negated {
            buf.push(")");
        }
        Ok(())
    }

    // ── Mutations ───────────────────────────────────────────────

    /// Inserts one row. Columns are the row's keys in sorted order.
    pub fn insert(&self, row: &Record) -> SqlResult<Statement> {
        self.bulk_insert(std::slice::from_ref(row))
    }

    /// Inserts several rows in one statement. Every row must carry the
    /// same column set as the first.
    pub fn bulk_insert(&self, rows: &[Record]) -> SqlResult<Statement> {
        let Some(first) = rows.first() else {
            return Err(SqlError::EmptyBatch);
        };
        if first.is_empty() {
            return Err(SqlError::NoColumns);
        }
        let columns: Vec<&str> = first.keys().collect();

        let mut buf = SqlBuf::new();
        buf.push(format!(
            "INSERT INTO {} ({}) VALUES ",
            self.table(),
            self.ident_list(columns.iter().copied())
        ));
        for (i, row) in rows.iter().enumerate() {
            self.require_tenant(row)?;
            if !row.keys().eq(columns.iter().copied()) {
                return Err(SqlError::RaggedBatch { row: i });
            }
            if i > 0 {
                buf.push(", ");
            }
            buf.push("(");
            for (j, (_, value)) in self.bind_row(row)?.into_iter().enumerate() {
                if j > 0 {
                    buf.push(", ");
                }
                buf.bind(value);
            }
            buf.push(")");
        }
        buf.finish(self.dialect)
    }

    /// Updates the row identified by its primary and tenant keys. Key
    /// columns are only used for lookup and never reassigned.
    pub fn update_by_key(&self, row: &Record) -> SqlResult<Statement> {
        self.require_tenant(row)?;
        for key in self.entity.primary_keys() {
            if !row.contains_key(key) {
                return Err(SqlError::MissingPrimaryKey {
                    column: key.clone(),
                });
            }
        }

        let bound = self.bind_row(row)?;
        let (keys, updates): (Vec<_>, Vec<_>) = bound
            .into_iter()
            .partition(|(column, _)| self.entity.is_key(&column.name));
        if updates.is_empty() {
            return Err(SqlError::NoUpdatableColumns);
        }

        let mut buf = SqlBuf::new();
        buf.push(format!("UPDATE {} SET ", self.table()));
        for (i, (column, value)) in updates.into_iter().enumerate() {
            if i > 0 {
                buf.push(", ");
            }
            buf.push(format!("{} = ", self.ident(&column.name)));
            buf.bind(value);
        }

        buf.push(" WHERE ");
        let lookup = self
            .entity
            .key_columns()
            .into_iter()
            .filter_map(|name| keys.iter().find(|(c, _)| c.name == name));
        for (i, (column, value)) in lookup.enumerate() {
            if i > 0 {
                buf.push(" AND ");
            }
            buf.push(format!("{} = ", self.ident(&column.name)));
            buf.bind(value.clone());
        }
        buf.finish(self.dialect)
    }

    /// Deletes rows matching every `column = value` pair in `filter`.
    pub fn delete_by_equality(&self, filter: &Record) -> SqlResult<Statement> {
        if filter.is_empty() {
            return Err(SqlError::EmptyDeleteFilter);
        }
        self.require_tenant(filter)?;

        let mut buf = SqlBuf::new();
        buf.push(format!("DELETE FROM {} WHERE ", self.table()));
        for (i, (key, value)) in filter.iter().enumerate() {
            let column = self.resolve(key)?;
            if i > 0 {
                buf.push(" AND ");
            }
            let target = self.ident(&column.name);
            self.compile_comparison(&mut buf, column, &target, Operator::Equals, value)?;
        }
        buf.finish(self.dialect)
    }
}

/// Escapes LIKE wildcards and the escape character itself.
fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
