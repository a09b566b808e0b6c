//! Physical entity derivation.

use crate::{ColumnCategory, DeriveError, DeriveResult};
use entkit_model::{EntityRule, Field, Schema};
use entkit_types::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// One table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub sql_type: String,
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Column {
    #[must_use]
    pub fn category(&self) -> ColumnCategory {
        ColumnCategory::of_sql_type(&self.sql_type)
    }
}

/// The dialect-specific table description derived from a [`Schema`].
///
/// Never authored by hand. A changed schema produces a new `DbEntity`;
/// an existing one is never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbEntity {
    name: String,
    table_name: String,
    columns: Vec<Column>,
    primary_keys: Vec<String>,
    tenant_key: Option<String>,
    unique_keys: Vec<Vec<String>>,
}

impl DbEntity {
    /// Derives the physical entity for `schema`.
    ///
    /// `resolve_db_type` maps each field to its column type and is normally
    /// a [`Dialect`](crate::Dialect)'s `resolve_db_type` or one of the free
    /// functions [`postgres_type`](crate::postgres_type) /
    /// [`sqlite_type`](crate::sqlite_type). A blank `table_name` falls back
    /// to the entity name.
    pub fn new<F>(schema: &Schema, table_name: &str, resolve_db_type: F) -> DeriveResult<Self>
    where
        F: Fn(&Field) -> DeriveResult<String>,
    {
        let name = schema.name().trim();
        if name.is_empty() {
            return Err(DeriveError::EmptyEntityName);
        }

        let mut columns: Vec<Column> = Vec::with_capacity(schema.fields().len());
        let mut seen = HashSet::new();
        let mut primary_keys = Vec::new();
        let mut tenant_key: Option<String> = None;
        let mut field_uniques = Vec::new();

        for field in schema.fields() {
            let column_name = field.name().trim();
            if column_name.is_empty() {
                return Err(DeriveError::EmptyFieldName {
                    entity: name.to_string(),
                });
            }
            if !seen.insert(column_name.to_string()) {
                return Err(DeriveError::DuplicateColumn {
                    entity: name.to_string(),
                    column: column_name.to_string(),
                });
            }

            let sql_type = resolve_db_type(field)?;
            let primary = field.is_primary();
            let tenant = field.is_tenant();

            if primary {
                primary_keys.push(column_name.to_string());
            }
            if tenant {
                match &tenant_key {
                    Some(existing) if existing != column_name => {
                        return Err(DeriveError::ConflictingTenantKey {
                            column: column_name.to_string(),
                            existing: existing.clone(),
                        });
                    }
                    _ => tenant_key = Some(column_name.to_string()),
                }
            }
            if field.is_unique() {
                field_uniques.push(vec![column_name.to_string()]);
            }

            columns.push(Column {
                name: column_name.to_string(),
                sql_type,
                nullable: !(field.is_required() || primary || tenant),
                default: field.default_value().cloned(),
            });
        }

        let mut groups = field_uniques;
        for rule in schema.rules() {
            match rule {
                EntityRule::Unique(group) => {
                    for column in group {
                        if !seen.contains(column.as_str()) {
                            return Err(DeriveError::UnknownUniqueColumn {
                                entity: name.to_string(),
                                column: column.clone(),
                            });
                        }
                    }
                    groups.push(group.clone());
                }
            }
        }
        let unique_keys = dedup_groups(groups);

        if primary_keys.is_empty() {
            return Err(DeriveError::MissingPrimaryKey {
                entity: name.to_string(),
            });
        }

        let table_name = match table_name.trim() {
            "" => name.to_string(),
            table => table.to_string(),
        };
        debug!(
            entity = %name,
            table = %table_name,
            columns = columns.len(),
            "derived physical entity"
        );

        Ok(Self {
            name: name.to_string(),
            table_name,
            columns,
            primary_keys,
            tenant_key,
            unique_keys,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Columns in field declaration order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Primary key columns in field declaration order.
    #[must_use]
    pub fn primary_keys(&self) -> &[String] {
        &self.primary_keys
    }

    #[must_use]
    pub fn tenant_key(&self) -> Option<&str> {
        self.tenant_key.as_deref()
    }

    /// Unique column groups, each sorted, without duplicates.
    #[must_use]
    pub fn unique_keys(&self) -> &[Vec<String>] {
        &self.unique_keys
    }

    /// Primary keys plus the tenant key when it is not already one of them.
    #[must_use]
    pub fn key_columns(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.primary_keys.iter().map(String::as_str).collect();
        if let Some(tenant) = self.tenant_key() {
            if !keys.contains(&tenant) {
                keys.push(tenant);
            }
        }
        keys
    }

    /// True for primary and tenant key columns.
    #[must_use]
    pub fn is_key(&self, column: &str) -> bool {
        self.primary_keys.iter().any(|k| k == column) || self.tenant_key() == Some(column)
    }
}

fn dedup_groups(groups: Vec<Vec<String>>) -> Vec<Vec<String>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for mut group in groups {
        group.sort();
        group.dedup();
        if group.is_empty() {
            continue;
        }
        if seen.insert(group.join("|")) {
            out.push(group);
        }
    }
    out
}
