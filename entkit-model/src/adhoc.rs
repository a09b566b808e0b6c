//! Ad hoc schemas: runtime-assembled schemas with nested holder groups.
//!
//! An ad hoc schema describes a loosely-typed payload whose shape is a tree
//! of named groups. Scalar entries are ordinary [`Field`]s; a holder entry
//! carries a nested [`AdhocSchema`] whose value must be a map. Holders are
//! not flattened here. Consumers (validation in particular) walk them
//! recursively.

use crate::{Field, Schema};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A nested group inside an ad hoc schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holder {
    pub name: String,
    pub required: bool,
    pub schema: AdhocSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdhocEntry {
    Field(Field),
    Holder(Holder),
}

impl AdhocEntry {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Field(field) => field.name(),
            Self::Holder(holder) => &holder.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdhocSchema {
    name: String,
    entries: BTreeMap<String, AdhocEntry>,
}

impl AdhocSchema {
    pub fn define(name: impl Into<String>) -> AdhocSchemaBuilder {
        AdhocSchemaBuilder {
            schema: Self {
                name: name.into(),
                entries: BTreeMap::new(),
            },
        }
    }

    /// Lifts a static schema into ad hoc form (scalar entries only).
    #[must_use]
    pub fn from_schema(schema: &Schema) -> Self {
        schema
            .fields()
            .iter()
            .cloned()
            .fold(Self::define(schema.name()), AdhocSchemaBuilder::field)
            .build()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entries keyed by top-level name.
    #[must_use]
    pub const fn entries(&self) -> &BTreeMap<String, AdhocEntry> {
        &self.entries
    }

    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&AdhocEntry> {
        self.entries.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.entries.values().filter_map(|entry| match entry {
            AdhocEntry::Field(field) => Some(field),
            AdhocEntry::Holder(_) => None,
        })
    }

    pub fn holders(&self) -> impl Iterator<Item = &Holder> {
        self.entries.values().filter_map(|entry| match entry {
            AdhocEntry::Holder(holder) => Some(holder),
            AdhocEntry::Field(_) => None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AdhocSchemaBuilder {
    schema: AdhocSchema,
}

impl AdhocSchemaBuilder {
    /// Adds a scalar field. Same-name entries are replaced.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.schema
            .entries
            .insert(field.name().to_string(), AdhocEntry::Field(field));
        self
    }

    /// Adds a holder: a named group whose value is validated against `sub`.
    #[must_use]
    pub fn holder(mut self, name: impl Into<String>, required: bool, sub: Self) -> Self {
        let name = name.into();
        self.schema.entries.insert(
            name.clone(),
            AdhocEntry::Holder(Holder {
                name,
                required,
                schema: sub.build(),
            }),
        );
        self
    }

    #[must_use]
    pub fn build(self) -> AdhocSchema {
        self.schema
    }
}
