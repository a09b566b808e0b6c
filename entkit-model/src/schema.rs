//! Entity schemas and their builder.

use crate::Field;
use serde::{Deserialize, Serialize};

/// A rule spanning the whole entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityRule {
    /// The listed columns are unique together.
    Unique(Vec<String>),
}

/// The logical description of an entity.
///
/// Built once through [`Schema::define`] and immutable afterwards. Fields
/// keep their declaration order, which is the order columns and primary
/// keys are derived in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    name: String,
    #[serde(default)]
    label: String,
    #[serde(default)]
    description: String,
    fields: Vec<Field>,
    #[serde(default)]
    rules: Vec<EntityRule>,
}

impl Schema {
    /// Starts a schema definition.
    pub fn define(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(Field::name)
    }

    #[must_use]
    pub fn rules(&self) -> &[EntityRule] {
        &self.rules
    }
}

/// Chainable builder for [`Schema`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            schema: Schema {
                name: name.into(),
                label: String::new(),
                description: String::new(),
                fields: Vec::new(),
                rules: Vec::new(),
            },
        }
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.schema.label = label.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.schema.description = description.into();
        self
    }

    /// Adds a field. A field with the same name replaces the earlier one in
    /// place, so a cloned base field can be specialized per entity.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        match self.schema.fields.iter_mut().find(|f| f.name() == field.name()) {
            Some(existing) => *existing = field,
            None => self.schema.fields.push(field),
        }
        self
    }

    #[must_use]
    pub fn fields(self, fields: impl IntoIterator<Item = Field>) -> Self {
        fields.into_iter().fold(self, Self::field)
    }

    #[must_use]
    pub fn rule(mut self, rule: EntityRule) -> Self {
        self.schema.rules.push(rule);
        self
    }

    /// Declares a multi-column unique constraint.
    #[must_use]
    pub fn unique<S: Into<String>>(self, columns: impl IntoIterator<Item = S>) -> Self {
        self.rule(EntityRule::Unique(
            columns.into_iter().map(Into::into).collect(),
        ))
    }

    #[must_use]
    pub fn build(self) -> Schema {
        self.schema
    }
}
