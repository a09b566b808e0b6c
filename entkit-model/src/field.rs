//! Field definitions: data types, per-field rules and the field builder.

use entkit_types::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The closed set of field data types.
///
/// Besides the plain scalar types there are format types (email, phone,
/// url, ulid, uuid, the enumerations) and custom domain types
/// (localized text, country and currency codes). Both of those groups own
/// their validation; see [`DataType::owns_validation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataType {
    Email,
    Phone,
    String,
    Secret,
    Url,
    Ulid,
    Uuid,
    Integer,
    Float,
    Boolean,
    Date,
    Time,
    DateTime,
    EnumString,
    EnumNumber,
    /// Map of language code to text, e.g. `{"en": "Hello", "de": "Hallo"}`.
    LocalizedText,
    /// ISO 3166-1 alpha-2 country code.
    CountryCode,
    /// ISO 4217 currency code.
    CurrencyCode,
}

impl DataType {
    pub const ALL: [Self; 18] = [
        Self::Email,
        Self::Phone,
        Self::String,
        Self::Secret,
        Self::Url,
        Self::Ulid,
        Self::Uuid,
        Self::Integer,
        Self::Float,
        Self::Boolean,
        Self::Date,
        Self::Time,
        Self::DateTime,
        Self::EnumString,
        Self::EnumNumber,
        Self::LocalizedText,
        Self::CountryCode,
        Self::CurrencyCode,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
            Self::String => "string",
            Self::Secret => "secret",
            Self::Url => "url",
            Self::Ulid => "ulid",
            Self::Uuid => "uuid",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "dateTime",
            Self::EnumString => "enumString",
            Self::EnumNumber => "enumNumber",
            Self::LocalizedText => "localizedText",
            Self::CountryCode => "countryCode",
            Self::CurrencyCode => "currencyCode",
        }
    }

    /// Custom domain types, as opposed to the generic scalar and format types.
    #[must_use]
    pub const fn is_custom(self) -> bool {
        matches!(
            self,
            Self::LocalizedText | Self::CountryCode | Self::CurrencyCode
        )
    }

    /// Types whose values are checked by a type-specific validator instead
    /// of the generic min/max/length/one-of rules.
    #[must_use]
    pub const fn owns_validation(self) -> bool {
        self.is_custom()
            || matches!(
                self,
                Self::Email
                    | Self::Phone
                    | Self::Url
                    | Self::Ulid
                    | Self::Uuid
                    | Self::EnumString
                    | Self::EnumNumber
            )
    }

    /// Types whose values travel as text.
    #[must_use]
    pub const fn is_textual(self) -> bool {
        matches!(
            self,
            Self::Email
                | Self::Phone
                | Self::String
                | Self::Secret
                | Self::Url
                | Self::Ulid
                | Self::Uuid
                | Self::EnumString
                | Self::CountryCode
                | Self::CurrencyCode
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rule attached to a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldRule {
    Max(Value),
    Min(Value),
    Length { min: u32, max: u32 },
    OneOf(Vec<Value>),
    Primary,
    Tenant,
    Unique,
}

/// One attribute of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    name: String,
    #[serde(default)]
    label: String,
    #[serde(default)]
    description: String,
    data_type: DataType,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    data_type_options: BTreeMap<String, String>,
    #[serde(default)]
    is_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_value: Option<Value>,
    #[serde(default)]
    rules: Vec<FieldRule>,
}

impl Field {
    /// Starts a field definition. The data type defaults to `string`.
    pub fn define(name: impl Into<String>) -> FieldBuilder {
        FieldBuilder::new(name)
    }

    /// Re-opens a copy of this field, e.g. to specialize a shared field
    /// for one entity. The source field is left untouched.
    #[must_use]
    pub fn to_builder(&self) -> FieldBuilder {
        FieldBuilder {
            field: self.clone(),
            label_set: true,
        }
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

    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.data_type
    }

    #[must_use]
    pub const fn data_type_options(&self) -> &BTreeMap<String, String> {
        &self.data_type_options
    }

    /// Looks up one data type option, e.g. `precision` for a float column.
    #[must_use]
    pub fn option(&self, key: &str) -> Option<&str> {
        self.data_type_options.get(key).map(String::as_str)
    }

    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.is_required
    }

    #[must_use]
    pub const fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    #[must_use]
    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.rules.contains(&FieldRule::Primary)
    }

    #[must_use]
    pub fn is_tenant(&self) -> bool {
        self.rules.contains(&FieldRule::Tenant)
    }

    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.rules.contains(&FieldRule::Unique)
    }

    /// The `(min, max)` bounds of the first `length` rule, if any.
    #[must_use]
    pub fn length_rule(&self) -> Option<(u32, u32)> {
        self.rules.iter().find_map(|rule| match rule {
            FieldRule::Length { min, max } => Some((*min, *max)),
            _ => None,
        })
    }

    /// The allowed values of the first `one_of` rule, if any.
    #[must_use]
    pub fn one_of_values(&self) -> Option<&[Value]> {
        self.rules.iter().find_map(|rule| match rule {
            FieldRule::OneOf(values) => Some(values.as_slice()),
            _ => None,
        })
    }
}

/// Chainable builder for [`Field`].
#[derive(Debug, Clone)]
pub struct FieldBuilder {
    field: Field,
    label_set: bool,
}

impl FieldBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            field: Field {
                name: name.into(),
                label: String::new(),
                description: String::new(),
                data_type: DataType::String,
                data_type_options: BTreeMap::new(),
                is_required: false,
                default_value: None,
                rules: Vec::new(),
            },
            label_set: false,
        }
    }

    /// Renames the field (useful together with [`Field::to_builder`]).
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.field.name = name.into();
        self
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.field.label = label.into();
        self.label_set = true;
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.field.description = description.into();
        self
    }

    #[must_use]
    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.field.data_type = data_type;
        self
    }

    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.field.data_type_options.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.field.is_required = required;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.field.default_value = Some(value.into());
        self
    }

    #[must_use]
    pub fn rule(mut self, rule: FieldRule) -> Self {
        self.field.rules.push(rule);
        self
    }

    #[must_use]
    pub fn primary(self) -> Self {
        self.rule(FieldRule::Primary)
    }

    #[must_use]
    pub fn tenant(self) -> Self {
        self.rule(FieldRule::Tenant)
    }

    #[must_use]
    pub fn unique(self) -> Self {
        self.rule(FieldRule::Unique)
    }

    #[must_use]
    pub fn min(self, value: impl Into<Value>) -> Self {
        self.rule(FieldRule::Min(value.into()))
    }

    #[must_use]
    pub fn max(self, value: impl Into<Value>) -> Self {
        self.rule(FieldRule::Max(value.into()))
    }

    #[must_use]
    pub fn length(self, min: u32, max: u32) -> Self {
        self.rule(FieldRule::Length { min, max })
    }

    #[must_use]
    pub fn one_of<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Self {
        self.rule(FieldRule::OneOf(values.into_iter().map(Into::into).collect()))
    }

    /// Finishes the field.
    ///
    /// # Panics
    ///
    /// Panics if the name is empty or blank. Fields are authored in code,
    /// so a missing name is a construction bug.
    #[must_use]
    pub fn build(mut self) -> Field {
        assert!(
            !self.field.name.trim().is_empty(),
            "field name must not be empty"
        );
        if !self.label_set {
            self.field.label = self.field.name.clone();
        }
        self.field
    }
}
