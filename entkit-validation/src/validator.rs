use crate::rules::FieldRules;
use crate::{ValidationConfig, ValidationErrors};
use entkit_model::{Field, Schema};
use entkit_types::{record_from_typed, Marshal, Record};
use tracing::debug;

/// Validates records against the rules derived from one schema.
///
/// Built once and reused; building panics on a rule that cannot apply to
/// its field. In edit mode `required` is not enforced and absent keys are
/// skipped, so partial updates validate only what they carry.
#[derive(Debug, Clone)]
pub struct Validator {
    entity: String,
    edit_mode: bool,
    fields: Vec<FieldRules>,
}

impl Validator {
    #[must_use]
    pub fn new(schema: &Schema, edit_mode: bool, config: &ValidationConfig) -> Self {
        Self::for_fields(schema.name(), schema.fields(), edit_mode, config)
    }

    pub(crate) fn for_fields<'f>(
        entity: &str,
        fields: impl IntoIterator<Item = &'f Field>,
        edit_mode: bool,
        config: &ValidationConfig,
    ) -> Self {
        let fields: Vec<FieldRules> = fields
            .into_iter()
            .map(|field| FieldRules::build(field, edit_mode, config))
            .collect();
        debug!(entity, fields = fields.len(), edit_mode, "built validator");
        Self {
            entity: entity.to_string(),
            edit_mode,
            fields,
        }
    }

    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    #[must_use]
    pub const fn is_edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(FieldRules::name)
    }

    /// Validates `record`. Keys the schema does not declare are ignored.
    pub fn validate_record(&self, record: &Record) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.collect(record, &mut errors);
        if !errors.is_empty() {
            debug!(entity = %self.entity, fields = errors.len(), "validation failed");
        }
        errors.into_result()
    }

    /// Validates a typed value through its record form.
    pub fn validate<T: Marshal>(&self, value: &T) -> Result<(), ValidationErrors> {
        self.validate_record(&record_from_typed(value))
    }

    pub(crate) fn collect(&self, record: &Record, errors: &mut ValidationErrors) {
        let working: Record = self
            .fields
            .iter()
            .filter_map(|f| record.get(f.name()).map(|v| (f.name(), v.clone())))
            .collect();

        for field in &self.fields {
            for violation in field.check(working.get(field.name())) {
                errors.add(field.name(), violation);
            }
        }
    }
}
