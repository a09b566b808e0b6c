use crate::{ValidationConfig, ValidationErrors, Validator, Violation};
use entkit_model::AdhocSchema;
use entkit_types::{Record, Value};
use tracing::debug;

#[derive(Debug, Clone)]
struct HolderRules {
    name: String,
    required: bool,
    validator: AdhocValidator,
}

/// Validates payloads shaped by an [`AdhocSchema`].
///
/// Scalar entries are checked like schema fields. Each holder must carry a
/// map that is validated recursively; its violations are reported under
/// `holder.child` paths.
#[derive(Debug, Clone)]
pub struct AdhocValidator {
    fields: Validator,
    holders: Vec<HolderRules>,
}

impl AdhocValidator {
    #[must_use]
    pub fn new(schema: &AdhocSchema, edit_mode: bool, config: &ValidationConfig) -> Self {
        let holders = schema
            .holders()
            .map(|holder| HolderRules {
                name: holder.name.clone(),
                required: holder.required && !edit_mode,
                validator: Self::new(&holder.schema, edit_mode, config),
            })
            .collect();
        Self {
            fields: Validator::for_fields(schema.name(), schema.fields(), edit_mode, config),
            holders,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.fields.entity()
    }

    pub fn validate_record(&self, record: &Record) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.collect(record, &mut errors);
        if !errors.is_empty() {
            debug!(schema = %self.name(), fields = errors.len(), "ad hoc validation failed");
        }
        errors.into_result()
    }

    fn collect(&self, record: &Record, errors: &mut ValidationErrors) {
        self.fields.collect(record, errors);

        for holder in &self.holders {
            match record.get(&holder.name) {
                Some(Value::Map(nested)) => {
                    let mut nested_errors = ValidationErrors::new();
                    holder.validator.collect(nested, &mut nested_errors);
                    errors.merge_nested(&holder.name, nested_errors);
                }
                None | Some(Value::Null) => {
                    if holder.required {
                        errors.add(&holder.name, Violation::new("required", "is required"));
                    }
                }
                Some(other) => errors.add(
                    &holder.name,
                    Violation::new("type", format!("expected map, got {}", other.kind())),
                ),
            }
        }
    }
}
