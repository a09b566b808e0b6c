//! Per-field rule sets and their evaluation.

use crate::format::{is_language_code, matches_format, normalize_temporal};
use crate::{ValidationConfig, Violation};
use entkit_model::{DataType, Field, FieldRule};
use entkit_types::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
enum Rule {
    Min(Value),
    Max(Value),
    Length { min: u32, max: u32 },
    OneOf(Vec<Value>),
    Format,
    Localized { min: u32, max: u32 },
}

/// The compiled rules of one field.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FieldRules {
    name: String,
    data_type: DataType,
    required: bool,
    rules: Vec<Rule>,
}

fn misconfigured(field: &Field, rule: &str, reason: impl std::fmt::Display) -> ! {
    panic!("invalid {rule} rule on field '{}': {reason}", field.name())
}

impl FieldRules {
    /// Builds the rule set for `field`. Panics when a rule cannot apply to
    /// the field's data type.
    pub(crate) fn build(field: &Field, edit_mode: bool, config: &ValidationConfig) -> Self {
        let data_type = field.data_type();
        let mut rules = Vec::new();

        if data_type.owns_validation() {
            match data_type {
                DataType::EnumString | DataType::EnumNumber => {
                    let Some(values) = field.one_of_values() else {
                        misconfigured(field, "one_of", "enumeration fields need allowed values");
                    };
                    rules.push(Rule::OneOf(one_of(field, values)));
                }
                DataType::LocalizedText => {
                    let (min, max) = length_bounds(field, config);
                    rules.push(Rule::Localized { min, max });
                }
                _ => {
                    let (min, max) = length_bounds(field, config);
                    rules.push(Rule::Length { min, max });
                    rules.push(Rule::Format);
                }
            }
        } else {
            for rule in field.rules() {
                match rule {
                    FieldRule::Min(bound) => rules.push(Rule::Min(bound_for(field, "min", bound))),
                    FieldRule::Max(bound) => rules.push(Rule::Max(bound_for(field, "max", bound))),
                    FieldRule::Length { min, max } => {
                        if !data_type.is_textual() {
                            misconfigured(field, "length", format!("{data_type} is not textual"));
                        }
                        if min > max {
                            misconfigured(field, "length", format!("min {min} exceeds max {max}"));
                        }
                        rules.push(Rule::Length {
                            min: *min,
                            max: *max,
                        });
                    }
                    FieldRule::OneOf(values) => rules.push(Rule::OneOf(one_of(field, values))),
                    FieldRule::Primary | FieldRule::Tenant | FieldRule::Unique => {}
                }
            }
        }

        Self {
            name: field.name().to_string(),
            data_type,
            required: field.is_required() && !edit_mode,
            rules,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Evaluates the rules against `value`, which is `None` when the key
    /// is absent from the record.
    pub(crate) fn check(&self, value: Option<&Value>) -> Vec<Violation> {
        let value = match value {
            Some(v) if !v.is_null() => v,
            _ if self.required => {
                return vec![Violation::new("required", "is required")];
            }
            _ => return Vec::new(),
        };

        let Some(value) = typed(self.data_type, value) else {
            return vec![Violation::new(
                "type",
                format!("expected {}, got {}", self.data_type, value.kind()),
            )];
        };

        self.rules
            .iter()
            .flat_map(|rule| self.evaluate(rule, &value))
            .collect()
    }

    fn evaluate(&self, rule: &Rule, value: &Value) -> Vec<Violation> {
        match rule {
            Rule::Min(bound) if value.compare(bound) == Some(Ordering::Less) => {
                vec![Violation::new("min", format!("must be at least {bound}"))]
            }
            Rule::Max(bound) if value.compare(bound) == Some(Ordering::Greater) => {
                vec![Violation::new("max", format!("must be at most {bound}"))]
            }
            Rule::Length { min, max } => value
                .as_str()
                .and_then(|text| length_violation(text, *min, *max))
                .into_iter()
                .collect(),
            Rule::OneOf(allowed) if !allowed.iter().any(|a| is_equal(value, a)) => {
                let listed: Vec<String> = allowed.iter().map(ToString::to_string).collect();
                vec![Violation::new(
                    "one_of",
                    format!("must be one of: {}", listed.join(", ")),
                )]
            }
            Rule::Format => match value.as_str() {
                Some(text) if !matches_format(self.data_type, text) => vec![Violation::new(
                    "format",
                    format!("is not a valid {}", self.data_type),
                )],
                _ => Vec::new(),
            },
            Rule::Localized { min, max } => localized_violations(value, *min, *max),
            _ => Vec::new(),
        }
    }
}

/// Returns `value` in the shape rules compare against, or `None` when it
/// does not fit the data type.
fn typed(data_type: DataType, value: &Value) -> Option<Value> {
    let fits = match data_type {
        DataType::Integer | DataType::EnumNumber => matches!(value, Value::Int(_) | Value::UInt(_)),
        DataType::Float => value.is_number(),
        DataType::Boolean => matches!(value, Value::Bool(_)),
        DataType::Date | DataType::Time | DataType::DateTime => {
            return normalize_temporal(data_type, value);
        }
        DataType::LocalizedText => matches!(value, Value::Map(_)),
        _ => matches!(value, Value::Text(_)),
    };
    fits.then(|| value.clone())
}

fn is_equal(a: &Value, b: &Value) -> bool {
    a.compare(b) == Some(Ordering::Equal) || a == b
}

fn length_bounds(field: &Field, config: &ValidationConfig) -> (u32, u32) {
    let (min, max) = field
        .length_rule()
        .unwrap_or((config.default_min_length, config.default_max_length));
    if min > max {
        misconfigured(field, "length", format!("min {min} exceeds max {max}"));
    }
    (min, max)
}

fn bound_for(field: &Field, rule: &str, bound: &Value) -> Value {
    let data_type = field.data_type();
    match data_type {
        DataType::Integer | DataType::Float if bound.is_number() => bound.clone(),
        DataType::Integer | DataType::Float => {
            misconfigured(field, rule, format!("{} bound on a number field", bound.kind()))
        }
        DataType::Date | DataType::Time | DataType::DateTime => {
            normalize_temporal(data_type, bound).unwrap_or_else(|| {
                misconfigured(field, rule, format!("'{bound}' is not a valid {data_type}"))
            })
        }
        _ => misconfigured(field, rule, format!("not applicable to {data_type} fields")),
    }
}

fn one_of(field: &Field, values: &[Value]) -> Vec<Value> {
    values
        .iter()
        .map(|v| {
            typed(field.data_type(), v).unwrap_or_else(|| {
                misconfigured(
                    field,
                    "one_of",
                    format!("{} value for a {} field", v.kind(), field.data_type()),
                )
            })
        })
        .collect()
}

fn length_violation(text: &str, min: u32, max: u32) -> Option<Violation> {
    let len = text.chars().count();
    let within = usize::try_from(min).is_ok_and(|min| len >= min)
        && usize::try_from(max).is_ok_and(|max| len <= max);
    (!within).then(|| {
        Violation::new(
            "length",
            format!("length must be between {min} and {max}"),
        )
    })
}

fn localized_violations(value: &Value, min: u32, max: u32) -> Vec<Violation> {
    let Some(map) = value.as_record() else {
        return Vec::new();
    };
    let mut violations = Vec::new();
    for (code, text) in map {
        if !is_language_code(code) {
            violations.push(Violation::new(
                "format",
                format!("'{code}' is not a language code"),
            ));
        }
        match text.as_str() {
            Some(text) => violations.extend(length_violation(text, min, max).map(|mut v| {
                v.message = format!("{code}: {}", v.message);
                v
            })),
            None => violations.push(Violation::new(
                "type",
                format!("{code}: expected text, got {}", text.kind()),
            )),
        }
    }
    violations
}
