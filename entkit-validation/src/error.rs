//! Field-addressable validation failures.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// One failed rule on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Stable machine-readable rule name, e.g. `required` or `format`.
    pub code: String,
    pub message: String,
}

impl Violation {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// All violations of one validation run, keyed by field path.
///
/// Nested ad hoc holders contribute paths like `address.city`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(transparent)]
#[error("validation failed: {}", summarize(.0))]
pub struct ValidationErrors(BTreeMap<String, Vec<Violation>>);

fn summarize(errors: &BTreeMap<String, Vec<Violation>>) -> String {
    errors
        .iter()
        .map(|(field, violations)| {
            let codes: Vec<&str> = violations.iter().map(|v| v.code.as_str()).collect();
            format!("{field} ({})", codes.join(", "))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, violation: Violation) {
        self.0.entry(field.into()).or_default().push(violation);
    }

    /// Moves every entry of `nested` in under `prefix.`.
    pub fn merge_nested(&mut self, prefix: &str, nested: ValidationErrors) {
        for (field, violations) in nested.0 {
            self.0
                .entry(format!("{prefix}.{field}"))
                .or_default()
                .extend(violations);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with at least one violation.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[Violation]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Violation codes for `field`, in the order they were found.
    #[must_use]
    pub fn codes(&self, field: &str) -> Vec<&str> {
        self.get(field)
            .map(|v| v.iter().map(|v| v.code.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Violation])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// `Ok(())` when nothing was collected.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}
