use serde::{Deserialize, Serialize};

/// Defaults applied while building validators.
///
/// Read from the `[validation]` table of the engine configuration:
///
/// ```toml
/// [validation]
/// default_min_length = 0
/// default_max_length = 255
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Lower length bound for format types without a `length` rule.
    pub default_min_length: u32,
    /// Upper length bound for format types without a `length` rule.
    pub default_max_length: u32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            default_min_length: 0,
            default_max_length: 255,
        }
    }
}
