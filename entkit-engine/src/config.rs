use crate::{EngineError, EngineResult};
use entkit_sql::{dialect_for, Dialect};
use entkit_validation::ValidationConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Engine settings, usually read from `entkit.toml`.
///
/// ```toml
/// dialect = "postgres"
/// table_prefix = "app_"
///
/// [validation]
/// default_max_length = 255
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// SQL dialect name, `postgres` or `sqlite`.
    pub dialect: String,
    /// Prepended to the lowercased entity name to form table names.
    pub table_prefix: String,
    pub validation: ValidationConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dialect: "postgres".to_string(),
            table_prefix: String::new(),
            validation: ValidationConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parses a TOML document. Unknown dialects are rejected.
    pub fn from_toml_str(contents: &str) -> EngineResult<Self> {
        let config: Self = toml::from_str(contents)?;
        config.resolve_dialect()?;
        Ok(config)
    }

    /// Loads from `path`, falling back to defaults when the file is
    /// missing or invalid.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No engine config at {:?}, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(config) => {
                    info!(dialect = %config.dialect, "Loaded engine config from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Failed to parse engine config {:?}: {}. Using defaults.", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read engine config {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn resolve_dialect(&self) -> EngineResult<Arc<dyn Dialect>> {
        dialect_for(&self.dialect).ok_or_else(|| EngineError::UnknownDialect(self.dialect.clone()))
    }

    /// Table name for `entity`.
    #[must_use]
    pub fn table_name(&self, entity: &str) -> String {
        format!("{}{}", self.table_prefix, entity.to_lowercase())
    }
}
