//! The seam through which the engine learns about schemas.

use crate::{EngineResult, ProviderError};
use entkit_model::{Schema, SchemaRegistry};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

pub type SchemaChangeCallback = Box<dyn Fn(&Schema) + Send + Sync>;

/// Supplies schemas by name and pushes later revisions.
///
/// The engine never polls; it subscribes once and reacts.
pub trait SchemaProvider: Send + Sync {
    /// Returns the schemas for `names`. Names the provider does not know
    /// may be reported as [`ProviderError::NotFound`].
    fn get_schemas(&self, names: &[&str]) -> Result<Vec<Schema>, ProviderError>;

    /// Registers `callback` to run for every changed schema.
    fn on_schema_changed(&self, callback: SchemaChangeCallback);
}

/// In-process provider over a [`SchemaRegistry`].
///
/// The registry holds the authored schemas and stays append-only.
/// [`publish`](Self::publish) records a newer revision next to it and
/// notifies subscribers.
#[derive(Default)]
pub struct MemorySchemaProvider {
    registry: Arc<SchemaRegistry>,
    revisions: RwLock<HashMap<String, Arc<Schema>>>,
    subscribers: RwLock<Vec<Arc<dyn Fn(&Schema) + Send + Sync>>>,
}

impl MemorySchemaProvider {
    #[must_use]
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self {
            registry,
            revisions: RwLock::default(),
            subscribers: RwLock::default(),
        }
    }

    /// Builds a provider whose registry holds `schemas`.
    pub fn from_schemas(schemas: impl IntoIterator<Item = Schema>) -> EngineResult<Self> {
        let registry = SchemaRegistry::default();
        for schema in schemas {
            registry.register(schema)?;
        }
        Ok(Self::new(Arc::new(registry)))
    }

    #[must_use]
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// The newest known revision of `name`.
    #[must_use]
    pub fn current(&self, name: &str) -> Option<Arc<Schema>> {
        let revisions = self.revisions.read().unwrap_or_else(PoisonError::into_inner);
        revisions
            .get(name)
            .cloned()
            .or_else(|| self.registry.get(name))
    }

    /// Records `schema` as the newest revision of its entity and notifies
    /// every subscriber.
    pub fn publish(&self, schema: Schema) {
        let schema = Arc::new(schema);
        self.revisions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(schema.name().to_string(), Arc::clone(&schema));

        let subscribers = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        debug!(entity = %schema.name(), subscribers = subscribers.len(), "publishing schema change");
        for callback in subscribers {
            callback(schema.as_ref());
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl SchemaProvider for MemorySchemaProvider {
    fn get_schemas(&self, names: &[&str]) -> Result<Vec<Schema>, ProviderError> {
        names
            .iter()
            .map(|name| {
                self.current(name)
                    .map(|schema| Schema::clone(&schema))
                    .ok_or_else(|| ProviderError::NotFound((*name).to_string()))
            })
            .collect()
    }

    fn on_schema_changed(&self, callback: SchemaChangeCallback) {
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::from(callback));
    }
}
