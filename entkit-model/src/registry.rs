//! Append-only, name-keyed registries for authored schemas.

use crate::{AdhocSchema, ModelError, ModelResult, Schema};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Anything that can be registered by name.
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for Schema {
    fn name(&self) -> &str {
        Schema::name(self)
    }
}

impl Named for AdhocSchema {
    fn name(&self) -> &str {
        AdhocSchema::name(self)
    }
}

/// A process-wide store of named items, explicitly constructed and shared.
///
/// Registration is append-only: an item can neither be replaced nor
/// removed, so a reader never sees a registered name disappear.
#[derive(Debug)]
pub struct Registry<T> {
    items: RwLock<HashMap<String, Arc<T>>>,
}

pub type SchemaRegistry = Registry<Schema>;
pub type AdhocRegistry = Registry<AdhocSchema>;

impl<T: Named> Registry<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
        }
    }

    /// Registers `item` under its name.
    pub fn register(&self, item: T) -> ModelResult<Arc<T>> {
        let name = item.name().trim().to_string();
        if name.is_empty() {
            return Err(ModelError::EmptyName);
        }
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        if items.contains_key(&name) {
            return Err(ModelError::AlreadyRegistered(name));
        }
        let item = Arc::new(item);
        items.insert(name.clone(), Arc::clone(&item));
        debug!(name = %name, "registered");
        Ok(item)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<T>> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Named> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}
