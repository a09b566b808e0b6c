use crate::{EngineConfig, EngineError, EngineResult, SchemaProvider};
use entkit_model::Schema;
use entkit_sql::{DbEntity, Dialect, SqlCompiler};
use entkit_validation::Validator;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use tracing::{debug, info, warn};

/// Everything derived for one entity.
#[derive(Debug, Clone)]
pub struct EntityToolbox {
    pub schema: Arc<Schema>,
    pub db_entity: Arc<DbEntity>,
    /// Enforces `required`; use for inserts.
    pub validator: Arc<Validator>,
    /// Skips `required` and absent keys; use for partial updates.
    pub edit_validator: Arc<Validator>,
}

/// An entity paired with the engine's dialect.
#[derive(Clone)]
pub struct EntityCompiler {
    entity: Arc<DbEntity>,
    dialect: Arc<dyn Dialect>,
}

impl EntityCompiler {
    #[must_use]
    pub fn compiler(&self) -> SqlCompiler<'_> {
        SqlCompiler::new(&self.entity, self.dialect.as_ref())
    }

    #[must_use]
    pub fn entity(&self) -> &DbEntity {
        &self.entity
    }
}

struct EngineInner {
    provider: Arc<dyn SchemaProvider>,
    config: EngineConfig,
    dialect: Arc<dyn Dialect>,
    cache: RwLock<HashMap<String, EntityToolbox>>,
    subscribed: AtomicBool,
}

/// Cache of per-entity toolboxes fed by a [`SchemaProvider`].
///
/// Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct EntityEngine {
    inner: Arc<EngineInner>,
}

impl EntityEngine {
    /// Creates an engine. Fails when the configured dialect is unknown.
    pub fn new(provider: Arc<dyn SchemaProvider>, config: EngineConfig) -> EngineResult<Self> {
        let dialect = config.resolve_dialect()?;
        Ok(Self {
            inner: Arc::new(EngineInner {
                provider,
                config,
                dialect,
                cache: RwLock::default(),
                subscribed: AtomicBool::new(false),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.inner.dialect.as_ref()
    }

    /// Fetches and derives `names`, then subscribes to schema changes.
    ///
    /// Runs once: when the cache already holds entries this is a no-op.
    /// Either every requested entity is installed or none is.
    pub fn prepare(&self, names: &[&str]) -> EngineResult<()> {
        let mut cache = self
            .inner
            .cache
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if !cache.is_empty() {
            debug!(cached = cache.len(), "engine already prepared");
            return Ok(());
        }

        let mut built = HashMap::with_capacity(names.len());
        for schema in self.inner.provider.get_schemas(names)? {
            let toolbox = self.inner.build(schema)?;
            built.insert(toolbox.schema.name().to_string(), toolbox);
        }
        if let Some(missing) = names.iter().find(|name| !built.contains_key(**name)) {
            return Err(EngineError::MissingSchema((*missing).to_string()));
        }
        *cache = built;

        if !self.inner.subscribed.swap(true, Ordering::SeqCst) {
            let weak: Weak<EngineInner> = Arc::downgrade(&self.inner);
            self.inner
                .provider
                .on_schema_changed(Box::new(move |schema: &Schema| {
                    if let Some(inner) = weak.upgrade() {
                        inner.refresh(schema);
                    }
                }));
        }

        info!(
            entities = cache.len(),
            dialect = self.inner.dialect.name(),
            "entity engine prepared"
        );
        Ok(())
    }

    #[must_use]
    pub fn is_prepared(&self) -> bool {
        !self.read_cache().is_empty()
    }

    /// Names of every cached entity, sorted.
    #[must_use]
    pub fn entity_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read_cache().keys().cloned().collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn toolbox(&self, name: &str) -> Option<EntityToolbox> {
        self.read_cache().get(name).cloned()
    }

    #[must_use]
    pub fn db_entity(&self, name: &str) -> Option<Arc<DbEntity>> {
        self.read_cache().get(name).map(|t| Arc::clone(&t.db_entity))
    }

    #[must_use]
    pub fn schema(&self, name: &str) -> Option<Arc<Schema>> {
        self.read_cache().get(name).map(|t| Arc::clone(&t.schema))
    }

    #[must_use]
    pub fn validator(&self, name: &str) -> Option<Arc<Validator>> {
        self.read_cache().get(name).map(|t| Arc::clone(&t.validator))
    }

    #[must_use]
    pub fn edit_validator(&self, name: &str) -> Option<Arc<Validator>> {
        self.read_cache()
            .get(name)
            .map(|t| Arc::clone(&t.edit_validator))
    }

    #[must_use]
    pub fn compiler(&self, name: &str) -> Option<EntityCompiler> {
        self.db_entity(name).map(|entity| EntityCompiler {
            entity,
            dialect: Arc::clone(&self.inner.dialect),
        })
    }

    fn read_cache(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, EntityToolbox>> {
        self.inner
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl EngineInner {
    fn build(&self, schema: Schema) -> EngineResult<EntityToolbox> {
        let table = self.config.table_name(schema.name());
        let db_entity = DbEntity::new(&schema, &table, |field| {
            self.dialect.resolve_db_type(field)
        })
        .map_err(|source| EngineError::Derive {
            entity: schema.name().to_string(),
            source,
        })?;
        let validator = Validator::new(&schema, false, &self.config.validation);
        let edit_validator = Validator::new(&schema, true, &self.config.validation);

        Ok(EntityToolbox {
            schema: Arc::new(schema),
            db_entity: Arc::new(db_entity),
            validator: Arc::new(validator),
            edit_validator: Arc::new(edit_validator),
        })
    }

    /// Rebuilds one cached entity. Unknown entities are ignored and a
    /// failed rebuild keeps the previous entry.
    fn refresh(&self, schema: &Schema) {
        let name = schema.name();
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if !cache.contains_key(name) {
            debug!(entity = %name, "ignoring change for entity that is not prepared");
            return;
        }

        match self.build(schema.clone()) {
            Ok(toolbox) => {
                cache.insert(name.to_string(), toolbox);
                info!(entity = %name, "refreshed entity");
            }
            Err(e) => {
                warn!(entity = %name, error = %e, "failed to refresh entity, keeping previous definition");
            }
        }
    }
}
