//! Runtime entity engine for entkit.
//!
//! The engine asks a [`SchemaProvider`] for the schemas it should serve,
//! derives a [`DbEntity`](entkit_sql::DbEntity) and validators for each one
//! and keeps them in a cache behind a single reader/writer lock. Lookups
//! take the read lock. [`EntityEngine::prepare`] and schema change
//! notifications take the write lock and replace entries whole.
//!
//! ```no_run
//! use entkit_engine::{EngineConfig, EntityEngine, MemorySchemaProvider};
//! use std::sync::Arc;
//!
//! # fn run(schemas: Vec<entkit_model::Schema>) -> entkit_engine::EngineResult<()> {
//! let provider = Arc::new(MemorySchemaProvider::from_schemas(schemas)?);
//! let engine = EntityEngine::new(provider, EngineConfig::load_from("entkit.toml"))?;
//! engine.prepare(&["Company"])?;
//! let table = engine.db_entity("Company").map(|e| e.table_name().to_string());
//! # Ok(())
//! # }
//! ```

mod config;
mod engine;
mod error;
mod provider;

pub use config::EngineConfig;
pub use engine::{EntityCompiler, EntityEngine, EntityToolbox};
pub use error::{EngineError, EngineResult, ProviderError};
pub use provider::{MemorySchemaProvider, SchemaChangeCallback, SchemaProvider};
