//! Entity schema model for entkit.
//!
//! Defines the metadata every other entkit crate is driven by:
//! - [`Schema`]: an entity's name, fields and cross-field rules
//! - [`Field`]: one attribute with its [`DataType`] and [`FieldRule`]s
//! - [`AdhocSchema`]: a runtime-assembled schema with nested holder groups
//! - [`Registry`]: append-only, name-keyed store for authored schemas
//!
//! Schemas are authored once through builders and never mutated afterwards.
//! The SQL crate derives tables from them and the validation crate derives
//! rules from them, so both always agree on the same metadata.

mod adhoc;
mod error;
mod field;
mod registry;
mod schema;

pub use adhoc::{AdhocEntry, AdhocSchema, AdhocSchemaBuilder, Holder};
pub use error::{ModelError, ModelResult};
pub use field::{DataType, Field, FieldBuilder, FieldRule};
pub use registry::{AdhocRegistry, Named, Registry, SchemaRegistry};
pub use schema::{EntityRule, Schema, SchemaBuilder};
