//! Core value types for entkit.
//!
//! Everything that crosses the engine boundary is expressed with these types:
//! - [`Value`]: a loosely-typed scalar, list or map
//! - [`Record`]: the generic key/value form of an entity row
//! - [`Marshal`]: explicit per-type mapping between typed structs and records
//!
//! The SQL compiler binds `Value`s as statement parameters, the validator
//! inspects `Record`s, and application services convert their own structs
//! through [`record_from_typed`] / [`typed_from_record`].

mod convert;
mod error;
mod marshal;
mod record;
mod temporal;
mod value;

pub use convert::{FromValue, IntoValue};
pub use error::{MarshalError, MarshalResult};
pub use marshal::{flatten_overflow, record_from_typed, typed_from_record, Marshal, RecordMapping};
pub use record::Record;
pub use temporal::{parse_date_text, parse_time_text};
pub use value::Value;
