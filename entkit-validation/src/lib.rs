//! Validation rules derived from entkit schemas.
//!
//! A [`Validator`] is built once per schema. Every field gets a presence
//! rule (unless the validator runs in edit mode), a data type check and
//! then either the type's own format rules or the generic
//! `min`/`max`/`length`/`one_of` rules translated from its [`FieldRule`]s.
//!
//! Failures are collected into [`ValidationErrors`], keyed by field path.
//! A rule whose configuration cannot apply to its field is a programming
//! error and panics while the validator is built.
//!
//! [`FieldRule`]: entkit_model::FieldRule

mod adhoc;
mod config;
mod error;
mod format;
mod rules;
mod validator;

pub use adhoc::AdhocValidator;
pub use config::ValidationConfig;
pub use error::{ValidationErrors, Violation};
pub use validator::Validator;
