//! Form schemas, validation rules and derived fields
//!
//! `formsmith-fields` models a form as an ordered list of typed fields. Each
//! field carries validation rules and may be derived from other fields. The
//! crate evaluates a flat data bag against a schema and keeps derived values
//! current.
//!
//! # Architecture
//!
//! - **Pure engine**: `validation`, `derive` and `refresh` take the schema and
//!   data explicitly and never fail; problems are reported as [`FieldError`]s
//!   or absent derived values
//! - **Hooks for `custom`**: a [`FormEngine`] carries optional [`RuleHook`] and
//!   [`DeriveHook`] implementations; without them `custom` is a no-op
//! - **Headless editing**: [`FormBuilder`] edits a schema, [`FormSession`]
//!   fills one in
//! - **YAML on disk**: [`FormStore`] keeps one `.yaml` file per schema

pub mod builder;
pub mod derive;
pub mod engine;
pub mod error;
pub mod graph;
pub mod refresh;
pub mod session;
pub mod store;
pub mod types;
pub mod validation;
pub mod value;

pub use builder::{FieldUpdate, FormBuilder};
pub use derive::{compute_derived_value, compute_derived_value_at, DeriveHook};
pub use engine::FormEngine;
pub use error::{FormsError, Result};
pub use graph::DependencyGraph;
pub use refresh::{refresh_derived, RefreshOutcome};
pub use session::{FormSession, NO_VALUE};
pub use store::{validate_schema_id, FormStore, FormStoreBuilder};
pub use types::{
    ComputationKind, DerivedFieldConfig, FieldType, FormField, FormSchema, RuleKind,
    RuleThreshold, SelectOption, ValidationRule,
};
pub use validation::{
    evaluate_rule, validate_field, validate_form, FieldError, FormValidation, RuleHook,
};
pub use value::{FieldValue, FormData};
