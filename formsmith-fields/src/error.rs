//! Error types for schema editing and persistence
//!
//! Evaluation never produces these: validation failures are [`FieldError`]
//! values and uncomputable derived fields are `None`. Only structural edits,
//! the on-disk store and parsing report a [`FormsError`].
//!
//! [`FieldError`]: crate::validation::FieldError

use std::path::PathBuf;
use thiserror::Error;

/// Result type for forms operations
pub type Result<T> = std::result::Result<T, FormsError>;

/// Errors that can occur while editing, loading or saving form schemas
#[derive(Debug, Error)]
pub enum FormsError {
    /// Schema not found by id
    #[error("form schema not found: {id}")]
    SchemaNotFound { id: String },

    /// Field not found by id
    #[error("field not found: {id}")]
    FieldNotFound { id: String },

    /// Position outside the current field or option list
    #[error("index {index} out of range for {len} entries")]
    IndexOutOfRange { index: usize, len: usize },

    /// Derived field configuration would make fields depend on themselves
    #[error("dependency cycle between fields: {}", fields.join(", "))]
    DependencyCycle { fields: Vec<String> },

    /// Schema id that cannot name a file inside the store
    #[error("invalid form schema id: {id:?}")]
    InvalidSchemaId { id: String },

    /// Forms directory not found
    #[error("forms directory not found: {path}")]
    NotInitialized { path: PathBuf },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
