//! FormStore: on-disk registry of form schemas.
//!
//! Each schema lives in its own `<id>.yaml` file under the store root. The
//! store keeps every schema in memory with an id index and writes through
//! to disk on every change.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tracing::{debug, warn};
use ulid::Ulid;

use crate::error::{FormsError, Result};
use crate::types::FormSchema;

/// Builder for `FormStore`. Created by `FormStore::open()`.
pub struct FormStoreBuilder {
    root: PathBuf,
    create: bool,
}

impl FormStoreBuilder {
    /// Whether a missing root directory is created (default) or reported as
    /// [`FormsError::NotInitialized`].
    pub fn create_missing(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    /// Build the store: create the directory if allowed, load from disk.
    pub async fn build(self) -> Result<FormStore> {
        let root = self.root;
        if self.create {
            fs::create_dir_all(&root).await?;
        } else if !root.is_dir() {
            return Err(FormsError::NotInitialized { path: root });
        }

        let mut store = FormStore {
            root,
            schemas: Vec::new(),
            index: HashMap::new(),
        };
        store.load_schemas().await?;

        debug!(schemas = store.schemas.len(), root = ?store.root, "form store opened");
        Ok(store)
    }
}

/// Directory of form schemas.
///
/// ```text
/// forms/
///   form_01j....yaml   ← one file per schema
/// ```
pub struct FormStore {
    root: PathBuf,
    schemas: Vec<FormSchema>,
    index: HashMap<String, usize>,
}

impl FormStore {
    /// Open or create a store directory.
    ///
    /// ```rust,ignore
    /// let mut store = FormStore::open(".formsmith/forms").build().await?;
    /// let saved = store.save_schema(builder.build_schema("Signup")).await?;
    /// ```
    pub fn open(root: impl Into<PathBuf>) -> FormStoreBuilder {
        FormStoreBuilder {
            root: root.into(),
            create: true,
        }
    }

    /// Get a schema by id.
    pub fn get_schema(&self, id: &str) -> Option<&FormSchema> {
        self.index.get(id).map(|&i| &self.schemas[i])
    }

    /// All schemas, oldest first.
    pub fn all_schemas(&self) -> &[FormSchema] {
        &self.schemas
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Reload every schema from disk, replacing the in-memory state.
    /// Files that fail to parse are skipped.
    pub async fn load_schemas(&mut self) -> Result<&[FormSchema]> {
        let mut loaded = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            let content = fs::read_to_string(&path).await?;
            match serde_yaml_ng::from_str::<FormSchema>(&content) {
                Ok(schema) if validate_schema_id(&schema.id).is_err() => {
                    warn!(?path, id = %schema.id, "skipping form schema with an invalid id");
                }
                Ok(mut schema) => {
                    schema.normalize();
                    loaded.push(schema);
                }
                Err(e) => {
                    warn!(?path, %e, "skipping invalid form schema");
                }
            }
        }
        loaded.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        self.index = loaded
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();
        self.schemas = loaded;
        Ok(&self.schemas)
    }

    /// Insert a new schema, or replace the stored one with the same id and
    /// bump its `updated_at`. Persists to YAML immediately and returns what
    /// was stored.
    pub async fn save_schema(&mut self, mut schema: FormSchema) -> Result<FormSchema> {
        validate_schema_id(&schema.id)?;
        let existing = self.index.get(&schema.id).copied();
        if existing.is_some() {
            schema.updated_at = Utc::now();
        }

        let yaml = serde_yaml_ng::to_string(&schema)?;
        atomic_write(&self.schema_path(&schema.id), yaml.as_bytes()).await?;

        match existing {
            Some(idx) => {
                self.schemas[idx] = schema.clone();
                debug!(id = %schema.id, "updated form schema");
            }
            None => {
                let idx = self.schemas.len();
                self.index.insert(schema.id.clone(), idx);
                self.schemas.push(schema.clone());
                debug!(id = %schema.id, "created form schema");
            }
        }
        Ok(schema)
    }

    /// Delete a schema by id.
    pub async fn delete_schema(&mut self, id: &str) -> Result<FormSchema> {
        validate_schema_id(id)?;
        let idx = self
            .index
            .remove(id)
            .ok_or_else(|| FormsError::SchemaNotFound { id: id.to_string() })?;

        let path = self.schema_path(id);
        if let Err(e) = fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(e.into());
            }
        }

        // Shift-remove to keep creation order, then fix the shifted indexes
        let removed = self.schemas.remove(idx);
        for (i, schema) in self.schemas.iter().enumerate().skip(idx) {
            self.index.insert(schema.id.clone(), i);
        }

        debug!(id, "deleted form schema");
        Ok(removed)
    }

    fn schema_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.yaml"))
    }
}

/// Check that `id` names a plain file inside the store root.
///
/// Ids may use letters, digits, `-`, `_` and `.`, and must not start with a
/// dot, so no id can reach a parent directory or collide with temp files.
pub fn validate_schema_id(id: &str) -> Result<()> {
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '-' | '_' | '.');
    if id.is_empty() || id.starts_with('.') || !id.chars().all(allowed) {
        return Err(FormsError::InvalidSchemaId { id: id.to_string() });
    }
    Ok(())
}

/// Write to a temp file then rename for atomic persistence.
async fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "no parent dir"))?;
    let tmp = dir.join(format!(".tmp_{}", Ulid::new()));
    fs::write(&tmp, data).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}
