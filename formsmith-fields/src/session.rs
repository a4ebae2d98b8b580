//! Form fill session: one schema, one data bag, the errors shown so far.
//!
//! Every change replaces the bag and runs the refresh loop so derived values
//! stay current. Errors are only computed on submit and are cleared field by
//! field as the user edits.

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::engine::FormEngine;
use crate::types::{FormField, FormSchema};
use crate::validation::FormValidation;
use crate::value::{FieldValue, FormData};

/// Text shown for a derived field that has nothing to show.
pub const NO_VALUE: &str = "No value";

#[derive(Debug, Clone)]
pub struct FormSession {
    engine: FormEngine,
    schema: FormSchema,
    fields: Vec<FormField>,
    data: FormData,
    errors: IndexMap<String, String>,
    submitted: bool,
}

impl FormSession {
    /// Open a session with the schema's defaults filled in.
    pub fn new(schema: FormSchema) -> Self {
        Self::with_engine(schema, FormEngine::default())
    }

    pub fn with_engine(schema: FormSchema, engine: FormEngine) -> Self {
        let fields: Vec<FormField> = schema.sorted_fields().into_iter().cloned().collect();
        let data = FormData::from_defaults(&fields);
        let mut session = Self {
            engine,
            schema,
            fields,
            data: FormData::new(),
            errors: IndexMap::new(),
            submitted: false,
        };
        session.replace_data(data);
        session
    }

    /// Open a session over an existing bag (normalized to the schema).
    pub fn with_data(schema: FormSchema, engine: FormEngine, data: &FormData) -> Self {
        let mut session = Self::with_engine(schema, engine);
        let normalized = data.normalized(&session.fields);
        session.replace_data(normalized);
        session
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn data(&self) -> &FormData {
        &self.data
    }

    /// Field id to message, one per field, from the last submit.
    pub fn errors(&self) -> &IndexMap<String, String> {
        &self.errors
    }

    pub fn error_for(&self, field_id: &str) -> Option<&str> {
        self.errors.get(field_id).map(String::as_str)
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Record a user edit. Clears that field's error and recomputes derived
    /// fields. Date text typed into a date field is stored as a date.
    pub fn set_value(&mut self, field_id: &str, value: impl Into<FieldValue>) {
        let mut value = value.into();
        if let Some(field) = self.fields.iter().find(|f| f.id == field_id) {
            value = value.coerce_for(&field.type_);
        }
        let next = self.data.with_value(field_id, value);
        self.errors.shift_remove(field_id);
        self.replace_data(next);
    }

    /// Remove a field's value.
    pub fn clear_value(&mut self, field_id: &str) {
        let next = self.data.with_updates([(field_id.to_string(), None)]);
        self.errors.shift_remove(field_id);
        self.replace_data(next);
    }

    /// Validate everything. On success the session is marked submitted;
    /// otherwise the per-field error map is replaced.
    pub fn submit(&mut self) -> FormValidation {
        let validation = self.engine.validate_form(&self.fields, &self.data);
        if validation.is_valid {
            self.submitted = true;
            self.errors.clear();
            info!(form = %self.schema.id, "form submitted");
        } else {
            self.errors = validation.errors_by_field();
            debug!(form = %self.schema.id, errors = self.errors.len(), "form rejected");
        }
        validation
    }

    /// What a renderer shows for a field's current value.
    pub fn display_value(&self, field_id: &str) -> String {
        match self.data.get(field_id) {
            Some(value) => value.to_string(),
            None if self.is_derived(field_id) => NO_VALUE.to_string(),
            None => String::new(),
        }
    }

    fn is_derived(&self, field_id: &str) -> bool {
        self.fields.iter().any(|f| f.id == field_id && f.is_derived)
    }

    fn replace_data(&mut self, data: FormData) {
        self.data = self.engine.refresh(&self.fields, &data).data;
    }
}
