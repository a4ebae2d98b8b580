//! Headless form builder.
//!
//! Owns the field list while a schema is being edited and keeps its
//! invariants: `order` stays dense and zero-based, option lists only exist on
//! option-bearing types, and derived configurations never form a cycle.

use chrono::{DateTime, Utc};
use tracing::debug;
use ulid::Ulid;

use crate::error::{FormsError, Result};
use crate::graph::DependencyGraph;
use crate::types::{DerivedFieldConfig, FieldType, FormField, FormSchema, SelectOption, ValidationRule};
use crate::value::FieldValue;

/// Partial update for [`FormBuilder::update_field`]. `None` leaves the
/// attribute alone.
#[derive(Debug, Clone, Default)]
pub struct FieldUpdate {
    pub label: Option<String>,
    pub required: Option<bool>,
    /// `Some(None)` clears the default.
    pub default_value: Option<Option<FieldValue>>,
    pub type_: Option<FieldType>,
}

impl FieldUpdate {
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn default_value(mut self, value: Option<FieldValue>) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn field_type(mut self, type_: FieldType) -> Self {
        self.type_ = Some(type_);
        self
    }
}

/// Editing state for one form schema.
#[derive(Debug, Clone, Default)]
pub struct FormBuilder {
    schema_id: Option<String>,
    created_at: Option<DateTime<Utc>>,
    name: String,
    fields: Vec<FormField>,
    selected: Option<String>,
}

impl FormBuilder {
    /// Start a new, empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Edit an existing schema. Its id and creation time are kept when the
    /// schema is rebuilt.
    pub fn from_schema(schema: FormSchema) -> Self {
        let mut fields = schema.fields;
        fields.sort_by_key(|f| f.order);
        let mut builder = Self {
            schema_id: Some(schema.id),
            created_at: Some(schema.created_at),
            name: schema.name,
            fields,
            selected: None,
        };
        builder.renumber();
        builder
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in form order.
    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn field(&self, id: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Append a field of `type_` with a generated id and placeholder label,
    /// select it and return its id.
    pub fn add_field(&mut self, type_: FieldType) -> String {
        let id = format!("field_{}", Ulid::new().to_string().to_lowercase());
        let label = format!("{} Field", capitalize(type_.name()));
        let field = FormField::new(id.clone(), type_.with_default_options(), label)
            .with_order(self.fields.len());
        debug!(id = %id, kind = field.type_.name(), "added field");
        self.fields.push(field);
        self.selected = Some(id.clone());
        id
    }

    /// Patch a field's basic attributes.
    pub fn update_field(&mut self, id: &str, update: FieldUpdate) -> Result<()> {
        let field = self.field_mut(id)?;
        if let Some(label) = update.label {
            field.label = label;
        }
        if let Some(required) = update.required {
            field.required = required;
        }
        if let Some(default_value) = update.default_value {
            field.default_value = default_value;
        }
        if let Some(type_) = update.type_ {
            field.type_ = type_;
        }
        Ok(())
    }

    /// Remove a field, renumber the rest and drop it from any derived
    /// field's parents.
    pub fn delete_field(&mut self, id: &str) -> Result<FormField> {
        let idx = self.position(id)?;
        let removed = self.fields.remove(idx);
        for field in &mut self.fields {
            if let Some(config) = field.derived_config.as_mut() {
                config.parent_fields.retain(|p| p != id);
            }
        }
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        self.renumber();
        debug!(id, "deleted field");
        Ok(removed)
    }

    /// Move the field at `from` to position `to`.
    pub fn reorder_fields(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.fields.len();
        for index in [from, to] {
            if index >= len {
                return Err(FormsError::IndexOutOfRange { index, len });
            }
        }
        let field = self.fields.remove(from);
        self.fields.insert(to, field);
        self.renumber();
        Ok(())
    }

    pub fn update_validation(&mut self, id: &str, rules: Vec<ValidationRule>) -> Result<()> {
        self.field_mut(id)?.validation_rules = rules;
        Ok(())
    }

    /// Replace a field's options. Fields without options ignore the call.
    pub fn update_options(&mut self, id: &str, options: Vec<SelectOption>) -> Result<()> {
        if let Some(current) = self.field_mut(id)?.type_.options_mut() {
            *current = options;
        }
        Ok(())
    }

    /// Append an option. Options need both a label and a value; incomplete
    /// ones are ignored, as are fields without options.
    pub fn add_option(&mut self, id: &str, option: SelectOption) -> Result<()> {
        if option.label.is_empty() || option.value.is_empty() {
            return Ok(());
        }
        if let Some(current) = self.field_mut(id)?.type_.options_mut() {
            current.push(option);
        }
        Ok(())
    }

    pub fn remove_option(&mut self, id: &str, index: usize) -> Result<SelectOption> {
        let options = self.options_mut(id, index)?;
        let len = options.len();
        if index >= len {
            return Err(FormsError::IndexOutOfRange { index, len });
        }
        Ok(options.remove(index))
    }

    pub fn update_option(&mut self, id: &str, index: usize, option: SelectOption) -> Result<()> {
        let options = self.options_mut(id, index)?;
        let len = options.len();
        let slot = options
            .get_mut(index)
            .ok_or(FormsError::IndexOutOfRange { index, len })?;
        *slot = option;
        Ok(())
    }

    /// Flip a field between entered and derived. Turning derivation off
    /// drops its configuration.
    pub fn toggle_derived(&mut self, id: &str) -> Result<bool> {
        let field = self.field_mut(id)?;
        if field.is_derived {
            field.is_derived = false;
            field.derived_config = None;
        } else {
            field.is_derived = true;
        }
        Ok(field.is_derived)
    }

    /// Set a field's derivation, marking it derived. Rejected if the new
    /// configuration makes any field depend on itself.
    pub fn update_derived_config(&mut self, id: &str, config: DerivedFieldConfig) -> Result<()> {
        let idx = self.position(id)?;
        let mut candidate = self.fields.clone();
        candidate[idx].is_derived = true;
        candidate[idx].derived_config = Some(config);
        DependencyGraph::from_fields(&candidate).ensure_acyclic()?;
        self.fields = candidate;
        Ok(())
    }

    /// Fields `id` may be derived from: every non-derived field but itself.
    pub fn available_parent_fields(&self, id: &str) -> Vec<&FormField> {
        self.fields
            .iter()
            .filter(|f| f.id != id && !f.is_derived)
            .collect()
    }

    pub fn select_field(&mut self, id: Option<&str>) {
        self.selected = id.map(str::to_string);
    }

    pub fn selected_field(&self) -> Option<&FormField> {
        self.selected.as_deref().and_then(|id| self.field(id))
    }

    /// Produce the schema to save under `name`.
    pub fn build_schema(&mut self, name: impl Into<String>) -> FormSchema {
        let now = Utc::now();
        self.name = name.into();
        let id = self
            .schema_id
            .get_or_insert_with(|| format!("form_{}", Ulid::new().to_string().to_lowercase()))
            .clone();
        let created_at = *self.created_at.get_or_insert(now);
        FormSchema {
            id,
            name: self.name.clone(),
            fields: self.fields.clone(),
            created_at,
            updated_at: now,
        }
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.fields
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| FormsError::FieldNotFound { id: id.to_string() })
    }

    fn field_mut(&mut self, id: &str) -> Result<&mut FormField> {
        let idx = self.position(id)?;
        Ok(&mut self.fields[idx])
    }

    /// Option list of `id`; a field without options has nothing at `index`.
    fn options_mut(&mut self, id: &str, index: usize) -> Result<&mut Vec<SelectOption>> {
        self.field_mut(id)?
            .type_
            .options_mut()
            .ok_or(FormsError::IndexOutOfRange { index, len: 0 })
    }

    fn renumber(&mut self) {
        for (order, field) in self.fields.iter_mut().enumerate() {
            field.order = order;
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ComputationKind;

    fn orders(builder: &FormBuilder) -> Vec<usize> {
        builder.fields().iter().map(|f| f.order).collect()
    }

    #[test]
    fn add_field_defaults() {
        let mut builder = FormBuilder::new();
        let id = builder.add_field(FieldType::Select { options: vec![] });
        let field = builder.field(&id).unwrap();

        assert!(id.starts_with("field_"));
        assert_eq!(field.label, "Select Field");
        assert!(!field.required);
        assert!(field.validation_rules.is_empty());
        assert_eq!(field.order, 0);
        assert_eq!(field.type_.options().unwrap().len(), 2);
        assert_eq!(builder.selected_field().unwrap().id, id);

        let second = builder.add_field(FieldType::Textarea);
        assert_eq!(builder.field(&second).unwrap().label, "Textarea Field");
        assert_eq!(orders(&builder), [0, 1]);
    }

    #[test]
    fn delete_renumbers_and_cleans_parents() {
        let mut builder = FormBuilder::new();
        let a = builder.add_field(FieldType::Number);
        let b = builder.add_field(FieldType::Number);
        let total = builder.add_field(FieldType::Number);
        builder
            .update_derived_config(
                &total,
                DerivedFieldConfig::new(ComputationKind::Sum, [a.clone(), b.clone()]),
            )
            .unwrap();

        builder.delete_field(&a).unwrap();
        assert_eq!(orders(&builder), [0, 1]);
        assert_eq!(
            builder.field(&total).unwrap().derived_config.as_ref().unwrap().parent_fields,
            [b.clone()]
        );
        // `total` was selected last; deleting another field keeps it.
        assert_eq!(builder.selected_field().unwrap().id, total);

        builder.delete_field(&total).unwrap();
        assert!(builder.selected_field().is_none());
        assert!(matches!(
            builder.delete_field("nope"),
            Err(FormsError::FieldNotFound { .. })
        ));
    }

    #[test]
    fn reorder_moves_and_renumbers() {
        let mut builder = FormBuilder::new();
        let ids: Vec<_> = (0..3).map(|_| builder.add_field(FieldType::Text)).collect();
        builder.reorder_fields(0, 2).unwrap();

        let now: Vec<_> = builder.fields().iter().map(|f| f.id.clone()).collect();
        assert_eq!(now, [ids[1].clone(), ids[2].clone(), ids[0].clone()]);
        assert_eq!(orders(&builder), [0, 1, 2]);
        assert!(matches!(
            builder.reorder_fields(0, 3),
            Err(FormsError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn update_field_patches_only_given_attributes() {
        let mut builder = FormBuilder::new();
        let id = builder.add_field(FieldType::Text);
        builder
            .update_field(&id, FieldUpdate::default().label("Email").required(true))
            .unwrap();
        builder
            .update_field(&id, FieldUpdate::default().default_value(Some("a@b.c".into())))
            .unwrap();

        let field = builder.field(&id).unwrap();
        assert_eq!(field.label, "Email");
        assert!(field.required);
        assert_eq!(field.default_value, Some(FieldValue::text("a@b.c")));

        builder
            .update_field(&id, FieldUpdate::default().default_value(None))
            .unwrap();
        assert!(builder.field(&id).unwrap().default_value.is_none());
    }

    #[test]
    fn option_editing() {
        let mut builder = FormBuilder::new();
        let id = builder.add_field(FieldType::Radio { options: vec![] });

        builder.add_option(&id, SelectOption::new("Third", "3")).unwrap();
        builder.add_option(&id, SelectOption::new("", "x")).unwrap();
        assert_eq!(builder.field(&id).unwrap().type_.options().unwrap().len(), 3);

        builder
            .update_option(&id, 0, SelectOption::new("First", "1"))
            .unwrap();
        let removed = builder.remove_option(&id, 1).unwrap();
        assert_eq!(removed.value, "option2");

        let options = builder.field(&id).unwrap().type_.options().unwrap();
        assert_eq!(options[0].label, "First");
        assert_eq!(options[1].value, "3");
        assert!(builder.remove_option(&id, 5).is_err());

        let text = builder.add_field(FieldType::Text);
        builder
            .update_options(&text, vec![SelectOption::new("x", "x")])
            .unwrap();
        assert!(builder.field(&text).unwrap().type_.options().is_none());
    }

    #[test]
    fn derived_toggle_and_parent_candidates() {
        let mut builder = FormBuilder::new();
        let name = builder.add_field(FieldType::Text);
        let greeting = builder.add_field(FieldType::Text);

        assert!(builder.toggle_derived(&greeting).unwrap());
        let candidates: Vec<_> = builder
            .available_parent_fields(&greeting)
            .iter()
            .map(|f| f.id.clone())
            .collect();
        assert_eq!(candidates, [name.clone()]);
        assert!(builder.available_parent_fields(&name).is_empty());

        builder
            .update_derived_config(&greeting, DerivedFieldConfig::new(ComputationKind::Concat, [name]))
            .unwrap();
        assert!(!builder.toggle_derived(&greeting).unwrap());
        assert!(builder.field(&greeting).unwrap().derived_config.is_none());
    }

    #[test]
    fn cyclic_configuration_rejected() {
        let mut builder = FormBuilder::new();
        let x = builder.add_field(FieldType::Number);
        let y = builder.add_field(FieldType::Number);
        builder
            .update_derived_config(&x, DerivedFieldConfig::new(ComputationKind::Sum, [y.clone()]))
            .unwrap();

        let err = builder
            .update_derived_config(&y, DerivedFieldConfig::new(ComputationKind::Sum, [x.clone()]))
            .unwrap_err();
        assert!(matches!(err, FormsError::DependencyCycle { .. }));
        assert!(!builder.field(&y).unwrap().is_derived);
    }

    #[test]
    fn build_schema_keeps_identity_when_editing() {
        let mut builder = FormBuilder::new();
        builder.add_field(FieldType::Date);
        let first = builder.build_schema("Trip");
        assert!(first.id.starts_with("form_"));
        assert_eq!(first.name, "Trip");
        assert_eq!(first.fields.len(), 1);

        let mut editing = FormBuilder::from_schema(first.clone());
        editing.add_field(FieldType::Text);
        let second = editing.build_schema("Trip v2");
        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(second.fields.len(), 2);
        assert_eq!(editing.name(), "Trip v2");
    }

    #[test]
    fn from_schema_sorts_by_order() {
        let mut builder = FormBuilder::new();
        let a = builder.add_field(FieldType::Text);
        let b = builder.add_field(FieldType::Text);
        let mut schema = builder.build_schema("x");
        schema.fields.reverse();

        let reloaded = FormBuilder::from_schema(schema);
        assert_eq!(reloaded.fields()[0].id, a);
        assert_eq!(reloaded.fields()[1].id, b);
    }
}
