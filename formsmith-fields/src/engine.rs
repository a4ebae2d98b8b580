//! `FormEngine`: evaluation entry point with optional custom hooks.
//!
//! The free functions in [`crate::validation`], [`crate::derive`] and
//! [`crate::refresh`] behave like a default engine. Build an engine when
//! `custom` rules or computations need semantics, when the refresh pass cap
//! should differ from the field count, or when ages must be computed against
//! a fixed date.

use std::fmt;
use std::sync::Arc;

use chrono::{Local, NaiveDate};

use crate::derive::{compute_with, DeriveHook};
use crate::refresh::{refresh_with, RefreshOutcome};
use crate::types::{FormField, ValidationRule};
use crate::validation::{
    evaluate_rule_with, validate_field_with, validate_form_with, FieldError, FormValidation,
    RuleHook,
};
use crate::value::{FieldValue, FormData};

/// Stateless evaluator for schemas and data bags.
///
/// Cloning is cheap; hooks are shared.
#[derive(Clone, Default)]
pub struct FormEngine {
    rule_hook: Option<Arc<dyn RuleHook>>,
    derive_hook: Option<Arc<dyn DeriveHook>>,
    max_passes: Option<usize>,
    today: Option<NaiveDate>,
}

impl fmt::Debug for FormEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormEngine")
            .field("rule_hook", &self.rule_hook.is_some())
            .field("derive_hook", &self.derive_hook.is_some())
            .field("max_passes", &self.max_passes)
            .field("today", &self.today)
            .finish()
    }
}

impl FormEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give `custom` validation rules their meaning.
    pub fn with_rule_hook(mut self, hook: impl RuleHook + 'static) -> Self {
        self.rule_hook = Some(Arc::new(hook));
        self
    }

    /// Give `custom` derived fields their meaning.
    pub fn with_derive_hook(mut self, hook: impl DeriveHook + 'static) -> Self {
        self.derive_hook = Some(Arc::new(hook));
        self
    }

    /// Override the refresh loop's pass cap (default: number of fields).
    pub fn with_max_passes(mut self, passes: usize) -> Self {
        self.max_passes = Some(passes);
        self
    }

    /// Compute ages against a fixed date instead of the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn evaluate_rule(
        &self,
        rule: &ValidationRule,
        field: &FormField,
        value: Option<&FieldValue>,
    ) -> Option<FieldError> {
        evaluate_rule_with(rule, field, value, self.rule_hook.as_deref())
    }

    pub fn validate_field(&self, field: &FormField, value: Option<&FieldValue>) -> Vec<FieldError> {
        validate_field_with(field, value, self.rule_hook.as_deref())
    }

    pub fn validate_form(&self, fields: &[FormField], data: &FormData) -> FormValidation {
        validate_form_with(fields, data, self.rule_hook.as_deref())
    }

    pub fn compute_derived_value(&self, field: &FormField, data: &FormData) -> Option<FieldValue> {
        compute_with(field, data, self.today(), self.derive_hook.as_deref())
    }

    pub fn refresh(&self, fields: &[FormField], data: &FormData) -> RefreshOutcome {
        refresh_with(
            fields,
            data,
            self.max_passes,
            self.today(),
            self.derive_hook.as_deref(),
        )
    }
}
