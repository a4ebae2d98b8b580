//! Rule-based validation of field values.
//!
//! Rules are evaluated independently and in declared order; a field reports
//! every rule that fails. Failures are plain values ([`FieldError`]), never
//! `Err`s.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::types::{FormField, RuleKind, ValidationRule};
use crate::value::{FieldValue, FormData};

/// `local@domain.tld` over printable ASCII with a single `@`.
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[[:graph:]&&[^@]]+@[[:graph:]&&[^@]]+\.[[:graph:]&&[^@]]+$")
        .expect("email pattern compiles")
});

const PASSWORD_MIN_CHARS: usize = 8;

/// A failed rule on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field_id: String,
    pub message: String,
}

/// Outcome of validating a whole form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormValidation {
    pub is_valid: bool,
    pub errors: Vec<FieldError>,
}

impl FormValidation {
    pub fn from_errors(errors: Vec<FieldError>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// One message per field, the last reported one winning. Fields keep
    /// the position of their first error.
    pub fn errors_by_field(&self) -> IndexMap<String, String> {
        let mut map = IndexMap::new();
        for error in &self.errors {
            map.insert(error.field_id.clone(), error.message.clone());
        }
        map
    }

    /// Every message reported for `field_id`, in rule order.
    pub fn messages_for(&self, field_id: &str) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|e| e.field_id == field_id)
            .map(|e| e.message.as_str())
            .collect()
    }
}

/// Caller-supplied semantics for [`RuleKind::Custom`] rules.
pub trait RuleHook: Send + Sync {
    /// Return a failure message, or `None` if the value passes. An empty
    /// string falls back to the rule's own message.
    fn check(
        &self,
        rule: &ValidationRule,
        field: &FormField,
        value: Option<&FieldValue>,
    ) -> Option<String>;
}

/// Evaluate one rule against a field's value.
pub fn evaluate_rule(
    rule: &ValidationRule,
    field: &FormField,
    value: Option<&FieldValue>,
) -> Option<FieldError> {
    evaluate_rule_with(rule, field, value, None)
}

/// Evaluate every rule of `field`, collecting all failures.
pub fn validate_field(field: &FormField, value: Option<&FieldValue>) -> Vec<FieldError> {
    validate_field_with(field, value, None)
}

/// Validate every field in the order given.
pub fn validate_form(fields: &[FormField], data: &FormData) -> FormValidation {
    validate_form_with(fields, data, None)
}

pub(crate) fn evaluate_rule_with(
    rule: &ValidationRule,
    field: &FormField,
    value: Option<&FieldValue>,
    hook: Option<&dyn RuleHook>,
) -> Option<FieldError> {
    let default_message = match rule.kind {
        RuleKind::Required => {
            let missing = value.is_none_or(FieldValue::is_blank);
            missing.then(|| format!("{} is required", field.label))
        }
        RuleKind::MinLength => {
            let text = value.and_then(FieldValue::as_str)?;
            let threshold = rule.value.as_ref()?;
            let min = threshold.as_number()?;
            ((char_len(text) as f64) < min)
                .then(|| format!("{} must be at least {} characters", field.label, threshold))
        }
        RuleKind::MaxLength => {
            let text = value.and_then(FieldValue::as_str)?;
            let threshold = rule.value.as_ref()?;
            let max = threshold.as_number()?;
            ((char_len(text) as f64) > max)
                .then(|| format!("{} must not exceed {} characters", field.label, threshold))
        }
        RuleKind::Email => {
            let text = value.and_then(FieldValue::as_str)?;
            (!text.is_empty() && !is_valid_email(text))
                .then(|| "Please enter a valid email address".to_string())
        }
        // Unlike email, an empty string is checked here too.
        RuleKind::Password => {
            let text = value.and_then(FieldValue::as_str)?;
            (!is_valid_password(text)).then(|| {
                format!(
                    "Password must be at least {PASSWORD_MIN_CHARS} characters and contain a number"
                )
            })
        }
        RuleKind::Custom => hook.and_then(|h| h.check(rule, field, value)),
        RuleKind::Unknown => None,
    }?;

    let message = match rule.kind {
        RuleKind::Custom if !default_message.is_empty() => default_message,
        _ if !rule.message.is_empty() => rule.message.clone(),
        _ => default_message,
    };

    trace!(field = %field.id, rule = ?rule.kind, %message, "rule failed");
    Some(FieldError {
        field_id: field.id.clone(),
        message,
    })
}

pub(crate) fn validate_field_with(
    field: &FormField,
    value: Option<&FieldValue>,
    hook: Option<&dyn RuleHook>,
) -> Vec<FieldError> {
    field
        .validation_rules
        .iter()
        .filter_map(|rule| evaluate_rule_with(rule, field, value, hook))
        .collect()
}

pub(crate) fn validate_form_with(
    fields: &[FormField],
    data: &FormData,
    hook: Option<&dyn RuleHook>,
) -> FormValidation {
    let errors: Vec<FieldError> = fields
        .iter()
        .flat_map(|field| validate_field_with(field, data.get(&field.id), hook))
        .collect();

    debug!(
        fields = fields.len(),
        errors = errors.len(),
        "validated form"
    );
    FormValidation::from_errors(errors)
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

pub fn is_valid_password(password: &str) -> bool {
    char_len(password) >= PASSWORD_MIN_CHARS && password.chars().any(|c| c.is_ascii_digit())
}
