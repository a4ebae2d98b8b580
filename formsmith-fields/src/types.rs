//! Core form schema types.
//!
//! All types serialize to/from YAML via serde. A [`FormSchema`] is an
//! ordered list of [`FormField`]s; each field carries its type, its
//! validation rules and, for derived fields, how its value is computed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value::FieldValue;

/// A single option in a select, radio or checkbox field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// The type of a field, which determines what shape the value takes.
///
/// Option-bearing types own their option list, so a text field can never
/// carry options and a select can never lack them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FieldType {
    Text,
    Number,
    Textarea,
    Select {
        #[serde(default)]
        options: Vec<SelectOption>,
    },
    Radio {
        #[serde(default)]
        options: Vec<SelectOption>,
    },
    Checkbox {
        #[serde(default)]
        options: Vec<SelectOption>,
    },
    Date,
}

impl FieldType {
    /// Lowercase type name, as used in serialized schemas.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Textarea => "textarea",
            Self::Select { .. } => "select",
            Self::Radio { .. } => "radio",
            Self::Checkbox { .. } => "checkbox",
            Self::Date => "date",
        }
    }

    /// The legal values for option-bearing types.
    pub fn options(&self) -> Option<&[SelectOption]> {
        match self {
            Self::Select { options } | Self::Radio { options } | Self::Checkbox { options } => {
                Some(options)
            }
            _ => None,
        }
    }

    pub fn options_mut(&mut self) -> Option<&mut Vec<SelectOption>> {
        match self {
            Self::Select { options } | Self::Radio { options } | Self::Checkbox { options } => {
                Some(options)
            }
            _ => None,
        }
    }

    /// The type a freshly added field of this kind starts with. Selects and
    /// radios get two placeholder options; checkboxes start empty.
    pub fn with_default_options(self) -> Self {
        let placeholders = || {
            vec![
                SelectOption::new("Option 1", "option1"),
                SelectOption::new("Option 2", "option2"),
            ]
        };
        match self {
            Self::Select { options } if options.is_empty() => Self::Select {
                options: placeholders(),
            },
            Self::Radio { options } if options.is_empty() => Self::Radio {
                options: placeholders(),
            },
            other => other,
        }
    }
}

/// Kind of a validation rule.
///
/// Unknown kinds in stored schemas load as [`RuleKind::Unknown`] and never
/// fail.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RuleKind {
    Required,
    #[serde(alias = "minLength")]
    MinLength,
    #[serde(alias = "maxLength")]
    MaxLength,
    Email,
    Password,
    Custom,
    #[serde(other)]
    Unknown,
}

impl RuleKind {
    /// Kebab-case name, as written in schemas.
    pub fn name(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::MinLength => "min-length",
            Self::MaxLength => "max-length",
            Self::Email => "email",
            Self::Password => "password",
            Self::Custom => "custom",
            Self::Unknown => "unknown",
        }
    }
}

/// Threshold attached to a rule: a number, or text holding a number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RuleThreshold {
    Number(f64),
    Text(String),
}

impl RuleThreshold {
    /// Numeric reading of the threshold; text that is not a number gives
    /// `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl std::fmt::Display for RuleThreshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", FieldValue::Number(*n)),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One declarative constraint on a field's value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationRule {
    #[serde(rename = "type")]
    pub kind: RuleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<RuleThreshold>,
    /// Message shown on failure. Empty means the kind's default message.
    #[serde(default)]
    pub message: String,
}

impl ValidationRule {
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            value: None,
            message: String::new(),
        }
    }

    pub fn required() -> Self {
        Self::new(RuleKind::Required)
    }

    pub fn min_length(n: usize) -> Self {
        Self::new(RuleKind::MinLength).with_value(RuleThreshold::Number(n as f64))
    }

    pub fn max_length(n: usize) -> Self {
        Self::new(RuleKind::MaxLength).with_value(RuleThreshold::Number(n as f64))
    }

    pub fn email() -> Self {
        Self::new(RuleKind::Email)
    }

    pub fn password() -> Self {
        Self::new(RuleKind::Password)
    }

    pub fn with_value(mut self, value: RuleThreshold) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

/// How a derived field computes its value.
///
/// Unknown kinds in stored schemas load as [`ComputationKind::Unknown`] and
/// never produce a value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ComputationKind {
    Age,
    Sum,
    Concat,
    Custom,
    #[serde(other)]
    Unknown,
}

impl ComputationKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Sum => "sum",
            Self::Concat => "concat",
            Self::Custom => "custom",
            Self::Unknown => "unknown",
        }
    }
}

/// Derivation settings for a derived field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DerivedFieldConfig {
    /// Ids of the fields this one is computed from, in order.
    #[serde(default, alias = "parentFields")]
    pub parent_fields: Vec<String>,
    pub computation: ComputationKind,
    /// Free-form formula, only read by a custom derive hook.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub formula: String,
}

impl DerivedFieldConfig {
    pub fn new<I, S>(computation: ComputationKind, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parent_fields: parents.into_iter().map(Into::into).collect(),
            computation,
            formula: String::new(),
        }
    }
}

/// A field definition: the complete schema for one input of a form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormField {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: FieldType,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, alias = "defaultValue", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<FieldValue>,
    #[serde(default, alias = "validationRules", skip_serializing_if = "Vec::is_empty")]
    pub validation_rules: Vec<ValidationRule>,
    #[serde(default, alias = "isDerived")]
    pub is_derived: bool,
    #[serde(default, alias = "derivedConfig", skip_serializing_if = "Option::is_none")]
    pub derived_config: Option<DerivedFieldConfig>,
    /// Position in the form, dense and zero-based.
    #[serde(default)]
    pub order: usize,
}

impl FormField {
    /// A plain, non-derived field with no rules.
    pub fn new(id: impl Into<String>, type_: FieldType, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_,
            label: label.into(),
            required: false,
            default_value: None,
            validation_rules: Vec::new(),
            is_derived: false,
            derived_config: None,
            order: 0,
        }
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.validation_rules.push(rule);
        self
    }

    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    pub fn with_default(mut self, value: impl Into<FieldValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Mark the field derived with the given configuration.
    pub fn derived(mut self, config: DerivedFieldConfig) -> Self {
        self.is_derived = true;
        self.derived_config = Some(config);
        self
    }

    /// The derivation in effect, if the field is derived and configured.
    pub fn derivation(&self) -> Option<&DerivedFieldConfig> {
        if self.is_derived {
            self.derived_config.as_ref()
        } else {
            None
        }
    }
}

/// A saved form: its name and ordered fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormSchema {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FormField>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FormSchema {
    pub fn get_field(&self, id: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Fields by ascending `order`.
    pub fn sorted_fields(&self) -> Vec<&FormField> {
        let mut fields: Vec<_> = self.fields.iter().collect();
        fields.sort_by_key(|f| f.order);
        fields
    }

    /// Reshape stored default values to their field types. Date defaults
    /// come back from YAML as text.
    pub fn normalize(&mut self) {
        for field in &mut self.fields {
            if let Some(value) = field.default_value.take() {
                field.default_value = Some(value.coerce_for(&field.type_));
            }
        }
    }
}
