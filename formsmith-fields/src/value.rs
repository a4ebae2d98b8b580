//! Field values and the data bag a form is filled into.
//!
//! A [`FormData`] maps field ids to [`FieldValue`]s. Evaluation functions
//! take a bag by reference and hand back new bags; nothing in this crate
//! edits a caller's bag behind its back.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::Result;
use crate::types::{FieldType, FormField};

/// Day-level ISO-8601 format used for dates in text form.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single value held for a field.
///
/// Serializes untagged so data bags read naturally in JSON and YAML. Dates
/// serialize as `YYYY-MM-DD` text and come back as [`FieldValue::Text`];
/// [`FieldValue::coerce_for`] (or [`FormData::normalized`]) turns them back
/// into dates for date-typed fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
    Date(NaiveDate),
}

impl FieldValue {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// True for whitespace-only text and empty lists.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Loose truthiness: empty text, zero, NaN and `false` are falsy.
    /// Lists and dates are always truthy, even an empty list.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Text(s) => !s.is_empty(),
            Self::List(_) | Self::Date(_) => true,
        }
    }

    /// Equality where a NaN number matches another NaN. Used to detect
    /// whether a recomputed value differs from the stored one.
    pub fn same_as(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            _ => self == other,
        }
    }

    /// Convert text into the shape a field of `field_type` stores.
    ///
    /// Only date fields change anything: ISO text parses into a date. Text
    /// that does not parse is left as it is.
    pub fn coerce_for(self, field_type: &FieldType) -> Self {
        match (field_type, self) {
            (FieldType::Date, Self::Text(s)) => match parse_date(&s) {
                Some(date) => Self::Date(date),
                None => Self::Text(s),
            },
            (_, value) => value,
        }
    }
}

/// Parse `YYYY-MM-DD`, or the date part of a full ISO-8601 timestamp.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let day = s.split_once('T').map_or(s, |(day, _)| day);
    NaiveDate::parse_from_str(day, DATE_FORMAT).ok()
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{}", format_number(*n)),
            Self::Text(s) => f.write_str(s),
            Self::List(items) => f.write_str(&items.join(",")),
            Self::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".into()
    } else if n == f64::INFINITY {
        "Infinity".into()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".into()
    } else if n == 0.0 {
        "0".into()
    } else {
        n.to_string()
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

/// The data bag for one form-fill session: field id to current value.
///
/// `null` entries in serialized input are dropped, so an absent key and an
/// explicit `null` mean the same thing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "BTreeMap<String, Option<FieldValue>>")]
pub struct FormData {
    values: BTreeMap<String, FieldValue>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a bag from every field's `default_value`.
    pub fn from_defaults(fields: &[FormField]) -> Self {
        fields
            .iter()
            .filter_map(|f| {
                f.default_value
                    .clone()
                    .map(|v| (f.id.clone(), v.coerce_for(&f.type_)))
            })
            .collect()
    }

    /// Parse a JSON object into a bag.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn get(&self, field_id: &str) -> Option<&FieldValue> {
        self.values.get(field_id)
    }

    pub fn contains(&self, field_id: &str) -> bool {
        self.values.contains_key(field_id)
    }

    pub fn insert(&mut self, field_id: impl Into<String>, value: impl Into<FieldValue>) {
        self.values.insert(field_id.into(), value.into());
    }

    pub fn remove(&mut self, field_id: &str) -> Option<FieldValue> {
        self.values.remove(field_id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.values.iter()
    }

    /// A new bag with one entry set.
    pub fn with_value(&self, field_id: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let mut next = self.clone();
        next.insert(field_id, value);
        next
    }

    /// A new bag with every staged update applied at once. `None` removes
    /// the entry.
    pub fn with_updates<I>(&self, updates: I) -> Self
    where
        I: IntoIterator<Item = (String, Option<FieldValue>)>,
    {
        let mut next = self.clone();
        for (id, value) in updates {
            match value {
                Some(v) => {
                    next.values.insert(id, v);
                }
                None => {
                    next.values.remove(&id);
                }
            }
        }
        next
    }

    /// A new bag with values reshaped to their field's type (ISO text into
    /// dates for date fields). Entries for unknown ids are kept unchanged.
    pub fn normalized(&self, fields: &[FormField]) -> Self {
        let mut next = self.clone();
        for field in fields {
            if let Some(value) = next.values.remove(&field.id) {
                next.values
                    .insert(field.id.clone(), value.coerce_for(&field.type_));
            }
        }
        next
    }
}

impl From<BTreeMap<String, Option<FieldValue>>> for FormData {
    fn from(raw: BTreeMap<String, Option<FieldValue>>) -> Self {
        Self {
            values: raw
                .into_iter()
                .filter_map(|(k, v)| v.map(|v| (k, v)))
                .collect(),
        }
    }
}

impl Serialize for FormData {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FormData {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
