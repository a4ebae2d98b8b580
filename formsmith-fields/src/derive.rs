//! Derived field computation.
//!
//! A derived field reads its parent fields from the data bag and produces a
//! value, or `None` when there is nothing to compute from. `None` is not a
//! failure; renderers show it as "No value".

use chrono::{Datelike, Local, NaiveDate};

use crate::types::{ComputationKind, DerivedFieldConfig, FormField};
use crate::value::{FieldValue, FormData};

/// Caller-supplied semantics for [`ComputationKind::Custom`] derivations.
pub trait DeriveHook: Send + Sync {
    /// Compute a value for `field` from `data`. `config.formula` holds the
    /// field's free-form formula.
    fn compute(
        &self,
        field: &FormField,
        config: &DerivedFieldConfig,
        data: &FormData,
    ) -> Option<FieldValue>;
}

/// Compute a derived field's value as of today (local time).
pub fn compute_derived_value(field: &FormField, data: &FormData) -> Option<FieldValue> {
    compute_derived_value_at(field, data, Local::now().date_naive())
}

/// Compute a derived field's value with an explicit "today" for ages.
pub fn compute_derived_value_at(
    field: &FormField,
    data: &FormData,
    today: NaiveDate,
) -> Option<FieldValue> {
    compute_with(field, data, today, None)
}

pub(crate) fn compute_with(
    field: &FormField,
    data: &FormData,
    today: NaiveDate,
    hook: Option<&dyn DeriveHook>,
) -> Option<FieldValue> {
    let config = field.derivation()?;
    let parents = &config.parent_fields;

    match config.computation {
        // Only the first parent is read.
        ComputationKind::Age => {
            let birth = data.get(parents.first()?)?.as_date()?;
            Some(FieldValue::Number(whole_years_between(birth, today).into()))
        }
        ComputationKind::Sum => {
            let total = parents
                .iter()
                .filter_map(|id| data.get(id).and_then(FieldValue::as_number))
                .sum::<f64>();
            Some(FieldValue::Number(total))
        }
        ComputationKind::Concat => {
            let joined = parents
                .iter()
                .filter_map(|id| data.get(id))
                .filter(|v| v.is_truthy())
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            Some(FieldValue::Text(joined))
        }
        ComputationKind::Custom => hook.and_then(|h| h.compute(field, config, data)),
        ComputationKind::Unknown => None,
    }
}

/// Completed years from `from` to `to`, one less if the anniversary has not
/// yet come round in `to`'s year.
pub fn whole_years_between(from: NaiveDate, to: NaiveDate) -> i32 {
    let years = to.year() - from.year();
    if (to.month(), to.day()) < (from.month(), from.day()) {
        years - 1
    } else {
        years
    }
}
