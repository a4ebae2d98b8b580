//! Derivation refresh loop.
//!
//! Recomputes every derived field against the current bag, applies all
//! changes in one replacement and repeats until nothing changes. Chains of
//! derived fields settle one link per pass. Fields caught in a dependency
//! cycle are never computed and end up absent.

use std::collections::BTreeSet;

use chrono::{Local, NaiveDate};
use tracing::{debug, trace, warn};

use crate::derive::{compute_with, DeriveHook};
use crate::graph::DependencyGraph;
use crate::types::FormField;
use crate::value::{FieldValue, FormData};

/// Result of running the refresh loop.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshOutcome {
    /// The bag after the last applied pass.
    pub data: FormData,
    /// Number of passes that changed something.
    pub passes: usize,
    /// False when the pass cap was reached while values were still changing.
    pub converged: bool,
    /// Derived fields skipped because they depend on themselves.
    pub cyclic: BTreeSet<String>,
}

impl RefreshOutcome {
    /// Whether the loop changed the bag at all.
    pub fn changed(&self) -> bool {
        self.passes > 0
    }
}

/// Refresh derived values as of today, capping passes at the field count.
pub fn refresh_derived(fields: &[FormField], data: &FormData) -> RefreshOutcome {
    refresh_with(fields, data, None, Local::now().date_naive(), None)
}

pub(crate) fn refresh_with(
    fields: &[FormField],
    data: &FormData,
    max_passes: Option<usize>,
    today: NaiveDate,
    hook: Option<&dyn DeriveHook>,
) -> RefreshOutcome {
    let cyclic = DependencyGraph::from_fields(fields).cyclic_fields();
    if !cyclic.is_empty() {
        warn!(fields = ?cyclic, "derived fields depend on themselves; leaving them empty");
    }

    let cap = max_passes.unwrap_or(fields.len()).max(1);
    let mut current = data.clone();
    let mut passes = 0;

    let converged = loop {
        let staged = stage_updates(fields, &current, &cyclic, today, hook);
        if staged.is_empty() {
            break true;
        }
        if passes == cap {
            break false;
        }
        trace!(pass = passes + 1, updates = staged.len(), "applying derived values");
        current = current.with_updates(staged);
        passes += 1;
    };

    if converged {
        debug!(passes, "derived values settled");
    } else {
        warn!(passes, "derived values still changing after pass limit");
    }

    RefreshOutcome {
        data: current,
        passes,
        converged,
        cyclic,
    }
}

/// Compare every derived field's fresh value with the bag and collect the
/// differences. `None` stages a removal.
fn stage_updates(
    fields: &[FormField],
    data: &FormData,
    cyclic: &BTreeSet<String>,
    today: NaiveDate,
    hook: Option<&dyn DeriveHook>,
) -> Vec<(String, Option<FieldValue>)> {
    fields
        .iter()
        .filter(|f| f.is_derived)
        .filter_map(|field| {
            let fresh = if cyclic.contains(&field.id) {
                None
            } else {
                compute_with(field, data, today, hook)
            };
            let unchanged = match (fresh.as_ref(), data.get(&field.id)) {
                (Some(fresh), Some(current)) => fresh.same_as(current),
                (None, None) => true,
                _ => false,
            };
            (!unchanged).then(|| (field.id.clone(), fresh))
        })
        .collect()
}
