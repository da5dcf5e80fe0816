//! Merges a scope-qualified roster fetch into a per-student baseline.
//! The baseline is what the entry panel shows before the teacher
//! touches anything, and what edits are later diffed against.

use std::collections::BTreeMap;

use tracing::warn;

use crate::catalog::StudentId;
use crate::roster::RosterEntry;
use crate::scope::RecordValue;

/// Baseline values keyed by student. A student missing from the map
/// has no value; `RecordKind::default_value` decides whether absence
/// of a stored record means "unset" or a synthesized default.
pub type BaselineMap = BTreeMap<StudentId, RecordValue>;

/// Builds the baseline for a fetched roster. One existing record seeds
/// the student's value; with several the first in server return order
/// wins and the rest are reported and dropped (no recency ordering is
/// assumed). No record means the `default` policy applies; a `None`
/// default leaves the student out of the map entirely.
pub fn reconcile(roster: &[RosterEntry], default: Option<RecordValue>) -> BaselineMap {
    let mut map = BaselineMap::new();
    for entry in roster {
        let id = entry.student.id;
        if map.contains_key(&id) {
            warn!(student = %id, "roster lists student twice, keeping the first row");
            continue;
        }
        if entry.existing.len() > 1 {
            warn!(
                student = %id,
                count = entry.existing.len(),
                "several stored records for one scope, keeping the first"
            );
        }
        if let Some(value) = entry.existing.first().map(|r| r.value).or(default) {
            map.insert(id, value);
        }
    }
    map
}
