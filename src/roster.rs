use serde::{Deserialize, Serialize};

use crate::catalog::StudentId;
use crate::cascade::name_order;
use crate::scope::RecordValue;

/// One student on a class membership list. `external_code` is the
/// school's own enrollment number, carried as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub external_code: String,
}

/// A record already persisted for the requested scope. The store's
/// relation fan-out can return several of these for one student.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingRecord {
    pub value: RecordValue,
}

/// One row of a scope-qualified roster fetch: the student plus every
/// record the store already holds for them under that scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub student: Student,
    #[serde(default)]
    pub existing: Vec<ExistingRecord>,
}

/// Orders roster entries by student name for presentation, ids breaking
/// exact-name ties. The relative order of `existing` records inside
/// each entry is preserved.
pub fn order_entries(entries: &mut [RosterEntry]) {
    entries.sort_by(|a, b| {
        name_order(&a.student.name, &b.student.name).then(a.student.id.cmp(&b.student.id))
    });
}
