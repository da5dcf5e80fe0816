//! Selector options derived from the session catalog. A teacher's
//! timetable repeats the same class and subject across many sessions,
//! so options are collapsed to unique ids before display.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::catalog::{ClassId, SubjectId, TeachingSession};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassOption {
    pub id: ClassId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectOption {
    pub id: SubjectId,
    pub name: String,
}

/// Case-insensitive name order with a case-sensitive tiebreak, so
/// "9a" and "9A" land next to each other but still deterministically.
pub(crate) fn name_order(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Every class the catalog mentions, one entry per id, ordered by name.
pub fn classes_of(sessions: &[TeachingSession]) -> Vec<ClassOption> {
    let mut seen = HashSet::new();
    let mut options: Vec<ClassOption> = sessions
        .iter()
        .filter(|s| seen.insert(s.class_id))
        .map(|s| ClassOption {
            id: s.class_id,
            name: s.class_name.clone(),
        })
        .collect();
    options.sort_by(|a, b| name_order(&a.name, &b.name));
    options
}

/// Subjects taught to one class, one entry per id, ordered by name.
/// A class id absent from the catalog yields no options.
pub fn subjects_of(sessions: &[TeachingSession], class_id: ClassId) -> Vec<SubjectOption> {
    let mut seen = HashSet::new();
    let mut options: Vec<SubjectOption> = sessions
        .iter()
        .filter(|s| s.class_id == class_id)
        .filter(|s| seen.insert(s.subject_id))
        .map(|s| SubjectOption {
            id: s.subject_id,
            name: s.subject_name.clone(),
        })
        .collect();
    options.sort_by(|a, b| name_order(&a.name, &b.name));
    options
}
