use std::collections::BTreeSet;

use crate::catalog::StudentId;
use crate::error::{EngineError, ValidationError};
use crate::reconcile::BaselineMap;
use crate::scope::{RecordKind, RecordValue};

/// Pending edits for one loaded roster. The working map starts as a
/// copy of the reconciled baseline; a student absent from the map has
/// no value. Edits are rejected up front rather than surfacing later
/// as store errors: the student must be on the roster and the value
/// must match the scope's kind.
#[derive(Debug, Clone)]
pub struct EditTracker {
    kind: RecordKind,
    members: BTreeSet<StudentId>,
    baseline: BaselineMap,
    working: BaselineMap,
}

impl EditTracker {
    /// Seeds a tracker for a freshly loaded scope. Reseeding replaces
    /// the tracker wholesale, so edits never leak across scopes.
    pub fn seed(
        kind: RecordKind,
        members: impl IntoIterator<Item = StudentId>,
        baseline: BaselineMap,
    ) -> EditTracker {
        EditTracker {
            kind,
            members: members.into_iter().collect(),
            working: baseline.clone(),
            baseline,
        }
    }

    /// Current working value for a student, `None` when unset.
    pub fn value_of(&self, student: StudentId) -> Option<RecordValue> {
        self.working.get(&student).copied()
    }

    pub fn set(&mut self, student: StudentId, value: RecordValue) -> Result<(), EngineError> {
        if !self.members.contains(&student) {
            return Err(EngineError::UnknownStudent(student));
        }
        if value.kind() != self.kind {
            return Err(ValidationError::KindMismatch {
                expected: self.kind,
            }
            .into());
        }
        self.working.insert(student, value);
        Ok(())
    }

    /// Unsets a student's working value. Clearing is local only; the
    /// store is never asked to delete.
    pub fn clear(&mut self, student: StudentId) -> Result<(), EngineError> {
        if !self.members.contains(&student) {
            return Err(EngineError::UnknownStudent(student));
        }
        self.working.remove(&student);
        Ok(())
    }

    /// Drops every pending edit, restoring the seeded baseline.
    pub fn reset(&mut self) {
        self.working = self.baseline.clone();
    }

    /// The full working map, as a submission would send it.
    pub fn snapshot(&self) -> &BaselineMap {
        &self.working
    }

    /// True when any entry diverges from the seeded baseline.
    pub fn is_dirty(&self) -> bool {
        self.working != self.baseline
    }
}
