use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use super::{RecordService, ServiceError, WireRecord};
use crate::catalog::{ClassId, StudentId, TeachingSession};
use crate::roster::{ExistingRecord, RosterEntry, Student};
use crate::scope::{RecordValue, ScopeKey};

/// In-memory school backend for tests and the sidecar's fixture mode.
/// Behaves like the real store: roster fetches are scope-qualified,
/// upserts overwrite by `(student, scope)` and keep the stored record's
/// id. Seeding bypasses upsert, so tests can plant the duplicate rows
/// a fanned-out relation would produce. Reads and writes are counted
/// and can be made to fail on demand.
pub struct MemoryRecordService {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    sessions: Vec<TeachingSession>,
    rosters: Vec<(ClassId, Vec<Student>)>,
    records: Vec<StoredRow>,
    fail_students: HashSet<StudentId>,
    fail_next_fetch: Option<ServiceError>,
    counts: RequestCounts,
}

struct StoredRow {
    id: Uuid,
    student: StudentId,
    scope: ScopeKey,
    value: RecordValue,
}

/// How many requests of each kind the store has answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestCounts {
    pub sessions: usize,
    pub rosters: usize,
    pub upserts: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Fixture {
    #[serde(default)]
    sessions: Vec<TeachingSession>,
    #[serde(default)]
    rosters: Vec<FixtureRoster>,
    #[serde(default)]
    records: Vec<WireRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FixtureRoster {
    class_id: ClassId,
    students: Vec<Student>,
}

impl MemoryRecordService {
    pub fn new() -> MemoryRecordService {
        MemoryRecordService {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Seeds a store from a JSON fixture file: sessions, students per
    /// class, and pre-existing records in the flat wire shape.
    pub fn from_fixture(path: &Path) -> anyhow::Result<MemoryRecordService> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_fixture_str(&raw)
    }

    pub fn from_fixture_str(raw: &str) -> anyhow::Result<MemoryRecordService> {
        let fixture: Fixture = serde_json::from_str(raw)?;
        let service = MemoryRecordService::new();
        {
            let mut inner = service.locked();
            inner.sessions = fixture.sessions;
            for roster in fixture.rosters {
                inner.rosters.push((roster.class_id, roster.students));
            }
            for record in fixture.records {
                let scope = record.scope()?;
                let row = StoredRow {
                    id: Uuid::new_v4(),
                    student: record.student_id,
                    scope,
                    value: record.value,
                };
                inner.records.push(row);
            }
        }
        Ok(service)
    }

    fn locked(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn seed_session(&self, session: TeachingSession) {
        self.locked().sessions.push(session);
    }

    pub fn seed_student(&self, class_id: ClassId, student: Student) {
        let mut inner = self.locked();
        match inner.rosters.iter_mut().find(|(id, _)| *id == class_id) {
            Some((_, students)) => students.push(student),
            None => inner.rosters.push((class_id, vec![student])),
        }
    }

    /// Plants a stored row directly, duplicates allowed.
    pub fn seed_record(&self, student: StudentId, scope: ScopeKey, value: RecordValue) {
        self.locked().records.push(StoredRow {
            id: Uuid::new_v4(),
            student,
            scope,
            value,
        });
    }

    /// Makes every upsert for this student fail with a 422.
    pub fn fail_student(&self, student: StudentId) {
        self.locked().fail_students.insert(student);
    }

    /// Makes the next read (sessions or roster) fail with `err`.
    pub fn fail_next_fetch(&self, err: ServiceError) {
        self.locked().fail_next_fetch = Some(err);
    }

    pub fn counts(&self) -> RequestCounts {
        self.locked().counts
    }

    /// First stored value for `(student, scope)`, if any.
    pub fn stored(&self, student: StudentId, scope: ScopeKey) -> Option<RecordValue> {
        self.locked()
            .records
            .iter()
            .find(|r| r.student == student && r.scope == scope)
            .map(|r| r.value)
    }

    /// Number of stored rows for `(student, scope)`.
    pub fn stored_rows(&self, student: StudentId, scope: ScopeKey) -> usize {
        self.locked()
            .records
            .iter()
            .filter(|r| r.student == student && r.scope == scope)
            .count()
    }
}

impl Default for MemoryRecordService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordService for MemoryRecordService {
    async fn fetch_sessions(&self) -> Result<Vec<TeachingSession>, ServiceError> {
        let mut inner = self.locked();
        inner.counts.sessions += 1;
        if let Some(err) = inner.fail_next_fetch.take() {
            return Err(err);
        }
        Ok(inner.sessions.clone())
    }

    async fn fetch_roster(&self, scope: ScopeKey) -> Result<Vec<RosterEntry>, ServiceError> {
        let mut inner = self.locked();
        inner.counts.rosters += 1;
        if let Some(err) = inner.fail_next_fetch.take() {
            return Err(err);
        }
        let students = inner
            .rosters
            .iter()
            .find(|(id, _)| *id == scope.class_id)
            .map(|(_, students)| students.clone())
            .unwrap_or_default();
        let entries = students
            .into_iter()
            .map(|student| {
                let existing = inner
                    .records
                    .iter()
                    .filter(|r| r.student == student.id && r.scope == scope)
                    .map(|r| ExistingRecord { value: r.value })
                    .collect();
                RosterEntry { student, existing }
            })
            .collect();
        Ok(entries)
    }

    async fn upsert_record(
        &self,
        student: StudentId,
        scope: ScopeKey,
        value: RecordValue,
    ) -> Result<(), ServiceError> {
        let mut inner = self.locked();
        inner.counts.upserts += 1;
        if inner.fail_students.contains(&student) {
            return Err(ServiceError::Status {
                status: 422,
                message: format!("record rejected for student {student}"),
            });
        }
        let kept = match inner
            .records
            .iter_mut()
            .find(|r| r.student == student && r.scope == scope)
        {
            Some(row) => {
                row.value = value;
                Some(row.id)
            }
            None => None,
        };
        match kept {
            Some(id) => {
                debug!(record = %id, student = %student, "overwrote stored record");
                inner
                    .records
                    .retain(|r| !(r.student == student && r.scope == scope) || r.id == id);
            }
            None => {
                let id = Uuid::new_v4();
                debug!(record = %id, student = %student, "created stored record");
                inner.records.push(StoredRow {
                    id,
                    student,
                    scope,
                    value,
                });
            }
        }
        Ok(())
    }
}
