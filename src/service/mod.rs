//! Backing-service boundary. The engine talks to the school's record
//! store only through [`RecordService`]; the HTTP transport and the
//! in-memory store used by tests and fixture mode both live behind it.

mod http;
mod memory;

pub use http::{AuthSession, HttpRecordService};
pub use memory::MemoryRecordService;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{ClassId, StudentId, SubjectId, TeachingSession};
use crate::error::ValidationError;
use crate::roster::RosterEntry;
use crate::scope::{PeriodKey, RecordKind, RecordValue, ScopeKey};

/// What the record store can fail with, as the engine sees it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error("record store answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error("record store unreachable: {0}")]
    Transport(String),
    #[error("record store answer did not parse: {0}")]
    Decode(String),
}

/// The school record store, from the engine's point of view. Reads are
/// teacher-scoped; the one write is an idempotent create-or-overwrite
/// keyed by `(student, scope)`. The engine never issues deletes.
#[async_trait]
pub trait RecordService: Send + Sync {
    /// The teacher's full session catalog, unordered.
    async fn fetch_sessions(&self) -> Result<Vec<TeachingSession>, ServiceError>;

    /// Membership list for the scope's class, each row carrying the
    /// records already stored under exactly that scope.
    async fn fetch_roster(&self, scope: ScopeKey) -> Result<Vec<RosterEntry>, ServiceError>;

    async fn upsert_record(
        &self,
        student: StudentId,
        scope: ScopeKey,
        value: RecordValue,
    ) -> Result<(), ServiceError>;
}

/// Flat record row as exchanged with the store: the upsert request
/// body and the fixture file both use this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRecord {
    pub student_id: StudentId,
    pub class_id: ClassId,
    pub subject_id: SubjectId,
    pub kind: RecordKind,
    pub period: String,
    pub value: RecordValue,
}

impl WireRecord {
    pub fn from_parts(student_id: StudentId, scope: ScopeKey, value: RecordValue) -> WireRecord {
        WireRecord {
            student_id,
            class_id: scope.class_id,
            subject_id: scope.subject_id,
            kind: scope.kind(),
            period: scope.period.as_wire(),
            value,
        }
    }

    pub fn scope(&self) -> Result<ScopeKey, ValidationError> {
        let period = PeriodKey::parse(self.kind, &self.period)?;
        Ok(ScopeKey::new(self.class_id, self.subject_id, period))
    }
}
