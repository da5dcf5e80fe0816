use thiserror::Error;

use crate::catalog::{ClassId, StudentId, SubjectId};
use crate::scope::RecordKind;
use crate::service::ServiceError;

/// Input rejected before any state changes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("score {value} is outside 0..=100")]
    ScoreOutOfRange { value: f64 },
    #[error("value kind does not match the {expected} scope")]
    KindMismatch { expected: RecordKind },
    #[error("cannot parse {raw:?} as a {kind} period")]
    BadPeriod { kind: RecordKind, raw: String },
}

/// Anything a workbench operation can fail with. `code` is the stable
/// identifier carried on the wire.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no session catalog is loaded")]
    CatalogNotLoaded,
    #[error("selection is incomplete: no {missing} chosen")]
    ScopeIncomplete { missing: &'static str },
    #[error("class {0} is not in the current catalog")]
    ClassNotFound(ClassId),
    #[error("subject {0} is not taught to the selected class")]
    SubjectNotFound(SubjectId),
    #[error("no roster is loaded for the current scope")]
    RosterNotLoaded,
    #[error("student {0} is not on the loaded roster")]
    UnknownStudent(StudentId),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("record service call failed: {0}")]
    Fetch(#[from] ServiceError),
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::CatalogNotLoaded => "catalog_not_loaded",
            EngineError::ScopeIncomplete { .. } => "scope_incomplete",
            EngineError::ClassNotFound(_) => "not_found",
            EngineError::SubjectNotFound(_) => "not_found",
            EngineError::RosterNotLoaded => "roster_not_loaded",
            EngineError::UnknownStudent(_) => "unknown_student",
            EngineError::Validation(_) => "validation_failed",
            EngineError::Fetch(_) => "fetch_failed",
        }
    }
}
