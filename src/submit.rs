use futures::future;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::StudentId;
use crate::reconcile::BaselineMap;
use crate::scope::ScopeKey;
use crate::service::RecordService;

/// Outcome of a bulk submission. Partial failure is data, not an
/// error: the report names exactly which students did not persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReport {
    pub succeeded: usize,
    pub failed: Vec<FailedStudent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedStudent {
    pub student_id: StudentId,
    pub reason: String,
}

/// Submits every entry of the working map as one upsert per student,
/// all addressed by the same scope. Requests run concurrently with no
/// ordering between students; every outcome is awaited. An empty map
/// returns `None` without touching the service. No retries, and an
/// issued request is never cancelled.
pub async fn submit_all(
    service: &dyn RecordService,
    scope: ScopeKey,
    working: &BaselineMap,
) -> Option<SubmitReport> {
    if working.is_empty() {
        debug!("working map empty, nothing to submit");
        return None;
    }

    info!(entries = working.len(), "submitting working map");
    let upserts = working.iter().map(|(&student, &value)| async move {
        (student, service.upsert_record(student, scope, value).await)
    });
    let outcomes = future::join_all(upserts).await;

    let mut report = SubmitReport {
        succeeded: 0,
        failed: Vec::new(),
    };
    for (student, outcome) in outcomes {
        match outcome {
            Ok(()) => report.succeeded += 1,
            Err(err) => {
                warn!(student = %student, error = %err, "upsert failed");
                report.failed.push(FailedStudent {
                    student_id: student,
                    reason: err.to_string(),
                });
            }
        }
    }
    info!(
        succeeded = report.succeeded,
        failed = report.failed.len(),
        "bulk submit finished"
    );
    Some(report)
}
