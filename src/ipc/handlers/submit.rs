use serde_json::{json, Value};

use crate::ipc::error::ok;
use crate::ipc::helpers::{engine_err, entries_json};
use crate::ipc::types::{AppState, Request};
use crate::workbench::SubmitOutcome;

async fn handle_submit_all(state: &mut AppState, req: &Request) -> serde_json::Value {
    let service = state.service.clone();
    match state.workbench.submit(service.as_ref()).await {
        Ok(SubmitOutcome::NothingToSubmit) => ok(&req.id, json!({ "nothingToSubmit": true })),
        Ok(SubmitOutcome::Submitted { report, refreshed }) => {
            let refreshed_entries = if refreshed {
                match state.workbench.loaded() {
                    Ok(loaded) => entries_json(loaded),
                    Err(_) => Value::Null,
                }
            } else {
                Value::Null
            };
            ok(
                &req.id,
                json!({
                    "succeeded": report.succeeded,
                    "failed": report.failed,
                    "refreshed": refreshed_entries,
                }),
            )
        }
        Err(e) => engine_err(&req.id, &e),
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "records.submitAll" => Some(handle_submit_all(state, req).await),
        _ => None,
    }
}
