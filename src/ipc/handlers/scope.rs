use serde_json::json;

use crate::catalog::{ClassId, SubjectId};
use crate::error::EngineError;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{engine_err, selection_json};
use crate::ipc::types::{AppState, Request};
use crate::scope::{PeriodKey, RecordKind};

fn handle_classes(state: &AppState, req: &Request) -> serde_json::Value {
    match state.workbench.class_options() {
        Ok(classes) => ok(&req.id, json!({ "classes": classes })),
        Err(e) => engine_err(&req.id, &e),
    }
}

fn handle_subjects(state: &AppState, req: &Request) -> serde_json::Value {
    match state.workbench.subject_options() {
        Ok(subjects) => ok(&req.id, json!({ "subjects": subjects })),
        Err(e) => engine_err(&req.id, &e),
    }
}

fn handle_select_class(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(class_id) = req.params.get("classId").and_then(|v| v.as_i64()) else {
        return err(&req.id, "bad_params", "missing params.classId", None);
    };
    match state.workbench.select_class(ClassId(class_id)) {
        Ok(()) => ok(&req.id, json!({ "selection": selection_json(&state.workbench) })),
        Err(e) => engine_err(&req.id, &e),
    }
}

fn handle_select_subject(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(subject_id) = req.params.get("subjectId").and_then(|v| v.as_i64()) else {
        return err(&req.id, "bad_params", "missing params.subjectId", None);
    };
    match state.workbench.select_subject(SubjectId(subject_id)) {
        Ok(()) => ok(&req.id, json!({ "selection": selection_json(&state.workbench) })),
        Err(e) => engine_err(&req.id, &e),
    }
}

fn handle_select_period(
    state: &mut AppState,
    req: &Request,
    kind: RecordKind,
    param: &str,
) -> serde_json::Value {
    let Some(raw) = req.params.get(param).and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", format!("missing params.{param}"), None);
    };
    let period = match PeriodKey::parse(kind, raw) {
        Ok(period) => period,
        Err(e) => return engine_err(&req.id, &EngineError::from(e)),
    };
    match state.workbench.select_period(period) {
        Ok(()) => ok(&req.id, json!({ "selection": selection_json(&state.workbench) })),
        Err(e) => engine_err(&req.id, &e),
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "scope.classes" => Some(handle_classes(state, req)),
        "scope.subjects" => Some(handle_subjects(state, req)),
        "scope.selectClass" => Some(handle_select_class(state, req)),
        "scope.selectSubject" => Some(handle_select_subject(state, req)),
        "scope.selectAttendanceDate" => {
            Some(handle_select_period(state, req, RecordKind::Attendance, "date"))
        }
        "scope.selectAssessment" => {
            Some(handle_select_period(state, req, RecordKind::Grade, "tag"))
        }
        _ => None,
    }
}
