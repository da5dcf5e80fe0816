use serde_json::{json, Value};

use crate::catalog::StudentId;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::engine_err;
use crate::ipc::types::{AppState, Request};
use crate::scope::{AttendanceStatus, GradeScore, RecordKind, RecordValue};

/// Raw entry input for the active scope's kind: a status string for
/// attendance, a score number for grades, or null. An empty string
/// means "clear", matching how the entry panel's inputs report an
/// erased field.
fn parse_value(
    id: &str,
    kind: RecordKind,
    raw: &Value,
) -> Result<Option<RecordValue>, serde_json::Value> {
    match (raw, kind) {
        (Value::Null, _) => Ok(None),
        (Value::String(s), _) if s.is_empty() => Ok(None),
        (Value::String(s), RecordKind::Attendance) => {
            match serde_json::from_value::<AttendanceStatus>(raw.clone()) {
                Ok(status) => Ok(Some(RecordValue::Attendance(status))),
                Err(_) => {
                    let accepted = AttendanceStatus::ALL.map(|s| s.as_str()).join(", ");
                    Err(err(
                        id,
                        "validation_failed",
                        format!("unknown attendance status {s:?}, accepted: {accepted}"),
                        None,
                    ))
                }
            }
        }
        (Value::String(s), RecordKind::Grade) => Err(err(
            id,
            "validation_failed",
            format!("a grade entry takes a numeric score, got {s:?}"),
            None,
        )),
        (Value::Number(_), RecordKind::Grade) => {
            match serde_json::from_value::<GradeScore>(raw.clone()) {
                Ok(score) => Ok(Some(RecordValue::Grade(score))),
                Err(e) => Err(err(id, "validation_failed", e.to_string(), None)),
            }
        }
        (Value::Number(_), RecordKind::Attendance) => Err(err(
            id,
            "validation_failed",
            "an attendance entry takes a status string, got a number",
            None,
        )),
        _ => Err(err(
            id,
            "bad_params",
            "params.value must be a string, number, or null",
            None,
        )),
    }
}

fn entry_response(state: &AppState, id: &str, student: StudentId) -> serde_json::Value {
    match state.workbench.loaded() {
        Ok(loaded) => ok(
            id,
            json!({
                "studentId": student,
                "value": loaded.tracker().value_of(student),
                "dirty": loaded.tracker().is_dirty(),
            }),
        ),
        Err(e) => engine_err(id, &e),
    }
}

fn handle_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(student_id) = req.params.get("studentId").and_then(|v| v.as_i64()) else {
        return err(&req.id, "bad_params", "missing params.studentId", None);
    };
    let student = StudentId(student_id);
    let kind = match state.workbench.loaded() {
        Ok(loaded) => loaded.scope.kind(),
        Err(e) => return engine_err(&req.id, &e),
    };
    let raw = req.params.get("value").unwrap_or(&Value::Null);
    let parsed = match parse_value(&req.id, kind, raw) {
        Ok(parsed) => parsed,
        Err(resp) => return resp,
    };
    let applied = match parsed {
        Some(value) => state.workbench.set_entry(student, value),
        None => state.workbench.clear_entry(student),
    };
    match applied {
        Ok(()) => entry_response(state, &req.id, student),
        Err(e) => engine_err(&req.id, &e),
    }
}

fn handle_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(student_id) = req.params.get("studentId").and_then(|v| v.as_i64()) else {
        return err(&req.id, "bad_params", "missing params.studentId", None);
    };
    let student = StudentId(student_id);
    match state.workbench.clear_entry(student) {
        Ok(()) => entry_response(state, &req.id, student),
        Err(e) => engine_err(&req.id, &e),
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "entry.set" => Some(handle_set(state, req)),
        "entry.clear" => Some(handle_clear(state, req)),
        _ => None,
    }
}
