use serde_json::{json, Value};

use super::error::err;
use crate::error::EngineError;
use crate::scope::ScopeKey;
use crate::workbench::{LoadedRoster, Workbench};

pub fn engine_err(id: &str, e: &EngineError) -> Value {
    err(id, e.code(), e.to_string(), None)
}

/// The surviving selection, every piece nullable, period split into
/// its kind and wire form so the shell can re-render dropdowns.
pub fn selection_json(workbench: &Workbench) -> Value {
    let selection = workbench.selection();
    json!({
        "classId": selection.class,
        "subjectId": selection.subject,
        "kind": selection.period.map(|p| p.kind().as_str()),
        "period": selection.period.map(|p| p.as_wire()),
    })
}

pub fn scope_json(scope: ScopeKey) -> Value {
    json!({
        "classId": scope.class_id,
        "subjectId": scope.subject_id,
        "kind": scope.kind().as_str(),
        "period": scope.period.as_wire(),
    })
}

/// Entry rows in roster order; `value` is null for an unset entry.
pub fn entries_json(loaded: &LoadedRoster) -> Value {
    Value::Array(
        loaded
            .entries()
            .map(|(student, value)| {
                json!({
                    "studentId": student.id,
                    "name": student.name,
                    "externalCode": student.external_code,
                    "value": value,
                })
            })
            .collect(),
    )
}
