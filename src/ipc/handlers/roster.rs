use serde_json::json;

use crate::ipc::error::ok;
use crate::ipc::helpers::{engine_err, entries_json, scope_json};
use crate::ipc::types::{AppState, Request};

async fn handle_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let service = state.service.clone();
    if let Err(e) = state.workbench.load_roster(service.as_ref()).await {
        return engine_err(&req.id, &e);
    }
    match state.workbench.loaded() {
        Ok(loaded) => ok(
            &req.id,
            json!({
                "scope": scope_json(loaded.scope),
                "entries": entries_json(loaded),
                "dirty": loaded.tracker().is_dirty(),
            }),
        ),
        Err(e) => engine_err(&req.id, &e),
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.open" => Some(handle_open(state, req).await),
        _ => None,
    }
}
