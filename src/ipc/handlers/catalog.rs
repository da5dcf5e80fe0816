use serde_json::json;

use crate::ipc::error::ok;
use crate::ipc::helpers::engine_err;
use crate::ipc::types::{AppState, Request};

async fn handle_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let service = state.service.clone();
    if let Err(e) = state.workbench.load_catalog(service.as_ref()).await {
        return engine_err(&req.id, &e);
    }
    match state.workbench.sessions() {
        Ok(sessions) => ok(&req.id, json!({ "sessions": sessions })),
        Err(e) => engine_err(&req.id, &e),
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "catalog.load" => Some(handle_load(state, req).await),
        _ => None,
    }
}
