use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::err;

pub async fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    if let Some(resp) = handlers::core::try_handle(state, &req).await {
        return resp;
    }
    if let Some(resp) = handlers::catalog::try_handle(state, &req).await {
        return resp;
    }
    if let Some(resp) = handlers::scope::try_handle(state, &req).await {
        return resp;
    }
    if let Some(resp) = handlers::roster::try_handle(state, &req).await {
        return resp;
    }
    if let Some(resp) = handlers::entries::try_handle(state, &req).await {
        return resp;
    }
    if let Some(resp) = handlers::submit::try_handle(state, &req).await {
        return resp;
    }

    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    )
}
