use super::handlers;
use super::types::{AppState, Request, RequestHost};
use crate::ipc::error::err;
use serde_json::json;

pub fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    let mut host = RequestHost::for_request(&req);
    let mut resp = dispatch(state, &req, &mut host);
    resp["notifications"] = json!(host.notifications);
    resp
}

fn dispatch(state: &mut AppState, req: &Request, host: &mut RequestHost) -> serde_json::Value {
    tracing::debug!(id = %req.id, method = %req.method, "request");
    if let Some(resp) = handlers::core::try_handle(state, req, host) {
        return resp;
    }
    if let Some(resp) = handlers::students::try_handle(state, req, host) {
        return resp;
    }
    if let Some(resp) = handlers::form::try_handle(state, req, host) {
        return resp;
    }
    if let Some(resp) = handlers::transfer::try_handle(state, req, host) {
        return resp;
    }

    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    )
}
