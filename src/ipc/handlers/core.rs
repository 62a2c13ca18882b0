use super::str_param;
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request, RequestHost};
use crate::manager::{RecordManager, Session};
use crate::store::RecordStore;
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "schemaVersion": db::SCHEMA_VERSION,
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "ready": state.manager.as_ref().map(|m| m.store().is_ready()).unwrap_or(false),
        }),
    )
}

fn handle_workspace_select(
    state: &mut AppState,
    req: &Request,
    host: &mut RequestHost,
) -> serde_json::Value {
    let Some(path) = str_param(req, "path").map(PathBuf::from) else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };
    select_workspace(state, path, host)
        .map(|result| ok(&req.id, result))
        .unwrap_or_else(|e| err(&req.id, e.code(), e.to_string(), None))
}

/// Opens the store in `path`. The manager stays attached even when opening
/// fails, so later data requests report `not_initialized`.
pub fn select_workspace(
    state: &mut AppState,
    path: PathBuf,
    host: &mut RequestHost,
) -> crate::error::Result<serde_json::Value> {
    let existed = db::workspace_db_exists(&path);
    let store = RecordStore::in_workspace(path.clone()).with_busy_timeout(state.busy_timeout);
    let mut manager = RecordManager::new(store, state.opts);
    let mut session = Session::default();
    let res = manager.initialize(&mut session, host);

    state.workspace = Some(path.clone());
    state.manager = Some(manager);
    state.session = session;
    res?;

    Ok(json!({
        "workspacePath": path.to_string_lossy(),
        "created": !existed,
        "count": state.session.current_records.len(),
    }))
}

pub fn try_handle(
    state: &mut AppState,
    req: &Request,
    host: &mut RequestHost,
) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req, host)),
        _ => None,
    }
}
