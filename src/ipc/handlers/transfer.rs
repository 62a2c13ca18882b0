use super::{str_param, workspace_parts};
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::types::{AppState, Request, RequestHost};
use serde_json::json;
use std::path::PathBuf;

type HandlerResult = Result<serde_json::Value, HandlerErr>;

/// Without `outDir` the JSON text is returned inline for the host to save.
fn handle_export(state: &mut AppState, req: &Request, host: &mut RequestHost) -> HandlerResult {
    let out_dir = str_param(req, "outDir").map(PathBuf::from);
    let (manager, _) = workspace_parts(state)?;
    let bundle = manager.export_all(host)?;
    let mut result = json!({
        "fileName": bundle.file_name,
        "count": bundle.record_count,
    });
    match out_dir {
        Some(dir) => {
            let path = bundle.write_into(&dir)?;
            result["path"] = json!(path.to_string_lossy());
        }
        None => result["json"] = json!(bundle.json),
    }
    Ok(result)
}

fn handle_import(state: &mut AppState, req: &Request, host: &mut RequestHost) -> HandlerResult {
    let text = match (str_param(req, "text"), str_param(req, "path")) {
        (Some(text), _) => text.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| HandlerErr {
            code: "io_failed",
            message: format!("failed to read {}: {}", path, e),
            details: None,
        })?,
        (None, None) => return Err(HandlerErr::bad_params("missing text or path")),
    };
    let (manager, session) = workspace_parts(state)?;
    let imported = manager.import_all(session, &text, host)?;
    Ok(json!({ "imported": imported, "total": session.current_records.len() }))
}

pub fn try_handle(
    state: &mut AppState,
    req: &Request,
    host: &mut RequestHost,
) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "students.export" => handle_export(state, req, host),
        "students.import" => handle_import(state, req, host),
        _ => return None,
    };
    Some(respond(&req.id, res))
}
