use super::{str_param, student_id_param, workspace_parts};
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::types::{AppState, Request, RequestHost};
use serde_json::json;

type HandlerResult = Result<serde_json::Value, HandlerErr>;

fn handle_list(state: &mut AppState, host: &mut RequestHost) -> HandlerResult {
    let (manager, session) = workspace_parts(state)?;
    manager.load_all(session, host)?;
    Ok(json!({
        "students": session.current_records,
        "total": session.current_records.len(),
    }))
}

fn handle_get(state: &mut AppState, req: &Request) -> HandlerResult {
    let id = student_id_param(req)?;
    let (manager, _) = workspace_parts(state)?;
    let student = manager.store().get(id).map_err(HandlerErr::from)?;
    Ok(json!({ "student": student }))
}

fn handle_stats(state: &mut AppState, host: &mut RequestHost) -> HandlerResult {
    let (manager, _) = workspace_parts(state)?;
    let stats = manager.stats(host)?;
    Ok(json!(stats))
}

fn handle_delete(state: &mut AppState, req: &Request, host: &mut RequestHost) -> HandlerResult {
    let id = student_id_param(req)?;
    let (manager, session) = workspace_parts(state)?;
    manager.remove(session, id, host)?;
    Ok(json!({ "ok": true, "total": session.current_records.len() }))
}

fn handle_search(state: &mut AppState, req: &Request, host: &mut RequestHost) -> HandlerResult {
    let term = str_param(req, "term").unwrap_or("");
    let (manager, session) = workspace_parts(state)?;
    let view = manager.run_search(session, term, host)?;
    Ok(json!(view))
}

fn handle_seed_sample(state: &mut AppState, host: &mut RequestHost) -> HandlerResult {
    let (manager, session) = workspace_parts(state)?;
    let added = manager.seed_sample_data(session, host)?;
    Ok(json!({ "added": added, "total": session.current_records.len() }))
}

fn handle_clear(state: &mut AppState, host: &mut RequestHost) -> HandlerResult {
    let (manager, session) = workspace_parts(state)?;
    manager.clear(session, host)?;
    Ok(json!({ "ok": true }))
}

pub fn try_handle(
    state: &mut AppState,
    req: &Request,
    host: &mut RequestHost,
) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "students.list" => handle_list(state, host),
        "students.get" => handle_get(state, req),
        "students.stats" => handle_stats(state, host),
        "students.delete" => handle_delete(state, req, host),
        "students.search" => handle_search(state, req, host),
        "students.seedSample" => handle_seed_sample(state, host),
        "students.clear" => handle_clear(state, host),
        _ => return None,
    };
    Some(respond(&req.id, res))
}
