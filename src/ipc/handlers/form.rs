use super::{student_id_param, workspace_parts};
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::types::{AppState, Request, RequestHost};
use crate::manager::SubmitOutcome;
use crate::model::StudentDraft;
use serde_json::json;

type HandlerResult = Result<serde_json::Value, HandlerErr>;

fn handle_submit(state: &mut AppState, req: &Request, host: &mut RequestHost) -> HandlerResult {
    let Some(raw) = req.params.get("form") else {
        return Err(HandlerErr::bad_params("missing form"));
    };
    let form: StudentDraft = serde_json::from_value(raw.clone())
        .map_err(|e| HandlerErr::bad_params(format!("invalid form: {e}")))?;

    let (manager, session) = workspace_parts(state)?;
    let outcome = manager.submit(session, &form, host)?;
    let result = match outcome {
        SubmitOutcome::Created(id) => json!({ "action": "created", "studentId": id }),
        SubmitOutcome::Updated(id) => json!({ "action": "updated", "studentId": id }),
        SubmitOutcome::Skipped => json!({ "action": "skipped" }),
    };
    Ok(result)
}

fn handle_edit(state: &mut AppState, req: &Request, host: &mut RequestHost) -> HandlerResult {
    let id = student_id_param(req)?;
    let (manager, session) = workspace_parts(state)?;
    let student = manager.begin_edit(session, id, host)?;
    Ok(json!({ "student": student, "form": session.mode }))
}

fn handle_cancel(state: &mut AppState, host: &mut RequestHost) -> HandlerResult {
    let (manager, session) = workspace_parts(state)?;
    manager.cancel_edit(session, host);
    Ok(json!({ "form": session.mode }))
}

fn handle_state(state: &mut AppState) -> HandlerResult {
    let (_, session) = workspace_parts(state)?;
    Ok(json!({
        "form": session.mode,
        "isLoading": session.is_loading,
        "total": session.current_records.len(),
    }))
}

pub fn try_handle(
    state: &mut AppState,
    req: &Request,
    host: &mut RequestHost,
) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "form.submit" => handle_submit(state, req, host),
        "form.edit" => handle_edit(state, req, host),
        "form.cancel" => handle_cancel(state, host),
        "form.state" => handle_state(state),
        _ => return None,
    };
    Some(respond(&req.id, res))
}
