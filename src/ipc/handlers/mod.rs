pub mod core;
pub mod form;
pub mod students;
pub mod transfer;

use crate::ipc::error::HandlerErr;
use crate::ipc::types::{AppState, Request};
use crate::manager::{RecordManager, Session};

/// The opened manager and the session it operates on.
fn workspace_parts(state: &mut AppState) -> Result<(&mut RecordManager, &mut Session), HandlerErr> {
    let AppState {
        manager, session, ..
    } = state;
    let Some(manager) = manager.as_mut() else {
        return Err(HandlerErr {
            code: "no_workspace",
            message: "select a workspace first".into(),
            details: None,
        });
    };
    Ok((manager, session))
}

fn student_id_param(req: &Request) -> Result<i64, HandlerErr> {
    req.params
        .get("studentId")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| HandlerErr::bad_params("missing studentId"))
}

fn str_param<'a>(req: &'a Request, key: &str) -> Option<&'a str> {
    req.params.get(key).and_then(|v| v.as_str())
}
