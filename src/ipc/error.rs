use crate::error::RosterError;
use serde::Serialize;
use serde_json::{json, Value};

/// The `error` member of a failed response.
#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

pub fn ok(id: &str, result: Value) -> Value {
    json!({ "id": id, "ok": true, "result": result })
}

pub fn err(id: &str, code: &str, message: impl Into<String>, details: Option<Value>) -> Value {
    let body = ErrorBody {
        code,
        message: message.into(),
        details,
    };
    json!({ "id": id, "ok": false, "error": body })
}

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl HandlerErr {
    pub fn bad_params(message: impl Into<String>) -> Self {
        Self {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<RosterError> for HandlerErr {
    fn from(e: RosterError) -> Self {
        let details = match &e {
            RosterError::Constraint { field } => Some(json!({ "field": field })),
            RosterError::NotFound(id) => Some(json!({ "studentId": id })),
            _ => None,
        };
        Self {
            code: e.code(),
            message: e.to_string(),
            details,
        }
    }
}

/// Collapses a handler result into a response envelope.
pub fn respond(id: &str, res: Result<Value, HandlerErr>) -> Value {
    match res {
        Ok(v) => ok(id, v),
        Err(e) => e.response(id),
    }
}
