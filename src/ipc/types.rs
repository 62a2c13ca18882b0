use crate::manager::{ManagerOptions, Notification, RecordManager, Session, UiHost};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub manager: Option<RecordManager>,
    pub session: Session,
    pub opts: ManagerOptions,
    pub busy_timeout: Duration,
}

impl AppState {
    pub fn new(opts: ManagerOptions, busy_timeout: Duration) -> Self {
        Self {
            workspace: None,
            manager: None,
            session: Session::default(),
            opts,
            busy_timeout,
        }
    }
}

/// Host side of one request: confirmation comes from `params.confirmed`,
/// notifications are collected and returned with the response.
#[derive(Debug, Default)]
pub struct RequestHost {
    pub confirmed: bool,
    pub notifications: Vec<Notification>,
}

impl RequestHost {
    pub fn for_request(req: &Request) -> Self {
        Self {
            confirmed: req
                .params
                .get("confirmed")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            notifications: Vec::new(),
        }
    }
}

impl UiHost for RequestHost {
    fn confirm(&mut self, prompt: &str) -> bool {
        tracing::debug!(prompt, confirmed = self.confirmed, "confirmation requested");
        self.confirmed
    }

    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }
}
