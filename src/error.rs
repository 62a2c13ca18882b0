//! Error taxonomy shared by the store, the manager and the ipc layer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("cannot open database: {0}")]
    Connection(String),

    #[error("database not initialized")]
    NotInitialized,

    #[error("{field} is already registered")]
    Constraint { field: &'static str },

    #[error("student not found: {0}")]
    NotFound(i64),

    #[error("invalid import payload: {0}")]
    Parse(String),

    #[error("{0}")]
    Validation(String),

    #[error("cancelled by user")]
    Cancelled,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RosterError>;

impl RosterError {
    /// Stable code used in ipc error responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection_failed",
            Self::NotInitialized => "not_initialized",
            Self::Constraint { .. } => "constraint_violation",
            Self::NotFound(_) => "not_found",
            Self::Parse(_) => "parse_failed",
            Self::Validation(_) => "validation_failed",
            Self::Cancelled => "cancelled",
            Self::Sqlite(_) => "db_query_failed",
            Self::Io(_) => "io_failed",
            Self::Json(_) => "parse_failed",
        }
    }

    /// Maps a rusqlite unique-index failure on the students table to
    /// `Constraint`, passing every other error through.
    pub(crate) fn from_write(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(inner, Some(msg)) = &e {
            if inner.code == rusqlite::ErrorCode::ConstraintViolation {
                if msg.contains("students.email") {
                    return Self::Constraint { field: "email" };
                }
                if msg.contains("students.enrollment_file") {
                    return Self::Constraint {
                        field: "enrollmentFile",
                    };
                }
            }
        }
        Self::Sqlite(e)
    }
}
