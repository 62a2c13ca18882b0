//! Student-record store and form manager.
//!
//! [`store::RecordStore`] keeps the records in SQLite with unique indexes on
//! email and enrollment file. [`manager::RecordManager`] drives the
//! create/edit form on top of it. [`ipc`] exposes both over a line-delimited
//! JSON protocol for a UI host.

pub mod config;
pub mod db;
pub mod error;
pub mod ipc;
pub mod manager;
pub mod model;
pub mod store;

pub use error::{Result, RosterError};
pub use manager::{FormMode, RecordManager, Session, UiHost};
pub use model::{StoreStats, StudentDraft, StudentPatch, StudentRecord};
pub use store::RecordStore;
