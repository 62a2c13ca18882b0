//! Form-driven orchestration on top of [`RecordStore`].
//!
//! The manager owns no session state of its own. Callers keep a [`Session`]
//! and pass it to every operation together with a [`UiHost`], which answers
//! confirmations and receives notifications.

use crate::error::{Result, RosterError};
use crate::model::{is_known_grade, StoreStats, StudentDraft, StudentRecord};
use crate::store::{ExportBundle, RecordStore};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

pub const DEFAULT_NOTIFICATION_MS: u64 = 4_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "studentId", rename_all = "camelCase")]
pub enum FormMode {
    Creating,
    Editing(i64),
}

#[derive(Debug, Clone)]
pub struct Session {
    pub mode: FormMode,
    pub current_records: Vec<StudentRecord>,
    pub is_loading: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            mode: FormMode::Creating,
            current_records: Vec::new(),
            is_loading: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub dismiss_after_ms: u64,
}

pub trait UiHost {
    fn confirm(&mut self, prompt: &str) -> bool;
    fn notify(&mut self, notification: Notification);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(i64),
    Updated(i64),
    /// Another submission was still in flight.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchView {
    pub records: Vec<StudentRecord>,
    pub total: usize,
    pub found: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct ManagerOptions {
    pub seed_on_first_run: bool,
    pub notification_ms: u64,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            seed_on_first_run: true,
            notification_ms: DEFAULT_NOTIFICATION_MS,
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Field-level checks run before any store call.
pub fn validate(form: &StudentDraft) -> Result<()> {
    let missing = [
        &form.email,
        &form.first_name,
        &form.last_name,
        &form.grade,
        &form.enrollment_file,
    ]
    .iter()
    .any(|v| v.trim().is_empty());
    if missing {
        return Err(RosterError::Validation("all fields are required".into()));
    }
    if !is_valid_email(&form.email) {
        return Err(RosterError::Validation("email format is not valid".into()));
    }
    if !is_known_grade(&form.grade) {
        return Err(RosterError::Validation(format!(
            "unknown grade: {}",
            form.grade
        )));
    }
    Ok(())
}

pub struct RecordManager {
    store: RecordStore,
    opts: ManagerOptions,
}

impl RecordManager {
    pub fn new(store: RecordStore, opts: ManagerOptions) -> Self {
        Self { store, opts }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    fn note(&self, ui: &mut dyn UiHost, severity: Severity, message: impl Into<String>) {
        ui.notify(Notification {
            message: message.into(),
            severity,
            dismiss_after_ms: self.opts.notification_ms,
        });
    }

    /// Reports `e` to the host and hands it back to the caller.
    fn fail(&self, ui: &mut dyn UiHost, context: &str, e: RosterError) -> RosterError {
        tracing::warn!(error = %e, "{}", context);
        let message = match &e {
            RosterError::Validation(m) => m.clone(),
            RosterError::Constraint { .. } => e.to_string(),
            _ => format!("{}: {}", context, e),
        };
        self.note(ui, Severity::Error, message);
        e
    }

    /// Opens the store, seeds it on first run and loads the snapshot.
    pub fn initialize(&mut self, session: &mut Session, ui: &mut dyn UiHost) -> Result<()> {
        let opened = self.store.open().and_then(|_| {
            if self.opts.seed_on_first_run && self.store.is_empty()? {
                tracing::info!("empty database, adding sample students");
                self.store.add_sample_data()?;
            }
            Ok(())
        });
        if let Err(e) = opened {
            return Err(self.fail(ui, "critical error while connecting to the database", e));
        }
        self.note(ui, Severity::Success, "database connected");
        self.load_all(session, ui)
    }

    pub fn load_all(&self, session: &mut Session, ui: &mut dyn UiHost) -> Result<()> {
        match self.store.get_all() {
            Ok(records) => {
                tracing::debug!(count = records.len(), "students loaded");
                session.current_records = records;
                Ok(())
            }
            Err(e) => Err(self.fail(ui, "failed to load students", e)),
        }
    }

    pub fn submit(
        &mut self,
        session: &mut Session,
        form: &StudentDraft,
        ui: &mut dyn UiHost,
    ) -> Result<SubmitOutcome> {
        if session.is_loading {
            return Ok(SubmitOutcome::Skipped);
        }
        session.is_loading = true;
        let res = match session.mode {
            FormMode::Creating => self.create(session, form, ui),
            FormMode::Editing(id) => self.save_edit(session, id, form, ui),
        };
        session.is_loading = false;
        res
    }

    fn create(
        &mut self,
        session: &mut Session,
        form: &StudentDraft,
        ui: &mut dyn UiHost,
    ) -> Result<SubmitOutcome> {
        let form = form.trimmed();
        let id = self
            .checked_write(&form, None, |store| store.add(&form))
            .map_err(|e| self.fail(ui, "failed to add student", e))?;
        self.load_all(session, ui)?;
        session.mode = FormMode::Creating;
        self.note(ui, Severity::Success, "student added");
        Ok(SubmitOutcome::Created(id))
    }

    fn save_edit(
        &mut self,
        session: &mut Session,
        id: i64,
        form: &StudentDraft,
        ui: &mut dyn UiHost,
    ) -> Result<SubmitOutcome> {
        let form = form.trimmed();
        let patch = form.clone().into_patch();
        self.checked_write(&form, Some(id), |store| store.update(id, &patch))
            .map_err(|e| self.fail(ui, "failed to update student", e))?;
        self.load_all(session, ui)?;
        session.mode = FormMode::Creating;
        self.note(ui, Severity::Success, "student updated");
        Ok(SubmitOutcome::Updated(id))
    }

    /// Validation, then the uniqueness pre-checks, then `write`.
    fn checked_write<T>(
        &mut self,
        form: &StudentDraft,
        exclude_id: Option<i64>,
        write: impl FnOnce(&mut RecordStore) -> Result<T>,
    ) -> Result<T> {
        validate(form)?;
        if self.store.email_exists(&form.email, exclude_id)? {
            return Err(RosterError::Constraint { field: "email" });
        }
        if self
            .store
            .enrollment_file_exists(&form.enrollment_file, exclude_id)?
        {
            return Err(RosterError::Constraint {
                field: "enrollmentFile",
            });
        }
        write(&mut self.store)
    }

    /// Switches the form to edit mode and returns the record to prefill it.
    pub fn begin_edit(
        &self,
        session: &mut Session,
        id: i64,
        ui: &mut dyn UiHost,
    ) -> Result<StudentRecord> {
        let rec = self
            .store
            .get(id)
            .and_then(|r| r.ok_or(RosterError::NotFound(id)))
            .map_err(|e| self.fail(ui, "failed to load student", e))?;
        session.mode = FormMode::Editing(id);
        self.note(ui, Severity::Info, "edit mode enabled");
        Ok(rec)
    }

    pub fn cancel_edit(&self, session: &mut Session, ui: &mut dyn UiHost) {
        session.mode = FormMode::Creating;
        self.note(ui, Severity::Info, "edit cancelled");
    }

    pub fn remove(&self, session: &mut Session, id: i64, ui: &mut dyn UiHost) -> Result<()> {
        if !ui.confirm("Delete this student?") {
            return Err(RosterError::Cancelled);
        }
        self.store
            .delete(id)
            .map_err(|e| self.fail(ui, "failed to delete student", e))?;
        if session.mode == FormMode::Editing(id) {
            session.mode = FormMode::Creating;
        }
        self.load_all(session, ui)?;
        self.note(ui, Severity::Success, "student deleted");
        Ok(())
    }

    /// Filters without touching `session.current_records`.
    pub fn run_search(
        &self,
        session: &Session,
        term: &str,
        ui: &mut dyn UiHost,
    ) -> Result<SearchView> {
        let records = self
            .store
            .search(term)
            .map_err(|e| self.fail(ui, "failed to search students", e))?;
        Ok(SearchView {
            total: session.current_records.len(),
            found: records.len(),
            records,
        })
    }

    pub fn stats(&self, ui: &mut dyn UiHost) -> Result<StoreStats> {
        self.store
            .stats()
            .map_err(|e| self.fail(ui, "failed to compute stats", e))
    }

    pub fn seed_sample_data(&mut self, session: &mut Session, ui: &mut dyn UiHost) -> Result<usize> {
        if !ui.confirm("Add sample data? This adds 3 example students.") {
            return Err(RosterError::Cancelled);
        }
        let n = self
            .store
            .add_sample_data()
            .map_err(|e| self.fail(ui, "failed to add sample data", e))?;
        self.load_all(session, ui)?;
        self.note(ui, Severity::Success, "sample data added");
        Ok(n)
    }

    pub fn export_all(&self, ui: &mut dyn UiHost) -> Result<ExportBundle> {
        let bundle = self
            .store
            .export_all()
            .map_err(|e| self.fail(ui, "failed to export data", e))?;
        self.note(ui, Severity::Success, "data exported");
        Ok(bundle)
    }

    pub fn import_all(
        &mut self,
        session: &mut Session,
        json_text: &str,
        ui: &mut dyn UiHost,
    ) -> Result<usize> {
        if !ui.confirm("Import data? This replaces every current student.") {
            return Err(RosterError::Cancelled);
        }
        let n = match self.store.import_all(json_text) {
            Ok(n) => n,
            Err(e) => return Err(self.fail(ui, "failed to import data", e)),
        };
        session.mode = FormMode::Creating;
        self.load_all(session, ui)?;
        self.note(ui, Severity::Success, "data imported");
        Ok(n)
    }

    pub fn clear(&self, session: &mut Session, ui: &mut dyn UiHost) -> Result<()> {
        if !ui.confirm("Delete every student?") {
            return Err(RosterError::Cancelled);
        }
        self.store
            .clear()
            .map_err(|e| self.fail(ui, "failed to clear students", e))?;
        session.mode = FormMode::Creating;
        self.load_all(session, ui)?;
        self.note(ui, Severity::Success, "all students deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(email: &str, grade: &str) -> StudentDraft {
        StudentDraft {
            first_name: "Rosa".into(),
            last_name: "Quispe".into(),
            email: email.into(),
            grade: grade.into(),
            enrollment_file: "MAT-1".into(),
        }
    }

    #[test]
    fn email_pattern_accepts_basic_addresses() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("juan.perez@colegio.edu"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("@c.com"));
        assert!(!is_valid_email("a@@c.com"));
    }

    #[test]
    fn validate_rejects_blank_fields_and_unknown_grades() {
        assert!(validate(&form("rosa@q.pe", "2do Primaria")).is_ok());

        let mut blank = form("rosa@q.pe", "2do Primaria");
        blank.last_name = "   ".into();
        assert!(matches!(validate(&blank), Err(RosterError::Validation(_))));

        assert!(matches!(
            validate(&form("rosa-at-q.pe", "2do Primaria")),
            Err(RosterError::Validation(_))
        ));
        assert!(matches!(
            validate(&form("rosa@q.pe", "7mo Primaria")),
            Err(RosterError::Validation(_))
        ));
    }

    #[test]
    fn form_mode_serializes_with_student_id() {
        let v = serde_json::to_value(FormMode::Editing(4)).expect("serialize");
        assert_eq!(v["mode"], "editing");
        assert_eq!(v["studentId"], 4);
        let v = serde_json::to_value(FormMode::Creating).expect("serialize");
        assert_eq!(v["mode"], "creating");
    }
}
