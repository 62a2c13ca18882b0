use rosterd::manager::{ManagerOptions, Notification, Severity, SubmitOutcome};
use rosterd::{FormMode, RecordManager, RecordStore, RosterError, Session, StudentDraft, UiHost};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Default)]
struct ScriptedHost {
    answer: bool,
    prompts: Vec<String>,
    notes: Vec<Notification>,
}

impl ScriptedHost {
    fn accepting() -> Self {
        Self {
            answer: true,
            ..Default::default()
        }
    }

    fn last(&self) -> &Notification {
        self.notes.last().expect("at least one notification")
    }
}

impl UiHost for ScriptedHost {
    fn confirm(&mut self, prompt: &str) -> bool {
        self.prompts.push(prompt.to_string());
        self.answer
    }

    fn notify(&mut self, notification: Notification) {
        self.notes.push(notification);
    }
}

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn manager(seed: bool) -> (RecordManager, Session, ScriptedHost) {
    let opts = ManagerOptions {
        seed_on_first_run: seed,
        ..Default::default()
    };
    let mut m = RecordManager::new(RecordStore::in_memory(), opts);
    let mut session = Session::default();
    let mut host = ScriptedHost::accepting();
    m.initialize(&mut session, &mut host).expect("initialize");
    (m, session, host)
}

fn form(email: &str, file: &str) -> StudentDraft {
    StudentDraft {
        first_name: "Pedro".into(),
        last_name: "Mamani".into(),
        email: email.into(),
        grade: "6to Primaria".into(),
        enrollment_file: file.into(),
    }
}

#[test]
fn first_run_seeds_sample_students() {
    let (m, session, host) = manager(true);
    assert_eq!(session.current_records.len(), 3);
    assert_eq!(host.last().severity, Severity::Success);

    let mut host = ScriptedHost::accepting();
    let stats = m.stats(&mut host).expect("stats");
    assert_eq!(stats.total, 3);
    assert_eq!(stats.by_grade.len(), 3);
    assert!(stats.by_grade.values().all(|&n| n == 1));
}

#[test]
fn seed_on_empty_store_gives_three_grades() {
    let (mut m, mut session, mut host) = manager(false);
    assert!(session.current_records.is_empty());
    let added = m.seed_sample_data(&mut session, &mut host).expect("seed");
    assert_eq!(added, 3);
    assert_eq!(host.prompts.len(), 1);
    let stats = m.stats(&mut host).expect("stats");
    assert_eq!(stats.total, 3);
    assert_eq!(stats.by_grade.get("5to Primaria"), Some(&1));
    assert_eq!(stats.by_grade.get("3ro Secundaria"), Some(&1));
    assert_eq!(stats.by_grade.get("1ro Primaria"), Some(&1));
}

#[test]
fn create_trims_and_returns_to_create_mode() {
    let (mut m, mut session, mut host) = manager(false);
    let raw = StudentDraft {
        first_name: "  Pedro ".into(),
        enrollment_file: " F1 ".into(),
        email: " a@b.com".into(),
        ..form("", "")
    };
    let out = m.submit(&mut session, &raw, &mut host).expect("submit");
    let SubmitOutcome::Created(id) = out else {
        panic!("expected create, got {out:?}");
    };
    assert_eq!(session.mode, FormMode::Creating);
    assert_eq!(session.current_records.len(), 1);
    let rec = &session.current_records[0];
    assert_eq!(rec.id, id);
    assert_eq!(rec.first_name, "Pedro");
    assert_eq!(rec.email, "a@b.com");
    assert_eq!(rec.enrollment_file, "F1");
    assert_eq!(host.last().severity, Severity::Success);
}

#[test]
fn duplicate_email_is_rejected_and_store_keeps_one_record() {
    let (mut m, mut session, mut host) = manager(false);
    m.submit(&mut session, &form("a@b.com", "F1"), &mut host)
        .expect("first");
    let res = m.submit(&mut session, &form("a@b.com", "F2"), &mut host);
    assert!(matches!(res, Err(RosterError::Constraint { field: "email" })));
    assert_eq!(host.last().severity, Severity::Error);
    assert_eq!(m.store().count().expect("count"), 1);
    assert!(!session.is_loading);
}

#[test]
fn validation_failure_never_reaches_the_store() {
    let (mut m, mut session, mut host) = manager(false);
    let mut bad = form("not-an-email", "F1");
    let res = m.submit(&mut session, &bad, &mut host);
    assert!(matches!(res, Err(RosterError::Validation(_))));

    bad.email = "ok@b.com".into();
    bad.last_name = "   ".into();
    let res = m.submit(&mut session, &bad, &mut host);
    assert!(matches!(res, Err(RosterError::Validation(_))));

    assert!(m.store().is_empty().expect("empty"));
    assert_eq!(host.last().severity, Severity::Error);
}

#[test]
fn edit_with_unchanged_unique_fields_succeeds() {
    let (mut m, mut session, mut host) = manager(true);
    let target = session.current_records[0].clone();

    let rec = m
        .begin_edit(&mut session, target.id, &mut host)
        .expect("begin edit");
    assert_eq!(session.mode, FormMode::Editing(target.id));
    assert_eq!(host.last().severity, Severity::Info);

    let mut edited = rec.draft();
    edited.last_name = "Pérez Gómez".into();
    let out = m
        .submit(&mut session, &edited, &mut host)
        .expect("submit edit");
    assert_eq!(out, SubmitOutcome::Updated(target.id));
    assert_eq!(session.mode, FormMode::Creating);

    let saved = m
        .store()
        .get(target.id)
        .expect("get")
        .expect("still present");
    assert_eq!(saved.last_name, "Pérez Gómez");
    assert_eq!(saved.email, target.email);
    assert_eq!(saved.created_at, target.created_at);
}

#[test]
fn edit_into_another_students_file_is_rejected() {
    let (mut m, mut session, mut host) = manager(true);
    let a = session.current_records[0].clone();
    let b = session.current_records[1].clone();
    m.begin_edit(&mut session, a.id, &mut host).expect("edit");

    let mut edited = a.draft();
    edited.enrollment_file = b.enrollment_file.clone();
    let res = m.submit(&mut session, &edited, &mut host);
    assert!(matches!(
        res,
        Err(RosterError::Constraint {
            field: "enrollmentFile"
        })
    ));
    // A failed save keeps the form in edit mode.
    assert_eq!(session.mode, FormMode::Editing(a.id));
}

#[test]
fn cancel_edit_returns_to_create_mode() {
    let (m, mut session, mut host) = manager(true);
    let id = session.current_records[0].id;
    m.begin_edit(&mut session, id, &mut host).expect("edit");
    m.cancel_edit(&mut session, &mut host);
    assert_eq!(session.mode, FormMode::Creating);
}

#[test]
fn begin_edit_on_missing_record_is_not_found() {
    let (m, mut session, mut host) = manager(false);
    let res = m.begin_edit(&mut session, 77, &mut host);
    assert!(matches!(res, Err(RosterError::NotFound(77))));
    assert_eq!(session.mode, FormMode::Creating);
}

#[test]
fn submit_while_loading_is_skipped() {
    let (mut m, mut session, mut host) = manager(false);
    session.is_loading = true;
    let out = m
        .submit(&mut session, &form("a@b.com", "F1"), &mut host)
        .expect("submit");
    assert_eq!(out, SubmitOutcome::Skipped);
    assert!(m.store().is_empty().expect("empty"));
}

#[test]
fn remove_requires_confirmation() {
    let (m, mut session, _) = manager(true);
    let id = session.current_records[0].id;

    let mut declining = ScriptedHost::default();
    let res = m.remove(&mut session, id, &mut declining);
    assert!(matches!(res, Err(RosterError::Cancelled)));
    assert_eq!(declining.prompts.len(), 1);
    assert!(m.store().get(id).expect("get").is_some());

    let mut host = ScriptedHost::accepting();
    m.remove(&mut session, id, &mut host).expect("remove");
    assert!(m.store().get(id).expect("get").is_none());
    assert_eq!(session.current_records.len(), 2);
}

#[test]
fn removing_the_edited_record_leaves_edit_mode() {
    let (m, mut session, mut host) = manager(true);
    let id = session.current_records[2].id;
    m.begin_edit(&mut session, id, &mut host).expect("edit");
    m.remove(&mut session, id, &mut host).expect("remove");
    assert_eq!(session.mode, FormMode::Creating);
}

#[test]
fn search_reports_total_and_found_without_touching_snapshot() {
    let (m, session, mut host) = manager(true);
    let view = m
        .run_search(&session, "secundaria", &mut host)
        .expect("search");
    assert_eq!(view.total, 3);
    assert_eq!(view.found, 1);
    assert_eq!(view.records[0].first_name, "María");
    assert_eq!(session.current_records.len(), 3);

    let view = m.run_search(&session, "", &mut host).expect("blank search");
    assert_eq!(view.found, 3);
}

#[test]
fn import_is_confirmed_and_malformed_payload_keeps_data() {
    let (mut m, mut session, _) = manager(true);
    let mut host = ScriptedHost::accepting();
    let bundle = m.export_all(&mut host).expect("export");

    let res = m.import_all(&mut session, "[{]", &mut host);
    assert!(matches!(res, Err(RosterError::Parse(_))));
    assert_eq!(m.store().count().expect("count"), 3);
    assert_eq!(host.last().severity, Severity::Error);

    let mut declining = ScriptedHost::default();
    let res = m.import_all(&mut session, &bundle.json, &mut declining);
    assert!(matches!(res, Err(RosterError::Cancelled)));

    let n = m
        .import_all(&mut session, &bundle.json, &mut host)
        .expect("import");
    assert_eq!(n, 3);
    assert_eq!(session.current_records.len(), 3);
}

#[test]
fn initialize_failure_leaves_operations_not_initialized() {
    let dir = temp_dir("rosterd-init-fail");
    // A directory where the database file should be makes the open fail.
    std::fs::create_dir_all(dir.join(rosterd::db::DB_FILE_NAME)).expect("block db path");

    let mut m = RecordManager::new(RecordStore::in_workspace(&dir), ManagerOptions::default());
    let mut session = Session::default();
    let mut host = ScriptedHost::accepting();
    let res = m.initialize(&mut session, &mut host);
    assert!(matches!(res, Err(RosterError::Connection(_))));
    assert_eq!(host.last().severity, Severity::Error);

    let res = m.submit(&mut session, &form("a@b.com", "F1"), &mut host);
    assert!(matches!(res, Err(RosterError::NotInitialized)));
    assert!(!session.is_loading);

    let _ = std::fs::remove_dir_all(dir);
}
