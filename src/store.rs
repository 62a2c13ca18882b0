//! SQLite-backed collection of student records.

use crate::db::{self, DbLocation};
use crate::error::{Result, RosterError};
use crate::model::{sample_students, StoreStats, StudentDraft, StudentPatch, StudentRecord};
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::time::Duration;

const SELECT_STUDENT: &str = "SELECT id, first_name, last_name, email, grade, enrollment_file, created_at, updated_at
     FROM students";

pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Current time as an ISO 8601 UTC string with millisecond precision.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serialized records plus the file name suggested for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBundle {
    pub file_name: String,
    pub json: String,
    pub record_count: usize,
}

impl ExportBundle {
    pub fn write_into(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, self.json.as_bytes())?;
        Ok(path)
    }
}

pub struct RecordStore {
    location: DbLocation,
    busy_timeout: Duration,
    conn: Option<Connection>,
}

impl RecordStore {
    pub fn new(location: DbLocation) -> Self {
        Self {
            location,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            conn: None,
        }
    }

    pub fn in_workspace(dir: impl Into<PathBuf>) -> Self {
        Self::new(DbLocation::Workspace(dir.into()))
    }

    /// An unopened in-memory store (for testing).
    pub fn in_memory() -> Self {
        Self::new(DbLocation::InMemory)
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Connects and runs any pending schema upgrade. No-op once open.
    pub fn open(&mut self) -> Result<()> {
        if self.conn.is_some() {
            return Ok(());
        }
        let conn = db::open_db(&self.location, self.busy_timeout).map_err(|e| {
            tracing::error!(error = %e, "failed to open student database");
            e
        })?;
        tracing::info!(location = ?self.location, "student database connected");
        self.conn = Some(conn);
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.conn.is_some()
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(RosterError::NotInitialized)
    }

    fn conn_mut(&mut self) -> Result<&mut Connection> {
        self.conn.as_mut().ok_or(RosterError::NotInitialized)
    }

    pub fn add(&self, draft: &StudentDraft) -> Result<i64> {
        let id = insert_student(self.conn()?, draft, &now_iso())?;
        tracing::debug!(id, "student added");
        Ok(id)
    }

    pub fn get(&self, id: i64) -> Result<Option<StudentRecord>> {
        get_student(self.conn()?, id)
    }

    /// Every record, in insertion order.
    pub fn get_all(&self) -> Result<Vec<StudentRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{SELECT_STUDENT} ORDER BY id"))?;
        let rows = stmt
            .query_map([], row_to_student)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Merges `patch` over the stored record and refreshes `updatedAt`.
    pub fn update(&mut self, id: i64, patch: &StudentPatch) -> Result<StudentRecord> {
        let tx = self.conn_mut()?.transaction()?;
        let Some(mut rec) = get_student(&tx, id)? else {
            return Err(RosterError::NotFound(id));
        };
        patch.apply(&mut rec);
        let now = now_iso();
        // Clock skew must never put updatedAt before createdAt.
        rec.updated_at = if now < rec.created_at {
            rec.created_at.clone()
        } else {
            now
        };
        tx.execute(
            "UPDATE students
             SET first_name = ?1, last_name = ?2, email = ?3, grade = ?4,
                 enrollment_file = ?5, updated_at = ?6
             WHERE id = ?7",
            params![
                rec.first_name,
                rec.last_name,
                rec.email,
                rec.grade,
                rec.enrollment_file,
                rec.updated_at,
                id
            ],
        )
        .map_err(RosterError::from_write)?;
        tx.commit()?;
        tracing::debug!(id, "student updated");
        Ok(rec)
    }

    /// Hard delete. Missing ids are not an error.
    pub fn delete(&self, id: i64) -> Result<()> {
        let changed = self
            .conn()?
            .execute("DELETE FROM students WHERE id = ?1", [id])?;
        tracing::debug!(id, changed, "student delete");
        Ok(())
    }

    /// Case-insensitive substring match over the five text fields.
    /// A blank term returns everything; otherwise the term is matched as
    /// typed, surrounding whitespace included.
    pub fn search(&self, term: &str) -> Result<Vec<StudentRecord>> {
        let all = self.get_all()?;
        if term.trim().is_empty() {
            return Ok(all);
        }
        let needle = term.to_lowercase();
        Ok(all.into_iter().filter(|s| s.matches(&needle)).collect())
    }

    pub fn email_exists(&self, email: &str, exclude_id: Option<i64>) -> Result<bool> {
        self.value_exists("email", email, exclude_id)
    }

    pub fn enrollment_file_exists(&self, file: &str, exclude_id: Option<i64>) -> Result<bool> {
        self.value_exists("enrollment_file", file, exclude_id)
    }

    fn value_exists(&self, column: &str, value: &str, exclude_id: Option<i64>) -> Result<bool> {
        let sql = format!(
            "SELECT 1 FROM students WHERE {} = ?1 AND (?2 IS NULL OR id != ?2) LIMIT 1",
            column
        );
        let found: Option<i64> = self
            .conn()?
            .query_row(&sql, params![value, exclude_id], |r| r.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT grade, COUNT(*) FROM students GROUP BY grade")?;
        let mut stats = StoreStats::default();
        let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?;
        for row in rows {
            let (grade, n) = row?;
            stats.total += n as usize;
            stats.by_grade.insert(grade, n as usize);
        }
        Ok(stats)
    }

    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM students", [], |r| r.get(0))?;
        Ok(n as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.count()? == 0)
    }

    pub fn export_all(&self) -> Result<ExportBundle> {
        let students = self.get_all()?;
        let json = serde_json::to_string_pretty(&students)?;
        Ok(ExportBundle {
            file_name: export_file_name(),
            json,
            record_count: students.len(),
        })
    }

    /// Replaces the whole collection with the records in `json_text`.
    ///
    /// The payload is parsed and checked for blank required fields before
    /// anything is touched. Ids and timestamps in the payload are ignored;
    /// every record gets a fresh id. The clear and the inserts share one
    /// transaction, so a duplicate inside the payload leaves the previous
    /// collection in place.
    pub fn import_all(&mut self, json_text: &str) -> Result<usize> {
        let drafts: Vec<StudentDraft> =
            serde_json::from_str(json_text).map_err(|e| RosterError::Parse(e.to_string()))?;
        for (i, draft) in drafts.iter().enumerate() {
            if let Some(field) = draft.first_blank_field() {
                return Err(RosterError::Parse(format!("entry {i}: {field} is empty")));
            }
        }

        let tx = self.conn_mut()?.transaction()?;
        tx.execute("DELETE FROM students", [])?;
        let now = now_iso();
        for draft in &drafts {
            insert_student(&tx, draft, &now)?;
        }
        tx.commit()?;
        tracing::info!(count = drafts.len(), "students imported");
        Ok(drafts.len())
    }

    /// Removes every record. The id sequence keeps counting.
    pub fn clear(&self) -> Result<()> {
        self.conn()?.execute("DELETE FROM students", [])?;
        tracing::info!("students cleared");
        Ok(())
    }

    /// Inserts the sample students together; one collision keeps none.
    pub fn add_sample_data(&mut self) -> Result<usize> {
        let samples = sample_students();
        let tx = self.conn_mut()?.transaction()?;
        let now = now_iso();
        for s in &samples {
            insert_student(&tx, s, &now)?;
        }
        tx.commit()?;
        tracing::info!(count = samples.len(), "sample students added");
        Ok(samples.len())
    }
}

pub fn export_file_name() -> String {
    format!("estudiantes_{}.json", Utc::now().format("%Y-%m-%d"))
}

fn insert_student(conn: &Connection, draft: &StudentDraft, now: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO students(
           first_name,
           last_name,
           email,
           grade,
           enrollment_file,
           created_at,
           updated_at
         ) VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![
            draft.first_name,
            draft.last_name,
            draft.email,
            draft.grade,
            draft.enrollment_file,
            now
        ],
    )
    .map_err(RosterError::from_write)?;
    Ok(conn.last_insert_rowid())
}

fn get_student(conn: &Connection, id: i64) -> Result<Option<StudentRecord>> {
    Ok(conn
        .query_row(&format!("{SELECT_STUDENT} WHERE id = ?1"), [id], row_to_student)
        .optional()?)
}

fn row_to_student(row: &Row<'_>) -> rusqlite::Result<StudentRecord> {
    Ok(StudentRecord {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        grade: row.get(4)?,
        enrollment_file: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}
