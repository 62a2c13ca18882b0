use crate::error::{Result, RosterError};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DB_FILE_NAME: &str = "roster.sqlite3";

/// Bumped whenever the students table or its index set changes.
pub const SCHEMA_VERSION: i64 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    Workspace(PathBuf),
    InMemory,
}

pub fn open_db(location: &DbLocation, busy_timeout: Duration) -> Result<Connection> {
    let conn = match location {
        DbLocation::Workspace(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| {
                RosterError::Connection(format!("{}: {}", dir.to_string_lossy(), e))
            })?;
            Connection::open(dir.join(DB_FILE_NAME))
        }
        DbLocation::InMemory => Connection::open_in_memory(),
    }
    .map_err(|e| RosterError::Connection(e.to_string()))?;

    conn.busy_timeout(busy_timeout)
        .map_err(|e| RosterError::Connection(e.to_string()))?;
    migrate(&conn).map_err(|e| match e {
        RosterError::Connection(msg) => RosterError::Connection(msg),
        other => RosterError::Connection(other.to_string()),
    })?;
    Ok(conn)
}

pub fn schema_version(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("PRAGMA user_version", [], |r| r.get(0))?)
}

fn migrate(conn: &Connection) -> Result<()> {
    let current = schema_version(conn)?;
    if current > SCHEMA_VERSION {
        return Err(RosterError::Connection(format!(
            "database schema version {} is newer than supported version {}",
            current, SCHEMA_VERSION
        )));
    }
    if current == SCHEMA_VERSION {
        return Ok(());
    }

    tracing::info!(
        from = current,
        to = SCHEMA_VERSION,
        "upgrading students schema"
    );
    // Upgrades rebuild the collection from scratch; rows from older
    // versions are not carried over.
    conn.execute_batch(&format!(
        "BEGIN;
         DROP TABLE IF EXISTS students;
         {CREATE_STUDENTS_TABLE}
         {CREATE_INDEXES}
         PRAGMA user_version = {SCHEMA_VERSION};
         COMMIT;"
    ))?;
    Ok(())
}

const CREATE_STUDENTS_TABLE: &str = "CREATE TABLE students(
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    grade TEXT NOT NULL,
    enrollment_file TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);";

const CREATE_INDEXES: &str = "
CREATE INDEX IF NOT EXISTS idx_students_first_name ON students(first_name);
CREATE INDEX IF NOT EXISTS idx_students_last_name ON students(last_name);
CREATE INDEX IF NOT EXISTS idx_students_grade ON students(grade);
CREATE INDEX IF NOT EXISTS idx_students_created_at ON students(created_at);
";

/// Names of the indexes on `students`, including the implicit ones SQLite
/// creates for `UNIQUE` columns.
pub fn student_indexes(conn: &Connection) -> Result<Vec<(String, bool)>> {
    let mut stmt = conn.prepare("PRAGMA index_list(students)")?;
    let rows = stmt
        .query_map([], |row| {
            let name: String = row.get(1)?;
            let unique: i64 = row.get(2)?;
            Ok((name, unique != 0))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn workspace_db_exists(workspace: &Path) -> bool {
    workspace.join(DB_FILE_NAME).is_file()
}
