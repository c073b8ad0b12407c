//! Database schema definitions.
//!
//! The data layer holds the roster, the monthly submissions with their
//! per-day details, and the job ledger of export runs.

use rusqlite::{Connection, Result};

/// Current schema version for migration tracking.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the shiftx database.
///
/// Note: Timestamps are stored as INTEGER (Unix milliseconds). Dates and
/// year-months are stored as ISO TEXT so they sort lexically.
pub const SCHEMA_SQL: &str = r"
-- ====================
-- Schema Version Tracking
-- ====================

CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at INTEGER NOT NULL
);

-- ====================
-- Roster
-- ====================

CREATE TABLE IF NOT EXISTS employees (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL,
    department TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_employees_active ON employees(is_active);

-- ====================
-- Submissions
-- ====================

CREATE TABLE IF NOT EXISTS submissions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    year_month TEXT NOT NULL,
    employee_id INTEGER NOT NULL,
    submitted_at INTEGER NOT NULL,
    FOREIGN KEY (employee_id) REFERENCES employees(id)
);

CREATE INDEX IF NOT EXISTS idx_submissions_month ON submissions(year_month);
CREATE INDEX IF NOT EXISTS idx_submissions_employee ON submissions(employee_id);

CREATE TABLE IF NOT EXISTS submission_details (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    submission_id INTEGER NOT NULL,
    target_date TEXT NOT NULL,
    availability TEXT NOT NULL CHECK (availability IN ('available', 'unavailable', 'tentative')),
    time_range TEXT,
    UNIQUE (submission_id, target_date),
    FOREIGN KEY (submission_id) REFERENCES submissions(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_details_submission ON submission_details(submission_id);

-- ====================
-- Job Ledger
-- ====================

CREATE TABLE IF NOT EXISTS sync_runs (
    id TEXT PRIMARY KEY,
    dataset_key TEXT NOT NULL,
    trigger_kind TEXT NOT NULL CHECK (trigger_kind IN ('automatic', 'manual', 'retry')),
    actor TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'running' CHECK (status IN ('running', 'success', 'failed')),
    started_at INTEGER NOT NULL,
    finished_at INTEGER,
    error_summary TEXT
);

CREATE INDEX IF NOT EXISTS idx_runs_dataset ON sync_runs(dataset_key, started_at);
CREATE INDEX IF NOT EXISTS idx_runs_status ON sync_runs(status);

CREATE TABLE IF NOT EXISTS sync_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id TEXT NOT NULL,
    record_id TEXT NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('success', 'failed')),
    error TEXT,
    FOREIGN KEY (run_id) REFERENCES sync_runs(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_items_run ON sync_items(run_id);
";

/// Apply the schema to a database connection.
///
/// Sets pragmas, creates tables if missing and records the schema version.
///
/// # Errors
///
/// Returns an error if any statement fails.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;

    conn.execute_batch(SCHEMA_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
        rusqlite::params![
            format!("v{CURRENT_SCHEMA_VERSION}"),
            chrono::Utc::now().timestamp_millis()
        ],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        apply_schema(&conn).unwrap();

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }

    #[test]
    fn test_availability_check_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO employees (code, display_name, created_at) VALUES ('E1', 'Aiko', 0)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO submissions (year_month, employee_id, submitted_at) VALUES ('2026-03', 1, 0)",
            [],
        )
        .unwrap();

        let bad = conn.execute(
            "INSERT INTO submission_details (submission_id, target_date, availability) VALUES (1, '2026-03-01', 'sometimes')",
            [],
        );
        assert!(bad.is_err());
    }
}
