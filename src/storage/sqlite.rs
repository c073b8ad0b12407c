//! SQLite storage implementation.
//!
//! This module provides the data layer for shiftx: the employee roster,
//! monthly submissions and the job ledger of export runs. Writes go through
//! [`SqliteStorage::mutate`] for transaction discipline.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, Transaction};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{Employee, Submission, SubmissionDetail, SyncItem, SyncRun, YearMonth};
use crate::storage::schema::apply_schema;
use crate::sync::{JobLedger, RecordSource, SyncError, SyncResult};

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;

        if let Some(timeout) = timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        } else {
            // Default 5 second timeout
            conn.busy_timeout(Duration::from_secs(5))?;
        }

        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Get a reference to the underlying connection (for read operations).
    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Execute a mutation inside an IMMEDIATE transaction.
    ///
    /// The closure's writes are committed together or rolled back on error.
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails.
    pub fn mutate<F, R>(&mut self, op: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let result = f(&tx)?;
        tx.commit()?;

        debug!(op, "Mutation committed");
        Ok(result)
    }

    // ==================
    // Employee Operations
    // ==================

    /// Add an employee to the roster.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a blank code or name, or a code that
    /// is already taken.
    pub fn create_employee(
        &mut self,
        code: &str,
        display_name: &str,
        department: Option<&str>,
    ) -> Result<Employee> {
        let code = code.trim();
        let display_name = display_name.trim();
        if code.is_empty() || display_name.is_empty() {
            return Err(Error::InvalidArgument(
                "Employee code and name must not be empty".to_string(),
            ));
        }

        let mut employee = Employee::new(
            code.to_string(),
            display_name.to_string(),
            department.map(str::to_string),
        );

        let id = self
            .mutate("create_employee", |tx| {
                tx.execute(
                    "INSERT INTO employees (code, display_name, department, is_active, created_at)
                     VALUES (?1, ?2, ?3, 1, ?4)",
                    rusqlite::params![
                        employee.code,
                        employee.display_name,
                        employee.department,
                        employee.created_at
                    ],
                )?;
                Ok(tx.last_insert_rowid())
            })
            .map_err(|e| match e {
                Error::Database(ref db) if is_constraint_violation(db) => {
                    Error::InvalidArgument(format!("Employee code '{code}' already exists"))
                }
                other => other,
            })?;

        employee.id = id;
        Ok(employee)
    }

    /// Get an employee by numeric ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_employee(&self, id: i64) -> Result<Option<Employee>> {
        let employee = self
            .conn
            .query_row(
                "SELECT id, code, display_name, department, is_active, created_at
                 FROM employees WHERE id = ?1",
                [id],
                map_employee_row,
            )
            .optional()?;
        Ok(employee)
    }

    /// Find an employee by code, falling back to numeric ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_employee(&self, code_or_id: &str) -> Result<Option<Employee>> {
        let by_code = self
            .conn
            .query_row(
                "SELECT id, code, display_name, department, is_active, created_at
                 FROM employees WHERE code = ?1",
                [code_or_id],
                map_employee_row,
            )
            .optional()?;

        match (by_code, code_or_id.parse::<i64>()) {
            (Some(employee), _) => Ok(Some(employee)),
            (None, Ok(id)) => self.get_employee(id),
            (None, Err(_)) => Ok(None),
        }
    }

    /// List employees ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_employees(&self, include_inactive: bool) -> Result<Vec<Employee>> {
        let sql = if include_inactive {
            "SELECT id, code, display_name, department, is_active, created_at
             FROM employees ORDER BY id"
        } else {
            "SELECT id, code, display_name, department, is_active, created_at
             FROM employees WHERE is_active = 1 ORDER BY id"
        };

        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], map_employee_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    /// Activate or deactivate an employee.
    ///
    /// Inactive employees stay in the roster export with `is_active = 0`.
    ///
    /// # Errors
    ///
    /// Returns `EmployeeNotFound` if no employee has this ID.
    pub fn set_employee_active(&mut self, id: i64, active: bool) -> Result<()> {
        let updated = self.mutate("set_employee_active", |tx| {
            Ok(tx.execute(
                "UPDATE employees SET is_active = ?1 WHERE id = ?2",
                rusqlite::params![active, id],
            )?)
        })?;

        if updated == 0 {
            return Err(Error::EmployeeNotFound { id: id.to_string() });
        }
        Ok(())
    }

    // ==================
    // Submission Operations
    // ==================

    /// Store a submission header and its details in one transaction.
    ///
    /// # Errors
    ///
    /// - `EmployeeNotFound` if the employee does not exist.
    /// - `InvalidArgument` if a date falls outside `month` or repeats.
    pub fn create_submission(
        &mut self,
        month: YearMonth,
        employee_id: i64,
        details: &[SubmissionDetail],
    ) -> Result<Submission> {
        if self.get_employee(employee_id)?.is_none() {
            return Err(Error::EmployeeNotFound {
                id: employee_id.to_string(),
            });
        }
        if let Some(outside) = details.iter().find(|d| !month.contains(d.target_date)) {
            return Err(Error::InvalidArgument(format!(
                "Date {} is outside month {month}",
                outside.target_date
            )));
        }

        let submitted_at = chrono::Utc::now().timestamp_millis();

        let (id, stored) = self
            .mutate("create_submission", |tx| {
                tx.execute(
                    "INSERT INTO submissions (year_month, employee_id, submitted_at)
                     VALUES (?1, ?2, ?3)",
                    rusqlite::params![month.to_string(), employee_id, submitted_at],
                )?;
                let submission_id = tx.last_insert_rowid();

                let mut stored = Vec::with_capacity(details.len());
                for detail in details {
                    tx.execute(
                        "INSERT INTO submission_details (submission_id, target_date, availability, time_range)
                         VALUES (?1, ?2, ?3, ?4)",
                        rusqlite::params![
                            submission_id,
                            detail.target_date.to_string(),
                            detail.availability.as_str(),
                            detail.time_range
                        ],
                    )?;
                    stored.push(SubmissionDetail {
                        id: tx.last_insert_rowid(),
                        ..detail.clone()
                    });
                }

                Ok((submission_id, stored))
            })
            .map_err(|e| match e {
                Error::Database(ref db) if is_constraint_violation(db) => {
                    Error::InvalidArgument("A date appears twice in one submission".to_string())
                }
                other => other,
            })?;

        Ok(Submission {
            id,
            year_month: month,
            employee_id,
            submitted_at,
            details: stored,
        })
    }

    /// All submissions for `month` with their details, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_submissions(&self, month: YearMonth) -> Result<Vec<Submission>> {
        let key = month.to_string();

        let mut detail_stmt = self.conn.prepare(
            "SELECT d.submission_id, d.id, d.target_date, d.availability, d.time_range
             FROM submission_details d
             JOIN submissions s ON s.id = d.submission_id
             WHERE s.year_month = ?1
             ORDER BY d.submission_id, d.target_date",
        )?;
        let mut details: HashMap<i64, Vec<SubmissionDetail>> = HashMap::new();
        let rows = detail_stmt.query_map([&key], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                SubmissionDetail {
                    id: row.get(1)?,
                    target_date: parse_column(row, 2)?,
                    availability: parse_column(row, 3)?,
                    time_range: row.get(4)?,
                },
            ))
        })?;
        for row in rows {
            let (submission_id, detail) = row?;
            details.entry(submission_id).or_default().push(detail);
        }

        let mut stmt = self.conn.prepare(
            "SELECT id, year_month, employee_id, submitted_at
             FROM submissions WHERE year_month = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([&key], |row| {
            Ok(Submission {
                id: row.get(0)?,
                year_month: parse_column(row, 1)?,
                employee_id: row.get(2)?,
                submitted_at: row.get(3)?,
                details: Vec::new(),
            })
        })?;

        let mut submissions = Vec::new();
        for row in rows {
            let mut submission = row?;
            submission.details = details.remove(&submission.id).unwrap_or_default();
            submissions.push(submission);
        }
        Ok(submissions)
    }

    // ==================
    // Job Ledger Operations
    // ==================

    /// Insert a freshly started run.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_run(&mut self, run: &SyncRun) -> Result<()> {
        self.mutate("create_run", |tx| {
            tx.execute(
                "INSERT INTO sync_runs (id, dataset_key, trigger_kind, actor, status, started_at, finished_at, error_summary)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    run.id,
                    run.dataset_key,
                    run.trigger.as_str(),
                    run.actor,
                    run.status.as_str(),
                    run.started_at,
                    run.finished_at,
                    run.error_summary
                ],
            )?;
            Ok(())
        })
    }

    /// Append one item to a run.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails (e.g., unknown run).
    pub fn insert_item(&mut self, run_id: &str, item: &SyncItem) -> Result<()> {
        self.mutate("record_item", |tx| {
            tx.execute(
                "INSERT INTO sync_items (run_id, record_id, status, error) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![run_id, item.record_id, item.status.as_str(), item.error],
            )?;
            Ok(())
        })
    }

    /// Store the terminal state of a run.
    ///
    /// Only a `running` row is updated, so a finished run never changes.
    ///
    /// # Errors
    ///
    /// Returns `RunNotFound` if no running run has this ID.
    pub fn update_run(&mut self, run: &SyncRun) -> Result<()> {
        let updated = self.mutate("finish_run", |tx| {
            Ok(tx.execute(
                "UPDATE sync_runs SET status = ?1, finished_at = ?2, error_summary = ?3
                 WHERE id = ?4 AND status = 'running'",
                rusqlite::params![
                    run.status.as_str(),
                    run.finished_at,
                    run.error_summary,
                    run.id
                ],
            )?)
        })?;

        if updated == 0 {
            return Err(Error::RunNotFound { id: run.id.clone() });
        }
        Ok(())
    }

    /// Get a run by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_run(&self, id: &str) -> Result<Option<SyncRun>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, dataset_key, trigger_kind, actor, status, started_at, finished_at, error_summary
                 FROM sync_runs WHERE id = ?1",
                [id],
                map_run_row,
            )
            .optional()?;
        Ok(run)
    }

    /// List runs, newest first, optionally for one dataset.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_runs(&self, dataset_key: Option<&str>, limit: u32) -> Result<Vec<SyncRun>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, dataset_key, trigger_kind, actor, status, started_at, finished_at, error_summary
             FROM sync_runs
             WHERE ?1 IS NULL OR dataset_key = ?1
             ORDER BY started_at DESC, rowid DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(rusqlite::params![dataset_key, limit], map_run_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    /// Items of a run in the order they were recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_run_items(&self, run_id: &str) -> Result<Vec<SyncItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT record_id, status, error FROM sync_items WHERE run_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([run_id], |row| {
            Ok(SyncItem {
                record_id: row.get(0)?,
                status: parse_column(row, 1)?,
                error: row.get(2)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }
}

// ==================
// Export Seams
// ==================

fn ledger_err(err: Error) -> SyncError {
    SyncError::Database(err.to_string())
}

impl RecordSource for SqliteStorage {
    fn list_submissions_for_month(&self, month: YearMonth) -> SyncResult<Vec<Submission>> {
        self.list_submissions(month).map_err(ledger_err)
    }

    fn list_all_employees(&self) -> SyncResult<Vec<Employee>> {
        self.list_employees(true).map_err(ledger_err)
    }
}

impl JobLedger for SqliteStorage {
    fn create_run(&mut self, run: &SyncRun) -> SyncResult<()> {
        self.insert_run(run).map_err(ledger_err)
    }

    fn record_item(&mut self, run_id: &str, item: &SyncItem) -> SyncResult<()> {
        self.insert_item(run_id, item).map_err(ledger_err)
    }

    fn finish_run(&mut self, run: &SyncRun) -> SyncResult<()> {
        self.update_run(run).map_err(ledger_err)
    }
}

// ==================
// Row Mapping
// ==================

fn map_employee_row(row: &rusqlite::Row) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: row.get(0)?,
        code: row.get(1)?,
        display_name: row.get(2)?,
        department: row.get(3)?,
        is_active: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn map_run_row(row: &rusqlite::Row) -> rusqlite::Result<SyncRun> {
    Ok(SyncRun {
        id: row.get(0)?,
        dataset_key: row.get(1)?,
        trigger: parse_column(row, 2)?,
        actor: row.get(3)?,
        status: parse_column(row, 4)?,
        started_at: row.get(5)?,
        finished_at: row.get(6)?,
        error_summary: row.get(7)?,
    })
}

/// Read a TEXT column and parse it into a domain value.
fn parse_column<T>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: T::Err| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
