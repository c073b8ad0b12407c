//! Export run orchestration.
//!
//! One run exports a month's submissions and the employee roster:
//!
//! 1. Create the run (`running`) in the job ledger.
//! 2. Project every submission concurrently; wait for all to settle.
//! 3. Record one item per submission, success or failure.
//! 4. Sort the surviving rows by natural key.
//! 5. Export the submissions dataset, then the roster dataset.
//! 6. Finish the run and hand back the report.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::model::{Employee, Submission, SyncItem, SyncRun, TriggerKind, YearMonth};
use crate::sync::dataset::Dataset;
use crate::sync::project::{employee_names, project_employee, project_submission, sort_rows};
use crate::sync::types::{RunReport, RunSummary, SyncError, SyncResult};
use crate::sync::writer::ArtifactWriter;

/// Reads the current records the export is built from.
pub trait RecordSource {
    /// All submissions for `month`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be read.
    fn list_submissions_for_month(&self, month: YearMonth) -> SyncResult<Vec<Submission>>;

    /// Every employee, active or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be read.
    fn list_all_employees(&self) -> SyncResult<Vec<Employee>>;
}

/// Persists runs and their items.
pub trait JobLedger {
    /// Persist a freshly started run.
    ///
    /// # Errors
    ///
    /// Returns an error if the run cannot be stored.
    fn create_run(&mut self, run: &SyncRun) -> SyncResult<()>;

    /// Persist the outcome of one record attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if the item cannot be stored.
    fn record_item(&mut self, run_id: &str, item: &SyncItem) -> SyncResult<()>;

    /// Persist the terminal state of a run.
    ///
    /// # Errors
    ///
    /// Returns an error if the run cannot be updated.
    fn finish_run(&mut self, run: &SyncRun) -> SyncResult<()>;
}

/// Coordinates export runs against one export root.
#[derive(Debug)]
pub struct Orchestrator {
    export_root: PathBuf,
    writer: Arc<ArtifactWriter>,
}

impl Orchestrator {
    /// Create an orchestrator with its own writer.
    #[must_use]
    pub fn new(export_root: PathBuf) -> Self {
        Self::with_writer(export_root, Arc::new(ArtifactWriter::new()))
    }

    /// Create an orchestrator sharing `writer` (and its dataset locks).
    #[must_use]
    pub fn with_writer(export_root: PathBuf, writer: Arc<ArtifactWriter>) -> Self {
        Self {
            export_root,
            writer,
        }
    }

    #[must_use]
    pub fn export_root(&self) -> &Path {
        &self.export_root
    }

    #[must_use]
    pub fn writer(&self) -> &ArtifactWriter {
        &self.writer
    }

    /// Fetch the month's records from `store` and run the export.
    ///
    /// # Errors
    ///
    /// See [`Orchestrator::run`]; also fails if the records cannot be read.
    pub async fn run_from_source<S>(
        &self,
        store: &mut S,
        month: YearMonth,
        trigger: TriggerKind,
        actor: &str,
    ) -> SyncResult<RunReport>
    where
        S: RecordSource + JobLedger,
    {
        let submissions = store.list_submissions_for_month(month)?;
        let employees = store.list_all_employees()?;
        self.run(store, month, trigger, actor, submissions, employees)
            .await
    }

    /// Export `submissions` for `month` plus the roster built from `employees`.
    ///
    /// A record that fails projection is recorded as a failed item and the
    /// run continues. The run ends `failed` if any item or dataset failed.
    ///
    /// # Errors
    ///
    /// - [`SyncError::NoRecords`] if `submissions` is empty; no run is created.
    /// - [`SyncError::DatasetExport`] if a dataset could not be written; the
    ///   run is still finished in the ledger.
    /// - Ledger errors. Once the run exists, a failed item write still lets
    ///   both datasets export and the run finish as `failed`; the first such
    ///   error is returned after `finish_run`.
    pub async fn run<L: JobLedger>(
        &self,
        ledger: &mut L,
        month: YearMonth,
        trigger: TriggerKind,
        actor: &str,
        submissions: Vec<Submission>,
        employees: Vec<Employee>,
    ) -> SyncResult<RunReport> {
        let dataset = Dataset::submissions(&self.export_root, month);
        let roster_dataset = Dataset::employees(&self.export_root);

        if submissions.is_empty() {
            return Err(SyncError::NoRecords {
                dataset: dataset.key(),
            });
        }

        let mut run = SyncRun::start(&dataset.key(), trigger, actor);
        ledger.create_run(&run)?;
        info!(
            run_id = %run.id,
            dataset = %dataset.key(),
            trigger = %trigger,
            records = submissions.len(),
            "Starting export run"
        );

        let names = Arc::new(employee_names(&employees));
        let attempts = submissions.into_iter().map(|submission| {
            let names = Arc::clone(&names);
            async move {
                let record_id = submission.id.to_string();
                let result =
                    tokio::task::spawn_blocking(move || project_submission(&submission, &names))
                        .await
                        .unwrap_or_else(|e| Err(SyncError::Task(e.to_string())));
                (record_id, result)
            }
        });
        let settled = join_all(attempts).await;

        let mut summary = RunSummary {
            total: settled.len(),
            ..RunSummary::default()
        };
        let mut errors = Vec::new();
        let mut ledger_error = None;
        let mut items = Vec::with_capacity(settled.len());
        let mut rows = Vec::new();

        for (record_id, result) in settled {
            let item = match result {
                Ok(projected) => {
                    summary.success += 1;
                    rows.extend(projected);
                    SyncItem::success(record_id)
                }
                Err(e) => {
                    warn!(run_id = %run.id, record_id = %record_id, error = %e, "Record failed");
                    summary.failed += 1;
                    errors.push(format!("record {record_id}: {e}"));
                    SyncItem::failed(record_id, e.to_string())
                }
            };
            if let Err(e) = ledger.record_item(&run.id, &item) {
                warn!(
                    run_id = %run.id,
                    record_id = %item.record_id,
                    error = %e,
                    "Could not record item"
                );
                errors.push(format!("ledger: {e}"));
                if ledger_error.is_none() {
                    ledger_error = Some(e);
                }
            }
            items.push(item);
        }

        sort_rows(&mut rows);

        let mut roster_rows: Vec<_> = employees.iter().map(project_employee).collect();
        sort_rows(&mut roster_rows);

        let primary = self.writer.write_if_changed(&dataset, rows).await;
        let roster = self.writer.write_if_changed(&roster_dataset, roster_rows).await;

        let mut failures = Vec::new();
        let mut completed = Vec::new();
        for (key, result) in [(dataset.key(), &primary), (roster_dataset.key(), &roster)] {
            match result {
                Ok(outcome) => completed.push(outcome.clone()),
                Err(e) => failures.push(format!("{key}: {e}")),
            }
        }
        errors.extend(failures.iter().cloned());

        run.finish(&errors);
        ledger.finish_run(&run)?;
        if let Some(e) = ledger_error {
            return Err(e);
        }

        let (submissions, roster) = match (primary, roster) {
            (Ok(submissions), Ok(roster)) => (submissions, roster),
            _ => {
                warn!(run_id = %run.id, failures = ?failures, "Export run failed to write datasets");
                return Err(SyncError::DatasetExport {
                    run_id: run.id,
                    failures,
                    completed,
                });
            }
        };

        summary.submissions_diff = submissions.diff;
        summary.roster_diff = roster.diff;
        let changed = submissions.changed || roster.changed;

        info!(
            run_id = %run.id,
            status = %run.status,
            success = summary.success,
            failed = summary.failed,
            changed,
            "Export run finished"
        );

        Ok(RunReport {
            run,
            items,
            summary,
            submissions,
            roster,
            changed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Availability, ItemStatus, RunStatus, SubmissionDetail};
    use crate::sync::index;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    /// In-memory ledger capturing every call.
    #[derive(Default)]
    struct MemoryLedger {
        created: Vec<SyncRun>,
        items: Vec<(String, SyncItem)>,
        finished: Vec<SyncRun>,
        fail_items: bool,
    }

    impl JobLedger for MemoryLedger {
        fn create_run(&mut self, run: &SyncRun) -> SyncResult<()> {
            self.created.push(run.clone());
            Ok(())
        }

        fn record_item(&mut self, run_id: &str, item: &SyncItem) -> SyncResult<()> {
            if self.fail_items {
                return Err(SyncError::Database("disk I/O error".to_string()));
            }
            self.items.push((run_id.to_string(), item.clone()));
            Ok(())
        }

        fn finish_run(&mut self, run: &SyncRun) -> SyncResult<()> {
            self.finished.push(run.clone());
            Ok(())
        }
    }

    fn march() -> YearMonth {
        "2026-03".parse().unwrap()
    }

    fn employee(id: i64, name: &str) -> Employee {
        let mut e = Employee::new(format!("E-{id}"), name.to_string(), Some("Hall".to_string()));
        e.id = id;
        e
    }

    fn submission(id: i64, employee_id: i64, days: &[(u32, Option<&str>)]) -> Submission {
        Submission {
            id,
            year_month: march(),
            employee_id,
            submitted_at: 0,
            details: days
                .iter()
                .enumerate()
                .map(|(i, (day, memo))| SubmissionDetail {
                    id: i64::try_from(i).unwrap() + 1,
                    target_date: NaiveDate::from_ymd_opt(2026, 3, *day).unwrap(),
                    availability: Availability::Available,
                    time_range: memo.map(String::from),
                })
                .collect(),
        }
    }

    fn roster() -> Vec<Employee> {
        vec![employee(1, "Aiko"), employee(2, "Ben"), employee(3, "Chika")]
    }

    #[tokio::test]
    async fn test_empty_records_rejected_before_run() {
        let tmp = TempDir::new().unwrap();
        let orchestrator = Orchestrator::new(tmp.path().to_path_buf());
        let mut ledger = MemoryLedger::default();

        let err = orchestrator
            .run(&mut ledger, march(), TriggerKind::Manual, "alice", Vec::new(), roster())
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::NoRecords { .. }));
        assert!(ledger.created.is_empty());
        assert!(!tmp.path().join("employees").exists());
    }

    #[tokio::test]
    async fn test_successful_run() {
        let tmp = TempDir::new().unwrap();
        let orchestrator = Orchestrator::new(tmp.path().to_path_buf());
        let mut ledger = MemoryLedger::default();

        let report = orchestrator
            .run(
                &mut ledger,
                march(),
                TriggerKind::Manual,
                "alice",
                vec![submission(1, 1, &[(2, Some("AM")), (3, None)])],
                roster(),
            )
            .await
            .unwrap();

        assert_eq!(report.run.status, RunStatus::Success);
        assert!(report.changed);
        assert!(report.submissions.changed);
        assert!(report.roster.changed);
        assert_eq!(report.summary.total, 1);
        assert_eq!(report.summary.success, 1);
        assert_eq!(report.summary.submissions_diff.inserted, 2);
        assert_eq!(report.summary.roster_diff.inserted, 3);
        assert_eq!(ledger.created.len(), 1);
        assert_eq!(ledger.finished[0].status, RunStatus::Success);
        assert!(ledger.finished[0].finished_at.is_some());
    }

    #[tokio::test]
    async fn test_second_identical_run_is_noop() {
        let tmp = TempDir::new().unwrap();
        let orchestrator = Orchestrator::new(tmp.path().to_path_buf());
        let mut ledger = MemoryLedger::default();
        let subs = vec![submission(1, 1, &[(2, None)]), submission(2, 2, &[(2, None)])];

        let first = orchestrator
            .run(&mut ledger, march(), TriggerKind::Manual, "a", subs.clone(), roster())
            .await
            .unwrap();
        let second = orchestrator
            .run(&mut ledger, march(), TriggerKind::Automatic, "a", subs, roster())
            .await
            .unwrap();

        assert!(!second.changed);
        assert_eq!(second.submissions.artifact, first.submissions.artifact);
        assert_eq!(second.roster.artifact, first.roster.artifact);

        let dataset = Dataset::submissions(tmp.path(), march());
        assert_eq!(index::load(&dataset).unwrap().latest_version, 1);
    }

    #[tokio::test]
    async fn test_partial_failure_is_isolated() {
        let tmp = TempDir::new().unwrap();
        let orchestrator = Orchestrator::new(tmp.path().to_path_buf());
        let mut ledger = MemoryLedger::default();

        let report = orchestrator
            .run(
                &mut ledger,
                march(),
                TriggerKind::Manual,
                "alice",
                vec![
                    submission(1, 1, &[(2, None)]),
                    submission(2, 2, &[]),
                    submission(3, 3, &[(4, Some("late"))]),
                ],
                roster(),
            )
            .await
            .unwrap();

        assert_eq!(report.run.status, RunStatus::Failed);
        assert!(report.run.error_summary.as_deref().unwrap().contains("record 2"));
        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.summary.success, 2);

        let failed: Vec<_> = report
            .items
            .iter()
            .filter(|i| i.status == ItemStatus::Failed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].record_id, "2");
        assert!(failed[0].error.is_some());
        assert_eq!(ledger.items.len(), 3);

        let text = fs::read_to_string(&report.submissions.artifact.unwrap().file_path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("1,2026-03,1,Aiko,2026-03-02"));
        assert!(lines[2].starts_with("3,2026-03,3,Chika,2026-03-04"));
    }

    #[tokio::test]
    async fn test_row_order_independent_of_input_order() {
        let subs = vec![
            submission(5, 1, &[(9, None), (1, None)]),
            submission(12, 2, &[(3, None)]),
            submission(3, 3, &[(7, Some("x, y"))]),
        ];
        let mut reversed = subs.clone();
        reversed.reverse();

        let mut outputs = Vec::new();
        for input in [subs, reversed] {
            let tmp = TempDir::new().unwrap();
            let orchestrator = Orchestrator::new(tmp.path().to_path_buf());
            let mut ledger = MemoryLedger::default();
            let report = orchestrator
                .run(&mut ledger, march(), TriggerKind::Manual, "a", input, roster())
                .await
                .unwrap();
            outputs.push(fs::read_to_string(report.submissions.artifact.unwrap().file_path).unwrap());
        }

        assert_eq!(outputs[0], outputs[1]);
        let keys: Vec<_> = outputs[0]
            .lines()
            .skip(1)
            .map(|l| l.split(',').take(1).collect::<String>())
            .collect();
        assert_eq!(keys, vec!["12", "3", "5", "5"]);
    }

    #[tokio::test]
    async fn test_dataset_failure_finishes_run_and_reports_completed() {
        let tmp = TempDir::new().unwrap();
        // A file where the roster directory should be makes that dataset unwritable.
        fs::write(tmp.path().join("employees"), "not a directory").unwrap();

        let orchestrator = Orchestrator::new(tmp.path().to_path_buf());
        let mut ledger = MemoryLedger::default();

        let err = orchestrator
            .run(
                &mut ledger,
                march(),
                TriggerKind::Retry,
                "alice",
                vec![submission(1, 1, &[(2, None)])],
                roster(),
            )
            .await
            .unwrap_err();

        match err {
            SyncError::DatasetExport {
                failures,
                completed,
                ..
            } => {
                assert_eq!(failures.len(), 1);
                assert!(failures[0].starts_with("employees:"));
                assert_eq!(completed.len(), 1);
                assert_eq!(completed[0].dataset, "submissions/202603");
            }
            other => panic!("expected DatasetExport, got {other:?}"),
        }

        assert_eq!(ledger.finished.len(), 1);
        assert_eq!(ledger.finished[0].status, RunStatus::Failed);
        assert_eq!(ledger.finished[0].trigger, TriggerKind::Retry);
    }

    #[tokio::test]
    async fn test_item_ledger_failure_still_finishes_run() {
        let tmp = TempDir::new().unwrap();
        let orchestrator = Orchestrator::new(tmp.path().to_path_buf());
        let mut ledger = MemoryLedger {
            fail_items: true,
            ..MemoryLedger::default()
        };

        let err = orchestrator
            .run(
                &mut ledger,
                march(),
                TriggerKind::Automatic,
                "alice",
                vec![submission(1, 1, &[(2, None)]), submission(2, 2, &[(3, None)])],
                roster(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Database(ref msg) if msg == "disk I/O error"));
        assert_eq!(ledger.created.len(), 1);
        assert!(ledger.items.is_empty());
        assert_eq!(ledger.finished.len(), 1);

        let finished = &ledger.finished[0];
        assert_eq!(finished.id, ledger.created[0].id);
        assert_eq!(finished.status, RunStatus::Failed);
        assert!(finished.finished_at.is_some());
        assert!(finished.error_summary.as_deref().unwrap().contains("ledger"));

        let submissions = Dataset::submissions(tmp.path(), march());
        assert_eq!(index::load(&submissions).unwrap().latest_version, 1);
        let employees = Dataset::employees(tmp.path());
        assert_eq!(index::load(&employees).unwrap().latest_version, 1);
    }
}
