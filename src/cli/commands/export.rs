//! Export command implementation.
//!
//! Runs the orchestrator for one month on a dedicated tokio runtime and
//! prints the run report. Also used by `submission add` for automatic runs.

use crate::config::load_global_config;
use crate::error::{Error, Result};
use crate::model::{RunStatus, TriggerKind, YearMonth};
use crate::storage::SqliteStorage;
use crate::sync::{Dataset, Orchestrator, RunReport};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::{export_root, open_storage, parse_month};

/// Execute the export command.
///
/// # Errors
///
/// Returns `Sync(NoRecords)` if the month has no submissions, or
/// `Sync(DatasetExport)` if a dataset could not be written.
pub fn execute(
    month: &str,
    retry: bool,
    db_path: Option<&PathBuf>,
    export_dir: Option<&PathBuf>,
    actor: &str,
    json: bool,
) -> Result<()> {
    let month = parse_month(month)?;
    let mut storage = open_storage(db_path)?;
    let config = load_global_config()?;
    let root = export_root(export_dir, &config)?;

    let trigger = if retry {
        warn_if_nothing_to_retry(&storage, month)?;
        TriggerKind::Retry
    } else {
        TriggerKind::Manual
    };

    let report = run_export(&mut storage, &root, month, trigger, actor)?;
    print_report(&report, json)
}

/// Run one export on a fresh runtime.
///
/// # Errors
///
/// Propagates orchestrator errors.
pub(crate) fn run_export(
    storage: &mut SqliteStorage,
    root: &Path,
    month: YearMonth,
    trigger: TriggerKind,
    actor: &str,
) -> Result<RunReport> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;

    let orchestrator = Orchestrator::new(root.to_path_buf());
    let report = rt.block_on(orchestrator.run_from_source(storage, month, trigger, actor))?;
    Ok(report)
}

fn warn_if_nothing_to_retry(storage: &SqliteStorage, month: YearMonth) -> Result<()> {
    let key = Dataset::submissions_key(month);
    let latest = storage.list_runs(Some(&key), 1)?;
    if latest.first().is_none_or(|run| run.status != RunStatus::Failed) {
        warn!(dataset = %key, "Latest run did not fail; running retry anyway");
    }
    Ok(())
}

/// Print a run report as JSON or a short human summary.
pub(crate) fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
        return Ok(());
    }

    let status = match report.run.status {
        RunStatus::Success => report.run.status.as_str().green(),
        RunStatus::Failed => report.run.status.as_str().red(),
        RunStatus::Running => report.run.status.as_str().yellow(),
    };
    println!("Run {} ({}) {status}", report.run.id, report.run.trigger);
    println!(
        "  Records: {} total, {} ok, {} failed",
        report.summary.total, report.summary.success, report.summary.failed
    );

    for outcome in [&report.submissions, &report.roster] {
        let diff = &outcome.diff;
        let state = if outcome.changed {
            "new version".green()
        } else {
            "unchanged".dimmed()
        };
        println!(
            "  {:<20} {state}  +{} ~{} -{}  ({} rows)",
            outcome.dataset, diff.inserted, diff.updated, diff.deleted, outcome.row_count
        );
        if let Some(artifact) = &outcome.artifact {
            println!("    v{} {}", artifact.version, artifact.file_path.display());
        }
    }

    for item in report.items.iter().filter(|i| i.error.is_some()) {
        println!(
            "  {} record {}: {}",
            "✗".red(),
            item.record_id,
            item.error.as_deref().unwrap_or_default()
        );
    }
    Ok(())
}
