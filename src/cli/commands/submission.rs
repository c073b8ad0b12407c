//! Submission commands.
//!
//! `submission add` stores one employee's availability for a month and then,
//! unless disabled, triggers an automatic export run for that month.

use crate::cli::SubmissionCommands;
use crate::config::load_global_config;
use crate::error::{Error, Result};
use crate::model::{Employee, TriggerKind};
use crate::storage::SqliteStorage;
use crate::sync::employee_names;
use crate::validate::parse_entry;
use std::path::PathBuf;
use tracing::{info, warn};

use super::employee::resolve;
use super::export::{print_report, run_export};
use super::{export_root, open_storage, parse_month};

/// Execute submission commands.
///
/// # Errors
///
/// Returns an error if the database is missing, input is invalid or the
/// operation fails. A failed automatic export after a stored submission is
/// reported in the output but does not fail the command.
pub fn execute(
    command: &SubmissionCommands,
    db_path: Option<&PathBuf>,
    export_dir: Option<&PathBuf>,
    actor: &str,
    json: bool,
) -> Result<()> {
    let mut storage = open_storage(db_path)?;

    match command {
        SubmissionCommands::Add {
            month,
            employee,
            entries,
            no_export,
        } => add(
            &mut storage,
            month,
            employee,
            entries,
            *no_export,
            export_dir,
            actor,
            json,
        ),
        SubmissionCommands::List { month } => list(&storage, month, json),
    }
}

#[allow(clippy::too_many_arguments)]
fn add(
    storage: &mut SqliteStorage,
    month: &str,
    employee: &str,
    entries: &[String],
    no_export: bool,
    export_dir: Option<&PathBuf>,
    actor: &str,
    json: bool,
) -> Result<()> {
    let month = parse_month(month)?;
    let employee = resolve(storage, employee)?;

    let details = entries
        .iter()
        .map(|entry| parse_entry(entry, month))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::InvalidArgument)?;

    let submission = storage.create_submission(month, employee.id, &details)?;
    info!(
        submission_id = submission.id,
        month = %month,
        employee = %employee.code,
        days = submission.details.len(),
        "Stored submission"
    );

    let config = load_global_config()?;
    let export = if no_export || !config.auto_export {
        None
    } else {
        let root = export_root(export_dir, &config)?;
        match run_export(storage, &root, month, TriggerKind::Automatic, actor) {
            Ok(report) => Some(Ok(report)),
            Err(e) => {
                warn!(submission_id = submission.id, error = %e, "Automatic export failed");
                Some(Err(e))
            }
        }
    };

    if json {
        let export = match &export {
            Some(Ok(report)) => serde_json::to_value(report)?,
            Some(Err(e)) => e.to_structured_json(),
            None => serde_json::Value::Null,
        };
        let output = serde_json::json!({
            "submission": submission,
            "export": export,
        });
        println!("{output}");
        return Ok(());
    }

    println!(
        "Stored submission {} for {} ({}), {} day(s)",
        submission.id,
        employee.display_name,
        month,
        submission.details.len()
    );
    match export {
        Some(Ok(report)) => print_report(&report, false)?,
        Some(Err(e)) => {
            println!("Automatic export failed: {e}");
            if let Some(hint) = e.hint() {
                println!("  Hint: {hint}");
            }
        }
        None => {}
    }
    Ok(())
}

fn list(storage: &SqliteStorage, month: &str, json: bool) -> Result<()> {
    let month = parse_month(month)?;
    let submissions = storage.list_submissions(month)?;

    if json {
        let output = serde_json::json!({
            "month": month,
            "submissions": submissions,
            "count": submissions.len(),
        });
        println!("{output}");
        return Ok(());
    }

    if submissions.is_empty() {
        println!("No submissions for {month}.");
        return Ok(());
    }

    let names = employee_names(&storage.list_employees(true)?);

    for submission in &submissions {
        let name = names
            .get(&submission.employee_id)
            .cloned()
            .unwrap_or_else(|| Employee::fallback_name(submission.employee_id));
        println!("#{} {name}", submission.id);
        for detail in &submission.details {
            match &detail.time_range {
                Some(range) => println!(
                    "  {}  {:<12} {range}",
                    detail.target_date,
                    detail.availability.as_str()
                ),
                None => println!("  {}  {}", detail.target_date, detail.availability),
            }
        }
    }
    Ok(())
}
