//! Job ledger inspection commands.

use crate::cli::RunsCommands;
use crate::error::{Error, Result};
use crate::model::{ItemStatus, RunStatus, SyncRun};
use crate::sync::Dataset;
use chrono::{TimeZone, Utc};
use colored::Colorize;
use std::path::PathBuf;

use super::{open_storage, parse_month};

/// Execute runs commands.
///
/// # Errors
///
/// Returns an error if the database is missing or the run does not exist.
pub fn execute(command: &RunsCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let storage = open_storage(db_path)?;

    match command {
        RunsCommands::List { month, limit } => {
            let dataset_key = month
                .as_deref()
                .map(parse_month)
                .transpose()?
                .map(Dataset::submissions_key);
            let runs = storage.list_runs(dataset_key.as_deref(), *limit)?;

            if json {
                let output = serde_json::json!({
                    "runs": runs,
                    "count": runs.len(),
                });
                println!("{output}");
                return Ok(());
            }

            if runs.is_empty() {
                println!("No runs.");
                return Ok(());
            }
            for run in &runs {
                println!(
                    "{}  {:<20} {:<9} {:<8} {}",
                    run.id,
                    run.dataset_key,
                    run.trigger.as_str(),
                    status_label(run.status),
                    format_millis(run.started_at)
                );
            }
            Ok(())
        }

        RunsCommands::Show { id } => {
            let run = storage
                .get_run(id)?
                .ok_or_else(|| Error::RunNotFound { id: id.clone() })?;
            let items = storage.get_run_items(id)?;

            if json {
                let output = serde_json::json!({
                    "run": run,
                    "items": items,
                });
                println!("{output}");
                return Ok(());
            }

            print_run(&run);
            println!();
            println!("Items ({}):", items.len());
            for item in &items {
                match item.status {
                    ItemStatus::Success => println!("  {} {}", "✓".green(), item.record_id),
                    ItemStatus::Failed => println!(
                        "  {} {}: {}",
                        "✗".red(),
                        item.record_id,
                        item.error.as_deref().unwrap_or_default()
                    ),
                }
            }
            Ok(())
        }
    }
}

fn print_run(run: &SyncRun) {
    println!("Run {}", run.id);
    println!("  Dataset:  {}", run.dataset_key);
    println!("  Trigger:  {}", run.trigger);
    println!("  Actor:    {}", run.actor);
    println!("  Status:   {}", status_label(run.status));
    println!("  Started:  {}", format_millis(run.started_at));
    if let Some(finished) = run.finished_at {
        println!("  Finished: {}", format_millis(finished));
    }
    if let Some(summary) = &run.error_summary {
        println!("  Errors:   {summary}");
    }
}

fn status_label(status: RunStatus) -> String {
    match status {
        RunStatus::Success => status.as_str().green().to_string(),
        RunStatus::Failed => status.as_str().red().to_string(),
        RunStatus::Running => status.as_str().yellow().to_string(),
    }
}

fn format_millis(millis: i64) -> String {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map_or_else(|| millis.to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string())
}
