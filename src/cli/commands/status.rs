//! Status command implementation.
//!
//! Reads the version index of the roster dataset and, when a month is given,
//! of that month's submissions dataset. Never writes.

use crate::config::load_global_config;
use crate::error::{Error, Result};
use crate::sync::{ArtifactWriter, Dataset, DatasetStatus, SyncError};
use serde::Serialize;
use std::path::PathBuf;

use super::{export_root, parse_month};

#[derive(Serialize)]
struct StatusOutput {
    export_dir: PathBuf,
    datasets: Vec<DatasetStatus>,
}

/// Execute status command.
///
/// # Errors
///
/// Returns an error if the month is invalid or an index cannot be read.
pub fn execute(month: Option<&str>, export_dir: Option<&PathBuf>, json: bool) -> Result<()> {
    let config = load_global_config()?;
    let root = export_root(export_dir, &config)?;

    let mut datasets = Vec::new();
    if let Some(month) = month {
        datasets.push(Dataset::submissions(&root, parse_month(month)?));
    }
    datasets.push(Dataset::employees(&root));

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;
    let writer = ArtifactWriter::new();
    let statuses = rt.block_on(async {
        let mut statuses = Vec::with_capacity(datasets.len());
        for dataset in &datasets {
            statuses.push(writer.status(dataset).await?);
        }
        Ok::<_, SyncError>(statuses)
    })?;

    if json {
        let output = StatusOutput {
            export_dir: root,
            datasets: statuses,
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("shiftx Status");
    println!("=============");
    println!();
    println!("Exports: {}", root.display());
    for status in &statuses {
        println!();
        println!("{}", status.dataset);
        if status.latest_version == 0 {
            println!("  No versions yet");
            continue;
        }
        println!("  Latest version: v{}", status.latest_version);
        if let Some(file) = &status.latest_file {
            println!("  Latest file:    {}", file.display());
        }
        println!("  Tracked rows:   {}", status.tracked_rows);
        println!("  Versions:       {}", status.history_len);
    }
    Ok(())
}
