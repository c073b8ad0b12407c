//! Hash-gated artifact writer.
//!
//! ## `write_if_changed` protocol
//!
//! 1. Load the dataset's version index.
//! 2. Fingerprint the current rows.
//! 3. Diff against the stored row hashes.
//! 4. Unchanged → return the existing latest artifact, write nothing.
//! 5. Changed → render CSV, write `<prefix>_v<NNNN>_<millis>.csv` (create-new).
//! 6. Append the artifact to the index, replace the row hashes.
//! 7. Save the index atomically. If this fails the new artifact is removed.
//!
//! Steps 1–7 form a critical section per dataset. [`ArtifactWriter`] keeps a
//! lock per dataset key; the blocking file work runs on the blocking pool
//! while the async guard is held.

use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::sync::csv::render;
use crate::sync::dataset::Dataset;
use crate::sync::diff::{compute_diff, is_changed};
use crate::sync::file::write_new;
use crate::sync::hash::fingerprint_rows;
use crate::sync::index;
use crate::sync::project::Row;
use crate::sync::types::{Artifact, DatasetStatus, ExportOutcome, SyncError, SyncResult};

/// Serializes export attempts per dataset.
#[derive(Debug, Default)]
pub struct ArtifactWriter {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ArtifactWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock guarding `dataset`, created on first use.
    fn lock_for(&self, dataset: &Dataset) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(dataset.key()).or_default())
    }

    /// Write a new artifact for `dataset` if `rows` differ from the last one.
    ///
    /// # Errors
    ///
    /// Returns an error if the index or artifact cannot be written, or if the
    /// rows do not fit the dataset.
    pub async fn write_if_changed(
        &self,
        dataset: &Dataset,
        rows: Vec<Row>,
    ) -> SyncResult<ExportOutcome> {
        let lock = self.lock_for(dataset);
        let _guard = lock.lock().await;

        let dataset = dataset.clone();
        tokio::task::spawn_blocking(move || write_if_changed_blocking(&dataset, &rows))
            .await
            .map_err(|e| SyncError::Task(e.to_string()))?
    }

    /// Current state of `dataset`'s version index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index exists but cannot be read.
    pub async fn status(&self, dataset: &Dataset) -> SyncResult<DatasetStatus> {
        let lock = self.lock_for(dataset);
        let _guard = lock.lock().await;

        let dataset = dataset.clone();
        tokio::task::spawn_blocking(move || dataset_status(&dataset))
            .await
            .map_err(|e| SyncError::Task(e.to_string()))?
    }
}

/// Unlocked core of [`ArtifactWriter::write_if_changed`].
///
/// Callers must hold the dataset's lock.
///
/// # Errors
///
/// See [`ArtifactWriter::write_if_changed`].
pub fn write_if_changed_blocking(dataset: &Dataset, rows: &[Row]) -> SyncResult<ExportOutcome> {
    let key = dataset.key();

    if let Some(row) = rows.iter().find(|r| !r.belongs_to(dataset.kind())) {
        return Err(SyncError::RowKindMismatch {
            dataset: key,
            key: row.natural_key(),
        });
    }

    let mut index = index::load(dataset)?;
    let current = fingerprint_rows(&key, rows)?;
    let diff = compute_diff(&index.row_hashes, &current);

    if !is_changed(&diff, index.has_artifact()) {
        debug!(dataset = %key, version = index.latest_version, "unchanged");
        return Ok(ExportOutcome {
            dataset: key,
            changed: false,
            diff,
            artifact: index.latest_artifact().cloned(),
            row_count: rows.len(),
        });
    }

    let version = index.latest_version + 1;
    let now = Utc::now();
    let file_name = dataset.artifact_file_name(version, now.timestamp_millis());
    let file_path = dataset.dir().join(&file_name);

    write_new(&file_path, &render(dataset.columns(), rows))?;

    let artifact = Artifact {
        version,
        file_name,
        file_path,
        created_at: now.to_rfc3339(),
    };
    index.push(artifact.clone(), current);
    if let Err(e) = index::save(dataset, &index) {
        // Unpublished artifact; its version number is reused by the next export.
        if let Err(cleanup) = fs::remove_file(&artifact.file_path) {
            warn!(
                dataset = %key,
                error = %cleanup,
                "Could not remove unpublished artifact {}",
                artifact.file_path.display()
            );
        }
        return Err(e);
    }

    info!(
        dataset = %key,
        version,
        rows = rows.len(),
        inserted = diff.inserted,
        updated = diff.updated,
        deleted = diff.deleted,
        "wrote {}",
        artifact.file_path.display()
    );

    Ok(ExportOutcome {
        dataset: key,
        changed: true,
        diff,
        artifact: Some(artifact),
        row_count: rows.len(),
    })
}

/// Read-only summary of a dataset's index.
///
/// # Errors
///
/// Returns an error if the index exists but cannot be read.
pub fn dataset_status(dataset: &Dataset) -> SyncResult<DatasetStatus> {
    let index = index::load(dataset)?;
    Ok(DatasetStatus {
        dataset: dataset.key(),
        latest_version: index.latest_version,
        latest_file: index.latest_file_path.clone(),
        tracked_rows: index.row_hashes.len(),
        history_len: index.files.len(),
    })
}
