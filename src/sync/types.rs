//! Sync types for versioned CSV export.
//!
//! This module defines the values passed between the diff engine, the
//! artifact writer and the orchestrator, plus the sync-specific error type.

use std::path::PathBuf;

use serde::Serialize;

use crate::model::SyncRun;

/// Row-level change counts between the previous artifact and the current rows.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Diff {
    /// Keys present now but not in the previous artifact.
    pub inserted: usize,
    /// Keys present in both whose content fingerprint differs.
    pub updated: usize,
    /// Keys present in the previous artifact but not now.
    pub deleted: usize,
}

impl Diff {
    /// Total number of changed rows.
    #[must_use]
    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.deleted
    }

    /// Returns true if no row changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// One immutable exported file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub version: u32,
    pub file_name: String,
    pub file_path: PathBuf,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

/// Result of one `write_if_changed` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportOutcome {
    /// Dataset key (e.g., "submissions/202603" or "employees").
    pub dataset: String,
    /// Whether a new artifact was written.
    pub changed: bool,
    pub diff: Diff,
    /// New artifact when changed, otherwise the existing latest (if any).
    pub artifact: Option<Artifact>,
    /// Number of rows in the current row set.
    pub row_count: usize,
}

/// Read-only view of a dataset's version index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetStatus {
    pub dataset: String,
    pub latest_version: u32,
    pub latest_file: Option<PathBuf>,
    /// Rows in the most recent artifact.
    pub tracked_rows: usize,
    pub history_len: usize,
}

/// Record counts and per-dataset diffs for one run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub submissions_diff: Diff,
    pub roster_diff: Diff,
}

/// Everything a finished run hands back to its caller.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run: SyncRun,
    pub items: Vec<crate::model::SyncItem>,
    pub summary: RunSummary,
    pub submissions: ExportOutcome,
    pub roster: ExportOutcome,
    /// True if either dataset produced a new artifact.
    pub changed: bool,
}

/// Sync-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// IO error during artifact or index operations.
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Job ledger or record source failure.
    #[error("Database error: {0}")]
    Database(String),

    /// A run was requested with no input records.
    #[error("No records to export for {dataset}")]
    NoRecords { dataset: String },

    /// A row handed to a dataset of a different kind.
    #[error("Row {key} does not belong to dataset {dataset}")]
    RowKindMismatch { dataset: String, key: String },

    /// Two rows in one export share a natural key.
    #[error("Duplicate row key {key} in dataset {dataset}")]
    DuplicateKey { dataset: String, key: String },

    /// A record could not be turned into rows.
    #[error("Record {record_id} rejected: {reason}")]
    Projection { record_id: String, reason: String },

    /// One or more dataset export steps failed inside a run.
    #[error("Export failed in run {run_id}: {}", failures.join("; "))]
    DatasetExport {
        run_id: String,
        /// `"<dataset>: <error>"` per failed dataset.
        failures: Vec<String>,
        /// Outcomes of the datasets that did export.
        completed: Vec<ExportOutcome>,
    },

    /// A background task was cancelled or panicked.
    #[error("Background task failed: {0}")]
    Task(String),
}

impl From<rusqlite::Error> for SyncError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// Result type for sync operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_totals() {
        let mut diff = Diff::default();
        assert!(diff.is_empty());

        diff.inserted = 2;
        diff.deleted = 1;
        assert_eq!(diff.total(), 3);
        assert!(!diff.is_empty());
    }

    #[test]
    fn test_dataset_export_message_lists_failures() {
        let err = SyncError::DatasetExport {
            run_id: "run_abc".to_string(),
            failures: vec!["employees: disk full".to_string()],
            completed: Vec::new(),
        };
        assert_eq!(
            err.to_string(),
            "Export failed in run run_abc: employees: disk full"
        );
    }
}
