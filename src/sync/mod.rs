//! Versioned CSV export.
//!
//! This module is the export core. It receives current records from the
//! data layer and publishes them as immutable, versioned CSV artifacts:
//!
//! - **Projection**: records → flat rows with natural keys
//! - **Hashing**: SHA256 fingerprint per row for change detection
//! - **Diff**: inserted / updated / deleted counts against the last artifact
//! - **Index**: per-dataset `index.json` ledger of versions and row hashes
//! - **Writer**: writes a new artifact only when something changed
//! - **Orchestrator**: one run = concurrent projection + both dataset exports
//!
//! # Example
//!
//! ```ignore
//! use shiftx::sync::Orchestrator;
//! use shiftx::model::TriggerKind;
//!
//! let orchestrator = Orchestrator::new(export_root);
//! let report = orchestrator
//!     .run_from_source(&mut storage, "2026-03".parse()?, TriggerKind::Manual, "alice")
//!     .await?;
//! println!("changed: {}", report.changed);
//! ```

mod csv;
mod dataset;
mod diff;
mod file;
mod hash;
mod index;
mod orchestrator;
mod project;
mod types;
mod writer;

// Re-export main types and functions
pub use csv::{csv_escape, render};
pub use dataset::{Dataset, DatasetKind, EMPLOYEE_COLUMNS, INDEX_FILE_NAME, SUBMISSION_COLUMNS};
pub use diff::{compute_diff, is_changed};
pub use file::{atomic_write, write_new};
pub use hash::{content_hash, fingerprint_rows, has_changed};
pub use index::{load as load_index, save as save_index, VersionIndex};
pub use orchestrator::{JobLedger, Orchestrator, RecordSource};
pub use project::{
    employee_names, project_employee, project_submission, sort_rows, EmployeeRow, Row,
    SubmissionRow,
};
pub use types::{
    Artifact, DatasetStatus, Diff, ExportOutcome, RunReport, RunSummary, SyncError, SyncResult,
};
pub use writer::{dataset_status, write_if_changed_blocking, ArtifactWriter};
