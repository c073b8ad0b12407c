//! Data models for shiftx.
//!
//! This module contains the domain records handed to the export core:
//! - Employee (roster entry)
//! - Submission + SubmissionDetail (one employee's availability for a month)
//! - SyncRun + SyncItem (job ledger of one export run)

pub mod employee;
pub mod submission;
pub mod sync_run;

pub use employee::Employee;
pub use submission::{Availability, Submission, SubmissionDetail, YearMonth};
pub use sync_run::{ItemStatus, RunStatus, SyncItem, SyncRun, TriggerKind};
