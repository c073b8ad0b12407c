//! Sync run ("job") model.
//!
//! A run is one invocation of the export pipeline. It owns one item per
//! input record attempted. Lifecycle: `running -> success | failed`; both
//! terminal states are final and a retry is always a brand-new run.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What started a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// Fired by the data layer after a mutation.
    Automatic,
    /// Requested explicitly by an operator.
    Manual,
    /// Operator re-run after a failed run.
    Retry,
}

impl TriggerKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Automatic => "automatic",
            Self::Manual => "manual",
            Self::Retry => "retry",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "automatic" => Ok(Self::Automatic),
            "manual" => Ok(Self::Manual),
            "retry" => Ok(Self::Retry),
            _ => Err(format!("Unknown trigger kind: {s}")),
        }
    }
}

/// Overall run status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Success,
    Failed,
}

impl RunStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    /// Whether this status can no longer change.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Unknown run status: {s}")),
        }
    }
}

/// Outcome of one record attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Success,
    Failed,
}

impl ItemStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Unknown item status: {s}")),
        }
    }
}

/// One export run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRun {
    /// Unique identifier (`run_` + 12 hex chars)
    pub id: String,

    /// Dataset the run exports (e.g., "submissions/202603")
    pub dataset_key: String,

    pub trigger: TriggerKind,

    /// Actor who started the run
    pub actor: String,

    pub status: RunStatus,

    /// Start timestamp (Unix milliseconds)
    pub started_at: i64,

    /// End timestamp (Unix milliseconds), set once terminal
    pub finished_at: Option<i64>,

    /// Aggregate error message for failed runs
    pub error_summary: Option<String>,
}

impl SyncRun {
    /// Start a new run in `running` status.
    pub fn start(dataset_key: &str, trigger: TriggerKind, actor: &str) -> Self {
        let id = format!("run_{}", &uuid::Uuid::new_v4().simple().to_string()[..12]);
        Self {
            id,
            dataset_key: dataset_key.to_string(),
            trigger,
            actor: actor.to_string(),
            status: RunStatus::Running,
            started_at: chrono::Utc::now().timestamp_millis(),
            finished_at: None,
            error_summary: None,
        }
    }

    /// Move the run to its terminal status.
    ///
    /// The run fails if any error message was collected.
    pub fn finish(&mut self, errors: &[String]) {
        self.finished_at = Some(chrono::Utc::now().timestamp_millis());
        if errors.is_empty() {
            self.status = RunStatus::Success;
            self.error_summary = None;
        } else {
            self.status = RunStatus::Failed;
            self.error_summary = Some(errors.join("; "));
        }
    }
}

/// Ledger entry for one input record attempted by a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncItem {
    /// Identifier of the input record (submission id)
    pub record_id: String,

    pub status: ItemStatus,

    /// Captured error for failed attempts
    pub error: Option<String>,
}

impl SyncItem {
    #[must_use]
    pub fn success(record_id: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            status: ItemStatus::Success,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(record_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            status: ItemStatus::Failed,
            error: Some(error.into()),
        }
    }
}
