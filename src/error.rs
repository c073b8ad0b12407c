//! Error types for shiftx.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=db, 3=not_found, 4=validation, etc.)
//! - Retryability flags
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

use crate::sync::SyncError;

/// Result type alias for shiftx operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database (exit 2)
    NotInitialized,
    AlreadyInitialized,
    DatabaseError,

    // Not Found (exit 3)
    EmployeeNotFound,
    RunNotFound,

    // Validation (exit 4)
    InvalidArgument,
    NoRecords,

    // Export (exit 6)
    ExportError,
    PartialExport,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::EmployeeNotFound => "EMPLOYEE_NOT_FOUND",
            Self::RunNotFound => "RUN_NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::NoRecords => "NO_RECORDS",
            Self::ExportError => "EXPORT_ERROR",
            Self::PartialExport => "PARTIAL_EXPORT",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized | Self::AlreadyInitialized | Self::DatabaseError => 2,
            Self::EmployeeNotFound | Self::RunNotFound => 3,
            Self::InvalidArgument | Self::NoRecords => 4,
            Self::ExportError | Self::PartialExport => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether retrying can succeed without changing the input.
    ///
    /// Export failures are retryable with `shiftx export --retry`; an empty
    /// record set is not.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DatabaseError | Self::ExportError | Self::PartialExport | Self::IoError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in shiftx operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `shiftx init` first")]
    NotInitialized,

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("Employee not found: {id}")]
    EmployeeNotFound { id: String },

    #[error("Run not found: {id}")]
    RunNotFound { id: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Export error: {0}")]
    Sync(#[from] SyncError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::EmployeeNotFound { .. } => ErrorCode::EmployeeNotFound,
            Self::RunNotFound { .. } => ErrorCode::RunNotFound,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Sync(e) => match e {
                SyncError::NoRecords { .. } => ErrorCode::NoRecords,
                SyncError::DatasetExport { .. } => ErrorCode::PartialExport,
                SyncError::Database(_) => ErrorCode::DatabaseError,
                SyncError::Io { .. } => ErrorCode::IoError,
                SyncError::Json(_) => ErrorCode::JsonError,
                SyncError::RowKindMismatch { .. }
                | SyncError::DuplicateKey { .. }
                | SyncError::Projection { .. }
                | SyncError::Task(_) => ErrorCode::ExportError,
            },
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => {
                Some("Run `shiftx init` to create the database and export directory".to_string())
            }

            Self::AlreadyInitialized { path } => Some(format!(
                "Database already exists at {}. Use `--force` to reinitialize.",
                path.display()
            )),

            Self::EmployeeNotFound { id } => Some(format!(
                "No employee '{id}'. Use `shiftx employee list` to see the roster."
            )),

            Self::RunNotFound { id } => Some(format!(
                "No run with ID '{id}'. Use `shiftx runs list` to see recent runs."
            )),

            Self::Sync(SyncError::NoRecords { dataset }) => Some(format!(
                "No submissions exist for {dataset}. Add one with `shiftx submission add` first."
            )),

            Self::Sync(SyncError::DatasetExport { run_id, .. }) => Some(format!(
                "Run {run_id} was recorded as failed. Fix the export directory, then \
                 re-run with `shiftx export --month <YYYY-MM> --retry`."
            )),

            Self::InvalidArgument(msg) => {
                if msg.contains("availability") {
                    Some(
                        "Valid availabilities: available, unavailable, tentative. \
                         Synonyms: ok→available, ng→unavailable, maybe→tentative"
                            .to_string(),
                    )
                } else if msg.contains("year-month") || msg.contains("month") {
                    Some("Months are written YYYY-MM, e.g. 2026-03".to_string())
                } else {
                    None
                }
            }

            Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Sync(_)
            | Self::Config(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
