//! Dataset addressing.
//!
//! A dataset is one independently versioned export target living in its own
//! directory under the export root:
//!
//! ```text
//! <export_root>/
//!   submissions/202603/index.json
//!   submissions/202603/202603_submissions_v0001_1773712800000.csv
//!   employees/index.json
//!   employees/employees_v0001_1773712800000.csv
//! ```

use std::path::{Path, PathBuf};

use crate::model::YearMonth;

/// Column names of the submissions dataset, in export order.
pub const SUBMISSION_COLUMNS: &[&str] = &[
    "submission_id",
    "year_month",
    "employee_id",
    "employee_name",
    "target_date",
    "availability",
    "time_range",
];

/// Column names of the employee roster dataset, in export order.
pub const EMPLOYEE_COLUMNS: &[&str] = &[
    "employee_id",
    "employee_code",
    "display_name",
    "department",
    "is_active",
];

/// Name of the version index file inside every dataset directory.
pub const INDEX_FILE_NAME: &str = "index.json";

/// Which rows a dataset holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    /// All submissions for one shift-month.
    Submissions(YearMonth),
    /// The employee roster.
    Employees,
}

/// A versioned export target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    kind: DatasetKind,
    dir: PathBuf,
}

impl Dataset {
    /// Submissions dataset for `month` under `export_root`.
    #[must_use]
    pub fn submissions(export_root: &Path, month: YearMonth) -> Self {
        Self {
            kind: DatasetKind::Submissions(month),
            dir: export_root.join("submissions").join(month.compact()),
        }
    }

    /// Employee roster dataset under `export_root`.
    #[must_use]
    pub fn employees(export_root: &Path) -> Self {
        Self {
            kind: DatasetKind::Employees,
            dir: export_root.join("employees"),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> DatasetKind {
        self.kind
    }

    /// Directory holding the artifacts and the index.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Key of the submissions dataset for `month`, without an export root.
    #[must_use]
    pub fn submissions_key(month: YearMonth) -> String {
        format!("submissions/{}", month.compact())
    }

    /// Stable identifier, also used as the lock key and in the job ledger.
    #[must_use]
    pub fn key(&self) -> String {
        match self.kind {
            DatasetKind::Submissions(month) => Self::submissions_key(month),
            DatasetKind::Employees => "employees".to_string(),
        }
    }

    /// Artifact file name prefix.
    #[must_use]
    pub fn prefix(&self) -> String {
        match self.kind {
            DatasetKind::Submissions(month) => format!("{}_submissions", month.compact()),
            DatasetKind::Employees => "employees".to_string(),
        }
    }

    /// Header columns for this dataset.
    #[must_use]
    pub const fn columns(&self) -> &'static [&'static str] {
        match self.kind {
            DatasetKind::Submissions(_) => SUBMISSION_COLUMNS,
            DatasetKind::Employees => EMPLOYEE_COLUMNS,
        }
    }

    /// Path of the persisted version index.
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE_NAME)
    }

    /// `<prefix>_v<NNNN>_<millis>.csv`
    #[must_use]
    pub fn artifact_file_name(&self, version: u32, timestamp_millis: i64) -> String {
        format!("{}_v{version:04}_{timestamp_millis}.csv", self.prefix())
    }
}
