//! Version index persistence.
//!
//! Every dataset directory holds an `index.json` ledger:
//!
//! ```json
//! {
//!   "latestVersion": 2,
//!   "latestFilePath": "/exports/employees/employees_v0002_1773712800000.csv",
//!   "rowHashes": { "1": "9f2c…", "2": "04ab…" },
//!   "files": [
//!     { "version": 1, "fileName": "employees_v0001_…csv", "filePath": "…", "createdAt": "…" },
//!     { "version": 2, "fileName": "employees_v0002_…csv", "filePath": "…", "createdAt": "…" }
//!   ]
//! }
//! ```
//!
//! A missing or unreadable index loads as the zero index: the next export
//! behaves like the first one.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::sync::dataset::Dataset;
use crate::sync::file::atomic_write;
use crate::sync::types::{io_err, Artifact, SyncResult};

/// Persisted export ledger of one dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionIndex {
    pub latest_version: u32,
    pub latest_file_path: Option<PathBuf>,
    /// Natural key → content fingerprint of the rows in the latest artifact.
    pub row_hashes: BTreeMap<String, String>,
    /// Every artifact ever written, in version order.
    pub files: Vec<Artifact>,
}

impl VersionIndex {
    /// The most recent artifact, if any export happened.
    #[must_use]
    pub fn latest_artifact(&self) -> Option<&Artifact> {
        self.files.last()
    }

    /// Whether at least one artifact has been written.
    #[must_use]
    pub fn has_artifact(&self) -> bool {
        self.latest_version > 0
    }

    /// Record a freshly written artifact and its row snapshot.
    pub fn push(&mut self, artifact: Artifact, row_hashes: BTreeMap<String, String>) {
        self.latest_version = artifact.version;
        self.latest_file_path = Some(artifact.file_path.clone());
        self.row_hashes = row_hashes;
        self.files.push(artifact);
    }

    /// Structural sanity check applied after parsing.
    fn is_consistent(&self) -> bool {
        let versions_ok = self
            .files
            .iter()
            .enumerate()
            .all(|(i, a)| usize::try_from(a.version).is_ok_and(|v| v == i + 1));
        versions_ok && self.files.len() == self.latest_version as usize
    }
}

/// Load the version index for `dataset`.
///
/// Returns the zero index if the file does not exist, cannot be parsed, or
/// is internally inconsistent.
///
/// # Errors
///
/// Returns an error only when the file exists but cannot be read.
pub fn load(dataset: &Dataset) -> SyncResult<VersionIndex> {
    let path = dataset.index_path();
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(VersionIndex::default()),
        Err(e) if e.kind() == ErrorKind::InvalidData => {
            warn!(dataset = %dataset.key(), error = %e, "Version index is not UTF-8, starting fresh");
            return Ok(VersionIndex::default());
        }
        Err(e) => return Err(io_err(path, e)),
    };

    match serde_json::from_str::<VersionIndex>(&contents) {
        Ok(index) if index.is_consistent() => Ok(index),
        Ok(_) => {
            warn!(dataset = %dataset.key(), "Version index is inconsistent, starting fresh");
            Ok(VersionIndex::default())
        }
        Err(e) => {
            warn!(dataset = %dataset.key(), error = %e, "Version index is corrupt, starting fresh");
            Ok(VersionIndex::default())
        }
    }
}

/// Save the version index for `dataset` atomically.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn save(dataset: &Dataset, index: &VersionIndex) -> SyncResult<()> {
    let json = serde_json::to_string_pretty(index)?;
    atomic_write(&dataset.index_path(), &json)
}
