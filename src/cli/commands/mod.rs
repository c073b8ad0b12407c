//! Command implementations.

pub mod completions;
pub mod employee;
pub mod export;
pub mod init;
pub mod runs;
pub mod status;
pub mod submission;
pub mod version;

use std::path::PathBuf;

use crate::config::{resolve_db_path, resolve_export_dir, ShiftxConfig};
use crate::error::{Error, Result};
use crate::model::YearMonth;
use crate::storage::SqliteStorage;

/// Open the database, failing if `shiftx init` has not run.
pub(crate) fn open_storage(db_path: Option<&PathBuf>) -> Result<SqliteStorage> {
    let db_path = resolve_db_path(db_path.map(PathBuf::as_path)).ok_or(Error::NotInitialized)?;

    if !db_path.exists() {
        return Err(Error::NotInitialized);
    }

    SqliteStorage::open(&db_path)
}

/// Resolve the export root from flag, config, or default.
pub(crate) fn export_root(export_dir: Option<&PathBuf>, config: &ShiftxConfig) -> Result<PathBuf> {
    resolve_export_dir(export_dir.map(PathBuf::as_path), config)
        .ok_or_else(|| Error::Config("Could not determine export directory".to_string()))
}

/// Parse a `YYYY-MM` argument.
pub(crate) fn parse_month(input: &str) -> Result<YearMonth> {
    input
        .parse()
        .map_err(Error::InvalidArgument)
}
