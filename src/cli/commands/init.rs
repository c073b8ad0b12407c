//! Initialize a shiftx workspace.
//!
//! Creates the database (schema applied on open) and the export root.
//! Dataset directories below the export root are created on first export.

use crate::config::{load_global_config, resolve_db_path};
use crate::error::{Error, Result};
use crate::storage::SqliteStorage;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use super::export_root;

#[derive(Serialize)]
struct InitOutput {
    database: PathBuf,
    export_dir: PathBuf,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns `AlreadyInitialized` if the database exists and `force` is not
/// set, or an error if the directories or database cannot be created.
pub fn execute(
    db_path: Option<&PathBuf>,
    export_dir: Option<&PathBuf>,
    force: bool,
    json: bool,
) -> Result<()> {
    let db_path = resolve_db_path(db_path.map(PathBuf::as_path)).ok_or_else(|| {
        Error::Config("Could not determine database location".to_string())
    })?;

    if db_path.exists() && !force {
        return Err(Error::AlreadyInitialized { path: db_path });
    }

    let config = load_global_config()?;
    let export_dir = export_root(export_dir, &config)?;

    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }
    if force {
        for suffix in ["", "-wal", "-shm"] {
            let path = PathBuf::from(format!("{}{suffix}", db_path.display()));
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
    }
    SqliteStorage::open(&db_path)?;
    fs::create_dir_all(&export_dir)?;

    if json {
        let output = InitOutput {
            database: db_path,
            export_dir,
        };
        let payload = serde_json::to_string(&output)?;
        println!("{payload}");
    } else {
        println!("Initialized shiftx");
        println!("  Database: {}", db_path.display());
        println!("  Exports:  {}", export_dir.display());
        println!();
        println!("Next: add employees with 'shiftx employee add <CODE> <NAME>'.");
    }

    Ok(())
}
