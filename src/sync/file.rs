//! Atomic file operations for export.
//!
//! This module provides safe file operations that prevent data corruption:
//! - Atomic writes for the version index: temp file, fsync, rename
//! - Create-new writes for artifacts, which are never overwritten

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::sync::types::{io_err, SyncResult};

/// Write content to a file atomically.
///
/// This function:
/// 1. Writes content to a temporary file (same path with `.tmp` appended)
/// 2. Calls `fsync` to ensure data is on disk
/// 3. Atomically renames the temp file to the target path
///
/// If any step fails, the original file (if any) remains untouched.
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn atomic_write(path: &Path, content: &str) -> SyncResult<()> {
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = Path::new(&temp_name);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    {
        let file = File::create(temp_path).map_err(|e| io_err(temp_path, e))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(content.as_bytes())
            .and_then(|()| writer.flush())
            .and_then(|()| writer.get_ref().sync_all())
            .map_err(|e| io_err(temp_path, e))?;
    }

    if let Err(e) = fs::rename(temp_path, path) {
        let _ = fs::remove_file(temp_path);
        return Err(io_err(path, e));
    }

    Ok(())
}

/// Write content to a file that must not exist yet.
///
/// Artifacts are immutable: an existing file at `path` is an error, never
/// overwritten. A partially written file is removed on failure.
///
/// # Errors
///
/// Returns an error if the file exists or cannot be written.
pub fn write_new(path: &Path, content: &str) -> SyncResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| io_err(path, e))?;

    let mut writer = BufWriter::new(file);
    let result = writer
        .write_all(content.as_bytes())
        .and_then(|()| writer.flush())
        .and_then(|()| writer.get_ref().sync_all());

    if let Err(e) = result {
        drop(writer);
        let _ = fs::remove_file(path);
        return Err(io_err(path, e));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::types::SyncError;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index.json");

        atomic_write(&path, "{}").unwrap();
        atomic_write(&path, "{\"a\":1}").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\"a\":1}");
        assert!(!temp_dir.path().join("index.json.tmp").exists());
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("submissions").join("202603").join("index.json");
        atomic_write(&path, "{}").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_write_new() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.csv");

        write_new(&path, "h\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "h\n");
    }

    #[test]
    fn test_write_new_refuses_to_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.csv");
        fs::write(&path, "original").unwrap();

        let result = write_new(&path, "new");
        assert!(matches!(result, Err(SyncError::Io { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");
    }
}
