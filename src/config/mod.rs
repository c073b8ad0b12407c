//! Configuration management.
//!
//! This module resolves the database path and the export root, and loads
//! the optional `config.json`.
//!
//! # Layout
//!
//! Everything lives under `~/.shiftx/` unless overridden:
//! - **Database**: `~/.shiftx/data/shiftx.db`
//! - **Exports**: `~/.shiftx/exports/` (one directory per dataset)
//! - **Config**: `~/.shiftx/config.json`
//!
//! Priority for every setting is CLI flag > environment > config file > default.
//! Flags and their environment fallbacks are handled by clap.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Settings read from `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftxConfig {
    /// Export root override.
    pub export_dir: Option<PathBuf>,

    /// Run an automatic export after each submission is stored.
    pub auto_export: bool,
}

impl Default for ShiftxConfig {
    fn default() -> Self {
        Self {
            export_dir: None,
            auto_export: true,
        }
    }
}

/// Get the global shiftx directory (`~/.shiftx/`).
#[must_use]
pub fn global_shiftx_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".shiftx"))
}

/// Resolve the config file path.
///
/// `SHIFTX_CONFIG` wins over `~/.shiftx/config.json`.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("SHIFTX_CONFIG") {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    global_shiftx_dir().map(|dir| dir.join("config.json"))
}

/// Load configuration from `path`.
///
/// A missing file yields the defaults.
///
/// # Errors
///
/// Returns `Config` if the file exists but cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<ShiftxConfig> {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid {}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No config file, using defaults");
            Ok(ShiftxConfig::default())
        }
        Err(e) => Err(Error::Config(format!(
            "Cannot read {}: {e}",
            path.display()
        ))),
    }
}

/// Load configuration from the resolved config path.
///
/// # Errors
///
/// See [`load_config`].
pub fn load_global_config() -> Result<ShiftxConfig> {
    match config_path() {
        Some(path) => load_config(&path),
        None => Ok(ShiftxConfig::default()),
    }
}

/// Resolve the database path.
///
/// Priority:
/// 1. `explicit_path` (the `--db` flag or `SHIFTX_DB`)
/// 2. Global location: `~/.shiftx/data/shiftx.db`
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }
    global_shiftx_dir().map(|dir| dir.join("data").join("shiftx.db"))
}

/// Resolve the export root.
///
/// Priority:
/// 1. `explicit_path` (the `--export-dir` flag or `SHIFTX_EXPORT_DIR`)
/// 2. `export_dir` from the config file
/// 3. Global location: `~/.shiftx/exports`
#[must_use]
pub fn resolve_export_dir(explicit_path: Option<&Path>, config: &ShiftxConfig) -> Option<PathBuf> {
    explicit_path
        .map(Path::to_path_buf)
        .or_else(|| config.export_dir.clone())
        .or_else(|| global_shiftx_dir().map(|dir| dir.join("exports")))
}

/// Get the default actor name.
///
/// Priority:
/// 1. Git user name
/// 2. System username
/// 3. "unknown"
///
/// `--actor` / `SHIFTX_ACTOR` are applied by the caller before this.
#[must_use]
pub fn default_actor() -> String {
    if let Ok(output) = std::process::Command::new("git")
        .args(["config", "user.name"])
        .output()
    {
        if output.status.success() {
            let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !name.is_empty() {
                return name;
            }
        }
    }

    if let Ok(user) = std::env::var("USER") {
        if !user.is_empty() {
            return user;
        }
    }

    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_actor() {
        let actor = default_actor();
        assert!(!actor.is_empty());
    }

    #[test]
    fn test_resolve_db_path_with_explicit() {
        let explicit = PathBuf::from("/custom/path/db.sqlite");
        let result = resolve_db_path(Some(&explicit));
        assert_eq!(result, Some(explicit));
    }

    #[test]
    fn test_resolve_db_path_global() {
        let path = resolve_db_path(None).unwrap();
        assert!(path.ends_with("data/shiftx.db"));
    }

    #[test]
    fn test_resolve_export_dir_priority() {
        let config = ShiftxConfig {
            export_dir: Some(PathBuf::from("/from/config")),
            auto_export: true,
        };
        let flag = PathBuf::from("/from/flag");

        assert_eq!(
            resolve_export_dir(Some(&flag), &config),
            Some(flag.clone())
        );
        assert_eq!(
            resolve_export_dir(None, &config),
            Some(PathBuf::from("/from/config"))
        );
        assert!(
            resolve_export_dir(None, &ShiftxConfig::default())
                .unwrap()
                .ends_with(".shiftx/exports")
        );
    }

    #[test]
    fn test_load_config_missing_file_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("config.json")).unwrap();
        assert_eq!(config, ShiftxConfig::default());
        assert!(config.auto_export);
    }

    #[test]
    fn test_load_config_partial_and_invalid() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");

        fs::write(&path, r#"{"auto_export": false}"#).unwrap();
        let config = load_config(&path).unwrap();
        assert!(!config.auto_export);
        assert!(config.export_dir.is_none());

        fs::write(&path, "{not json").unwrap();
        assert!(matches!(load_config(&path), Err(Error::Config(_))));
    }
}
