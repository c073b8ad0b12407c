//! Content hashing for change detection.
//!
//! Each row is serialized to canonical JSON (typed struct, fixed field order)
//! and hashed with SHA256. Equal logical content always yields the same
//! fingerprint, so a memo edit is detected even when the row count is stable.

use std::collections::BTreeMap;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::sync::project::Row;
use crate::sync::types::{SyncError, SyncResult};

/// Compute a SHA256 hash of a serializable value.
///
/// The value is first serialized to JSON, then hashed.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn content_hash<T: Serialize>(value: &T) -> SyncResult<String> {
    let json = serde_json::to_string(value)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Fingerprint every row, keyed by natural key.
///
/// # Errors
///
/// Returns [`SyncError::DuplicateKey`] if two rows share a natural key.
pub fn fingerprint_rows(dataset: &str, rows: &[Row]) -> SyncResult<BTreeMap<String, String>> {
    let mut hashes = BTreeMap::new();
    for row in rows {
        let key = row.natural_key();
        let hash = content_hash(row)?;
        if hashes.insert(key.clone(), hash).is_some() {
            return Err(SyncError::DuplicateKey {
                dataset: dataset.to_string(),
                key,
            });
        }
    }
    Ok(hashes)
}

/// Check if a row has changed since the last export.
///
/// Returns `true` if there is no stored hash or it differs.
#[must_use]
pub fn has_changed(current_hash: &str, stored_hash: Option<&str>) -> bool {
    stored_hash.is_none_or(|h| h != current_hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::project::EmployeeRow;

    fn row(id: i64, name: &str) -> Row {
        Row::Employee(EmployeeRow {
            employee_id: id,
            employee_code: format!("E-{id}"),
            display_name: name.to_string(),
            department: String::new(),
            is_active: 1,
        })
    }

    #[test]
    fn test_content_hash_deterministic() {
        let hash1 = content_hash(&row(1, "Aiko")).unwrap();
        let hash2 = content_hash(&row(1, "Aiko")).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64); // SHA256 produces 64 hex chars
    }

    #[test]
    fn test_content_hash_changes_with_content() {
        let hash1 = content_hash(&row(1, "Aiko")).unwrap();
        let hash2 = content_hash(&row(1, "Aiko T.")).unwrap();
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_fingerprint_rows_keys() {
        let hashes = fingerprint_rows("employees", &[row(2, "b"), row(1, "a")]).unwrap();
        let keys: Vec<_> = hashes.keys().cloned().collect();
        assert_eq!(keys, vec!["1", "2"]);
    }

    #[test]
    fn test_fingerprint_rows_rejects_duplicate_key() {
        let err = fingerprint_rows("employees", &[row(1, "a"), row(1, "b")]).unwrap_err();
        assert!(matches!(err, SyncError::DuplicateKey { .. }));
    }

    #[test]
    fn test_has_changed() {
        assert!(has_changed("abc123", None));
        assert!(has_changed("abc123", Some("xyz789")));
        assert!(!has_changed("abc123", Some("abc123")));
    }
}
