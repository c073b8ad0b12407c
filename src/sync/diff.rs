//! Row-hash diffing.
//!
//! Compares the key→fingerprint map of the last artifact with the one of the
//! freshly projected rows.

use std::collections::BTreeMap;

use crate::sync::hash::has_changed;
use crate::sync::types::Diff;

/// Count inserted, updated and deleted keys between two snapshots.
#[must_use]
pub fn compute_diff(
    previous: &BTreeMap<String, String>,
    current: &BTreeMap<String, String>,
) -> Diff {
    let mut diff = Diff::default();

    for (key, hash) in current {
        match previous.get(key) {
            None => diff.inserted += 1,
            Some(stored) if has_changed(hash, Some(stored)) => diff.updated += 1,
            Some(_) => {}
        }
    }

    diff.deleted = previous
        .keys()
        .filter(|key| !current.contains_key(*key))
        .count();

    diff
}

/// Whether an export must produce a new artifact.
///
/// A dataset that never produced an artifact always exports, even when the
/// row set is empty, so consumers can see that the export ran.
#[must_use]
pub fn is_changed(diff: &Diff, has_artifact: bool) -> bool {
    !diff.is_empty() || !has_artifact
}
