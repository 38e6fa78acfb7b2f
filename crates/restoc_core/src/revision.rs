//! Record revisions for optimistic concurrency.
//!
//! A revision is `{n}-{hash}`: a counter bumped on every write and the
//! first 32 hex characters of the SHA-256 of the record's JSON encoding
//! (revision field excluded).

use crate::error::RecordResult;
use restoc_codec::{to_json, Value, ValueMap};
use sha2::{Digest, Sha256};

const HASH_LEN: usize = 32;

/// Returns the counter part of a revision, or 0 if it doesn't parse.
pub fn counter(revision: &str) -> u64 {
    revision
        .split_once('-')
        .and_then(|(n, _)| n.parse().ok())
        .unwrap_or(0)
}

/// Computes the revision following `current` for `values`.
///
/// # Errors
///
/// Returns a codec error if a value can't be JSON encoded.
pub fn next(current: Option<&str>, values: &ValueMap, rev_field: &str) -> RecordResult<String> {
    let n = current.map_or(0, counter) + 1;

    let mut hashed = values.clone();
    hashed.remove(rev_field);
    let digest = Sha256::digest(to_json(&Value::Map(hashed))?.as_bytes());

    let hash: String = digest
        .iter()
        .take(HASH_LEN / 2)
        .map(|b| format!("{b:02x}"))
        .collect();
    Ok(format!("{n}-{hash}"))
}
