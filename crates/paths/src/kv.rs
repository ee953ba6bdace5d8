//! KV engine path helpers
//!
//! A KV v2 mount exposes the same secret under two trees:
//!
//! ```text
//! secret/data/team/api       <- read/write secret data
//! secret/metadata/team/api   <- versions, delete all versions
//! ```

use crate::errors::PathBuilderError;

/// Segment that selects the data tree of a KV v2 mount
pub const DATA_SEGMENT: &str = "data";

/// Segment that selects the metadata tree of a KV v2 mount
pub const METADATA_SEGMENT: &str = "metadata";

/// Strip leading/trailing slashes and collapse empty segments.
///
/// Returns [`PathBuilderError::EmptyPath`] when nothing is left.
pub fn normalize(path: &str) -> Result<String, PathBuilderError> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Err(PathBuilderError::EmptyPath);
    }
    Ok(segments.join("/"))
}

/// Derive the KV v2 metadata path for a declared secret path.
///
/// The first segment always belongs to the mount. The first `data` segment
/// after it that still has a secret name below it is replaced by `metadata`,
/// which also covers nested mounts (`team/kv/data/app`). Without such a
/// segment `metadata` is inserted after the first segment, so `secret/foo`
/// and `secret/data/foo` address the same metadata entry.
pub fn metadata_path(path: &str) -> Result<String, PathBuilderError> {
    let normalized = normalize(path)?;
    let mut segments: Vec<&str> = normalized.split('/').collect();
    if segments.len() < 2 {
        return Err(PathBuilderError::MissingMount(normalized));
    }

    let data_index = (1..segments.len() - 1).find(|&i| segments[i] == DATA_SEGMENT);
    match data_index {
        Some(i) => segments[i] = METADATA_SEGMENT,
        None => segments.insert(1, METADATA_SEGMENT),
    }

    Ok(segments.join("/"))
}
