//! # KV Writer
//!
//! Engine-aware writes for a resolved secret map.
//!
//! KV v1 writes are unconditional overwrites. KV v2 writes are guarded by
//! the resource's declared `casIndex`:
//!
//! | store version      | result                         |
//! |--------------------|--------------------------------|
//! | `> casIndex + 1`   | [`KvWriteError::Conflict`]     |
//! | `== casIndex + 1`  | already applied, nothing sent  |
//! | otherwise          | write with `options.cas`       |

use super::{KvMetadata, KvV2WriteRequest, StoreError};
use crate::crd::{KvEngineVersion, KvSettings};
use crate::observability::metrics;
use crate::provider::KvBackend;
use paths::prelude::{PathBuilder, VaultOperation};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info};
use zeroize::Zeroizing;

/// Resolved key → plaintext map written to one Vault path
pub type SecretData = BTreeMap<String, Zeroizing<String>>;

#[derive(Debug, Error)]
pub enum KvWriteError {
    #[error(
        "cas index behind store at {path}: casIndex {cas_index}, current version {}",
        current_version.map_or_else(|| "unknown".to_string(), |v| v.to_string())
    )]
    Conflict {
        path: String,
        cas_index: u64,
        current_version: Option<u64>,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The store already holds the version this casIndex produces
    AlreadyApplied { version: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KvWriter {
    Unversioned,
    Versioned { cas_index: u64 },
}

impl KvWriter {
    pub fn from_settings(settings: &KvSettings) -> Self {
        match settings.engine_version {
            KvEngineVersion::V1 => KvWriter::Unversioned,
            KvEngineVersion::V2 => KvWriter::Versioned {
                cas_index: settings.cas_index,
            },
        }
    }

    pub fn engine(&self) -> KvEngineVersion {
        match self {
            KvWriter::Unversioned => KvEngineVersion::V1,
            KvWriter::Versioned { .. } => KvEngineVersion::V2,
        }
    }

    pub async fn write(
        &self,
        backend: &dyn KvBackend,
        path: &str,
        data: &SecretData,
    ) -> Result<WriteOutcome, KvWriteError> {
        let result = match *self {
            KvWriter::Unversioned => backend
                .write(path, serde_json::Value::Object(to_json(data)))
                .await
                .map(|()| WriteOutcome::Written)
                .map_err(KvWriteError::from),
            KvWriter::Versioned { cas_index } => {
                write_versioned(backend, path, data, cas_index).await
            }
        };

        let outcome = match &result {
            Ok(WriteOutcome::Written) => "written",
            Ok(WriteOutcome::AlreadyApplied { .. }) => "unchanged",
            Err(KvWriteError::Conflict { .. }) => "conflict",
            Err(KvWriteError::Store(_)) => "error",
        };
        metrics::record_kv_write(self.engine().as_str(), outcome);
        result
    }

    /// Remove the secret. For KV v2 every version is removed via the metadata path.
    pub async fn delete(&self, backend: &dyn KvBackend, path: &str) -> Result<(), StoreError> {
        match self {
            KvWriter::Unversioned => backend.delete(path).await,
            KvWriter::Versioned { .. } => {
                let metadata = metadata_api_path(path)?;
                backend.delete(&metadata).await
            }
        }
    }
}

async fn write_versioned(
    backend: &dyn KvBackend,
    path: &str,
    data: &SecretData,
    cas_index: u64,
) -> Result<WriteOutcome, KvWriteError> {
    let current_version = current_version(backend, path).await?;
    let expected = cas_index.saturating_add(1);

    if current_version > expected {
        return Err(KvWriteError::Conflict {
            path: path.to_string(),
            cas_index,
            current_version: Some(current_version),
        });
    }

    if current_version == expected {
        debug!(
            "Vault path {} already at version {}, skipping write",
            path, current_version
        );
        return Ok(WriteOutcome::AlreadyApplied {
            version: current_version,
        });
    }

    let body = KvV2WriteRequest::new(to_json(data), cas_index);
    let body = serde_json::to_value(body)
        .map_err(|e| StoreError::InvalidResponse(format!("failed to encode write: {e}")))?;

    match backend.write(path, body).await {
        Ok(()) => {
            info!(
                "Wrote {} keys to {} (cas {})",
                data.len(),
                path,
                cas_index
            );
            Ok(WriteOutcome::Written)
        }
        Err(StoreError::CheckAndSetMismatch(_)) => Err(KvWriteError::Conflict {
            path: path.to_string(),
            cas_index,
            current_version: None,
        }),
        Err(e) => Err(e.into()),
    }
}

/// `current_version` from the KV v2 metadata; absent secrets are version 0
async fn current_version(backend: &dyn KvBackend, path: &str) -> Result<u64, StoreError> {
    let metadata_path = metadata_api_path(path)?;
    match backend.read(&metadata_path).await? {
        Some(data) => {
            let metadata: KvMetadata = serde_json::from_value(data).map_err(|e| {
                StoreError::InvalidResponse(format!("metadata at {metadata_path}: {e}"))
            })?;
            Ok(metadata.current_version)
        }
        None => Ok(0),
    }
}

/// Metadata tree path relative to the API prefix, as [`KvBackend`] expects it
fn metadata_api_path(path: &str) -> Result<String, StoreError> {
    Ok(PathBuilder::new()
        .operation(VaultOperation::KvMetadata)
        .secret_path(path)
        .build_api_path()?)
}

fn to_json(data: &SecretData) -> serde_json::Map<String, serde_json::Value> {
    data.iter()
        .map(|(key, value)| (key.clone(), serde_json::Value::String(value.to_string())))
        .collect()
}
