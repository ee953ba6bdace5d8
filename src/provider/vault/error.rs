//! # Vault Errors

use paths::prelude::PathBuilderError;
use std::path::PathBuf;
use thiserror::Error;

use super::responses::VaultErrorResponse;

/// Errors from the Vault HTTP API and client setup
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Vault request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Vault returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// KV v2 rejected the write because `options.cas` did not match the current version
    #[error("check-and-set rejected by Vault: {0}")]
    CheckAndSetMismatch(String),

    #[error("Invalid Vault path: {0}")]
    Path(#[from] PathBuilderError),

    #[error("Unexpected Vault response: {0}")]
    InvalidResponse(String),

    #[error("Failed to load CA certificates from {}: {message}", path.display())]
    TrustMaterial { path: PathBuf, message: String },

    #[error("Vault session is no longer running")]
    SessionClosed,
}

impl StoreError {
    /// Build an error from a non-success Vault response.
    ///
    /// Vault reports failures as `{"errors": [...]}`; a KV v2 CAS mismatch is
    /// a 400 whose message mentions `check-and-set`.
    pub fn from_response(status: reqwest::StatusCode, error_text: &str) -> Self {
        let message = match serde_json::from_str::<VaultErrorResponse>(error_text) {
            Ok(response) if !response.errors.is_empty() => response.errors.join("; "),
            _ => error_text.trim().to_string(),
        };

        if status == reqwest::StatusCode::BAD_REQUEST && message.contains("check-and-set") {
            return StoreError::CheckAndSetMismatch(message);
        }

        StoreError::Status {
            status: status.as_u16(),
            message,
        }
    }

    /// HTTP status for errors that carry one
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Status { status, .. } => Some(*status),
            StoreError::CheckAndSetMismatch(_) => Some(400),
            StoreError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
