//! # Reconciler Types

use super::control_plane::{ControlPlane, ControlPlaneError};
use crate::config::ControllerConfig;
use crate::crd::AuthMethod;
use crate::provider::kms::DecryptionGateway;
use crate::provider::vault::auth::AuthError;
use crate::provider::vault::kv::KvWriteError;
use crate::provider::vault::StoreError;
use crate::provider::StoreSession;
use std::sync::Arc;
use thiserror::Error;

/// Shared context handed to every reconcile pass
pub struct Reconciler {
    pub control_plane: Arc<dyn ControlPlane>,
    pub session: Arc<dyn StoreSession>,
    pub gateway: DecryptionGateway,
    pub config: ControllerConfig,
    /// Used when a resource does not set `vaultAuthMethod`
    pub default_auth_method: AuthMethod,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("gateway", &self.gateway)
            .field("config", &self.config)
            .field("default_auth_method", &self.default_auth_method)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("resource {0} has no namespace")]
    MissingNamespace(String),

    #[error("Vault authentication failed: {0}")]
    Authentication(#[from] AuthError),

    #[error(transparent)]
    Write(#[from] KvWriteError),

    #[error("failed to delete Vault path {path}: {source}")]
    Delete {
        path: String,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    ControlPlane(#[from] ControlPlaneError),
}

impl ReconcilerError {
    /// Label for the error metric
    pub fn metric_label(&self) -> &'static str {
        match self {
            ReconcilerError::MissingNamespace(_) => "invalid",
            ReconcilerError::Authentication(e) if e.is_configuration() => "configuration",
            ReconcilerError::Authentication(_) => "auth",
            ReconcilerError::Write(KvWriteError::Conflict { .. }) => "cas_conflict",
            ReconcilerError::Write(KvWriteError::Store(_)) | ReconcilerError::Delete { .. } => {
                "store"
            }
            ReconcilerError::ControlPlane(_) => "kubernetes",
        }
    }

    /// False when another pass cannot succeed until the resource or the
    /// controller's configuration changes
    pub fn is_retryable(&self) -> bool {
        match self {
            ReconcilerError::MissingNamespace(_) => false,
            ReconcilerError::Authentication(e) => !e.is_configuration(),
            ReconcilerError::Write(_)
            | ReconcilerError::Delete { .. }
            | ReconcilerError::ControlPlane(_) => true,
        }
    }
}

/// Where a pass is, recorded on its tracing span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Fetched,
    Composed,
    Authenticated,
    Deleting,
    Writing,
    Done,
}

impl SyncPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncPhase::Fetched => "fetched",
            SyncPhase::Composed => "composed",
            SyncPhase::Authenticated => "authenticated",
            SyncPhase::Deleting => "deleting",
            SyncPhase::Writing => "writing",
            SyncPhase::Done => "done",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_auth_settings_are_not_retried() {
        let err = ReconcilerError::from(AuthError::MissingConfiguration {
            method: AuthMethod::Userpass,
            missing: "VAULT_USERNAME",
        });
        assert!(!err.is_retryable());
        assert_eq!(err.metric_label(), "configuration");
    }

    #[test]
    fn test_login_and_store_failures_are_retried() {
        let login = ReconcilerError::from(AuthError::Login {
            method: AuthMethod::AppRole,
            source: StoreError::Status {
                status: 503,
                message: "sealed".into(),
            },
        });
        assert!(login.is_retryable());
        assert_eq!(login.metric_label(), "auth");

        let conflict = ReconcilerError::from(KvWriteError::Conflict {
            path: "secret/data/app".into(),
            cas_index: 1,
            current_version: Some(4),
        });
        assert!(conflict.is_retryable());
    }
}
