//! # Prelude
//!
//! Re-exports the types most callers need: the CRDs, the provider traits,
//! the reconciler context and configuration.

pub use crate::crd::*;

pub use crate::provider::kms::{DecryptionError, DecryptionGateway, Decryptor};
pub use crate::provider::vault::auth::{AuthError, AuthSettings, Credential};
pub use crate::provider::vault::kv::{KvWriteError, KvWriter, SecretData, WriteOutcome};
pub use crate::provider::vault::{SessionHandle, StoreError, VaultClient, VaultSession};
pub use crate::provider::{KvBackend, StoreSession, TokenApi};

pub use crate::controller::reconciler::{
    reconcile, ControlPlane, ControlPlaneError, Reconciler, ReconcilerError,
};

pub use crate::config::{ControllerConfig, ServerConfig, VaultConfig};
