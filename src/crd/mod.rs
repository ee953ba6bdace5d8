//! # Custom Resource Definitions
//!
//! - [`KMSVaultSecret`]: a bundle of KMS-encrypted entries synced to one Vault path
//! - [`PartialKMSVaultSecret`]: a reusable set of entries spliced into bundles
//!   through `includeSecrets`
//!
//! Both live in the `secret-management.octopilot.io/v1alpha1` API group.

mod partial;
mod secret;
mod spec;
mod status;

pub use partial::{PartialKMSVaultSecret, PartialKMSVaultSecretSpec};
pub use secret::{
    AuthMethod, KvEngineVersion, KvSettings, SecretContext, SecretEntry, UnknownAuthMethod,
};
pub use spec::{KMSVaultSecret, KMSVaultSecretSpec};
pub use status::{Condition, KMSVaultSecretStatus};

/// API group shared by both CRDs
pub const API_GROUP: &str = "secret-management.octopilot.io";
/// API version shared by both CRDs
pub const API_VERSION: &str = "v1alpha1";
