//! # PartialKMSVaultSecret Spec

use super::{SecretContext, SecretEntry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reusable entry set referenced from `KMSVaultSecret.spec.includeSecrets`.
///
/// The controller never reconciles these on their own; they are read
/// whenever an including bundle is synced.
#[derive(kube::CustomResource, Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "PartialKMSVaultSecret",
    group = "secret-management.octopilot.io",
    version = "v1alpha1",
    namespaced,
    shortname = "pkvs"
)]
#[serde(rename_all = "camelCase")]
pub struct PartialKMSVaultSecretSpec {
    #[serde(default)]
    pub secrets: Vec<SecretEntry>,
    /// Default encryption context for this bundle's entries
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub secret_context: SecretContext,
}
