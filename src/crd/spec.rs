//! # KMSVaultSecret Spec

use super::{AuthMethod, KvSettings, SecretContext, SecretEntry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// KMSVaultSecret Custom Resource Definition
///
/// Declares a set of KMS-encrypted entries that the controller decrypts and
/// writes as a single secret to a Vault KV path.
///
/// # Example
///
/// ```yaml
/// apiVersion: secret-management.octopilot.io/v1alpha1
/// kind: KMSVaultSecret
/// metadata:
///   name: payments-api
///   namespace: payments
///   finalizers:
///     - delete.secret-management.octopilot.io
/// spec:
///   path: secret/data/payments/api
///   kvSettings:
///     engineVersion: v2
///     casIndex: 3
///   vaultAuthMethod: k8s
///   secretContext:
///     team: payments
///   includeSecrets:
///     - shared-db-credentials
///   secrets:
///     - key: API_KEY
///       encryptedSecret: AQICAHh...
///     - key: OPTIONAL_FLAG
///       emptySecret: true
/// ```
#[derive(kube::CustomResource, Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "KMSVaultSecret",
    group = "secret-management.octopilot.io",
    version = "v1alpha1",
    namespaced,
    status = "crate::crd::KMSVaultSecretStatus",
    shortname = "kvs",
    printcolumn = r#"{"name":"Path", "type":"string", "jsonPath":".spec.path"}, {"name":"Created", "type":"boolean", "jsonPath":".status.created"}, {"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct KMSVaultSecretSpec {
    /// Vault path the composed secret is written to.
    /// For KV v2 include the `data` segment (e.g. `secret/data/app`).
    pub path: String,
    #[serde(default)]
    pub kv_settings: KvSettings,
    /// Entries owned by this resource
    #[serde(default)]
    pub secrets: Vec<SecretEntry>,
    /// Default encryption context for entries without their own
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub secret_context: SecretContext,
    /// Auth method for this resource.
    /// Falls back to the controller default (`VAULT_AUTH_METHOD`) when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_auth_method: Option<AuthMethod>,
    /// Names of PartialKMSVaultSecret resources in the same namespace whose
    /// entries are appended after this resource's own entries, in order
    #[serde(default)]
    pub include_secrets: Vec<String>,
}
