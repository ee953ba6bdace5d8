//! # Secret Entry Types
//!
//! Types shared by [`KMSVaultSecret`](super::KMSVaultSecret) and
//! [`PartialKMSVaultSecret`](super::PartialKMSVaultSecret).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// KMS encryption context: additional authenticated data bound to a ciphertext
pub type SecretContext = BTreeMap<String, String>;

/// A single key in a secret bundle
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretEntry {
    /// Key written to Vault
    pub key: String,
    /// Base64 KMS ciphertext blob
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_secret: Option<String>,
    /// Per-entry encryption context. Overrides the bundle context when non-empty.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub secret_context: SecretContext,
    /// Store an empty string for this key without calling KMS.
    /// Any ciphertext on the entry is ignored.
    #[serde(default)]
    pub empty_secret: bool,
}

/// Vault KV secrets engine version
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize, schemars::JsonSchema,
)]
pub enum KvEngineVersion {
    #[default]
    #[serde(rename = "v1")]
    V1,
    #[serde(rename = "v2")]
    V2,
}

impl KvEngineVersion {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            KvEngineVersion::V1 => "v1",
            KvEngineVersion::V2 => "v2",
        }
    }
}

/// KV engine settings for the target path
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KvSettings {
    /// KV engine version mounted at the target path
    #[serde(default)]
    pub engine_version: KvEngineVersion,
    /// Check-and-set index for KV v2 writes.
    /// The write is accepted by Vault only while its current version equals this value.
    #[serde(default)]
    pub cas_index: u64,
}

/// Vault authentication method
///
/// One variant per supported login strategy. The serialized names match the
/// `VAULT_AUTH_METHOD` values accepted by the controller.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize, schemars::JsonSchema,
)]
pub enum AuthMethod {
    #[default]
    #[serde(rename = "token")]
    Token,
    #[serde(rename = "userpass")]
    Userpass,
    #[serde(rename = "approle")]
    AppRole,
    #[serde(rename = "github")]
    GitHub,
    #[serde(rename = "iam")]
    AwsIam,
    #[serde(rename = "k8s")]
    Kubernetes,
}

impl AuthMethod {
    pub const ALL: [AuthMethod; 6] = [
        AuthMethod::Token,
        AuthMethod::Userpass,
        AuthMethod::AppRole,
        AuthMethod::GitHub,
        AuthMethod::AwsIam,
        AuthMethod::Kubernetes,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::Token => "token",
            AuthMethod::Userpass => "userpass",
            AuthMethod::AppRole => "approle",
            AuthMethod::GitHub => "github",
            AuthMethod::AwsIam => "iam",
            AuthMethod::Kubernetes => "k8s",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized auth method name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown Vault auth method '{0}' (expected one of: token, userpass, approle, github, iam, k8s)")]
pub struct UnknownAuthMethod(pub String);

impl FromStr for AuthMethod {
    type Err = UnknownAuthMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        AuthMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == name)
            .ok_or_else(|| UnknownAuthMethod(name.to_string()))
    }
}
