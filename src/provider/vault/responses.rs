//! Vault API response types

use serde::Deserialize;

/// Common Vault response envelope
#[derive(Debug, Deserialize)]
pub struct VaultResponse<T> {
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub auth: Option<AuthInfo>,
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
}

/// `auth` block returned by login and renew-self
#[derive(Deserialize)]
pub struct AuthInfo {
    pub client_token: String,
    /// Seconds until the token expires; 0 means no expiry
    #[serde(default)]
    pub lease_duration: i64,
    #[serde(default)]
    pub renewable: bool,
    #[serde(default)]
    pub policies: Vec<String>,
}

impl std::fmt::Debug for AuthInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthInfo")
            .field("client_token", &"***")
            .field("lease_duration", &self.lease_duration)
            .field("renewable", &self.renewable)
            .field("policies", &self.policies)
            .finish()
    }
}

/// `data` of `auth/token/lookup-self`
#[derive(Debug, Deserialize)]
pub struct LookupSelfData {
    /// RFC 3339 timestamp, null for tokens without expiry
    #[serde(default)]
    pub expire_time: Option<String>,
    #[serde(default)]
    pub renewable: bool,
    #[serde(default)]
    pub ttl: i64,
}

/// `data` of a KV v2 metadata read
#[derive(Debug, Deserialize)]
pub struct KvMetadata {
    #[serde(default)]
    pub current_version: u64,
}

/// Error body
#[derive(Debug, Default, Deserialize)]
pub struct VaultErrorResponse {
    #[serde(default)]
    pub errors: Vec<String>,
}
