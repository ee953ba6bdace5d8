//! # Vault Configuration
//!
//! Connection settings shared by every auth strategy. Names follow the
//! `vault` CLI so existing deployments can reuse their environment.

use super::{env_var_non_empty, env_var_or_default, env_var_or_default_bool, env_var_or_default_str};
use crate::constants::{DEFAULT_VAULT_ADDR, DEFAULT_VAULT_CLIENT_TIMEOUT_SECS};
use std::path::PathBuf;
use std::time::Duration;

/// Where the Vault client finds its CA certificates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustSource {
    /// PEM bundle (`VAULT_CACERT`)
    pub ca_cert: Option<PathBuf>,
    /// Directory of PEM files (`VAULT_CAPATH`)
    pub ca_path: Option<PathBuf>,
}

impl TrustSource {
    /// True when the client should only use the built-in roots
    pub fn is_empty(&self) -> bool {
        self.ca_cert.is_none() && self.ca_path.is_none()
    }

    /// Files and directories that trigger a client rebuild when changed
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        self.ca_cert
            .iter()
            .chain(self.ca_path.iter())
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Vault server address (`VAULT_ADDR`)
    pub address: String,
    pub trust: TrustSource,
    /// Disable certificate verification (`VAULT_SKIP_VERIFY`)
    pub skip_verify: bool,
    /// Per-request timeout (seconds)
    pub client_timeout_secs: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_VAULT_ADDR.to_string(),
            trust: TrustSource::default(),
            skip_verify: false,
            client_timeout_secs: DEFAULT_VAULT_CLIENT_TIMEOUT_SECS,
        }
    }
}

impl VaultConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            address: env_var_or_default_str("VAULT_ADDR", DEFAULT_VAULT_ADDR),
            trust: TrustSource {
                ca_cert: env_var_non_empty("VAULT_CACERT").map(PathBuf::from),
                ca_path: env_var_non_empty("VAULT_CAPATH").map(PathBuf::from),
            },
            skip_verify: env_var_or_default_bool("VAULT_SKIP_VERIFY", false),
            client_timeout_secs: env_var_or_default(
                "VAULT_CLIENT_TIMEOUT_SECS",
                DEFAULT_VAULT_CLIENT_TIMEOUT_SECS,
            ),
        }
    }

    pub fn client_timeout(&self) -> Duration {
        Duration::from_secs(self.client_timeout_secs)
    }

    /// Address without trailing slash, ready for path concatenation
    pub fn base_url(&self) -> &str {
        self.address.trim_end_matches('/')
    }
}
