//! # Configuration
//!
//! Process-level settings loaded from environment variables.
//!
//! - [`ControllerConfig`]: reconcile cadence and controller defaults
//! - [`VaultConfig`]: Vault address, trust material and client timeout
//! - [`ServerConfig`]: metrics/probe HTTP server
//!
//! Per-strategy auth settings live in [`crate::provider::vault::auth::AuthSettings`].

mod controller;
mod server;
mod vault;

pub use controller::ControllerConfig;
pub use server::ServerConfig;
pub use vault::{TrustSource, VaultConfig};

/// Read environment variable or return default value
pub(crate) fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as boolean or return default
pub(crate) fn env_var_or_default_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| {
            let v_lower = v.to_lowercase();
            v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
        })
        .unwrap_or(default)
}

/// Read environment variable as string or return default
pub(crate) fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read a non-empty environment variable
pub(crate) fn env_var_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
