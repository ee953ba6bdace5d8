//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use super::{env_var_or_default, env_var_or_default_str, env_var_non_empty};
use crate::constants::{
    DEFAULT_KMS_DECRYPT_TIMEOUT_SECS, DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS,
    DEFAULT_SYNC_PERIOD_SECS, DEFAULT_WATCH_RESTART_DELAY_SECS,
};
use std::time::Duration;

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Environment variables are populated from a ConfigMap using `envFrom` in the deployment.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Requeue interval after a successful sync (seconds)
    pub sync_period_secs: u64,
    /// Reconciliation error requeue interval (seconds)
    /// Fixed short backoff for auth, store and conflict failures
    pub reconciliation_error_requeue_secs: u64,
    /// Controller stream restart delay (seconds)
    pub watch_restart_delay_secs: u64,
    /// Timeout for a single KMS decrypt call (seconds)
    pub kms_decrypt_timeout_secs: u64,
    /// Vault auth method used when a resource does not name one.
    /// Raw string; parsed and validated at startup.
    pub default_auth_method: Option<String>,
    /// Log format (json, text)
    pub log_format: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            sync_period_secs: DEFAULT_SYNC_PERIOD_SECS,
            reconciliation_error_requeue_secs: DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS,
            watch_restart_delay_secs: DEFAULT_WATCH_RESTART_DELAY_SECS,
            kms_decrypt_timeout_secs: DEFAULT_KMS_DECRYPT_TIMEOUT_SECS,
            default_auth_method: None,
            log_format: "text".to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            sync_period_secs: env_var_or_default("SYNC_PERIOD_SECS", DEFAULT_SYNC_PERIOD_SECS),
            reconciliation_error_requeue_secs: env_var_or_default(
                "RECONCILIATION_ERROR_REQUEUE_SECS",
                DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS,
            ),
            watch_restart_delay_secs: env_var_or_default(
                "WATCH_RESTART_DELAY_SECS",
                DEFAULT_WATCH_RESTART_DELAY_SECS,
            ),
            kms_decrypt_timeout_secs: env_var_or_default(
                "KMS_DECRYPT_TIMEOUT_SECS",
                DEFAULT_KMS_DECRYPT_TIMEOUT_SECS,
            ),
            default_auth_method: env_var_non_empty("VAULT_AUTH_METHOD"),
            log_format: env_var_or_default_str("LOG_FORMAT", "text"),
        }
    }

    /// Get sync period duration
    pub fn sync_period(&self) -> Duration {
        Duration::from_secs(self.sync_period_secs)
    }

    /// Get reconciliation error requeue duration
    pub fn reconciliation_error_requeue_duration(&self) -> Duration {
        Duration::from_secs(self.reconciliation_error_requeue_secs)
    }

    /// Get watch restart delay duration
    pub fn watch_restart_delay_duration(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_secs)
    }

    /// Get KMS decrypt timeout
    pub fn kms_decrypt_timeout(&self) -> Duration {
        Duration::from_secs(self.kms_decrypt_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ControllerConfig::default();
        assert_eq!(config.sync_period(), Duration::from_secs(120));
        assert_eq!(
            config.reconciliation_error_requeue_duration(),
            Duration::from_secs(15)
        );
        assert_eq!(config.kms_decrypt_timeout(), Duration::from_secs(10));
        assert!(config.default_auth_method.is_none());
    }
}
