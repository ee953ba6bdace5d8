//! # Constants
//!
//! Shared constants used throughout the controller and webhook.
//!
//! These values represent reasonable defaults and can be overridden via
//! environment variables where applicable.

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default requeue interval after a successful sync (seconds)
pub const DEFAULT_SYNC_PERIOD_SECS: u64 = 120;

/// Default requeue interval for reconciliation errors (seconds)
pub const DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS: u64 = 15;

/// Default delay before restarting the controller stream after it ends (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;

/// Default timeout for a single KMS decrypt call (seconds)
pub const DEFAULT_KMS_DECRYPT_TIMEOUT_SECS: u64 = 10;

/// Default Vault address, matching the vault CLI
pub const DEFAULT_VAULT_ADDR: &str = "https://127.0.0.1:8200";

/// Default timeout for Vault HTTP requests (seconds)
pub const DEFAULT_VAULT_CLIENT_TIMEOUT_SECS: u64 = 60;

/// Default debounce window for certificate and CA file watches
pub const DEFAULT_FILE_WATCH_DEBOUNCE_MS: u64 = 100;

/// Finalizer that opts a KMSVaultSecret into Vault deletion on removal
pub const DELETE_FINALIZER: &str = "delete.secret-management.octopilot.io";

/// Field manager and event reporter name
pub const CONTROLLER_NAME: &str = "kms-vault-controller";

/// Default Vault role for Kubernetes auth
pub const DEFAULT_K8S_ROLE: &str = "kms-vault-operator";

/// Projected service account token
pub const DEFAULT_K8S_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// Default admission listen address
pub const DEFAULT_WEBHOOK_LISTEN_ADDR: &str = "0.0.0.0:4443";

/// Default webhook metrics and probe address
pub const DEFAULT_WEBHOOK_METRICS_ADDR: &str = "0.0.0.0:8081";
