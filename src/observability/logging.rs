//! # Logging
//!
//! `RUST_LOG` drives the filter (default `kms_vault_controller=info`).
//! `LOG_FORMAT=json` switches to one JSON object per line.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "kms_vault_controller=info";

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging(format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    let result = if format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_current_span(true)
            .with_env_filter(filter)
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };

    if let Err(e) = result {
        tracing::warn!("Tracing subscriber already initialized: {}", e);
    }
}
