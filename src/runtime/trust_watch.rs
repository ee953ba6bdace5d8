//! # Trust Watch
//!
//! Rebuilds the Vault HTTP client when `VAULT_CACERT` or `VAULT_CAPATH`
//! changes on disk. Returns an error when the new material cannot be used;
//! the controller exits on that error.

use crate::observability::metrics;
use crate::provider::vault::SessionHandle;
use crate::tls::watch_paths;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

pub async fn watch_trust(
    paths: Vec<PathBuf>,
    session: SessionHandle,
    debounce: Duration,
) -> Result<()> {
    let mut watch = watch_paths(&paths, debounce).context("Failed to watch Vault CA material")?;
    info!("Watching Vault CA material: {:?}", paths);

    loop {
        watch.changed().await?;
        match session.reload_trust().await {
            Ok(()) => metrics::increment_certificate_reloads("vault-ca", "success"),
            Err(e) => {
                error!("Failed to reload Vault CA material: {}", e);
                metrics::increment_certificate_reloads("vault-ca", "failure");
                return Err(e).context("Vault CA reload failed");
            }
        }
    }
}
