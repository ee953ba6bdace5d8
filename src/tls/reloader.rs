//! # Certificate Reloader
//!
//! Owns the serving key pair. Each change burst reloads both files and
//! publishes the new pair; a pair that fails to load stops the reloader
//! with an error.

use super::{fingerprint, load_certified_key, watch_paths, ReloadingResolver, TlsError};
use crate::observability::metrics;
use rustls::sign::CertifiedKey;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Debug)]
pub struct CertificateReloader {
    cert_path: PathBuf,
    key_path: PathBuf,
    current: watch::Sender<Arc<CertifiedKey>>,
}

impl CertificateReloader {
    /// Load the initial pair and return the reloader with a resolver bound to it
    pub fn load(cert_path: &Path, key_path: &Path) -> Result<(Self, ReloadingResolver), TlsError> {
        let initial = load_certified_key(cert_path, key_path)?;
        info!(
            "Loaded TLS certificate {} (sha256 {})",
            cert_path.display(),
            fingerprint(&initial)
        );
        let (current, receiver) = watch::channel(Arc::new(initial));
        let reloader = Self {
            cert_path: cert_path.to_path_buf(),
            key_path: key_path.to_path_buf(),
            current,
        };
        Ok((reloader, ReloadingResolver::new(receiver)))
    }

    /// Re-read both files and publish the new pair
    pub fn reload(&self) -> Result<(), TlsError> {
        match load_certified_key(&self.cert_path, &self.key_path) {
            Ok(key) => {
                info!("🔐 Reloaded TLS certificate (sha256 {})", fingerprint(&key));
                self.current.send_replace(Arc::new(key));
                metrics::increment_certificate_reloads("webhook", "success");
                Ok(())
            }
            Err(e) => {
                error!("Failed to reload TLS certificate: {}", e);
                metrics::increment_certificate_reloads("webhook", "failure");
                Err(e)
            }
        }
    }

    /// Reload on every change until the watch fails or a reload fails
    pub async fn run(self, debounce: Duration) -> Result<(), TlsError> {
        let mut watch = watch_paths(&[self.cert_path.clone(), self.key_path.clone()], debounce)?;
        info!(
            "Watching {} and {} for changes",
            self.cert_path.display(),
            self.key_path.display()
        );
        loop {
            watch.changed().await?;
            self.reload()?;
        }
    }
}
