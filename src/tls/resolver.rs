//! Handshake-time certificate selection

use super::TlsError;
use rustls::server::{ClientHello, ResolvesServerCert};
use rustls::sign::CertifiedKey;
use rustls::ServerConfig;
use std::sync::Arc;
use tokio::sync::watch;

/// Hands every handshake the most recently published key pair
#[derive(Debug, Clone)]
pub struct ReloadingResolver {
    current: watch::Receiver<Arc<CertifiedKey>>,
}

impl ReloadingResolver {
    pub fn new(current: watch::Receiver<Arc<CertifiedKey>>) -> Self {
        Self { current }
    }

    /// The key pair the next handshake will use
    pub fn current(&self) -> Arc<CertifiedKey> {
        self.current.borrow().clone()
    }
}

impl ResolvesServerCert for ReloadingResolver {
    fn resolve(&self, _client_hello: ClientHello<'_>) -> Option<Arc<CertifiedKey>> {
        Some(self.current())
    }
}

/// rustls server config using `resolver`, offering HTTP/2 and HTTP/1.1
pub fn server_config(resolver: ReloadingResolver) -> Result<ServerConfig, TlsError> {
    let mut config =
        ServerConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_safe_default_protocol_versions()?
            .with_no_client_auth()
            .with_cert_resolver(Arc::new(resolver));
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
    Ok(config)
}
