//! # TLS
//!
//! Serving certificates for the admission webhook, swapped at runtime when
//! the mounted files change.
//!
//! ```text
//! cert/key files ──notify──▶ CertificateReloader ──watch::Sender──▶ ReloadingResolver
//!                                                                   (rustls handshake)
//! ```
//!
//! Handshakes never wait on a reload; they see the last published
//! [`CertifiedKey`](rustls::sign::CertifiedKey).

mod certificate;
mod reloader;
mod resolver;
mod watch;

pub use certificate::{fingerprint, load_certified_key};
pub use reloader::CertificateReloader;
pub use resolver::{server_config, ReloadingResolver};
pub use watch::{watch_paths, FileWatch};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to read {}: {source}", path.display())]
    Pem {
        path: PathBuf,
        #[source]
        source: rustls::pki_types::pem::Error,
    },

    #[error("no certificates found in {}", .0.display())]
    NoCertificates(PathBuf),

    #[error("unusable private key in {}: {source}", path.display())]
    Key {
        path: PathBuf,
        #[source]
        source: rustls::Error,
    },

    #[error("TLS configuration error: {0}")]
    Config(#[from] rustls::Error),

    #[error("file watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("file watch stopped")]
    WatchClosed,
}
