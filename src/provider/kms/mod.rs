//! # Decryption Gateway
//!
//! Turns a declared [`SecretEntry`] into plaintext: base64 decode, then an
//! envelope decrypt through a [`Decryptor`] bound by a timeout.
//!
//! Decode and decrypt failures are distinct kinds. Reconciliation skips the
//! affected key and reports the kind in a Warning event; admission rejects
//! the resource.

mod aws;

pub use aws::AwsKmsDecryptor;

use crate::crd::{SecretContext, SecretEntry};
use crate::observability::metrics;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use zeroize::Zeroizing;

#[derive(Debug, Error)]
pub enum DecryptionError {
    #[error("invalid base64 ciphertext: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("entry has no encryptedSecret and is not marked emptySecret")]
    MissingCiphertext,

    #[error("decrypt failed: {0}")]
    Decrypt(String),

    #[error("decrypt timed out after {0:?}")]
    Timeout(Duration),

    #[error("plaintext is not valid UTF-8")]
    InvalidUtf8,
}

impl DecryptionError {
    /// `decode` or `decrypt`, used for events and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            DecryptionError::Decode(_) | DecryptionError::MissingCiphertext => "decode",
            DecryptionError::Decrypt(_)
            | DecryptionError::Timeout(_)
            | DecryptionError::InvalidUtf8 => "decrypt",
        }
    }

    pub fn is_decode(&self) -> bool {
        self.kind() == "decode"
    }
}

/// Envelope decryption oracle
#[async_trait]
pub trait Decryptor: Send + Sync {
    async fn decrypt(
        &self,
        ciphertext: &[u8],
        context: &SecretContext,
    ) -> Result<Zeroizing<Vec<u8>>, DecryptionError>;
}

#[derive(Clone)]
pub struct DecryptionGateway {
    decryptor: Arc<dyn Decryptor>,
    timeout: Duration,
}

impl std::fmt::Debug for DecryptionGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptionGateway")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl DecryptionGateway {
    pub fn new(decryptor: Arc<dyn Decryptor>, timeout: Duration) -> Self {
        Self { decryptor, timeout }
    }

    /// Decode `ciphertext` and decrypt it under `context`
    pub async fn decrypt(
        &self,
        ciphertext: &str,
        context: &SecretContext,
    ) -> Result<Zeroizing<String>, DecryptionError> {
        let result = self.decrypt_inner(ciphertext, context).await;
        if let Err(e) = &result {
            metrics::increment_decryption_failures(e.kind());
        }
        result
    }

    async fn decrypt_inner(
        &self,
        ciphertext: &str,
        context: &SecretContext,
    ) -> Result<Zeroizing<String>, DecryptionError> {
        let blob = BASE64.decode(ciphertext.trim())?;
        let plaintext = tokio::time::timeout(self.timeout, self.decryptor.decrypt(&blob, context))
            .await
            .map_err(|_| DecryptionError::Timeout(self.timeout))??;

        std::str::from_utf8(&plaintext)
            .map(|s| Zeroizing::new(s.to_string()))
            .map_err(|_| DecryptionError::InvalidUtf8)
    }

    /// Plaintext for one entry. `emptySecret` entries resolve to `""` without a call.
    pub async fn resolve(
        &self,
        entry: &SecretEntry,
        context: &SecretContext,
    ) -> Result<Zeroizing<String>, DecryptionError> {
        if entry.empty_secret {
            return Ok(Zeroizing::new(String::new()));
        }
        match entry.encrypted_secret.as_deref() {
            Some(ciphertext) => self.decrypt(ciphertext, context).await,
            None => {
                metrics::increment_decryption_failures("decode");
                Err(DecryptionError::MissingCiphertext)
            }
        }
    }
}
