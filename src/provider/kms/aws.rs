//! AWS KMS backed [`Decryptor`]

use super::{DecryptionError, Decryptor};
use crate::crd::SecretContext;
use async_trait::async_trait;
use aws_sdk_kms::error::DisplayErrorContext;
use aws_sdk_kms::primitives::Blob;
use aws_sdk_kms::Client as KmsClient;
use std::collections::HashMap;
use tracing::{debug, info};
use zeroize::Zeroizing;

/// Calls `kms:Decrypt`; the key is identified by the ciphertext blob itself
pub struct AwsKmsDecryptor {
    client: KmsClient,
}

impl std::fmt::Debug for AwsKmsDecryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsKmsDecryptor").finish_non_exhaustive()
    }
}

impl AwsKmsDecryptor {
    /// Client from the default AWS credential chain and region (IRSA in-cluster)
    pub async fn from_env() -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .load()
            .await;
        info!(
            "AWS KMS client configured (region: {})",
            sdk_config
                .region()
                .map_or("default", |region| region.as_ref())
        );
        Self::new(KmsClient::new(&sdk_config))
    }

    pub fn new(client: KmsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Decryptor for AwsKmsDecryptor {
    async fn decrypt(
        &self,
        ciphertext: &[u8],
        context: &SecretContext,
    ) -> Result<Zeroizing<Vec<u8>>, DecryptionError> {
        let encryption_context = (!context.is_empty()).then(|| {
            context
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<HashMap<_, _>>()
        });

        let output = self
            .client
            .decrypt()
            .ciphertext_blob(Blob::new(ciphertext))
            .set_encryption_context(encryption_context)
            .send()
            .await
            .map_err(|e| DecryptionError::Decrypt(DisplayErrorContext(&e).to_string()))?;

        debug!("KMS decrypted with key {}", output.key_id().unwrap_or("unknown"));
        output
            .plaintext()
            .map(|blob| Zeroizing::new(blob.as_ref().to_vec()))
            .ok_or_else(|| DecryptionError::Decrypt("KMS returned no plaintext".to_string()))
    }
}
