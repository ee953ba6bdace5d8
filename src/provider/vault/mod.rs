//! # Vault REST Client
//!
//! Native REST implementation for the HashiCorp Vault HTTP API.
//! Uses reqwest with rustls; trust roots come from `VAULT_CACERT` and
//! `VAULT_CAPATH` in addition to the bundled web PKI roots.
//!
//! - [`kv`]: engine-aware writes with check-and-set for KV v2
//! - [`auth`]: login strategies and token renewal
//! - [`session`]: the task that owns credentials and the HTTP client
//!
//! References:
//! - [KV v1](https://developer.hashicorp.com/vault/api-docs/secret/kv/kv-v1)
//! - [KV v2](https://developer.hashicorp.com/vault/api-docs/secret/kv/kv-v2)
//! - [Token auth](https://developer.hashicorp.com/vault/api-docs/auth/token)

pub mod auth;
mod error;
pub mod kv;
mod requests;
mod responses;
pub mod session;

pub use error::StoreError;
pub use requests::*;
pub use responses::*;
pub use session::{SessionHandle, VaultSession};

use crate::config::{TrustSource, VaultConfig};
use crate::observability::metrics;
use crate::provider::{KvBackend, TokenApi};
use async_trait::async_trait;
use auth::{Credential, LoginRequest, TokenInfo};
use paths::prelude::{PathBuilder, VaultOperation};
use reqwest::{Client, Method, StatusCode};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, Instrument};
use zeroize::Zeroizing;

const TOKEN_HEADER: &str = "X-Vault-Token";
const REQUEST_HEADER: &str = "X-Vault-Request";

/// Vault REST client
///
/// Cloning is cheap: the HTTP connection pool and the token are shared.
#[derive(Clone)]
pub struct VaultClient {
    http_client: Client,
    base_url: String,
    token: Option<Arc<Zeroizing<String>>>,
}

impl std::fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl VaultClient {
    /// Create an unauthenticated client from configuration
    ///
    /// # Errors
    /// Returns an error if the CA material cannot be read or the HTTP client cannot be built
    pub fn new(config: &VaultConfig) -> Result<Self, StoreError> {
        let http_client = build_http_client(config)?;
        Ok(Self::with_http_client(http_client, config.base_url()))
    }

    /// Wrap an existing HTTP client (tests, custom TLS)
    pub fn with_http_client(http_client: Client, base_url: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Copy of this client that sends `token` on every request
    #[must_use]
    pub fn with_token(&self, token: &str) -> Self {
        Self {
            http_client: self.http_client.clone(),
            base_url: self.base_url.clone(),
            token: Some(Arc::new(Zeroizing::new(token.to_string()))),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn make_request(
        &self,
        method: Method,
        http_path: &str,
        token: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, http_path);
        let mut request = self
            .http_client
            .request(method, &url)
            .header(REQUEST_HEADER, "true");

        if let Some(token) = token.or(self.token.as_deref().map(|t| t.as_str())) {
            request = request.header(TOKEN_HEADER, token);
        }

        request
    }

    async fn handle_error_response(response: reqwest::Response) -> StoreError {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        StoreError::from_response(status, &error_text)
    }

    fn kv_http_path(path: &str) -> Result<String, StoreError> {
        Ok(PathBuilder::new()
            .operation(VaultOperation::KvData)
            .secret_path(path)
            .build_http_path()?)
    }

    /// POST to a token-issuing endpoint and parse the `auth` block
    async fn auth_request(
        request: reqwest::RequestBuilder,
        http_path: &str,
        body: &serde_json::Value,
    ) -> Result<Credential, StoreError> {
        let response = request.json(body).send().await?;

        if !response.status().is_success() {
            return Err(Self::handle_error_response(response).await);
        }

        let parsed: VaultResponse<serde_json::Value> = response.json().await?;
        let auth = parsed.auth.ok_or_else(|| {
            StoreError::InvalidResponse(format!("{http_path} returned no auth block"))
        })?;
        Ok(Credential::from_lease(
            auth.client_token,
            auth.lease_duration,
            auth.renewable,
        ))
    }
}

#[async_trait]
impl KvBackend for VaultClient {
    async fn read(&self, path: &str) -> Result<Option<serde_json::Value>, StoreError> {
        let span = tracing::debug_span!("vault.kv.read", vault.path = path);
        async move {
            let start = Instant::now();
            let http_path = Self::kv_http_path(path)?;
            let response = self.make_request(Method::GET, &http_path, None).send().await?;

            let result = match response.status() {
                status if status.is_success() => {
                    let parsed: VaultResponse<serde_json::Value> = response.json().await?;
                    Ok(parsed.data)
                }
                StatusCode::NOT_FOUND => Ok(None),
                _ => Err(Self::handle_error_response(response).await),
            };
            metrics::record_vault_operation("read", result.is_ok(), start.elapsed());
            result
        }
        .instrument(span)
        .await
    }

    async fn write(&self, path: &str, body: serde_json::Value) -> Result<(), StoreError> {
        let span = info_span!("vault.kv.write", vault.path = path);
        async move {
            let start = Instant::now();
            let http_path = Self::kv_http_path(path)?;
            let response = self
                .make_request(Method::POST, &http_path, None)
                .json(&body)
                .send()
                .await?;

            let result = if response.status().is_success() {
                debug!("Wrote Vault path {}", path);
                Ok(())
            } else {
                Err(Self::handle_error_response(response).await)
            };
            metrics::record_vault_operation("write", result.is_ok(), start.elapsed());
            result
        }
        .instrument(span)
        .await
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        let span = info_span!("vault.kv.delete", vault.path = path);
        async move {
            let start = Instant::now();
            let http_path = Self::kv_http_path(path)?;
            let response = self
                .make_request(Method::DELETE, &http_path, None)
                .send()
                .await?;

            let result = match response.status() {
                status if status.is_success() => {
                    info!("Deleted Vault path {}", path);
                    Ok(())
                }
                StatusCode::NOT_FOUND => {
                    debug!("Vault path {} already absent", path);
                    Ok(())
                }
                _ => Err(Self::handle_error_response(response).await),
            };
            metrics::record_vault_operation("delete", result.is_ok(), start.elapsed());
            result
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl TokenApi for VaultClient {
    async fn lookup_self(&self, token: &str) -> Result<TokenInfo, StoreError> {
        let http_path = PathBuilder::new()
            .operation(VaultOperation::TokenLookupSelf)
            .build_http_path()?;
        let response = self
            .make_request(Method::GET, &http_path, Some(token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::handle_error_response(response).await);
        }

        let parsed: VaultResponse<LookupSelfData> = response.json().await?;
        let data = parsed
            .data
            .ok_or_else(|| StoreError::InvalidResponse("lookup-self returned no data".into()))?;
        TokenInfo::from_lookup(&data)
    }

    async fn renew_self(&self, token: &str) -> Result<Credential, StoreError> {
        let http_path = PathBuilder::new()
            .operation(VaultOperation::TokenRenewSelf)
            .build_http_path()?;
        let request = self.make_request(Method::POST, &http_path, Some(token));
        Self::auth_request(request, &http_path, &serde_json::json!({}))
            .await
    }

    async fn login(&self, request: &LoginRequest) -> Result<Credential, StoreError> {
        let http_path = PathBuilder::new()
            .operation(VaultOperation::Login)
            .login_endpoint(&request.path)
            .build_http_path()?;
        // Login endpoints must not see a previous token
        let http_request = self
            .http_client
            .post(format!("{}{}", self.base_url, http_path))
            .header(REQUEST_HEADER, "true");
        Self::auth_request(http_request, &http_path, &request.body)
            .await
    }
}

/// Build the reqwest client with the configured trust roots
///
/// # Errors
/// Returns [`StoreError::TrustMaterial`] when a CA file cannot be read or parsed
pub fn build_http_client(config: &VaultConfig) -> Result<Client, StoreError> {
    let mut builder = Client::builder()
        .use_rustls_tls()
        .timeout(config.client_timeout());

    for certificate in load_trust_roots(&config.trust)? {
        builder = builder.add_root_certificate(certificate);
    }

    if config.skip_verify {
        tracing::warn!("⚠️  VAULT_SKIP_VERIFY is set, Vault TLS certificates are not verified");
        builder = builder.danger_accept_invalid_certs(true);
    }

    Ok(builder.build()?)
}

/// Read every certificate from `VAULT_CACERT` and the files in `VAULT_CAPATH`
pub fn load_trust_roots(trust: &TrustSource) -> Result<Vec<reqwest::Certificate>, StoreError> {
    let mut certificates = Vec::new();

    if let Some(ca_cert) = &trust.ca_cert {
        certificates.extend(read_pem_bundle(ca_cert)?);
    }

    if let Some(ca_path) = &trust.ca_path {
        for entry in walkdir::WalkDir::new(ca_path)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| StoreError::TrustMaterial {
                path: ca_path.clone(),
                message: e.to_string(),
            })?;
            if entry.file_type().is_file() && is_pem_file(entry.path()) {
                certificates.extend(read_pem_bundle(entry.path())?);
            }
        }
    }

    if !trust.is_empty() {
        debug!("Loaded {} CA certificates for Vault", certificates.len());
    }
    Ok(certificates)
}

fn is_pem_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext, "pem" | "crt" | "cer"))
}

fn read_pem_bundle(path: &Path) -> Result<Vec<reqwest::Certificate>, StoreError> {
    let trust_error = |message: String| StoreError::TrustMaterial {
        path: path.to_path_buf(),
        message,
    };
    let pem = std::fs::read(path).map_err(|e| trust_error(e.to_string()))?;
    let certificates =
        reqwest::Certificate::from_pem_bundle(&pem).map_err(|e| trust_error(e.to_string()))?;
    if certificates.is_empty() {
        return Err(trust_error("no certificates found".to_string()));
    }
    Ok(certificates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures/tls")
            .join(name)
    }

    #[test]
    fn test_load_trust_roots_from_file_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::copy(fixture("first.crt"), dir.path().join("a.pem")).unwrap();
        std::fs::copy(fixture("second.crt"), dir.path().join("b.crt")).unwrap();
        std::fs::write(dir.path().join("README"), "not a cert").unwrap();

        let trust = TrustSource {
            ca_cert: Some(fixture("first.crt")),
            ca_path: Some(dir.path().to_path_buf()),
        };
        assert_eq!(load_trust_roots(&trust).unwrap().len(), 3);
    }

    #[test]
    fn test_load_trust_roots_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("ca.pem");
        std::fs::write(&bad, "garbage").unwrap();

        let trust = TrustSource {
            ca_cert: Some(bad),
            ca_path: None,
        };
        assert!(matches!(
            load_trust_roots(&trust),
            Err(StoreError::TrustMaterial { .. })
        ));
    }

    #[test]
    fn test_client_debug_hides_token() {
        let client = VaultClient::with_http_client(Client::new(), "http://vault:8200/")
            .with_token("s.secret");
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("s.secret"));
        assert_eq!(client.base_url(), "http://vault:8200");
    }
}
