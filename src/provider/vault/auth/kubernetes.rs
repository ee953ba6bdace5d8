//! Kubernetes service account login
//!
//! The projected token is re-read on every login since the kubelet rotates it.

use super::{AuthError, LoginRequest};
use crate::config::env_var_or_default_str;
use crate::constants::{DEFAULT_K8S_ROLE, DEFAULT_K8S_TOKEN_PATH};
use crate::provider::vault::KubernetesLoginRequest;
use std::path::PathBuf;
use zeroize::Zeroizing;

#[derive(Debug, Clone)]
pub struct KubernetesSettings {
    pub role: String,
    pub endpoint: String,
    pub token_path: PathBuf,
}

impl Default for KubernetesSettings {
    fn default() -> Self {
        Self {
            role: DEFAULT_K8S_ROLE.to_string(),
            endpoint: paths::auth::KUBERNETES_LOGIN.to_string(),
            token_path: PathBuf::from(DEFAULT_K8S_TOKEN_PATH),
        }
    }
}

impl KubernetesSettings {
    pub fn from_env() -> Self {
        Self {
            role: env_var_or_default_str("VAULT_K8S_ROLE", DEFAULT_K8S_ROLE),
            endpoint: env_var_or_default_str(
                "VAULT_K8S_LOGIN_ENDPOINT",
                paths::auth::KUBERNETES_LOGIN,
            ),
            token_path: PathBuf::from(env_var_or_default_str(
                "VAULT_K8S_TOKEN_PATH",
                DEFAULT_K8S_TOKEN_PATH,
            )),
        }
    }

    pub(super) async fn login_request(&self) -> Result<LoginRequest, AuthError> {
        let jwt = tokio::fs::read_to_string(&self.token_path)
            .await
            .map(Zeroizing::new)
            .map_err(|source| AuthError::CredentialFile {
                path: self.token_path.clone(),
                source,
            })?;

        Ok(LoginRequest {
            path: self.endpoint.clone(),
            body: serde_json::json!(KubernetesLoginRequest {
                role: &self.role,
                jwt: jwt.trim(),
            }),
        })
    }
}
