//! GitHub personal access token login

use super::{require, AuthError, AuthMethod, LoginRequest};
use crate::config::{env_var_non_empty, env_var_or_default_str};
use crate::provider::vault::GitHubLoginRequest;
use zeroize::Zeroizing;

#[derive(Clone)]
pub struct GitHubSettings {
    pub token: Option<Zeroizing<String>>,
    pub endpoint: String,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            token: None,
            endpoint: paths::auth::GITHUB_LOGIN.to_string(),
        }
    }
}

impl std::fmt::Debug for GitHubSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubSettings")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl GitHubSettings {
    pub fn from_env() -> Self {
        Self {
            token: env_var_non_empty("VAULT_GITHUB_TOKEN").map(Zeroizing::new),
            endpoint: env_var_or_default_str(
                "VAULT_GITHUB_AUTH_ENDPOINT",
                paths::auth::GITHUB_LOGIN,
            ),
        }
    }

    pub(super) fn login_request(&self) -> Result<LoginRequest, AuthError> {
        let token = require(self.token.as_deref(), AuthMethod::GitHub, "VAULT_GITHUB_TOKEN")?;
        Ok(LoginRequest {
            path: self.endpoint.clone(),
            body: serde_json::json!(GitHubLoginRequest { token }),
        })
    }
}
