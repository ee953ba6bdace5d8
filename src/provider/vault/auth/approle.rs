//! AppRole login

use super::{require, AuthError, AuthMethod, LoginRequest};
use crate::config::{env_var_non_empty, env_var_or_default_str};
use crate::provider::vault::AppRoleLoginRequest;
use zeroize::Zeroizing;

#[derive(Clone)]
pub struct AppRoleSettings {
    pub role_id: Option<String>,
    pub secret_id: Option<Zeroizing<String>>,
    pub endpoint: String,
}

impl Default for AppRoleSettings {
    fn default() -> Self {
        Self {
            role_id: None,
            secret_id: None,
            endpoint: paths::auth::APPROLE_LOGIN.to_string(),
        }
    }
}

impl std::fmt::Debug for AppRoleSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppRoleSettings")
            .field("role_id", &self.role_id)
            .field("secret_id", &self.secret_id.as_ref().map(|_| "***"))
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl AppRoleSettings {
    pub fn from_env() -> Self {
        Self {
            role_id: env_var_non_empty("VAULT_APPROLE_ROLE_ID"),
            secret_id: env_var_non_empty("VAULT_APPROLE_SECRET_ID").map(Zeroizing::new),
            endpoint: env_var_or_default_str("VAULT_APPROLE_ENDPOINT", paths::auth::APPROLE_LOGIN),
        }
    }

    pub(super) fn login_request(&self) -> Result<LoginRequest, AuthError> {
        let role_id = require(
            self.role_id.as_deref(),
            AuthMethod::AppRole,
            "VAULT_APPROLE_ROLE_ID",
        )?;
        let secret_id = require(
            self.secret_id.as_deref(),
            AuthMethod::AppRole,
            "VAULT_APPROLE_SECRET_ID",
        )?;

        Ok(LoginRequest {
            path: self.endpoint.clone(),
            body: serde_json::json!(AppRoleLoginRequest { role_id, secret_id }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approle_body() {
        let settings = AppRoleSettings {
            role_id: Some("r-1".into()),
            secret_id: Some(Zeroizing::new("s-1".into())),
            ..AppRoleSettings::default()
        };
        let request = settings.login_request().unwrap();
        assert_eq!(request.path, "auth/approle/login");
        assert_eq!(
            request.body,
            serde_json::json!({"role_id": "r-1", "secret_id": "s-1"})
        );
        assert!(!format!("{request:?}").contains("s-1"));
    }
}
