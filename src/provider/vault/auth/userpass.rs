//! Username and password login

use super::{require, AuthError, AuthMethod, LoginRequest};
use crate::config::{env_var_non_empty, env_var_or_default_str};
use crate::provider::vault::UserpassLoginRequest;
use zeroize::Zeroizing;

#[derive(Clone)]
pub struct UserpassSettings {
    pub username: Option<String>,
    pub password: Option<Zeroizing<String>>,
    pub endpoint: String,
}

impl Default for UserpassSettings {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            endpoint: paths::auth::USERPASS_LOGIN.to_string(),
        }
    }
}

impl std::fmt::Debug for UserpassSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserpassSettings")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl UserpassSettings {
    pub fn from_env() -> Self {
        Self {
            username: env_var_non_empty("VAULT_USERNAME"),
            password: env_var_non_empty("VAULT_PASSWORD").map(Zeroizing::new),
            endpoint: env_var_or_default_str(
                "VAULT_USERPASS_AUTH_ENDPOINT",
                paths::auth::USERPASS_LOGIN,
            ),
        }
    }

    pub(super) fn login_request(&self) -> Result<LoginRequest, AuthError> {
        let username = require(self.username.as_deref(), AuthMethod::Userpass, "VAULT_USERNAME")?;
        let password = require(self.password.as_deref(), AuthMethod::Userpass, "VAULT_PASSWORD")?;

        Ok(LoginRequest {
            path: paths::auth::userpass_login(&self.endpoint, username),
            body: serde_json::json!(UserpassLoginRequest { password }),
        })
    }
}
