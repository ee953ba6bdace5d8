//! Static token from `VAULT_TOKEN`

use super::{require, AuthError, AuthMethod, Credential};
use crate::config::env_var_non_empty;
use zeroize::Zeroizing;

#[derive(Clone, Default)]
pub struct TokenSettings {
    pub token: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl TokenSettings {
    pub fn from_env() -> Self {
        Self {
            token: env_var_non_empty("VAULT_TOKEN").map(Zeroizing::new),
        }
    }

    /// The configured token, used as-is.
    ///
    /// Its lifetime is unknown until the first lookup-self.
    pub(super) fn credential(&self) -> Result<Credential, AuthError> {
        let token = require(self.token.as_deref(), AuthMethod::Token, "VAULT_TOKEN")?;
        Ok(Credential::new(token.as_str(), None, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_used_verbatim() {
        let settings = TokenSettings {
            token: Some(Zeroizing::new("s.static".into())),
        };
        let credential = settings.credential().unwrap();
        assert_eq!(credential.token(), "s.static");
        assert_eq!(credential.expiry, None);
        assert!(!credential.renewable);
        assert!(!format!("{settings:?}").contains("s.static"));
    }

    #[test]
    fn test_missing_token() {
        let err = TokenSettings::default().credential().unwrap_err();
        assert!(matches!(
            err,
            AuthError::MissingConfiguration {
                method: AuthMethod::Token,
                missing: "VAULT_TOKEN"
            }
        ));
    }
}
