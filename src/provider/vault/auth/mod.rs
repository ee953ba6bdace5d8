//! # Vault Authentication
//!
//! One login strategy per [`AuthMethod`] variant, plus the token lifecycle
//! check run before every reconcile pass touches Vault.
//!
//! | Method     | Required settings                                   |
//! |------------|-----------------------------------------------------|
//! | `token`    | `VAULT_TOKEN`                                        |
//! | `userpass` | `VAULT_USERNAME`, `VAULT_PASSWORD`                   |
//! | `approle`  | `VAULT_APPROLE_ROLE_ID`, `VAULT_APPROLE_SECRET_ID`   |
//! | `github`   | `VAULT_GITHUB_TOKEN`                                 |
//! | `iam`      | AWS credentials (explicit or default chain)          |
//! | `k8s`      | service account token file                           |
//!
//! ## Renewal
//!
//! ```text
//! lookup-self ──fail──────────────────────────────▶ login
//!     │
//!     ├─ expiry unknown or in the future ─▶ keep token
//!     ├─ expired, renewable ─▶ renew-self ──fail──▶ login
//!     └─ expired, not renewable ──────────────────▶ login
//! ```

mod approle;
mod github;
mod iam;
mod kubernetes;
mod token;
mod userpass;

pub use approle::AppRoleSettings;
pub use github::GitHubSettings;
pub use iam::IamSettings;
pub use kubernetes::KubernetesSettings;
pub use token::TokenSettings;
pub use userpass::UserpassSettings;

pub use crate::crd::AuthMethod;

use super::{LookupSelfData, StoreError};
use crate::crd::UnknownAuthMethod;
use crate::provider::TokenApi;
use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

#[derive(Debug, Error)]
pub enum AuthError {
    /// A required setting for the selected method is absent. Not retried.
    #[error("{method} auth is not configured: {missing} is not set")]
    MissingConfiguration {
        method: AuthMethod,
        missing: &'static str,
    },

    #[error(transparent)]
    UnknownMethod(#[from] UnknownAuthMethod),

    #[error("{method} login failed: {source}")]
    Login {
        method: AuthMethod,
        #[source]
        source: StoreError,
    },

    #[error("failed to read {}: {source}", path.display())]
    CredentialFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("AWS credentials unavailable: {0}")]
    AwsCredentials(String),

    #[error("failed to sign AWS STS request: {0}")]
    Signing(String),

    #[error("Vault session is no longer running")]
    SessionClosed,
}

impl AuthError {
    /// Configuration problems cannot be fixed by retrying. An absent
    /// credential file counts; other read failures may be transient.
    pub fn is_configuration(&self) -> bool {
        match self {
            AuthError::MissingConfiguration { .. } | AuthError::UnknownMethod(_) => true,
            AuthError::CredentialFile { source, .. } => {
                source.kind() == std::io::ErrorKind::NotFound
            }
            _ => false,
        }
    }
}

/// A Vault token and what is known about its lifetime
#[derive(Clone)]
pub struct Credential {
    token: Zeroizing<String>,
    /// `None` when the token does not expire or its expiry is unknown
    pub expiry: Option<DateTime<Utc>>,
    pub renewable: bool,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"***")
            .field("expiry", &self.expiry)
            .field("renewable", &self.renewable)
            .finish()
    }
}

impl Credential {
    pub fn new(token: impl Into<String>, expiry: Option<DateTime<Utc>>, renewable: bool) -> Self {
        Self {
            token: Zeroizing::new(token.into()),
            expiry,
            renewable,
        }
    }

    /// Credential from a login/renew `auth` block. A lease of 0 never expires.
    pub fn from_lease(token: String, lease_duration_secs: i64, renewable: bool) -> Self {
        let expiry =
            (lease_duration_secs > 0).then(|| Utc::now() + Duration::seconds(lease_duration_secs));
        Self::new(token, expiry, renewable)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Same token with lifetime details refreshed from lookup-self
    #[must_use]
    pub fn refreshed(&self, info: &TokenInfo) -> Self {
        Self {
            token: self.token.clone(),
            expiry: info.expire_time,
            renewable: info.renewable,
        }
    }
}

/// Result of `auth/token/lookup-self`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub expire_time: Option<DateTime<Utc>>,
    pub renewable: bool,
}

impl TokenInfo {
    /// Parse lookup-self data. A null `expire_time` means the token never expires.
    pub fn from_lookup(data: &LookupSelfData) -> Result<Self, StoreError> {
        let expire_time = data
            .expire_time
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| {
                DateTime::parse_from_rfc3339(s)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|e| {
                        StoreError::InvalidResponse(format!("invalid expire_time '{s}': {e}"))
                    })
            })
            .transpose()?;
        Ok(Self {
            expire_time,
            renewable: data.renewable,
        })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expire_time.is_some_and(|expiry| expiry <= now)
    }
}

/// A login call: endpoint below `/v1/` and its JSON body
#[derive(Clone)]
pub struct LoginRequest {
    pub path: String,
    pub body: serde_json::Value,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("path", &self.path)
            .field("body", &"***")
            .finish()
    }
}

/// Settings for every strategy, read once at startup.
///
/// Missing values are only reported when the corresponding method is used.
#[derive(Debug, Clone, Default)]
pub struct AuthSettings {
    pub token: TokenSettings,
    pub userpass: UserpassSettings,
    pub approle: AppRoleSettings,
    pub github: GitHubSettings,
    pub iam: IamSettings,
    pub kubernetes: KubernetesSettings,
}

impl AuthSettings {
    pub fn from_env() -> Self {
        Self {
            token: TokenSettings::from_env(),
            userpass: UserpassSettings::from_env(),
            approle: AppRoleSettings::from_env(),
            github: GitHubSettings::from_env(),
            iam: IamSettings::from_env(),
            kubernetes: KubernetesSettings::from_env(),
        }
    }
}

/// Resolve the controller-wide default method.
///
/// An absent or blank value selects `token`.
pub fn default_method(configured: Option<&str>) -> Result<AuthMethod, AuthError> {
    match configured.map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => Ok(name.parse()?),
        None => {
            info!("VAULT_AUTH_METHOD not set, defaulting to token auth");
            Ok(AuthMethod::Token)
        }
    }
}

/// Obtain a fresh token with the given method
pub async fn login(
    method: AuthMethod,
    settings: &AuthSettings,
    api: &dyn TokenApi,
) -> Result<Credential, AuthError> {
    let request = match method {
        AuthMethod::Token => return settings.token.credential(),
        AuthMethod::Userpass => settings.userpass.login_request()?,
        AuthMethod::AppRole => settings.approle.login_request()?,
        AuthMethod::GitHub => settings.github.login_request()?,
        AuthMethod::AwsIam => settings.iam.login_request().await?,
        AuthMethod::Kubernetes => settings.kubernetes.login_request().await?,
    };

    debug!("Logging in to Vault at {} ({})", request.path, method);
    let credential = api
        .login(&request)
        .await
        .map_err(|source| AuthError::Login { method, source })?;
    info!("🔑 Logged in to Vault with {} auth", method);
    Ok(credential)
}

/// What [`renew`] had to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renewal {
    /// Existing token is still valid
    Current,
    /// Token was extended with renew-self
    Renewed,
    /// A new token was issued
    LoggedIn,
}

impl Renewal {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Renewal::Current => "current",
            Renewal::Renewed => "renewed",
            Renewal::LoggedIn => "login",
        }
    }
}

/// Make sure a usable token exists for `method`
pub async fn renew(
    current: Option<&Credential>,
    method: AuthMethod,
    settings: &AuthSettings,
    api: &dyn TokenApi,
) -> Result<(Credential, Renewal), AuthError> {
    renew_at(Utc::now(), current, method, settings, api).await
}

/// [`renew`] evaluated at a fixed instant
pub async fn renew_at(
    now: DateTime<Utc>,
    current: Option<&Credential>,
    method: AuthMethod,
    settings: &AuthSettings,
    api: &dyn TokenApi,
) -> Result<(Credential, Renewal), AuthError> {
    let Some(current) = current else {
        return Ok((login(method, settings, api).await?, Renewal::LoggedIn));
    };

    let info = match api.lookup_self(current.token()).await {
        Ok(info) => info,
        Err(e) => {
            warn!("Token lookup failed ({}), logging in again with {} auth", e, method);
            return Ok((login(method, settings, api).await?, Renewal::LoggedIn));
        }
    };

    if !info.is_expired_at(now) {
        return Ok((current.refreshed(&info), Renewal::Current));
    }

    if info.renewable {
        match api.renew_self(current.token()).await {
            Ok(renewed) => {
                info!("🔄 Renewed Vault token ({} auth)", method);
                return Ok((renewed, Renewal::Renewed));
            }
            Err(e) => warn!("Token renewal failed ({}), logging in again", e),
        }
    } else {
        debug!("Token expired and not renewable, logging in again");
    }

    Ok((login(method, settings, api).await?, Renewal::LoggedIn))
}

/// Read a required setting, naming the variable when absent
pub(crate) fn require<'a, T: ?Sized>(
    value: Option<&'a T>,
    method: AuthMethod,
    missing: &'static str,
) -> Result<&'a T, AuthError> {
    value.ok_or(AuthError::MissingConfiguration { method, missing })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// TokenApi double with scripted answers and call counters
    #[derive(Default)]
    struct ScriptedApi {
        lookup: Mutex<Option<Result<TokenInfo, u16>>>,
        renew_fails: bool,
        lookups: AtomicUsize,
        renewals: AtomicUsize,
        logins: Mutex<Vec<String>>,
    }

    impl ScriptedApi {
        fn with_lookup(result: Result<TokenInfo, u16>) -> Self {
            Self {
                lookup: Mutex::new(Some(result)),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl TokenApi for ScriptedApi {
        async fn lookup_self(&self, _token: &str) -> Result<TokenInfo, StoreError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            match self.lookup.lock().unwrap().clone().unwrap_or(Err(403)) {
                Ok(info) => Ok(info),
                Err(status) => Err(StoreError::Status {
                    status,
                    message: "permission denied".into(),
                }),
            }
        }

        async fn renew_self(&self, token: &str) -> Result<Credential, StoreError> {
            self.renewals.fetch_add(1, Ordering::SeqCst);
            if self.renew_fails {
                return Err(StoreError::Status {
                    status: 400,
                    message: "lease is not renewable".into(),
                });
            }
            Ok(Credential::new(
                format!("{token}-renewed"),
                Some(Utc::now() + Duration::hours(1)),
                true,
            ))
        }

        async fn login(&self, request: &LoginRequest) -> Result<Credential, StoreError> {
            self.logins.lock().unwrap().push(request.path.clone());
            Ok(Credential::new("fresh", None, true))
        }
    }

    fn approle_settings() -> AuthSettings {
        AuthSettings {
            approle: AppRoleSettings {
                role_id: Some("role".into()),
                secret_id: Some(Zeroizing::new("secret".into())),
                endpoint: paths::auth::APPROLE_LOGIN.into(),
            },
            ..AuthSettings::default()
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[tokio::test]
    async fn test_no_current_token_logs_in() {
        let api = ScriptedApi::default();
        let (credential, renewal) =
            renew_at(now(), None, AuthMethod::AppRole, &approle_settings(), &api)
                .await
                .unwrap();
        assert_eq!(renewal, Renewal::LoggedIn);
        assert_eq!(credential.token(), "fresh");
        assert_eq!(api.lookups.load(Ordering::SeqCst), 0);
        assert_eq!(*api.logins.lock().unwrap(), vec!["auth/approle/login"]);
    }

    #[tokio::test]
    async fn test_unexpired_token_is_kept() {
        let api = ScriptedApi::with_lookup(Ok(TokenInfo {
            expire_time: Some(now() + Duration::minutes(5)),
            renewable: true,
        }));
        let current = Credential::new("s.current", None, true);
        let (credential, renewal) = renew_at(
            now(),
            Some(&current),
            AuthMethod::AppRole,
            &approle_settings(),
            &api,
        )
        .await
        .unwrap();
        assert_eq!(renewal, Renewal::Current);
        assert_eq!(credential.token(), "s.current");
        assert_eq!(credential.expiry, Some(now() + Duration::minutes(5)));
        assert_eq!(api.renewals.load(Ordering::SeqCst), 0);
        assert!(api.logins.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_expiry_counts_as_non_expiring() {
        let api = ScriptedApi::with_lookup(Ok(TokenInfo {
            expire_time: None,
            renewable: false,
        }));
        let current = Credential::new("s.root", None, false);
        let (_, renewal) = renew_at(
            now(),
            Some(&current),
            AuthMethod::AppRole,
            &approle_settings(),
            &api,
        )
        .await
        .unwrap();
        assert_eq!(renewal, Renewal::Current);
    }

    #[tokio::test]
    async fn test_expired_renewable_token_is_renewed() {
        let api = ScriptedApi::with_lookup(Ok(TokenInfo {
            expire_time: Some(now() - Duration::seconds(1)),
            renewable: true,
        }));
        let current = Credential::new("s.old", None, true);
        let (credential, renewal) = renew_at(
            now(),
            Some(&current),
            AuthMethod::AppRole,
            &approle_settings(),
            &api,
        )
        .await
        .unwrap();
        assert_eq!(renewal, Renewal::Renewed);
        assert_eq!(credential.token(), "s.old-renewed");
        assert!(api.logins.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_renewal_falls_back_to_login() {
        let api = ScriptedApi {
            renew_fails: true,
            ..ScriptedApi::with_lookup(Ok(TokenInfo {
                expire_time: Some(now()),
                renewable: true,
            }))
        };
        let current = Credential::new("s.old", None, true);
        let (credential, renewal) = renew_at(
            now(),
            Some(&current),
            AuthMethod::AppRole,
            &approle_settings(),
            &api,
        )
        .await
        .unwrap();
        assert_eq!(renewal, Renewal::LoggedIn);
        assert_eq!(credential.token(), "fresh");
        assert_eq!(api.renewals.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_non_renewable_token_logs_in() {
        let api = ScriptedApi::with_lookup(Ok(TokenInfo {
            expire_time: Some(now() - Duration::hours(1)),
            renewable: false,
        }));
        let current = Credential::new("s.old", None, false);
        let (_, renewal) = renew_at(
            now(),
            Some(&current),
            AuthMethod::AppRole,
            &approle_settings(),
            &api,
        )
        .await
        .unwrap();
        assert_eq!(renewal, Renewal::LoggedIn);
        assert_eq!(api.renewals.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_lookup_failure_logs_in() {
        let api = ScriptedApi::with_lookup(Err(403));
        let current = Credential::new("s.revoked", None, true);
        let (_, renewal) = renew_at(
            now(),
            Some(&current),
            AuthMethod::AppRole,
            &approle_settings(),
            &api,
        )
        .await
        .unwrap();
        assert_eq!(renewal, Renewal::LoggedIn);
    }

    #[tokio::test]
    async fn test_missing_configuration_is_reported_without_rpc() {
        let api = ScriptedApi::default();
        let err = login(AuthMethod::Userpass, &AuthSettings::default(), &api)
            .await
            .unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "userpass auth is not configured: VAULT_USERNAME is not set"
        );
        assert!(api.logins.lock().unwrap().is_empty());
    }

    #[test]
    fn test_default_method() {
        assert_eq!(default_method(None).unwrap(), AuthMethod::Token);
        assert_eq!(default_method(Some("  ")).unwrap(), AuthMethod::Token);
        assert_eq!(default_method(Some("k8s")).unwrap(), AuthMethod::Kubernetes);
        assert!(default_method(Some("kerberos")).unwrap_err().is_configuration());
    }

    #[test]
    fn test_token_info_parses_rfc3339_and_null() {
        let info = TokenInfo::from_lookup(&LookupSelfData {
            expire_time: Some("2026-01-01T12:00:00.123456Z".into()),
            renewable: true,
            ttl: 30,
        })
        .unwrap();
        assert!(info.expire_time.is_some());
        assert!(info.renewable);

        let root = TokenInfo::from_lookup(&LookupSelfData {
            expire_time: None,
            renewable: false,
            ttl: 0,
        })
        .unwrap();
        assert!(!root.is_expired_at(now()));
    }

    #[test]
    fn test_credential_debug_hides_token() {
        let credential = Credential::new("s.secret", None, true);
        assert!(!format!("{credential:?}").contains("s.secret"));
    }
}
