//! PathBuilder implementation
//!
//! Provides a type-safe builder pattern for constructing Vault API paths
//! with different output formats for different consumers.

use crate::auth;
use crate::errors::PathBuilderError;
use crate::formats::{PathFormat, API_PREFIX};
use crate::kv;
use crate::operations::VaultOperation;

/// Builder for constructing Vault API paths
///
/// # Example
///
/// ```rust
/// use vault_paths::prelude::*;
///
/// let path = PathBuilder::new()
///     .operation(VaultOperation::Login)
///     .login_endpoint("auth/userpass/login")
///     .username("ci")
///     .build_http_path()
///     .unwrap();
/// assert_eq!(path, "/v1/auth/userpass/login/ci");
/// ```
#[derive(Debug, Clone, Default)]
pub struct PathBuilder {
    operation: Option<VaultOperation>,
    secret_path: Option<String>,
    login_endpoint: Option<String>,
    username: Option<String>,
}

impl PathBuilder {
    /// Create a new PathBuilder
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operation(mut self, operation: VaultOperation) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Secret path as declared on the resource (`secret/data/foo` for KV v2)
    pub fn secret_path(mut self, path: impl Into<String>) -> Self {
        self.secret_path = Some(path.into());
        self
    }

    pub fn login_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.login_endpoint = Some(endpoint.into());
        self
    }

    /// Appended to the login endpoint (userpass)
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    // Build methods
    pub fn build_http_path(&self) -> Result<String, PathBuilderError> {
        self.build(PathFormat::HttpPath)
    }

    pub fn build_api_path(&self) -> Result<String, PathBuilderError> {
        self.build(PathFormat::ApiPath)
    }

    // Generic build with format
    pub fn build(&self, format: PathFormat) -> Result<String, PathBuilderError> {
        let operation = self
            .operation
            .ok_or_else(|| PathBuilderError::MissingRequiredParameter("operation".to_string()))?;

        let path = match operation {
            VaultOperation::KvData => kv::normalize(self.required_secret_path()?)?,
            VaultOperation::KvMetadata => kv::metadata_path(self.required_secret_path()?)?,
            VaultOperation::TokenLookupSelf => auth::TOKEN_LOOKUP_SELF.to_string(),
            VaultOperation::TokenRenewSelf => auth::TOKEN_RENEW_SELF.to_string(),
            VaultOperation::Login => {
                let endpoint = self.login_endpoint.as_deref().ok_or_else(|| {
                    PathBuilderError::MissingRequiredParameter("login_endpoint".to_string())
                })?;
                let endpoint = kv::normalize(endpoint)?;
                match self.username.as_deref() {
                    Some(username) => auth::userpass_login(&endpoint, username),
                    None => endpoint,
                }
            }
        };

        Ok(Self::format_path(path, format))
    }

    fn required_secret_path(&self) -> Result<&str, PathBuilderError> {
        self.secret_path
            .as_deref()
            .ok_or_else(|| PathBuilderError::MissingRequiredParameter("secret_path".to_string()))
    }

    fn format_path(path: String, format: PathFormat) -> String {
        match format {
            PathFormat::HttpPath => format!("{API_PREFIX}{path}"),
            PathFormat::ApiPath => path,
        }
    }
}
