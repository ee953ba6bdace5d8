//! # AWS IAM Login
//!
//! Vault verifies the caller by replaying a SigV4-signed
//! `sts:GetCallerIdentity` request. We sign it locally and send the method,
//! URL, body and headers base64 encoded.
//!
//! Credentials come from `VAULT_IAM_AWS_ACCESS_KEY_ID` and
//! `VAULT_IAM_AWS_SECRET_ACCESS_KEY` when both are set, otherwise from the
//! default AWS provider chain (IRSA, instance profile, environment).

use super::{AuthError, LoginRequest};
use crate::config::{env_var_non_empty, env_var_or_default_str};
use crate::provider::vault::IamLoginRequest;
use aws_config::BehaviorVersion;
use aws_credential_types::provider::ProvideCredentials;
use aws_credential_types::Credentials;
use aws_sigv4::http_request::{sign, SignableBody, SignableRequest, SigningSettings};
use aws_sigv4::sign::v4;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::collections::BTreeMap;
use std::time::SystemTime;
use tracing::debug;
use zeroize::Zeroizing;

const STS_URL: &str = "https://sts.amazonaws.com/";
const STS_HOST: &str = "sts.amazonaws.com";
const STS_REGION: &str = "us-east-1";
const STS_BODY: &str = "Action=GetCallerIdentity&Version=2011-06-15";
const CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";
const SERVER_ID_HEADER: &str = "x-vault-aws-iam-server-id";

#[derive(Clone)]
pub struct IamSettings {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<Zeroizing<String>>,
    /// Vault role; omitted from the login body when unset
    pub role: Option<String>,
    pub endpoint: String,
    pub server_id: Option<String>,
}

impl Default for IamSettings {
    fn default() -> Self {
        Self {
            access_key_id: None,
            secret_access_key: None,
            role: None,
            endpoint: paths::auth::AWS_LOGIN.to_string(),
            server_id: None,
        }
    }
}

impl std::fmt::Debug for IamSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IamSettings")
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "***"),
            )
            .field("role", &self.role)
            .field("endpoint", &self.endpoint)
            .field("server_id", &self.server_id)
            .finish()
    }
}

impl IamSettings {
    pub fn from_env() -> Self {
        Self {
            access_key_id: env_var_non_empty("VAULT_IAM_AWS_ACCESS_KEY_ID"),
            secret_access_key: env_var_non_empty("VAULT_IAM_AWS_SECRET_ACCESS_KEY")
                .map(Zeroizing::new),
            role: env_var_non_empty("VAULT_IAM_ROLE"),
            endpoint: env_var_or_default_str("VAULT_IAM_AUTH_ENDPOINT", paths::auth::AWS_LOGIN),
            server_id: env_var_non_empty("VAULT_IAM_SERVER_ID_HEADER"),
        }
    }

    pub(super) async fn login_request(&self) -> Result<LoginRequest, AuthError> {
        let credentials = self.credentials().await?;
        self.signed_request(&credentials, SystemTime::now())
    }

    async fn credentials(&self) -> Result<Credentials, AuthError> {
        if let (Some(access_key_id), Some(secret_access_key)) =
            (&self.access_key_id, &self.secret_access_key)
        {
            debug!("Using explicit AWS credentials for Vault IAM login");
            return Ok(Credentials::new(
                access_key_id,
                secret_access_key.as_str(),
                None,
                None,
                "vault-iam-env",
            ));
        }

        debug!("Using the default AWS credential chain for Vault IAM login");
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        let provider = config.credentials_provider().ok_or_else(|| {
            AuthError::AwsCredentials("no credentials provider configured".to_string())
        })?;
        provider
            .provide_credentials()
            .await
            .map_err(|e| AuthError::AwsCredentials(e.to_string()))
    }

    /// Sign `GetCallerIdentity` at `time` and wrap it as a login request
    pub(crate) fn signed_request(
        &self,
        credentials: &Credentials,
        time: SystemTime,
    ) -> Result<LoginRequest, AuthError> {
        let mut headers: Vec<(&str, &str)> =
            vec![("host", STS_HOST), ("content-type", CONTENT_TYPE)];
        if let Some(server_id) = &self.server_id {
            headers.push((SERVER_ID_HEADER, server_id));
        }

        let identity = credentials.clone().into();
        let signing_params = v4::SigningParams::builder()
            .identity(&identity)
            .region(STS_REGION)
            .name("sts")
            .time(time)
            .settings(SigningSettings::default())
            .build()
            .map_err(|e| AuthError::Signing(e.to_string()))?
            .into();

        let signable = SignableRequest::new(
            "POST",
            STS_URL,
            headers.iter().copied(),
            SignableBody::Bytes(STS_BODY.as_bytes()),
        )
        .map_err(|e| AuthError::Signing(e.to_string()))?;

        let (instructions, _signature) = sign(signable, &signing_params)
            .map_err(|e| AuthError::Signing(e.to_string()))?
            .into_parts();

        let mut signed_headers: BTreeMap<String, Vec<String>> = headers
            .iter()
            .map(|(name, value)| ((*name).to_string(), vec![(*value).to_string()]))
            .collect();
        for (name, value) in instructions.headers() {
            signed_headers.insert(name.to_string(), vec![value.to_string()]);
        }

        let headers_json = serde_json::to_vec(&signed_headers)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        let body = IamLoginRequest {
            role: self.role.as_deref(),
            iam_http_request_method: "POST",
            iam_request_url: BASE64.encode(STS_URL),
            iam_request_body: BASE64.encode(STS_BODY),
            iam_request_headers: BASE64.encode(headers_json),
        };

        Ok(LoginRequest {
            path: self.endpoint.clone(),
            body: serde_json::to_value(body).map_err(|e| AuthError::Signing(e.to_string()))?,
        })
    }
}
