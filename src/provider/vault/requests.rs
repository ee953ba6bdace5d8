//! Vault API request types

use serde::Serialize;

/// KV v2 write body
#[derive(Debug, Serialize)]
pub struct KvV2WriteRequest {
    pub data: serde_json::Map<String, serde_json::Value>,
    pub options: CasOptions,
}

#[derive(Debug, Serialize)]
pub struct CasOptions {
    pub cas: u64,
}

impl KvV2WriteRequest {
    pub fn new(data: serde_json::Map<String, serde_json::Value>, cas: u64) -> Self {
        Self {
            data,
            options: CasOptions { cas },
        }
    }
}

#[derive(Serialize)]
pub struct UserpassLoginRequest<'a> {
    pub password: &'a str,
}

#[derive(Serialize)]
pub struct AppRoleLoginRequest<'a> {
    pub role_id: &'a str,
    pub secret_id: &'a str,
}

#[derive(Serialize)]
pub struct GitHubLoginRequest<'a> {
    pub token: &'a str,
}

#[derive(Serialize)]
pub struct KubernetesLoginRequest<'a> {
    pub role: &'a str,
    pub jwt: &'a str,
}

/// AWS IAM login: a presigned STS GetCallerIdentity call, base64 encoded
#[derive(Debug, Serialize)]
pub struct IamLoginRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'a str>,
    pub iam_http_request_method: &'a str,
    pub iam_request_url: String,
    pub iam_request_body: String,
    pub iam_request_headers: String,
}
