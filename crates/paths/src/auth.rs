//! Auth and token endpoints

pub const TOKEN_LOOKUP_SELF: &str = "auth/token/lookup-self";
pub const TOKEN_RENEW_SELF: &str = "auth/token/renew-self";

// Default login endpoints per auth method mount
pub const USERPASS_LOGIN: &str = "auth/userpass/login";
pub const APPROLE_LOGIN: &str = "auth/approle/login";
pub const GITHUB_LOGIN: &str = "auth/github/login";
pub const AWS_LOGIN: &str = "auth/aws/login";
pub const KUBERNETES_LOGIN: &str = "auth/kubernetes/login";

/// Userpass logins carry the username as the final segment
pub fn userpass_login(endpoint: &str, username: &str) -> String {
    format!("{}/{}", endpoint.trim_end_matches('/'), username)
}
