//! Output format definitions for PathBuilder
//!
//! - HttpPath: request path including the `/v1/` API prefix
//! - ApiPath: path relative to the API prefix, as Vault reports it in
//!   responses and as the `vault` CLI accepts it

/// Output format for path construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathFormat {
    /// Full HTTP path: "/v1/secret/data/foo"
    HttpPath,

    /// Relative API path: "secret/data/foo"
    ApiPath,
}

/// Vault HTTP API prefix
pub const API_PREFIX: &str = "/v1/";
