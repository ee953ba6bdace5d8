//! # Provider Modules
//!
//! External systems the controller talks to, each behind a trait so the
//! reconciler can be exercised without a cluster, Vault or AWS:
//!
//! - [`KvBackend`]: raw Vault KV reads, writes and deletes
//! - [`TokenApi`]: Vault token lookup, renewal and login
//! - [`StoreSession`]: hands out authenticated KV backends
//! - [`kms::Decryptor`]: envelope decryption oracle

pub mod kms;
pub mod vault;

use crate::crd::AuthMethod;
use async_trait::async_trait;
use std::sync::Arc;
use vault::auth::{AuthError, Credential, LoginRequest, TokenInfo};
use vault::StoreError;

/// Vault KV HTTP operations
///
/// Paths are the declared secret paths (`secret/data/foo` for KV v2);
/// request bodies are already shaped for the engine version by
/// [`vault::kv::KvWriter`].
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Read the `data` object at a path. `None` when Vault answers 404.
    async fn read(&self, path: &str) -> Result<Option<serde_json::Value>, StoreError>;

    /// Write a JSON body to a path
    async fn write(&self, path: &str, body: serde_json::Value) -> Result<(), StoreError>;

    /// Delete a path. Deleting a missing path is not an error.
    async fn delete(&self, path: &str) -> Result<(), StoreError>;
}

/// Vault token endpoints, used by the auth strategies
#[async_trait]
pub trait TokenApi: Send + Sync {
    /// `auth/token/lookup-self` with the given token
    async fn lookup_self(&self, token: &str) -> Result<TokenInfo, StoreError>;

    /// `auth/token/renew-self` with the given token
    async fn renew_self(&self, token: &str) -> Result<Credential, StoreError>;

    /// Submit a login request and parse the issued token
    async fn login(&self, request: &LoginRequest) -> Result<Credential, StoreError>;
}

/// Source of authenticated Vault access for a reconcile pass
#[async_trait]
pub trait StoreSession: Send + Sync {
    /// Renew or obtain a token for `method` and return a backend that uses it
    async fn authenticate(&self, method: AuthMethod) -> Result<Arc<dyn KvBackend>, AuthError>;
}
