//! Operation type definitions for PathBuilder

/// Vault operations the controller performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VaultOperation {
    /// Read, write or delete at the declared secret path.
    /// For KV v1 this is the only addressable location.
    KvData,
    /// KV v2 metadata tree: current version lookup and delete of all versions
    KvMetadata,
    /// `auth/token/lookup-self`
    TokenLookupSelf,
    /// `auth/token/renew-self`
    TokenRenewSelf,
    /// Login at a configured auth endpoint (`auth/<mount>/login[...]`)
    Login,
}
