//! # Secret Composition
//!
//! Builds the key → plaintext map written for a KMSVaultSecret.
//!
//! Entries are taken from the resource itself, then from each included
//! PartialKMSVaultSecret in `includeSecrets` order. Every entry is decrypted
//! under its effective context:
//!
//! ```text
//! own entry:      entry.secretContext ▸ resource.secretContext
//! included entry: entry.secretContext ▸ partial.secretContext ▸ resource.secretContext
//! ```
//!
//! The first non-empty map wins. Keys that fail to resolve are left out and
//! reported as warnings; a failure never replaces a value an earlier entry
//! resolved for the same key.

use super::control_plane::{ControlPlane, SyncEvent};
use crate::crd::{KMSVaultSecret, SecretContext, SecretEntry};
use crate::provider::kms::{DecryptionError, DecryptionGateway};
use crate::provider::vault::kv::SecretData;
use kube::ResourceExt;
use tracing::{debug, warn};

pub const REASON_DECODING_ERROR: &str = "DecodingError";
pub const REASON_DECRYPTING_ERROR: &str = "DecryptingError";
pub const REASON_INCLUDE_NOT_FOUND: &str = "IncludeNotFound";

/// Non-fatal problem found while composing
#[derive(Debug)]
pub enum ComposeWarning {
    IncludeNotFound {
        name: String,
        reason: Option<String>,
    },
    Decryption {
        key: String,
        error: DecryptionError,
    },
}

impl ComposeWarning {
    /// Warning event describing this problem on `resource`
    pub fn to_event(&self, resource: &str) -> SyncEvent {
        match self {
            ComposeWarning::IncludeNotFound { name, reason } => SyncEvent::warning(
                REASON_INCLUDE_NOT_FOUND,
                match reason {
                    Some(reason) => {
                        format!("Included PartialKMSVaultSecret {name} could not be read: {reason}")
                    }
                    None => format!("Included PartialKMSVaultSecret {name} not found"),
                },
            ),
            ComposeWarning::Decryption { key, error } if error.is_decode() => SyncEvent::warning(
                REASON_DECODING_ERROR,
                format!("Error decoding key {key} in KMSVaultSecret {resource}: {error}"),
            ),
            ComposeWarning::Decryption { key, error } => SyncEvent::warning(
                REASON_DECRYPTING_ERROR,
                format!("Error decrypting key {key} in KMSVaultSecret {resource}: {error}"),
            ),
        }
    }
}

#[derive(Debug, Default)]
pub struct Composition {
    pub data: SecretData,
    pub warnings: Vec<ComposeWarning>,
}

/// An entry paired with the context it decrypts under
#[derive(Debug, Clone, PartialEq)]
pub struct SourcedEntry {
    pub entry: SecretEntry,
    pub context: SecretContext,
}

/// First non-empty context in precedence order
pub fn effective_context<'a>(
    entry: &'a SecretContext,
    declaring: &'a SecretContext,
    including: &'a SecretContext,
) -> &'a SecretContext {
    [entry, declaring, including]
        .into_iter()
        .find(|context| !context.is_empty())
        .unwrap_or(entry)
}

/// Own entries followed by included ones, each with its effective context
pub async fn collect_entries(
    control_plane: &dyn ControlPlane,
    resource: &KMSVaultSecret,
    namespace: &str,
) -> (Vec<SourcedEntry>, Vec<ComposeWarning>) {
    let resource_context = &resource.spec.secret_context;
    let none = SecretContext::new();
    let mut warnings = Vec::new();

    let mut entries: Vec<SourcedEntry> = resource
        .spec
        .secrets
        .iter()
        .map(|entry| SourcedEntry {
            entry: entry.clone(),
            context: effective_context(&entry.secret_context, resource_context, &none).clone(),
        })
        .collect();

    for name in &resource.spec.include_secrets {
        match control_plane.get_partial(namespace, name).await {
            Ok(Some(partial)) => {
                debug!(
                    "Including {} entries from PartialKMSVaultSecret {}",
                    partial.spec.secrets.len(),
                    name
                );
                entries.extend(partial.spec.secrets.iter().map(|entry| SourcedEntry {
                    entry: entry.clone(),
                    context: effective_context(
                        &entry.secret_context,
                        &partial.spec.secret_context,
                        resource_context,
                    )
                    .clone(),
                }));
            }
            Ok(None) => {
                warn!(
                    "PartialKMSVaultSecret {}/{} included by {} not found",
                    namespace,
                    name,
                    resource.name_any()
                );
                warnings.push(ComposeWarning::IncludeNotFound {
                    name: name.clone(),
                    reason: None,
                });
            }
            Err(e) => {
                warn!(
                    "Failed to read PartialKMSVaultSecret {}/{}: {}",
                    namespace, name, e
                );
                warnings.push(ComposeWarning::IncludeNotFound {
                    name: name.clone(),
                    reason: Some(e.to_string()),
                });
            }
        }
    }

    (entries, warnings)
}

/// Decrypt every entry; later successes overwrite earlier ones for the same key
pub async fn resolve_entries(
    gateway: &DecryptionGateway,
    entries: &[SourcedEntry],
    resource: &str,
) -> Composition {
    let mut composition = Composition::default();

    for SourcedEntry { entry, context } in entries {
        if entry.empty_secret && entry.encrypted_secret.is_some() {
            warn!(
                secret.key = entry.key.as_str(),
                "Key {} in {} is marked emptySecret; its ciphertext is ignored",
                entry.key,
                resource
            );
        }

        match gateway.resolve(entry, context).await {
            Ok(plaintext) => {
                composition.data.insert(entry.key.clone(), plaintext);
            }
            Err(error) => {
                warn!(
                    secret.key = entry.key.as_str(),
                    "Skipping key {} in {}: {}",
                    entry.key,
                    resource,
                    error
                );
                composition.warnings.push(ComposeWarning::Decryption {
                    key: entry.key.clone(),
                    error,
                });
            }
        }
    }

    composition
}

/// Resolve includes and decrypt everything a resource declares
pub async fn compose(
    control_plane: &dyn ControlPlane,
    gateway: &DecryptionGateway,
    resource: &KMSVaultSecret,
    namespace: &str,
) -> Composition {
    let (entries, mut warnings) = collect_entries(control_plane, resource, namespace).await;
    let mut composition = resolve_entries(gateway, &entries, &resource.name_any()).await;
    warnings.append(&mut composition.warnings);
    composition.warnings = warnings;
    composition
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(pairs: &[(&str, &str)]) -> SecretContext {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_entry_context_wins() {
        let entry = ctx(&[("a", "entry")]);
        let declaring = ctx(&[("a", "bundle")]);
        let including = ctx(&[("a", "resource")]);
        assert_eq!(effective_context(&entry, &declaring, &including), &entry);
    }

    #[test]
    fn test_declaring_context_when_entry_empty() {
        let empty = SecretContext::new();
        let declaring = ctx(&[("a", "bundle")]);
        let including = ctx(&[("a", "resource")]);
        assert_eq!(effective_context(&empty, &declaring, &including), &declaring);
    }

    #[test]
    fn test_including_context_when_bundle_empty() {
        let empty = SecretContext::new();
        let including = ctx(&[("a", "resource")]);
        assert_eq!(effective_context(&empty, &empty, &including), &including);
        assert!(effective_context(&empty, &empty, &empty).is_empty());
    }

    #[test]
    fn test_warning_events() {
        let missing = ComposeWarning::IncludeNotFound {
            name: "shared".into(),
            reason: None,
        };
        let event = missing.to_event("app");
        assert_eq!(event.reason, REASON_INCLUDE_NOT_FOUND);
        assert_eq!(event.note, "Included PartialKMSVaultSecret shared not found");

        let decode = ComposeWarning::Decryption {
            key: "Foo".into(),
            error: DecryptionError::MissingCiphertext,
        };
        let event = decode.to_event("bar");
        assert_eq!(event.reason, REASON_DECODING_ERROR);
        assert!(event.note.starts_with("Error decoding key Foo in KMSVaultSecret bar"));

        let decrypt = ComposeWarning::Decryption {
            key: "Foo".into(),
            error: DecryptionError::Decrypt("denied".into()),
        };
        assert_eq!(decrypt.to_event("bar").reason, REASON_DECRYPTING_ERROR);
    }
}
