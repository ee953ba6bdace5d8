//! Common test utilities
//!
//! In-memory stand-ins for the cluster, Vault and KMS, plus builders for
//! resources. Shared by the integration test binaries, so not every helper
//! is used by each of them.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use kms_vault_controller::config::ControllerConfig;
use kms_vault_controller::controller::reconciler::{
    ControlPlane, ControlPlaneError, Reconciler, SyncEvent,
};
use kms_vault_controller::crd::{
    AuthMethod, KMSVaultSecret, KMSVaultSecretStatus, PartialKMSVaultSecret, SecretContext,
};
use kms_vault_controller::provider::kms::{DecryptionError, DecryptionGateway, Decryptor};
use kms_vault_controller::provider::vault::auth::{
    AuthError, Credential, LoginRequest, TokenInfo,
};
use kms_vault_controller::provider::vault::StoreError;
use kms_vault_controller::provider::{KvBackend, StoreSession, TokenApi};
use kube::ResourceExt;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use zeroize::Zeroizing;

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
///
/// Uses a `Once` so it is installed a single time per test binary.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        rustls::crypto::ring::default_provider()
            .install_default()
            .expect("Failed to install rustls crypto provider");
    });
}

pub const NAMESPACE: &str = "payments";

/// Ciphertext the [`EchoKms`] decrypts back to `plaintext`
pub fn encrypt(plaintext: &str) -> String {
    BASE64.encode(plaintext)
}

/// KMSVaultSecret built from its JSON form, as the API server would return it
pub fn secret_resource(name: &str, spec: Value) -> KMSVaultSecret {
    serde_json::from_value(json!({
        "apiVersion": "secret-management.octopilot.io/v1alpha1",
        "kind": "KMSVaultSecret",
        "metadata": {
            "name": name,
            "namespace": NAMESPACE,
            "generation": 1,
            "resourceVersion": "1",
        },
        "spec": spec,
    }))
    .expect("valid KMSVaultSecret")
}

/// Same resource, marked for deletion with the given finalizers
pub fn deleting(resource: &KMSVaultSecret, finalizers: &[&str]) -> KMSVaultSecret {
    let mut value = serde_json::to_value(resource).expect("serializable resource");
    value["metadata"]["deletionTimestamp"] = json!("2026-03-01T10:00:00Z");
    value["metadata"]["finalizers"] = json!(finalizers);
    serde_json::from_value(value).expect("valid KMSVaultSecret")
}

pub fn partial_resource(name: &str, spec: Value) -> PartialKMSVaultSecret {
    serde_json::from_value(json!({
        "apiVersion": "secret-management.octopilot.io/v1alpha1",
        "kind": "PartialKMSVaultSecret",
        "metadata": { "name": name, "namespace": NAMESPACE },
        "spec": spec,
    }))
    .expect("valid PartialKMSVaultSecret")
}

/// In-memory cluster holding KMSVaultSecrets, partials, events and status patches
#[derive(Default)]
pub struct FakeCluster {
    secrets: Mutex<HashMap<String, KMSVaultSecret>>,
    partials: Mutex<HashMap<String, PartialKMSVaultSecret>>,
    pub events: Mutex<Vec<SyncEvent>>,
    pub status_patches: Mutex<Vec<KMSVaultSecretStatus>>,
    pub removed_finalizers: Mutex<Vec<String>>,
}

impl FakeCluster {
    pub fn with_secret(self, resource: KMSVaultSecret) -> Self {
        self.put_secret(resource);
        self
    }

    pub fn with_partial(self, partial: PartialKMSVaultSecret) -> Self {
        self.partials
            .lock()
            .unwrap()
            .insert(partial.name_any(), partial);
        self
    }

    pub fn put_secret(&self, resource: KMSVaultSecret) {
        self.secrets
            .lock()
            .unwrap()
            .insert(resource.name_any(), resource);
    }

    pub fn secret(&self, name: &str) -> Option<KMSVaultSecret> {
        self.secrets.lock().unwrap().get(name).cloned()
    }

    pub fn event_reasons(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|e| e.reason).collect()
    }
}

#[async_trait]
impl ControlPlane for FakeCluster {
    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<KMSVaultSecret>, ControlPlaneError> {
        assert_eq!(namespace, NAMESPACE);
        Ok(self.secret(name))
    }

    async fn get_partial(
        &self,
        _namespace: &str,
        name: &str,
    ) -> Result<Option<PartialKMSVaultSecret>, ControlPlaneError> {
        Ok(self.partials.lock().unwrap().get(name).cloned())
    }

    async fn patch_status(
        &self,
        resource: &KMSVaultSecret,
        status: &KMSVaultSecretStatus,
    ) -> Result<(), ControlPlaneError> {
        let mut secrets = self.secrets.lock().unwrap();
        let stored = secrets
            .get_mut(&resource.name_any())
            .ok_or(ControlPlaneError::NotFound)?;
        stored.status = Some(status.clone());
        self.status_patches.lock().unwrap().push(status.clone());
        Ok(())
    }

    async fn remove_finalizer(
        &self,
        resource: &KMSVaultSecret,
        finalizer: &str,
    ) -> Result<(), ControlPlaneError> {
        let mut secrets = self.secrets.lock().unwrap();
        let stored = secrets
            .get_mut(&resource.name_any())
            .ok_or(ControlPlaneError::NotFound)?;
        stored.finalizers_mut().retain(|f| f != finalizer);
        self.removed_finalizers
            .lock()
            .unwrap()
            .push(finalizer.to_string());
        Ok(())
    }

    async fn publish(
        &self,
        _resource: &KMSVaultSecret,
        event: SyncEvent,
    ) -> Result<(), ControlPlaneError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// Vault KV mount kept in memory.
///
/// Bodies with `options.cas` follow KV v2 rules: the write succeeds only
/// when `cas` equals the current version, which then increments.
#[derive(Default)]
pub struct MemoryVault {
    data: Mutex<HashMap<String, Value>>,
    versions: Mutex<HashMap<String, u64>>,
    pub writes: AtomicUsize,
    pub deletes: Mutex<Vec<String>>,
}

impl MemoryVault {
    /// Mount where the secret at `path` is already at `version`
    pub fn at_version(path: &str, version: u64) -> Self {
        let vault = Self::default();
        vault
            .versions
            .lock()
            .unwrap()
            .insert(paths::kv::metadata_path(path).unwrap(), version);
        vault
    }

    pub fn stored(&self, path: &str) -> Option<Value> {
        self.data.lock().unwrap().get(path).cloned()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn delete_log(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl KvBackend for MemoryVault {
    async fn read(&self, path: &str) -> Result<Option<Value>, StoreError> {
        if let Some(version) = self.versions.lock().unwrap().get(path) {
            return Ok(Some(json!({ "current_version": version })));
        }
        Ok(self.stored(path))
    }

    async fn write(&self, path: &str, body: Value) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let stored = match body.pointer("/options/cas").and_then(Value::as_u64) {
            Some(cas) => {
                let metadata = paths::kv::metadata_path(path)?;
                let mut versions = self.versions.lock().unwrap();
                let version = versions.entry(metadata).or_insert(0);
                if *version != cas {
                    return Err(StoreError::CheckAndSetMismatch(format!(
                        "check-and-set parameter did not match the current version ({version})"
                    )));
                }
                *version += 1;
                body["data"].clone()
            }
            None => body,
        };
        self.data.lock().unwrap().insert(path.to_string(), stored);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        self.deletes.lock().unwrap().push(path.to_string());
        self.data.lock().unwrap().remove(path);
        self.versions.lock().unwrap().remove(path);
        Ok(())
    }
}

/// Hands out the shared [`MemoryVault`], or fails every login when `denied`
pub struct FakeSession {
    pub vault: Arc<MemoryVault>,
    pub denied: bool,
    /// Settings reported missing for every method
    pub missing_setting: Option<&'static str>,
    pub logins: Mutex<Vec<AuthMethod>>,
}

impl FakeSession {
    pub fn new(vault: Arc<MemoryVault>) -> Self {
        Self {
            vault,
            denied: false,
            missing_setting: None,
            logins: Mutex::new(Vec::new()),
        }
    }

    pub fn denied(vault: Arc<MemoryVault>) -> Self {
        Self {
            denied: true,
            ..Self::new(vault)
        }
    }

    pub fn missing(vault: Arc<MemoryVault>, setting: &'static str) -> Self {
        Self {
            missing_setting: Some(setting),
            ..Self::new(vault)
        }
    }

    pub fn login_count(&self) -> usize {
        self.logins.lock().unwrap().len()
    }
}

#[async_trait]
impl StoreSession for FakeSession {
    async fn authenticate(&self, method: AuthMethod) -> Result<Arc<dyn KvBackend>, AuthError> {
        self.logins.lock().unwrap().push(method);
        if let Some(missing) = self.missing_setting {
            return Err(AuthError::MissingConfiguration { method, missing });
        }
        if self.denied {
            return Err(AuthError::Login {
                method,
                source: StoreError::Status {
                    status: 403,
                    message: "permission denied".into(),
                },
            });
        }
        Ok(self.vault.clone())
    }
}

/// "Decrypts" by returning the ciphertext bytes; contexts containing
/// `deny` are refused. Every context seen is recorded.
#[derive(Default)]
pub struct EchoKms {
    pub contexts: Mutex<Vec<SecretContext>>,
}

#[async_trait]
impl Decryptor for EchoKms {
    async fn decrypt(
        &self,
        ciphertext: &[u8],
        context: &SecretContext,
    ) -> Result<Zeroizing<Vec<u8>>, DecryptionError> {
        self.contexts.lock().unwrap().push(context.clone());
        if context.contains_key("deny") {
            return Err(DecryptionError::Decrypt(
                "AccessDeniedException: context mismatch".into(),
            ));
        }
        Ok(Zeroizing::new(ciphertext.to_vec()))
    }
}

pub fn gateway(kms: Arc<EchoKms>) -> DecryptionGateway {
    DecryptionGateway::new(kms, Duration::from_secs(1))
}

/// Reconciler context wired to the fakes
pub fn reconciler(
    cluster: Arc<FakeCluster>,
    session: Arc<FakeSession>,
    kms: Arc<EchoKms>,
) -> Arc<Reconciler> {
    Arc::new(Reconciler {
        control_plane: cluster,
        session,
        gateway: gateway(kms),
        config: ControllerConfig::default(),
        default_auth_method: AuthMethod::Token,
    })
}

/// Token endpoints answering from a script; logins issue `s.<path>` tokens
#[derive(Default)]
pub struct ScriptedTokens {
    pub lookup: Mutex<Option<TokenInfo>>,
    pub logins: Mutex<Vec<LoginRequest>>,
    pub renewals: AtomicUsize,
}

#[async_trait]
impl TokenApi for ScriptedTokens {
    async fn lookup_self(&self, _token: &str) -> Result<TokenInfo, StoreError> {
        self.lookup
            .lock()
            .unwrap()
            .clone()
            .ok_or(StoreError::Status {
                status: 403,
                message: "permission denied".into(),
            })
    }

    async fn renew_self(&self, token: &str) -> Result<Credential, StoreError> {
        self.renewals.fetch_add(1, Ordering::SeqCst);
        Ok(Credential::new(token, None, true))
    }

    async fn login(&self, request: &LoginRequest) -> Result<Credential, StoreError> {
        self.logins.lock().unwrap().push(request.clone());
        Ok(Credential::new(format!("s.{}", request.path), None, true))
    }
}
