//! # Control Plane
//!
//! Kubernetes reads and writes performed during a reconcile pass, behind a
//! trait so passes can be driven against an in-memory cluster in tests.
//!
//! The controller only ever mutates `status`, its own finalizer and events.

use crate::constants::CONTROLLER_NAME;
use crate::crd::{KMSVaultSecret, KMSVaultSecretStatus, PartialKMSVaultSecret};
use async_trait::async_trait;
use kube::api::{Patch, PatchParams};
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::{Api, Client, Resource, ResourceExt};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ControlPlaneError {
    /// The object disappeared while the pass was running
    #[error("resource not found")]
    NotFound,

    /// Optimistic concurrency check failed (stale resourceVersion)
    #[error("resource was modified concurrently")]
    Conflict,

    #[error("Kubernetes API error: {0}")]
    Api(#[source] kube::Error),
}

impl From<kube::Error> for ControlPlaneError {
    fn from(error: kube::Error) -> Self {
        match &error {
            kube::Error::Api(api_err) if api_err.code == 404 => ControlPlaneError::NotFound,
            kube::Error::Api(api_err) if api_err.code == 409 => ControlPlaneError::Conflict,
            _ => ControlPlaneError::Api(error),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Normal,
    Warning,
}

/// Event attached to a KMSVaultSecret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEvent {
    pub kind: EventKind,
    pub reason: &'static str,
    pub note: String,
}

impl SyncEvent {
    pub fn normal(reason: &'static str, note: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Normal,
            reason,
            note: note.into(),
        }
    }

    pub fn warning(reason: &'static str, note: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Warning,
            reason,
            note: note.into(),
        }
    }
}

#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Current state of a KMSVaultSecret; `None` when it no longer exists
    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<KMSVaultSecret>, ControlPlaneError>;

    async fn get_partial(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<PartialKMSVaultSecret>, ControlPlaneError>;

    /// Replace the status subresource
    async fn patch_status(
        &self,
        resource: &KMSVaultSecret,
        status: &KMSVaultSecretStatus,
    ) -> Result<(), ControlPlaneError>;

    /// Drop one finalizer, keeping any others. Guarded by the observed resourceVersion.
    async fn remove_finalizer(
        &self,
        resource: &KMSVaultSecret,
        finalizer: &str,
    ) -> Result<(), ControlPlaneError>;

    async fn publish(
        &self,
        resource: &KMSVaultSecret,
        event: SyncEvent,
    ) -> Result<(), ControlPlaneError>;
}

/// [`ControlPlane`] backed by the cluster API
pub struct KubeControlPlane {
    client: Client,
    recorder: Recorder,
}

impl std::fmt::Debug for KubeControlPlane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeControlPlane").finish_non_exhaustive()
    }
}

impl KubeControlPlane {
    pub fn new(client: Client) -> Self {
        let reporter = Reporter {
            controller: CONTROLLER_NAME.to_string(),
            instance: std::env::var("POD_NAME").ok(),
        };
        let recorder = Recorder::new(client.clone(), reporter);
        Self { client, recorder }
    }

    fn secrets(&self, namespace: &str) -> Api<KMSVaultSecret> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ControlPlane for KubeControlPlane {
    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<KMSVaultSecret>, ControlPlaneError> {
        Ok(self.secrets(namespace).get_opt(name).await?)
    }

    async fn get_partial(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<PartialKMSVaultSecret>, ControlPlaneError> {
        let api: Api<PartialKMSVaultSecret> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn patch_status(
        &self,
        resource: &KMSVaultSecret,
        status: &KMSVaultSecretStatus,
    ) -> Result<(), ControlPlaneError> {
        let namespace = resource.namespace().unwrap_or_default();
        let patch = serde_json::json!({ "status": status });
        self.secrets(&namespace)
            .patch_status(
                &resource.name_any(),
                &PatchParams::apply(CONTROLLER_NAME),
                &Patch::Merge(patch),
            )
            .await?;
        debug!("Patched status of {}/{}", namespace, resource.name_any());
        Ok(())
    }

    async fn remove_finalizer(
        &self,
        resource: &KMSVaultSecret,
        finalizer: &str,
    ) -> Result<(), ControlPlaneError> {
        let remaining: Vec<&String> = resource
            .finalizers()
            .iter()
            .filter(|f| f.as_str() != finalizer)
            .collect();
        let patch = serde_json::json!({
            "metadata": {
                "finalizers": remaining,
                "resourceVersion": resource.resource_version(),
            }
        });
        self.secrets(&resource.namespace().unwrap_or_default())
            .patch(
                &resource.name_any(),
                &PatchParams::default(),
                &Patch::Merge(patch),
            )
            .await?;
        Ok(())
    }

    async fn publish(
        &self,
        resource: &KMSVaultSecret,
        event: SyncEvent,
    ) -> Result<(), ControlPlaneError> {
        let type_ = match event.kind {
            EventKind::Normal => EventType::Normal,
            EventKind::Warning => EventType::Warning,
        };
        self.recorder
            .publish(
                &Event {
                    type_,
                    reason: event.reason.to_string(),
                    note: Some(event.note),
                    action: "Reconcile".to_string(),
                    secondary: None,
                },
                &resource.object_ref(&()),
            )
            .await?;
        Ok(())
    }
}
