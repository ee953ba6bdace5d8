//! # Reconciliation Logic
//!
//! One pass for a KMSVaultSecret:
//!
//! ```text
//! Fetched ──deleting──────────────────────────▶ finalize (Deleting)
//!    │
//! Composed ──▶ Authenticated ──▶ Writing ──▶ Done (requeue after sync period)
//! ```
//!
//! The resource is re-read at the start of every pass so a queued key
//! always acts on the latest spec. Vault is only touched after
//! authentication succeeded.

use super::compose::compose;
use super::control_plane::{ControlPlaneError, SyncEvent};
use super::finalize::finalize;
use super::status::{desired_status, needs_patch, SyncOutcome};
use super::types::{Reconciler, ReconcilerError, SyncPhase};
use crate::crd::KMSVaultSecret;
use crate::observability::metrics;
use crate::provider::vault::kv::{KvWriteError, KvWriter, WriteOutcome};
use chrono::Utc;
use kube::runtime::controller::Action;
use kube::{Resource, ResourceExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, field, info, info_span, warn, Instrument, Span};

pub const REASON_SECRET_CREATED: &str = "SecretCreated";

/// Entry point for the kube-runtime controller
pub async fn reconcile(
    resource: Arc<KMSVaultSecret>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let start = Instant::now();
    metrics::increment_reconciliations();

    let name = resource.name_any();
    let namespace = resource
        .namespace()
        .ok_or_else(|| ReconcilerError::MissingNamespace(name.clone()))?;

    let span = info_span!(
        "reconcile",
        resource.name = %name,
        resource.namespace = %namespace,
        resource.kind = "KMSVaultSecret",
        sync.phase = field::Empty,
    );
    let result = sync(&ctx, &namespace, &name).instrument(span).await;

    metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
    result
}

pub(super) fn enter_phase(phase: SyncPhase) {
    Span::current().record("sync.phase", phase.as_str());
    debug!("Sync phase: {}", phase.as_str());
}

async fn sync(ctx: &Reconciler, namespace: &str, name: &str) -> Result<Action, ReconcilerError> {
    let Some(resource) = ctx.control_plane.get_secret(namespace, name).await? else {
        debug!("KMSVaultSecret {}/{} no longer exists", namespace, name);
        return Ok(Action::await_change());
    };
    enter_phase(SyncPhase::Fetched);

    let method = resource
        .spec
        .vault_auth_method
        .unwrap_or(ctx.default_auth_method);
    let writer = KvWriter::from_settings(&resource.spec.kv_settings);

    if resource.meta().deletion_timestamp.is_some() {
        return finalize(ctx, &resource, method, writer).await;
    }

    info!("🔄 Reconciling KMSVaultSecret {}/{}", namespace, name);

    let composition = compose(ctx.control_plane.as_ref(), &ctx.gateway, &resource, namespace).await;
    enter_phase(SyncPhase::Composed);
    for warning in &composition.warnings {
        publish(ctx, &resource, warning.to_event(name)).await;
    }

    let backend = match ctx.session.authenticate(method).await {
        Ok(backend) => backend,
        Err(e) => {
            warn!("Vault authentication ({}) failed for {}/{}: {}", method, namespace, name, e);
            let outcome = if e.is_configuration() {
                SyncOutcome::ConfigurationError(e.to_string())
            } else {
                SyncOutcome::AuthenticationFailed(e.to_string())
            };
            record_outcome(ctx, &resource, outcome).await.ok();
            return Err(e.into());
        }
    };
    enter_phase(SyncPhase::Authenticated);

    enter_phase(SyncPhase::Writing);
    let path = resource.spec.path.as_str();
    match writer.write(backend.as_ref(), path, &composition.data).await {
        Ok(WriteOutcome::Written) => {
            info!(vault.path = path, "✅ Wrote {} keys for {}/{}", composition.data.len(), namespace, name);
        }
        Ok(WriteOutcome::AlreadyApplied { version }) => {
            debug!(vault.path = path, "Vault already at version {}, nothing to write", version);
        }
        Err(e) => {
            let outcome = match &e {
                KvWriteError::Conflict { .. } => SyncOutcome::CasConflict(e.to_string()),
                KvWriteError::Store(_) => SyncOutcome::StoreError(e.to_string()),
            };
            warn!(vault.path = path, "Write for {}/{} failed: {}", namespace, name, e);
            record_outcome(ctx, &resource, outcome).await.ok();
            return Err(e.into());
        }
    }

    let was_created = resource.status.as_ref().is_some_and(|s| s.created);
    let synced = SyncOutcome::Synced {
        path: path.to_string(),
    };
    if !record_outcome(ctx, &resource, synced).await? {
        return Ok(Action::await_change());
    }
    if !was_created {
        publish(
            ctx,
            &resource,
            SyncEvent::normal(REASON_SECRET_CREATED, format!("Wrote secret {name} to {path}")),
        )
        .await;
    }

    enter_phase(SyncPhase::Done);
    Ok(Action::requeue(ctx.config.sync_period()))
}

/// Patch status if it changed. `Ok(false)` when the resource vanished.
async fn record_outcome(
    ctx: &Reconciler,
    resource: &KMSVaultSecret,
    outcome: SyncOutcome,
) -> Result<bool, ReconcilerError> {
    let current = resource.status.as_ref();
    let desired = desired_status(current, resource.meta().generation, &outcome, Utc::now());
    if !needs_patch(current, &desired) {
        return Ok(true);
    }

    match ctx.control_plane.patch_status(resource, &desired).await {
        Ok(()) => Ok(true),
        Err(ControlPlaneError::NotFound) => {
            debug!("{} was deleted during the pass", resource.name_any());
            Ok(false)
        }
        Err(e) => {
            warn!("Failed to update status of {}: {}", resource.name_any(), e);
            Err(e.into())
        }
    }
}

/// Events are best effort
pub(super) async fn publish(ctx: &Reconciler, resource: &KMSVaultSecret, event: SyncEvent) {
    let reason = event.reason;
    if let Err(e) = ctx.control_plane.publish(resource, event).await {
        warn!("Failed to publish {} event for {}: {}", reason, resource.name_any(), e);
    }
}
