//! # Finalizer Handling
//!
//! Deleting a KMSVaultSecret removes its Vault secret only when the
//! resource carries [`DELETE_FINALIZER`]. Without it the controller does no
//! Vault I/O at all and lets Kubernetes delete the object.

use super::control_plane::ControlPlaneError;
use super::reconcile::enter_phase;
use super::types::{Reconciler, ReconcilerError, SyncPhase};
use crate::constants::DELETE_FINALIZER;
use crate::crd::{AuthMethod, KMSVaultSecret};
use crate::provider::vault::kv::KvWriter;
use kube::runtime::controller::Action;
use kube::ResourceExt;
use tracing::{debug, info};

pub fn has_finalizer(resource: &KMSVaultSecret) -> bool {
    resource.finalizers().iter().any(|f| f == DELETE_FINALIZER)
}

pub async fn finalize(
    ctx: &Reconciler,
    resource: &KMSVaultSecret,
    method: AuthMethod,
    writer: KvWriter,
) -> Result<Action, ReconcilerError> {
    let name = resource.name_any();
    if !has_finalizer(resource) {
        debug!("{} is being deleted without {}, leaving Vault untouched", name, DELETE_FINALIZER);
        return Ok(Action::await_change());
    }

    let backend = ctx.session.authenticate(method).await?;
    enter_phase(SyncPhase::Authenticated);

    enter_phase(SyncPhase::Deleting);
    let path = resource.spec.path.as_str();
    writer
        .delete(backend.as_ref(), path)
        .await
        .map_err(|source| ReconcilerError::Delete {
            path: path.to_string(),
            source,
        })?;
    info!(vault.path = path, "🗑️  Deleted Vault secret for {}", name);

    match ctx
        .control_plane
        .remove_finalizer(resource, DELETE_FINALIZER)
        .await
    {
        Ok(()) | Err(ControlPlaneError::NotFound) => {}
        Err(e) => return Err(e.into()),
    }

    enter_phase(SyncPhase::Done);
    Ok(Action::await_change())
}
