//! # Error Policy
//!
//! Failed passes are requeued after the same short interval
//! (`RECONCILIATION_ERROR_REQUEUE_SECS`). Errors that no retry can fix, such
//! as missing auth settings, wait for the next change to the resource.

use crate::controller::reconciler::{Reconciler, ReconcilerError};
use crate::crd::KMSVaultSecret;
use crate::observability::metrics;
use kube::runtime::controller::Action;
use kube::ResourceExt;
use std::sync::Arc;
use tracing::{error, warn};

pub fn handle_reconciliation_error(
    resource: Arc<KMSVaultSecret>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let name = resource.name_any();
    let namespace = resource.namespace().unwrap_or_default();

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.reconciliation_error",
        resource.name = name.as_str(),
        resource.namespace = namespace.as_str(),
        error.kind = error.metric_label(),
    );
    let _error_guard = error_span.enter();

    error!("Reconciliation error for {}/{}: {}", namespace, name, error);
    metrics::increment_reconciliation_errors(error.metric_label());

    if !error.is_retryable() {
        warn!("Not retrying {}/{} until it changes", namespace, name);
        return Action::await_change();
    }

    Action::requeue(ctx.config.reconciliation_error_requeue_duration())
}
