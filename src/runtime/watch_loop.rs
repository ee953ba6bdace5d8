//! # Watch Loop
//!
//! Runs the kube-runtime controller over all KMSVaultSecret resources.
//! The controller serializes passes per object; a stream that ends without
//! a shutdown request is restarted after a delay.

use crate::controller::reconciler::{reconcile, Reconciler};
use crate::controller::server::ServerState;
use crate::crd::KMSVaultSecret;
use crate::runtime::error_policy::handle_reconciliation_error;
use futures::StreamExt;
use kube::api::Api;
use kube::runtime::{watcher, Controller};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub async fn run_watch_loop(
    secrets: Api<KMSVaultSecret>,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
) -> Result<(), anyhow::Error> {
    // Mark not ready on SIGINT/SIGTERM so probes drain traffic during shutdown
    let shutdown_state = server_state.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received shutdown signal, initiating graceful shutdown...");
        shutdown_state.set_ready(false);
    });

    let restart_delay = reconciler.config.watch_restart_delay_duration();

    loop {
        if !server_state.is_ready() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        info!("Starting controller watch loop...");
        Controller::new(secrets.clone(), watcher::Config::default().any_semantic())
            .shutdown_on_signal()
            .run(reconcile, handle_reconciliation_error, reconciler.clone())
            .for_each(|result| {
                match result {
                    Ok((object, _action)) => debug!("Reconciled {}", object),
                    Err(e) => warn!("Controller stream error: {}", e),
                }
                futures::future::ready(())
            })
            .await;

        if !server_state.is_ready() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        warn!(
            "Controller watch stream ended, restarting in {} seconds...",
            restart_delay.as_secs()
        );
        tokio::time::sleep(restart_delay).await;
    }

    info!("Controller stopped gracefully");
    Ok(())
}
