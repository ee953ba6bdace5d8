//! # KMS Vault Controller
//!
//! Watches `KMSVaultSecret` resources in all namespaces, decrypts their
//! entries with AWS KMS and writes the result to a Vault KV path.
//!
//! Configuration comes from environment variables; see
//! [`kms_vault_controller::config`].

use anyhow::Result;
use kms_vault_controller::runtime::initialization::initialize;
use kms_vault_controller::runtime::watch_loop::run_watch_loop;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialize().await?;

    let watch = run_watch_loop(
        init.secrets.clone(),
        init.reconciler.clone(),
        init.server_state.clone(),
    );

    match init.trust_task {
        Some(trust_task) => {
            tokio::select! {
                result = watch => result?,
                joined = trust_task => {
                    let result = joined.map_err(anyhow::Error::from).and_then(|r| r);
                    if let Err(e) = &result {
                        error!("Vault CA watch stopped: {:#}", e);
                    }
                    result?;
                }
            }
        }
        None => watch.await?,
    }

    init.session_task.abort();
    info!("Controller exited");
    Ok(())
}
