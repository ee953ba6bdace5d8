//! # KMS Vault Admission Webhook
//!
//! Validating webhook that rejects `KMSVaultSecret` and
//! `PartialKMSVaultSecret` objects whose entries cannot be decrypted.
//!
//! The serving certificate is reloaded whenever the files change; a pair
//! that fails to load stops the process so the pod restarts.

use anyhow::{Context, Result};
use clap::Parser;
use kms_vault_controller::config::ControllerConfig;
use kms_vault_controller::constants::{
    DEFAULT_FILE_WATCH_DEBOUNCE_MS, DEFAULT_WEBHOOK_LISTEN_ADDR, DEFAULT_WEBHOOK_METRICS_ADDR,
};
use kms_vault_controller::controller::admission::{router, serve_tls, AdmissionState};
use kms_vault_controller::controller::server::{start_server, ServerState};
use kms_vault_controller::observability::{self, metrics};
use kms_vault_controller::provider::kms::{AwsKmsDecryptor, DecryptionGateway};
use kms_vault_controller::tls::CertificateReloader;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "kms-vault-webhook")]
#[command(about = "Admission webhook for KMSVaultSecret resources", long_about = None)]
struct Args {
    /// PEM certificate chain served on the admission port
    #[arg(long, env = "TLS_CERT_FILE")]
    tls_cert_file: PathBuf,

    /// PEM private key for the certificate
    #[arg(long, env = "TLS_KEY_FILE")]
    tls_key_file: PathBuf,

    /// Address of the HTTPS admission endpoint
    #[arg(long, default_value = DEFAULT_WEBHOOK_LISTEN_ADDR)]
    listen_addr: SocketAddr,

    /// Address of the plain HTTP metrics and probe endpoint
    #[arg(long, default_value = DEFAULT_WEBHOOK_METRICS_ADDR)]
    metrics_addr: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = ControllerConfig::from_env();
    observability::init_logging(&config.log_format);
    info!("Starting KMS Vault admission webhook");

    metrics::register_metrics().context("Failed to register metrics")?;

    let (reloader, resolver) = CertificateReloader::load(&args.tls_cert_file, &args.tls_key_file)
        .context("Failed to load TLS certificate")?;

    let gateway = DecryptionGateway::new(
        Arc::new(AwsKmsDecryptor::from_env().await),
        config.kms_decrypt_timeout(),
    );

    let server_state = Arc::new(ServerState::default());
    let probes = tokio::spawn(start_server(args.metrics_addr, server_state.clone()));
    let reload = tokio::spawn(reloader.run(Duration::from_millis(DEFAULT_FILE_WATCH_DEBOUNCE_MS)));
    let admission = serve_tls(args.listen_addr, resolver, router(AdmissionState { gateway }));

    tokio::select! {
        result = admission => {
            result.context("Admission server failed")?;
        }
        joined = reload => {
            let result = joined.context("Certificate reloader panicked")?;
            if let Err(e) = &result {
                error!("Certificate reload failed, exiting: {}", e);
            }
            result.context("Certificate reload failed")?;
        }
        joined = probes => {
            joined.context("Metrics server panicked")??;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, exiting");
            server_state.set_ready(false);
        }
    }

    Ok(())
}
