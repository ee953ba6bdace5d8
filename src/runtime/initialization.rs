//! # Initialization
//!
//! Controller startup: rustls provider, tracing, metrics, probe server,
//! Vault session, KMS client and the reconciler context.
//!
//! Configuration errors stop startup. A default auth method that is
//! configured but cannot log in yet is only logged; the first pass retries.

use crate::config::{ControllerConfig, ServerConfig, VaultConfig};
use crate::constants::DEFAULT_FILE_WATCH_DEBOUNCE_MS;
use crate::controller::reconciler::{KubeControlPlane, Reconciler};
use crate::controller::server::{start_server, ServerState};
use crate::crd::KMSVaultSecret;
use crate::observability::{self, metrics};
use crate::provider::kms::{AwsKmsDecryptor, DecryptionGateway};
use crate::provider::vault::auth::{self, AuthMethod, AuthSettings};
use crate::provider::vault::{SessionHandle, VaultSession};
use crate::runtime::trust_watch::watch_trust;
use anyhow::{Context, Result};
use kube::{api::Api, Client};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Everything the watch loop needs
pub struct InitializationResult {
    pub client: Client,
    pub secrets: Api<KMSVaultSecret>,
    pub reconciler: Arc<Reconciler>,
    pub server_state: Arc<ServerState>,
    pub session: SessionHandle,
    pub session_task: JoinHandle<()>,
    /// Present when VAULT_CACERT or VAULT_CAPATH is set
    pub trust_task: Option<JoinHandle<Result<()>>>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.is_ready())
            .field("default_auth_method", &self.reconciler.default_auth_method)
            .field("watching_trust", &self.trust_task.is_some())
            .finish_non_exhaustive()
    }
}

pub async fn initialize() -> Result<InitializationResult> {
    // Must precede any rustls use. Err only means a provider is already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let controller_config = ControllerConfig::from_env();
    observability::init_logging(&controller_config.log_format);

    info!("Starting KMS Vault Controller");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    metrics::register_metrics().context("Failed to register metrics")?;

    let default_auth_method = auth::default_method(controller_config.default_auth_method.as_deref())
        .context("Invalid VAULT_AUTH_METHOD")?;
    info!("Default Vault auth method: {}", default_auth_method);

    let server_config = ServerConfig::from_env();
    let server_state = Arc::new(ServerState::default());
    let server_addr = SocketAddr::from(([0, 0, 0, 0], server_config.metrics_port));
    let server_state_clone = server_state.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(server_addr, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });
    wait_for_server_ready(&server_state, &server_handle, &server_config).await?;

    let vault_config = VaultConfig::from_env();
    let watched_trust = vault_config.trust.watched_paths();
    let (session, session_task) = VaultSession::spawn(vault_config, AuthSettings::from_env())
        .context("Failed to create Vault client")?;
    check_default_login(&session, default_auth_method).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    let secrets: Api<KMSVaultSecret> = Api::all(client.clone());

    let decryptor = AwsKmsDecryptor::from_env().await;
    let gateway = DecryptionGateway::new(
        Arc::new(decryptor),
        controller_config.kms_decrypt_timeout(),
    );

    let reconciler = Arc::new(Reconciler {
        control_plane: Arc::new(KubeControlPlane::new(client.clone())),
        session: Arc::new(session.clone()),
        gateway,
        config: controller_config,
        default_auth_method,
    });

    let trust_task = if watched_trust.is_empty() {
        None
    } else {
        Some(tokio::spawn(watch_trust(
            watched_trust,
            session.clone(),
            Duration::from_millis(DEFAULT_FILE_WATCH_DEBOUNCE_MS),
        )))
    };

    info!("Controller initialized, starting watch loop...");

    Ok(InitializationResult {
        client,
        secrets,
        reconciler,
        server_state,
        session,
        session_task,
        trust_task,
    })
}

/// Log in once with the default method so missing settings fail fast
async fn check_default_login(session: &SessionHandle, method: AuthMethod) -> Result<()> {
    match session.client(method).await {
        Ok(_) => {
            info!("Vault authentication with {} succeeded", method);
            Ok(())
        }
        Err(e) if e.is_configuration() => {
            Err(e).context("Vault auth for the default method is not configured")
        }
        Err(e) => {
            warn!(
                "Vault authentication with {} failed at startup, will retry on reconcile: {}",
                method, e
            );
            Ok(())
        }
    }
}

/// Wait for the HTTP server to become ready
async fn wait_for_server_ready(
    server_state: &Arc<ServerState>,
    server_handle: &JoinHandle<()>,
    server_config: &ServerConfig,
) -> Result<()> {
    let startup_timeout = server_config.startup_timeout();
    let start_time = std::time::Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }

        if server_state.is_ready() {
            info!("HTTP server is ready and accepting connections");
            return Ok(());
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(server_config.poll_interval()).await;
    }
}
