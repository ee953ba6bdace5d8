//! # Vault Session
//!
//! One task owns the HTTP client and every issued token. Reconcile passes
//! talk to it through a cloneable [`SessionHandle`]; commands are handled
//! one at a time, so concurrent passes never renew the same token twice or
//! see a half-rebuilt client.
//!
//! ```text
//! reconcile ─┐
//! reconcile ─┼─ mpsc ──▶ VaultSession ──▶ lookup-self / renew-self / login
//! trust watch┘    ◀── oneshot (authenticated VaultClient snapshot)
//! ```

use super::auth::{self, AuthError, AuthMethod, AuthSettings, Credential};
use super::{StoreError, VaultClient};
use crate::config::VaultConfig;
use crate::observability::metrics;
use crate::provider::{KvBackend, StoreSession};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const COMMAND_BUFFER: usize = 32;

#[derive(Debug)]
pub enum SessionCommand {
    /// Renew or log in with `method` and reply with a client carrying the token
    Authenticate {
        method: AuthMethod,
        reply: oneshot::Sender<Result<VaultClient, AuthError>>,
    },
    /// Rebuild the HTTP client after the CA material changed
    ReloadTrust {
        reply: oneshot::Sender<Result<(), StoreError>>,
    },
}

pub struct VaultSession {
    config: VaultConfig,
    settings: AuthSettings,
    client: VaultClient,
    credentials: HashMap<AuthMethod, Credential>,
    commands: mpsc::Receiver<SessionCommand>,
}

impl std::fmt::Debug for VaultSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSession")
            .field("client", &self.client)
            .field("methods", &self.credentials.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl VaultSession {
    /// Build the client and start the session task
    ///
    /// # Errors
    /// Returns an error if the initial HTTP client cannot be built
    pub fn spawn(
        config: VaultConfig,
        settings: AuthSettings,
    ) -> Result<(SessionHandle, JoinHandle<()>), StoreError> {
        let client = VaultClient::new(&config)?;
        let (sender, commands) = mpsc::channel(COMMAND_BUFFER);

        let session = Self {
            config,
            settings,
            client,
            credentials: HashMap::new(),
            commands,
        };
        let task = tokio::spawn(session.run());
        Ok((SessionHandle { sender }, task))
    }

    async fn run(mut self) {
        info!("Vault session started for {}", self.client.base_url());
        while let Some(command) = self.commands.recv().await {
            match command {
                SessionCommand::Authenticate { method, reply } => {
                    let result = self.authenticate(method).await;
                    if reply.send(result).is_err() {
                        debug!("Authenticate caller went away before the reply");
                    }
                }
                SessionCommand::ReloadTrust { reply } => {
                    let result = self.reload_trust();
                    let _ = reply.send(result);
                }
            }
        }
        info!("Vault session stopped");
    }

    async fn authenticate(&mut self, method: AuthMethod) -> Result<VaultClient, AuthError> {
        let current = self.credentials.get(&method);
        match auth::renew(current, method, &self.settings, &self.client).await {
            Ok((credential, renewal)) => {
                metrics::increment_token_operations(method.as_str(), renewal.as_str());
                let client = self.client.with_token(credential.token());
                self.credentials.insert(method, credential);
                Ok(client)
            }
            Err(e) => {
                metrics::increment_token_operations(method.as_str(), "failed");
                self.credentials.remove(&method);
                warn!("Vault authentication with {} failed: {}", method, e);
                Err(e)
            }
        }
    }

    /// Swap in a client with the new trust roots. Tokens survive.
    fn reload_trust(&mut self) -> Result<(), StoreError> {
        self.client = VaultClient::new(&self.config)?;
        info!("🔐 Reloaded Vault CA certificates");
        Ok(())
    }
}

/// Cloneable entry point to the session task
#[derive(Debug, Clone)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Authenticated client for `method`
    pub async fn client(&self, method: AuthMethod) -> Result<VaultClient, AuthError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(SessionCommand::Authenticate { method, reply })
            .await
            .map_err(|_| AuthError::SessionClosed)?;
        response.await.map_err(|_| AuthError::SessionClosed)?
    }

    pub async fn reload_trust(&self) -> Result<(), StoreError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(SessionCommand::ReloadTrust { reply })
            .await
            .map_err(|_| StoreError::SessionClosed)?;
        response.await.map_err(|_| StoreError::SessionClosed)?
    }
}

#[async_trait]
impl StoreSession for SessionHandle {
    async fn authenticate(&self, method: AuthMethod) -> Result<Arc<dyn KvBackend>, AuthError> {
        let client = self.client(method).await?;
        Ok(Arc::new(client))
    }
}
