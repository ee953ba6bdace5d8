//! # Admission Server
//!
//! `POST /validate` over TLS. Each accepted connection runs the axum router
//! through hyper-util's auto (HTTP/1.1 + HTTP/2) builder; the certificate is
//! picked per handshake by the reloading resolver.

use super::review;
use crate::provider::kms::DecryptionGateway;
use crate::tls::{server_config, ReloadingResolver};
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use kube::core::DynamicObject;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;
use tower::ServiceExt;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct AdmissionState {
    pub gateway: DecryptionGateway,
}

pub fn router(state: AdmissionState) -> Router {
    Router::new()
        .route("/validate", post(validate_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

async fn validate_handler(
    State(state): State<Arc<AdmissionState>>,
    Json(review_body): Json<AdmissionReview<DynamicObject>>,
) -> (StatusCode, Json<AdmissionReview<DynamicObject>>) {
    let request: AdmissionRequest<DynamicObject> = match review_body.try_into() {
        Ok(request) => request,
        Err(e) => {
            error!("Invalid AdmissionReview: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(AdmissionResponse::invalid(e.to_string()).into_review()),
            );
        }
    };

    let response = review(&state.gateway, &request).await;
    (StatusCode::OK, Json(response.into_review()))
}

/// Pause after a failed accept (e.g. EMFILE) before trying again
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Accept TLS connections on `addr`. Runs until the task is dropped.
pub async fn serve_tls(
    addr: SocketAddr,
    resolver: ReloadingResolver,
    router: Router,
) -> Result<(), anyhow::Error> {
    let acceptor = TlsAcceptor::from(Arc::new(server_config(resolver)?));
    let listener = TcpListener::bind(addr).await?;
    info!("Admission webhook listening on https://{}", addr);

    let listener = &listener;
    accept_loop(
        move || listener.accept(),
        |stream, peer| {
            let acceptor = acceptor.clone();
            let router = router.clone();
            tokio::spawn(serve_connection(acceptor, router, stream, peer));
        },
    )
    .await;
    Ok(())
}

/// Hand every accepted connection to `handle`. Accept errors are logged and
/// retried after [`ACCEPT_ERROR_BACKOFF`].
async fn accept_loop<S, Fut>(
    mut accept: impl FnMut() -> Fut,
    mut handle: impl FnMut(S, SocketAddr),
) where
    Fut: Future<Output = io::Result<(S, SocketAddr)>>,
{
    loop {
        match accept().await {
            Ok((stream, peer)) => handle(stream, peer),
            Err(e) => {
                warn!("Failed to accept admission connection: {}", e);
                tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
            }
        }
    }
}

async fn serve_connection(acceptor: TlsAcceptor, router: Router, stream: TcpStream, peer: SocketAddr) {
    let tls = match acceptor.accept(stream).await {
        Ok(tls) => tls,
        Err(e) => {
            warn!("TLS handshake with {} failed: {}", peer, e);
            return;
        }
    };

    let service = hyper::service::service_fn(move |request| router.clone().oneshot(request));
    if let Err(e) = auto::Builder::new(TokioExecutor::new())
        .serve_connection(TokioIo::new(tls), service)
        .await
    {
        debug!("Connection from {} closed with error: {}", peer, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_accept_error_does_not_stop_the_loop() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let mut handled = Vec::new();
        let peer: SocketAddr = "10.0.0.7:52100".parse().unwrap();

        let counter = attempts.clone();
        let accept = move || {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                match attempt {
                    // EMFILE
                    0 => Err(io::Error::from_raw_os_error(24)),
                    1 => Ok((attempt, peer)),
                    _ => std::future::pending().await,
                }
            }
        };

        tokio::time::timeout(
            Duration::from_secs(5),
            accept_loop(accept, |stream, peer| handled.push((stream, peer))),
        )
        .await
        .expect_err("loop only ends when dropped");

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(handled, vec![(1, peer)]);
    }
}
