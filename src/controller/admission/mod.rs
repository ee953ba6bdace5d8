//! # Admission Validator
//!
//! Pre-flights every entry of an incoming `KMSVaultSecret` or
//! `PartialKMSVaultSecret` through the decryption gateway and rejects the
//! object on the first key that does not decode or decrypt.
//!
//! Reconciliation is more lenient with the same input: it skips the bad key
//! and writes the rest.

mod server;

pub use server::{router, serve_tls, AdmissionState};

use crate::controller::reconciler::compose::effective_context;
use crate::crd::{KMSVaultSecret, PartialKMSVaultSecret, SecretContext, SecretEntry};
use crate::observability::metrics;
use crate::provider::kms::{DecryptionError, DecryptionGateway};
use kube::core::admission::{AdmissionRequest, AdmissionResponse, Operation};
use kube::core::DynamicObject;
use kube::ResourceExt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(String),
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept)
    }
}

fn rejection(kind: &str, name: &str, key: &str, error: &DecryptionError) -> String {
    let action = if error.is_decode() { "decoding" } else { "decrypting" };
    format!("Error {action} key {key} in {kind} {name}: {error}")
}

async fn validate_entries(
    gateway: &DecryptionGateway,
    kind: &str,
    name: &str,
    entries: &[SecretEntry],
    declaring: &SecretContext,
) -> Verdict {
    let none = SecretContext::new();
    for entry in entries.iter().filter(|entry| !entry.empty_secret) {
        let context = effective_context(&entry.secret_context, declaring, &none);
        if let Err(error) = gateway.resolve(entry, context).await {
            return Verdict::Reject(rejection(kind, name, &entry.key, &error));
        }
    }
    Verdict::Accept
}

pub async fn validate_secret(gateway: &DecryptionGateway, resource: &KMSVaultSecret) -> Verdict {
    validate_entries(
        gateway,
        "KMSVaultSecret",
        &resource.name_any(),
        &resource.spec.secrets,
        &resource.spec.secret_context,
    )
    .await
}

/// Bundle entries are checked under entry context, then the bundle's own
pub async fn validate_partial(
    gateway: &DecryptionGateway,
    partial: &PartialKMSVaultSecret,
) -> Verdict {
    validate_entries(
        gateway,
        "PartialKMSVaultSecret",
        &partial.name_any(),
        &partial.spec.secrets,
        &partial.spec.secret_context,
    )
    .await
}

/// Decide one admission request
pub async fn review(
    gateway: &DecryptionGateway,
    request: &AdmissionRequest<DynamicObject>,
) -> AdmissionResponse {
    let response = AdmissionResponse::from(request);

    if matches!(request.operation, Operation::Delete) {
        metrics::increment_admission_reviews("allowed");
        return response;
    }

    let Some(object) = request.object.clone() else {
        metrics::increment_admission_reviews("allowed");
        return response;
    };

    let verdict = match request.kind.kind.as_str() {
        "KMSVaultSecret" => match object.try_parse::<KMSVaultSecret>() {
            Ok(resource) => validate_secret(gateway, &resource).await,
            Err(e) => Verdict::Reject(format!("malformed KMSVaultSecret: {e}")),
        },
        "PartialKMSVaultSecret" => match object.try_parse::<PartialKMSVaultSecret>() {
            Ok(partial) => validate_partial(gateway, &partial).await,
            Err(e) => Verdict::Reject(format!("malformed PartialKMSVaultSecret: {e}")),
        },
        other => {
            debug!("Allowing admission of unrelated kind {}", other);
            Verdict::Accept
        }
    };

    match verdict {
        Verdict::Accept => {
            info!(
                "Admitted {} {}/{}",
                request.kind.kind,
                request.namespace.as_deref().unwrap_or_default(),
                request.name
            );
            metrics::increment_admission_reviews("allowed");
            response
        }
        Verdict::Reject(message) => {
            warn!("Rejected {}: {}", request.kind.kind, message);
            metrics::increment_admission_reviews("denied");
            response.deny(message)
        }
    }
}
