//! # Status
//!
//! Desired status after a pass, and whether it differs enough from the
//! stored one to be worth a patch. Skipping no-op patches keeps status
//! writes from feeding back into the watch.

use crate::crd::{Condition, KMSVaultSecretStatus};
use chrono::{DateTime, Utc};

pub const READY: &str = "Ready";

/// Result of the last pass as shown in the `Ready` condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Synced { path: String },
    CasConflict(String),
    AuthenticationFailed(String),
    /// Auth settings missing or invalid; waits for a spec or deployment change
    ConfigurationError(String),
    StoreError(String),
}

impl SyncOutcome {
    pub fn reason(&self) -> &'static str {
        match self {
            SyncOutcome::Synced { .. } => "Synced",
            SyncOutcome::CasConflict(_) => "CasConflict",
            SyncOutcome::AuthenticationFailed(_) => "AuthenticationFailed",
            SyncOutcome::ConfigurationError(_) => "ConfigurationError",
            SyncOutcome::StoreError(_) => "StoreError",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, SyncOutcome::Synced { .. })
    }

    pub fn message(&self) -> String {
        match self {
            SyncOutcome::Synced { path } => format!("Secret written to {path}"),
            SyncOutcome::CasConflict(message)
            | SyncOutcome::AuthenticationFailed(message)
            | SyncOutcome::ConfigurationError(message)
            | SyncOutcome::StoreError(message) => message.clone(),
        }
    }
}

/// Status to store after a pass ending in `outcome`.
///
/// `created` never goes back to false. The Ready condition keeps its
/// transition time while its status value is unchanged.
pub fn desired_status(
    current: Option<&KMSVaultSecretStatus>,
    generation: Option<i64>,
    outcome: &SyncOutcome,
    now: DateTime<Utc>,
) -> KMSVaultSecretStatus {
    let created = current.is_some_and(|s| s.created) || outcome.is_ready();
    let status_value = if outcome.is_ready() { "True" } else { "False" };

    let previous = current.and_then(|s| s.condition(READY));
    let last_transition_time = match previous {
        Some(previous) if previous.status == status_value => previous.last_transition_time.clone(),
        _ => Some(now.to_rfc3339()),
    };

    let mut conditions: Vec<Condition> = current
        .map(|s| {
            s.conditions
                .iter()
                .filter(|c| c.r#type != READY)
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    conditions.push(Condition {
        r#type: READY.to_string(),
        status: status_value.to_string(),
        last_transition_time,
        reason: Some(outcome.reason().to_string()),
        message: Some(outcome.message()),
    });

    KMSVaultSecretStatus {
        created,
        observed_generation: generation,
        conditions,
    }
}

/// True when `desired` carries information `current` does not
pub fn needs_patch(current: Option<&KMSVaultSecretStatus>, desired: &KMSVaultSecretStatus) -> bool {
    current != Some(desired)
}
