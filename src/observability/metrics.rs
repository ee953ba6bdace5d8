//! # Metrics
//!
//! Prometheus metrics for the controller and the admission webhook.
//!
//! ## Metrics Exposed
//!
//! - `kms_vault_reconciliations_total` - Total number of reconciliations
//! - `kms_vault_reconciliation_errors_total` - Reconciliation errors by kind
//! - `kms_vault_reconciliation_duration_seconds` - Duration of reconciliation passes
//! - `kms_vault_kv_writes_total` - KV writes by engine and outcome
//! - `kms_vault_decryption_failures_total` - Failed decryptions by kind (decode, decrypt)
//! - `kms_vault_token_operations_total` - Token checks by method and outcome
//! - `kms_vault_vault_requests_total` - Vault KV requests by operation and result
//! - `kms_vault_vault_request_duration_seconds` - Duration of Vault KV requests
//! - `kms_vault_admission_reviews_total` - Admission decisions by result
//! - `kms_vault_certificate_reloads_total` - Certificate and CA reloads by outcome

use anyhow::Result;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};
use std::sync::LazyLock;
use std::time::Duration;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "kms_vault_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "kms_vault_reconciliation_errors_total",
            "Total number of reconciliation errors",
        ),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "kms_vault_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static KV_WRITES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("kms_vault_kv_writes_total", "Total number of KV writes"),
        &["engine", "outcome"],
    )
    .expect("Failed to create KV_WRITES_TOTAL metric - this should never happen")
});

static DECRYPTION_FAILURES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "kms_vault_decryption_failures_total",
            "Total number of failed secret decryptions",
        ),
        &["kind"],
    )
    .expect("Failed to create DECRYPTION_FAILURES_TOTAL metric - this should never happen")
});

static TOKEN_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "kms_vault_token_operations_total",
            "Total number of Vault token checks, renewals and logins",
        ),
        &["method", "outcome"],
    )
    .expect("Failed to create TOKEN_OPERATIONS_TOTAL metric - this should never happen")
});

static VAULT_REQUESTS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "kms_vault_vault_requests_total",
            "Total number of Vault KV requests",
        ),
        &["operation", "result"],
    )
    .expect("Failed to create VAULT_REQUESTS_TOTAL metric - this should never happen")
});

static VAULT_REQUEST_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "kms_vault_vault_request_duration_seconds",
            "Duration of Vault KV requests in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["operation"],
    )
    .expect("Failed to create VAULT_REQUEST_DURATION metric - this should never happen")
});

static ADMISSION_REVIEWS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "kms_vault_admission_reviews_total",
            "Total number of admission reviews",
        ),
        &["result"],
    )
    .expect("Failed to create ADMISSION_REVIEWS_TOTAL metric - this should never happen")
});

static CERTIFICATE_RELOADS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "kms_vault_certificate_reloads_total",
            "Total number of certificate and CA bundle reloads",
        ),
        &["target", "outcome"],
    )
    .expect("Failed to create CERTIFICATE_RELOADS_TOTAL metric - this should never happen")
});

/// Register all metrics with the process registry. Call once per process.
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(KV_WRITES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(DECRYPTION_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(TOKEN_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(VAULT_REQUESTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(VAULT_REQUEST_DURATION.clone()))?;
    REGISTRY.register(Box::new(ADMISSION_REVIEWS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(CERTIFICATE_RELOADS_TOTAL.clone()))?;

    Ok(())
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors(kind: &str) {
    RECONCILIATION_ERRORS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn record_kv_write(engine: &str, outcome: &str) {
    KV_WRITES_TOTAL.with_label_values(&[engine, outcome]).inc();
}

pub fn increment_decryption_failures(kind: &str) {
    DECRYPTION_FAILURES_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_token_operations(method: &str, outcome: &str) {
    TOKEN_OPERATIONS_TOTAL
        .with_label_values(&[method, outcome])
        .inc();
}

pub fn record_vault_operation(operation: &str, success: bool, elapsed: Duration) {
    let result = if success { "success" } else { "error" };
    VAULT_REQUESTS_TOTAL
        .with_label_values(&[operation, result])
        .inc();
    VAULT_REQUEST_DURATION
        .with_label_values(&[operation])
        .observe(elapsed.as_secs_f64());
}

pub fn increment_admission_reviews(result: &str) {
    ADMISSION_REVIEWS_TOTAL.with_label_values(&[result]).inc();
}

pub fn increment_certificate_reloads(target: &str, outcome: &str) {
    CERTIFICATE_RELOADS_TOTAL
        .with_label_values(&[target, outcome])
        .inc();
}

/// Text exposition of every registered metric
pub fn gather() -> Result<String> {
    let encoder = prometheus::TextEncoder::new();
    Ok(encoder.encode_to_string(&REGISTRY.gather())?)
}
