// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the Route53 sync controller.
//!
//! All metrics use the namespace prefix `kube_route53_dns_`.
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - Per-domain outcomes and cycle duration
//! - **Collection Metrics** - Desired domains and skipped resources
//! - **Error Metrics** - Per-domain failures by pipeline stage
//! - **Credential Metrics** - Credential refreshes
//!
//! # Example
//!
//! ```rust,no_run
//! use kube_route53_dns::metrics::record_domain_outcome;
//!
//! record_domain_outcome("A", "upserted");
//! ```

use prometheus::{
    Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "kube_route53_dns";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of domain reconciliations by record type and outcome
///
/// Labels:
/// - `record_type`: `A` or `CNAME`
/// - `outcome`: `upserted`, `unchanged`, `dry_run`, or `error`
pub static DOMAIN_RECONCILIATIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_domain_reconciliations_total"),
        "Total number of domain reconciliations by record type and outcome",
    );
    let counter = CounterVec::new(opts, &["record_type", "outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of full reconciliation cycles in seconds
pub static CYCLE_DURATION_SECONDS: LazyLock<Histogram> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_cycle_duration_seconds"),
        "Duration of reconciliation cycles in seconds",
    )
    .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]);
    let histogram = Histogram::with_opts(opts).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

/// Total number of cycles aborted before reconciling any domain
pub static CYCLES_ABORTED_TOTAL: LazyLock<Counter> = LazyLock::new(|| {
    let counter = Counter::new(
        format!("{METRICS_NAMESPACE}_cycles_aborted_total"),
        "Total number of cycles aborted because desired state could not be collected",
    )
    .unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Collection Metrics
// ============================================================================

/// Number of domains in the most recently collected desired state
pub static DESIRED_DOMAINS: LazyLock<Gauge> = LazyLock::new(|| {
    let gauge = Gauge::new(
        format!("{METRICS_NAMESPACE}_desired_domains"),
        "Number of domains declared in the last collected desired state",
    )
    .unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Total number of skipped resources by kind and reason
///
/// Labels:
/// - `kind`: `Service` or `Ingress`
/// - `reason`: Skip reason label (e.g., `missing_domain_name`)
pub static SKIPPED_RESOURCES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_skipped_resources_total"),
        "Total number of skipped resources by kind and reason",
    );
    let counter = CounterVec::new(opts, &["kind", "reason"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Error Metrics
// ============================================================================

/// Total number of per-domain errors by stage
///
/// Labels:
/// - `stage`: `validate`, `resolve_zone`, `resolve_endpoint`, `build`, `upsert`
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_errors_total"),
        "Total number of per-domain errors by pipeline stage",
    );
    let counter = CounterVec::new(opts, &["stage"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Credential Metrics
// ============================================================================

/// Total number of credential refreshes by result
///
/// Labels:
/// - `status`: `success` or `error`
pub static CREDENTIAL_REFRESHES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_credential_refreshes_total"),
        "Total number of credential refreshes by result",
    );
    let counter = CounterVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record the outcome of one domain reconciliation
///
/// # Arguments
/// * `record_type` - Record type token (`A` or `CNAME`)
/// * `outcome` - `upserted`, `unchanged`, `dry_run`, or `error`
pub fn record_domain_outcome(record_type: &str, outcome: &str) {
    DOMAIN_RECONCILIATIONS_TOTAL
        .with_label_values(&[record_type, outcome])
        .inc();
}

/// Record a per-domain failure
pub fn record_error(stage: &str) {
    ERRORS_TOTAL.with_label_values(&[stage]).inc();
}

/// Record a skipped resource
pub fn record_skipped_resource(kind: &str, reason: &str) {
    SKIPPED_RESOURCES_TOTAL
        .with_label_values(&[kind, reason])
        .inc();
}

/// Record a completed cycle
///
/// # Arguments
/// * `desired_domains` - Number of domains collected this cycle
/// * `duration` - Wall-clock duration of the cycle
#[allow(clippy::cast_precision_loss)]
pub fn record_cycle(desired_domains: usize, duration: Duration) {
    DESIRED_DOMAINS.set(desired_domains as f64);
    CYCLE_DURATION_SECONDS.observe(duration.as_secs_f64());
}

/// Record a cycle that could not collect desired state
pub fn record_cycle_aborted() {
    CYCLES_ABORTED_TOTAL.inc();
}

/// Record a credential refresh attempt
pub fn record_credential_refresh(success: bool) {
    let status = if success { "success" } else { "error" };
    CREDENTIAL_REFRESHES_TOTAL.with_label_values(&[status]).inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
