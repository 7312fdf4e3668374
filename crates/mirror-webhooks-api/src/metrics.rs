//! Prometheus metrics for the webhook endpoint.

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Service metrics for observability
///
/// Each instance owns its registry so several services (or tests) can live in
/// one process.
#[derive(Debug)]
pub struct ServiceMetrics {
    registry: Registry,

    /// Deliveries by final outcome (`not_implemented`, `ignored`, `unauthorized`, ...)
    pub webhook_requests_total: IntCounterVec,

    /// Deliveries rejected for a missing or wrong signature
    pub webhook_signature_failures_total: IntCounter,

    /// Failed audit writes, including those tolerated under fail-open
    pub webhook_audit_failures_total: IntCounter,

    pub webhook_duration_seconds: Histogram,
}

impl ServiceMetrics {
    pub fn new() -> Result<Arc<Self>, prometheus::Error> {
        let registry = Registry::new();

        let webhook_requests_total = IntCounterVec::new(
            Opts::new("webhook_requests_total", "Total webhook requests by outcome"),
            &["outcome"],
        )?;
        let webhook_signature_failures_total = IntCounter::new(
            "webhook_signature_failures_total",
            "Webhook requests rejected for a missing or invalid signature",
        )?;
        let webhook_audit_failures_total = IntCounter::new(
            "webhook_audit_failures_total",
            "Audit log writes that failed",
        )?;
        let webhook_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "webhook_duration_seconds",
                "Webhook processing time distribution",
            )
            .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0]),
        )?;

        registry.register(Box::new(webhook_requests_total.clone()))?;
        registry.register(Box::new(webhook_signature_failures_total.clone()))?;
        registry.register(Box::new(webhook_audit_failures_total.clone()))?;
        registry.register(Box::new(webhook_duration_seconds.clone()))?;

        Ok(Arc::new(Self {
            registry,
            webhook_requests_total,
            webhook_signature_failures_total,
            webhook_audit_failures_total,
            webhook_duration_seconds,
        }))
    }

    /// Count one delivery under `outcome`
    pub fn record_outcome(&self, outcome: &str) {
        self.webhook_requests_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Render all metrics in the Prometheus text format
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
