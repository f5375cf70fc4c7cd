//! Observability for diagnostic passes
//!
//! Provides:
//! - Prometheus metrics (pass latency, issues by kind, collection/enrichment/explanation failures)
//! - Structured lifecycle logging with tracing

use crate::issue::Issue;
use crate::report::{CollectionError, ReportStats};
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for pass latency (in seconds)
const PASS_LATENCY_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<TriageMetricsInner> = OnceLock::new();

struct TriageMetricsInner {
    pass_latency_seconds: Histogram,
    issues_detected: IntCounterVec,
    collection_failures: IntCounterVec,
    enrichment_failures: IntCounter,
    explanation_failures: IntCounter,
}

impl TriageMetricsInner {
    fn new() -> Self {
        Self {
            pass_latency_seconds: register_histogram!(
                "triage_pass_latency_seconds",
                "Wall-clock duration of a diagnostic pass",
                PASS_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register pass_latency_seconds"),

            issues_detected: register_int_counter_vec!(
                "triage_issues_detected_total",
                "Unhealthy resources found, by kind",
                &["kind"]
            )
            .expect("Failed to register issues_detected"),

            collection_failures: register_int_counter_vec!(
                "triage_collection_failures_total",
                "Sections that could not be collected, by section",
                &["section"]
            )
            .expect("Failed to register collection_failures"),

            enrichment_failures: register_int_counter!(
                "triage_enrichment_failures_total",
                "Event or log lookups that degraded to an empty value"
            )
            .expect("Failed to register enrichment_failures"),

            explanation_failures: register_int_counter!(
                "triage_explanation_failures_total",
                "Explanation requests that failed"
            )
            .expect("Failed to register explanation_failures"),
        }
    }
}

/// Handle to the process-wide triage metrics.
///
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct TriageMetrics {
    inner: &'static TriageMetricsInner,
}

impl Default for TriageMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl TriageMetrics {
    pub fn new() -> Self {
        Self {
            inner: GLOBAL_METRICS.get_or_init(TriageMetricsInner::new),
        }
    }

    pub fn observe_pass_latency(&self, duration_secs: f64) {
        self.inner.pass_latency_seconds.observe(duration_secs);
    }

    pub fn inc_issues(&self, kind: &str) {
        self.inner.issues_detected.with_label_values(&[kind]).inc();
    }

    pub fn inc_collection_failures(&self, section: &str) {
        self.inner.collection_failures.with_label_values(&[section]).inc();
    }

    pub fn inc_enrichment_failures(&self, count: u64) {
        self.inner.enrichment_failures.inc_by(count);
    }

    pub fn inc_explanation_failures(&self) {
        self.inner.explanation_failures.inc();
    }

    pub fn issues_detected(&self, kind: &str) -> u64 {
        self.inner.issues_detected.with_label_values(&[kind]).get()
    }

    pub fn enrichment_failures(&self) -> u64 {
        self.inner.enrichment_failures.get()
    }
}

/// Structured logger for diagnostic pass lifecycle events
#[derive(Clone)]
pub struct StructuredLogger {
    scope: String,
}

impl StructuredLogger {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
        }
    }

    pub fn log_started(&self, namespaces: usize, timeout_secs: u64) {
        info!(
            event = "diagnosis_started",
            scope = %self.scope,
            namespaces = namespaces,
            timeout_secs = timeout_secs,
            "Diagnostic pass started"
        );
    }

    pub fn log_issue(&self, issue: &Issue) {
        info!(
            event = "issue_detected",
            scope = %self.scope,
            kind = %issue.kind,
            namespace = %issue.namespace,
            name = %issue.name,
            status = %issue.status,
            reason = %issue.reason,
            "Unhealthy resource detected"
        );
    }

    pub fn log_collection_failed(&self, error: &CollectionError) {
        warn!(
            event = "collection_failed",
            scope = %self.scope,
            namespace = %error.namespace,
            section = %error.section,
            error = %error.message,
            "Section could not be collected"
        );
    }

    pub fn log_completed(&self, stats: &ReportStats, partial: bool, elapsed_secs: f64) {
        if partial {
            warn!(
                event = "diagnosis_completed",
                scope = %self.scope,
                partial = true,
                namespaces = stats.namespaces,
                issues = stats.total_issues(),
                elapsed_secs = elapsed_secs,
                "Diagnostic pass hit its deadline, returning partial report"
            );
        } else {
            info!(
                event = "diagnosis_completed",
                scope = %self.scope,
                partial = false,
                namespaces = stats.namespaces,
                issues = stats.total_issues(),
                elapsed_secs = elapsed_secs,
                "Diagnostic pass completed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_handles_share_registry() {
        let a = TriageMetrics::new();
        let b = TriageMetrics::default();

        let before = b.issues_detected("ObservabilityTest");
        a.inc_issues("ObservabilityTest");
        a.observe_pass_latency(0.2);
        a.inc_collection_failures("pods");
        a.inc_enrichment_failures(2);
        a.inc_explanation_failures();
        assert_eq!(b.issues_detected("ObservabilityTest"), before + 1);
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("default");
        assert_eq!(logger.scope, "default");
    }
}
