//! Translation metrics and observability module.
//!
//! Process-wide counters for provider calls and persistence outcomes.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

/// Global translation metrics singleton.
pub struct TranslationMetrics {
    /// Number of batches that passed pre-flight and fanned out
    batches: AtomicUsize,

    /// Number of calls made to the translation provider
    api_calls: AtomicUsize,

    /// Number of provider calls that failed (including shape rejections and timeouts)
    api_failures: AtomicUsize,

    /// Number of translation rows written
    persisted: AtomicUsize,

    /// Number of translation rows that failed to write
    persist_failures: AtomicUsize,
}

/// Global metrics instance (initialized lazily)
static METRICS: OnceLock<TranslationMetrics> = OnceLock::new();

impl TranslationMetrics {
    /// Get the global translation metrics instance.
    pub fn global() -> &'static TranslationMetrics {
        METRICS.get_or_init(|| TranslationMetrics {
            batches: AtomicUsize::new(0),
            api_calls: AtomicUsize::new(0),
            api_failures: AtomicUsize::new(0),
            persisted: AtomicUsize::new(0),
            persist_failures: AtomicUsize::new(0),
        })
    }

    pub fn record_batch(&self) {
        self.batches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_api_call(&self) {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_api_failure(&self) {
        self.api_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persisted(&self) {
        self.persisted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persist_failure(&self) {
        self.persist_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::Relaxed)
    }

    pub fn api_calls(&self) -> usize {
        self.api_calls.load(Ordering::Relaxed)
    }

    pub fn api_failures(&self) -> usize {
        self.api_failures.load(Ordering::Relaxed)
    }

    pub fn persisted(&self) -> usize {
        self.persisted.load(Ordering::Relaxed)
    }

    pub fn persist_failures(&self) -> usize {
        self.persist_failures.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let calls = self.api_calls();
        let failures = self.api_failures();
        let api_success_rate = if calls > 0 {
            (calls.saturating_sub(failures) as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        let persisted = self.persisted();
        let persist_failures = self.persist_failures();
        let writes = persisted + persist_failures;
        let persist_success_rate = if writes > 0 {
            (persisted as f64 / writes as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            batches: self.batches(),
            api_calls: calls,
            api_failures: failures,
            api_success_rate,
            persisted,
            persist_failures,
            persist_success_rate,
        }
    }

    /// Reset all metrics to zero (useful for testing).
    #[cfg(test)]
    pub fn reset(&self) {
        self.batches.store(0, Ordering::Relaxed);
        self.api_calls.store(0, Ordering::Relaxed);
        self.api_failures.store(0, Ordering::Relaxed);
        self.persisted.store(0, Ordering::Relaxed);
        self.persist_failures.store(0, Ordering::Relaxed);
    }
}

/// Metrics report containing current translation statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub batches: usize,

    /// Number of provider calls made
    pub api_calls: usize,

    /// Number of provider failures
    pub api_failures: usize,

    /// Provider success rate as a percentage (0-100)
    pub api_success_rate: f64,

    pub persisted: usize,

    pub persist_failures: usize,

    /// Persistence success rate as a percentage (0-100)
    pub persist_success_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    // Helper to reset metrics before each test
    fn reset_metrics() {
        TranslationMetrics::global().reset();
    }

    // ==================== Counter Tests ====================

    #[test]
    #[serial]
    fn test_record_api_call_and_failure() {
        reset_metrics();
        let metrics = TranslationMetrics::global();

        metrics.record_api_call();
        metrics.record_api_call();
        metrics.record_api_failure();
        assert_eq!(metrics.api_calls(), 2);
        assert_eq!(metrics.api_failures(), 1);
    }

    #[test]
    #[serial]
    fn test_record_persistence_outcomes() {
        reset_metrics();
        let metrics = TranslationMetrics::global();

        metrics.record_persisted();
        metrics.record_persist_failure();
        metrics.record_batch();
        assert_eq!(metrics.persisted(), 1);
        assert_eq!(metrics.persist_failures(), 1);
        assert_eq!(metrics.batches(), 1);
    }

    // ==================== Report Tests ====================

    #[test]
    #[serial]
    fn test_report_empty() {
        reset_metrics();
        let report = TranslationMetrics::global().report();

        assert_eq!(report.api_calls, 0);
        assert_eq!(report.api_success_rate, 0.0);
        assert_eq!(report.persist_success_rate, 0.0);
    }

    #[test]
    #[serial]
    fn test_report_rates() {
        reset_metrics();
        let metrics = TranslationMetrics::global();

        // 4 calls, 1 failure = 75% success rate
        for _ in 0..4 {
            metrics.record_api_call();
        }
        metrics.record_api_failure();

        // 1 of 2 writes = 50%
        metrics.record_persisted();
        metrics.record_persist_failure();

        let report = metrics.report();
        assert_eq!(report.api_success_rate, 75.0);
        assert_eq!(report.persist_success_rate, 50.0);
    }

    #[test]
    fn test_global_returns_same_instance() {
        let metrics1 = TranslationMetrics::global();
        let metrics2 = TranslationMetrics::global();

        assert!(std::ptr::eq(metrics1, metrics2));
    }
}
