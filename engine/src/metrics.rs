//! Metrics collection for aggregation monitoring.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::worker::WorkerOutcome;

/// Engine metrics.
pub struct EngineMetrics {
    /// Total aggregation calls started.
    pub calls_total: AtomicU64,
    /// Calls in progress.
    pub calls_active: AtomicU64,
    /// Calls that returned fewer quotes than registered providers.
    pub calls_degraded: AtomicU64,
    /// Calls that returned no quote at all.
    pub calls_empty: AtomicU64,
    /// Quotes accepted into a result.
    pub quotes_published: AtomicU64,
    /// Provider calls not started because the deadline had passed.
    pub providers_skipped: AtomicU64,
    /// Provider calls that returned an error.
    pub providers_failed: AtomicU64,
    /// Provider calls cut off by the deadline.
    pub providers_timed_out: AtomicU64,
    /// Successful quotes lost to the deadline at publish time.
    pub quotes_abandoned: AtomicU64,
    /// Worker tasks that panicked.
    pub worker_panics: AtomicU64,
}

impl EngineMetrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self {
            calls_total: AtomicU64::new(0),
            calls_active: AtomicU64::new(0),
            calls_degraded: AtomicU64::new(0),
            calls_empty: AtomicU64::new(0),
            quotes_published: AtomicU64::new(0),
            providers_skipped: AtomicU64::new(0),
            providers_failed: AtomicU64::new(0),
            providers_timed_out: AtomicU64::new(0),
            quotes_abandoned: AtomicU64::new(0),
            worker_panics: AtomicU64::new(0),
        }
    }

    /// Record an aggregation call starting.
    pub fn call_started(&self) {
        self.calls_total.fetch_add(1, Ordering::Relaxed);
        self.calls_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an aggregation call returning `quotes` out of `providers`.
    pub fn call_finished(&self, quotes: usize, providers: usize) {
        self.calls_active.fetch_sub(1, Ordering::Relaxed);
        if quotes < providers {
            self.calls_degraded.fetch_add(1, Ordering::Relaxed);
        }
        if quotes == 0 {
            self.calls_empty.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record how a worker finished.
    pub fn worker_finished(&self, outcome: WorkerOutcome) {
        let counter = match outcome {
            WorkerOutcome::Published => &self.quotes_published,
            WorkerOutcome::Skipped => &self.providers_skipped,
            WorkerOutcome::Failed => &self.providers_failed,
            WorkerOutcome::TimedOut => &self.providers_timed_out,
            WorkerOutcome::Abandoned => &self.quotes_abandoned,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a worker panic.
    pub fn worker_panicked(&self) {
        self.worker_panics.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> EngineMetricsSnapshot {
        EngineMetricsSnapshot {
            calls_total: self.calls_total.load(Ordering::Relaxed),
            calls_active: self.calls_active.load(Ordering::Relaxed),
            calls_degraded: self.calls_degraded.load(Ordering::Relaxed),
            calls_empty: self.calls_empty.load(Ordering::Relaxed),
            quotes_published: self.quotes_published.load(Ordering::Relaxed),
            providers_skipped: self.providers_skipped.load(Ordering::Relaxed),
            providers_failed: self.providers_failed.load(Ordering::Relaxed),
            providers_timed_out: self.providers_timed_out.load(Ordering::Relaxed),
            quotes_abandoned: self.quotes_abandoned.load(Ordering::Relaxed),
            worker_panics: self.worker_panics.load(Ordering::Relaxed),
        }
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        format!(
            r#"# HELP rateagg_calls_total Total aggregation calls
# TYPE rateagg_calls_total counter
rateagg_calls_total {}

# HELP rateagg_calls_active Current aggregation calls in progress
# TYPE rateagg_calls_active gauge
rateagg_calls_active {}

# HELP rateagg_calls_degraded Calls answered by fewer than all providers
# TYPE rateagg_calls_degraded counter
rateagg_calls_degraded {}

# HELP rateagg_calls_empty Calls answered by no provider
# TYPE rateagg_calls_empty counter
rateagg_calls_empty {}

# HELP rateagg_quotes_published Total quotes accepted
# TYPE rateagg_quotes_published counter
rateagg_quotes_published {}

# HELP rateagg_providers_skipped Provider calls skipped after the deadline
# TYPE rateagg_providers_skipped counter
rateagg_providers_skipped {}

# HELP rateagg_providers_failed Provider calls that returned an error
# TYPE rateagg_providers_failed counter
rateagg_providers_failed {}

# HELP rateagg_providers_timed_out Provider calls cut off by the deadline
# TYPE rateagg_providers_timed_out counter
rateagg_providers_timed_out {}

# HELP rateagg_quotes_abandoned Quotes lost to the deadline at publish
# TYPE rateagg_quotes_abandoned counter
rateagg_quotes_abandoned {}

# HELP rateagg_worker_panics Worker tasks that panicked
# TYPE rateagg_worker_panics counter
rateagg_worker_panics {}
"#,
            snapshot.calls_total,
            snapshot.calls_active,
            snapshot.calls_degraded,
            snapshot.calls_empty,
            snapshot.quotes_published,
            snapshot.providers_skipped,
            snapshot.providers_failed,
            snapshot.providers_timed_out,
            snapshot.quotes_abandoned,
            snapshot.worker_panics,
        )
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineMetricsSnapshot {
    pub calls_total: u64,
    pub calls_active: u64,
    pub calls_degraded: u64,
    pub calls_empty: u64,
    pub quotes_published: u64,
    pub providers_skipped: u64,
    pub providers_failed: u64,
    pub providers_timed_out: u64,
    pub quotes_abandoned: u64,
    pub worker_panics: u64,
}

/// Shared metrics instance.
pub type SharedMetrics = Arc<EngineMetrics>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_increment() {
        let metrics = EngineMetrics::new();

        metrics.call_started();
        metrics.worker_finished(WorkerOutcome::Published);
        metrics.worker_finished(WorkerOutcome::Failed);
        metrics.call_finished(1, 2);
        metrics.call_started();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.calls_total, 2);
        assert_eq!(snapshot.calls_active, 1);
        assert_eq!(snapshot.calls_degraded, 1);
        assert_eq!(snapshot.calls_empty, 0);
        assert_eq!(snapshot.quotes_published, 1);
        assert_eq!(snapshot.providers_failed, 1);
    }

    #[test]
    fn test_prometheus_export() {
        let metrics = EngineMetrics::new();
        metrics.call_started();
        metrics.call_finished(0, 3);

        let output = metrics.to_prometheus();
        assert!(output.contains("rateagg_calls_total 1"));
        assert!(output.contains("rateagg_calls_empty 1"));
    }
}
