//! Simulation metrics.

use std::collections::VecDeque;

/// Per-run statistics over aggregation calls.
#[derive(Debug, Clone)]
pub struct SimulationMetrics {
    /// Total aggregation calls.
    pub total_calls: u64,
    /// Calls where every provider contributed.
    pub complete_calls: u64,
    /// Calls with some but not all providers.
    pub degraded_calls: u64,
    /// Calls with no quote at all.
    pub empty_calls: u64,
    /// Latency samples (ms).
    latency_samples: VecDeque<u64>,
    /// Maximum samples to keep.
    max_samples: usize,
}

impl SimulationMetrics {
    /// Create new metrics.
    pub fn new() -> Self {
        Self {
            total_calls: 0,
            complete_calls: 0,
            degraded_calls: 0,
            empty_calls: 0,
            latency_samples: VecDeque::with_capacity(10000),
            max_samples: 10000,
        }
    }

    /// Record one call returning `quotes` out of `providers`.
    pub fn record_call(&mut self, quotes: usize, providers: usize, latency_ms: u64) {
        self.total_calls += 1;

        if quotes == 0 {
            self.empty_calls += 1;
        } else if quotes < providers {
            self.degraded_calls += 1;
        } else {
            self.complete_calls += 1;
        }

        if self.latency_samples.len() >= self.max_samples {
            self.latency_samples.pop_front();
        }
        self.latency_samples.push_back(latency_ms);
    }

    /// Get average latency in ms.
    pub fn average_latency_ms(&self) -> u64 {
        if self.latency_samples.is_empty() {
            return 0;
        }

        let sum: u64 = self.latency_samples.iter().sum();
        sum / self.latency_samples.len() as u64
    }

    /// Get p50 latency.
    pub fn p50_latency_ms(&self) -> u64 {
        self.percentile_latency(50)
    }

    /// Get p99 latency.
    pub fn p99_latency_ms(&self) -> u64 {
        self.percentile_latency(99)
    }

    fn percentile_latency(&self, percentile: usize) -> u64 {
        if self.latency_samples.is_empty() {
            return 0;
        }

        let mut sorted: Vec<_> = self.latency_samples.iter().copied().collect();
        sorted.sort_unstable();

        let idx = (sorted.len() * percentile / 100).min(sorted.len() - 1);
        sorted[idx]
    }

    /// Share of calls where every provider contributed.
    pub fn completeness_rate(&self) -> f64 {
        if self.total_calls == 0 {
            return 0.0;
        }

        self.complete_calls as f64 / self.total_calls as f64
    }
}

impl Default for SimulationMetrics {
    fn default() -> Self {
        Self::new()
    }
}
