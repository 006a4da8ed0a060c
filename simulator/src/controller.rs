//! Simulation controller.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::info;

use rateagg_common::{AggregateResult, Currency};
use rateagg_engine::{Dispatcher, EngineConfig, ProviderRegistry};

use crate::metrics::SimulationMetrics;
use crate::provider::SimulatedProvider;
use crate::scenario::Scenario;

/// Drives repeated aggregation calls against a scenario's providers.
pub struct SimulationController {
    /// Engine under test.
    dispatcher: Arc<Dispatcher>,
    /// Currency requested on every call.
    currency: Currency,
    /// Simulation metrics.
    metrics: Arc<Mutex<SimulationMetrics>>,
}

impl SimulationController {
    /// Create a controller for a scenario.
    ///
    /// A scenario deadline overrides the one in `config`.
    pub fn new(scenario: &Scenario, mut config: EngineConfig, currency: Currency, seed: Option<u64>) -> Self {
        if let Some(ms) = scenario.deadline_ms {
            config.deadline = Duration::from_millis(ms);
        }

        let registry = Self::build_registry(scenario, seed);
        info!(
            scenario = %scenario.name,
            providers = ?registry.names(),
            deadline_ms = config.deadline.as_millis() as u64,
            "Registered simulated providers"
        );

        Self {
            dispatcher: Arc::new(Dispatcher::new(registry, config)),
            currency,
            metrics: Arc::new(Mutex::new(SimulationMetrics::new())),
        }
    }

    fn build_registry(scenario: &Scenario, seed: Option<u64>) -> ProviderRegistry {
        scenario
            .providers
            .iter()
            .enumerate()
            .fold(ProviderRegistry::new(), |registry, (i, profile)| {
                let seed = seed.map(|s| s.wrapping_add(i as u64));
                registry.register(Arc::new(SimulatedProvider::new(profile.clone(), seed)))
            })
    }

    /// Get the engine.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Run `calls` aggregations, at most `parallel` at a time.
    pub async fn run(&self, calls: usize, parallel: usize) -> Vec<AggregateResult> {
        let parallel = parallel.max(1);
        let mut results = Vec::with_capacity(calls);

        let mut started = 0;
        while started < calls {
            let batch = parallel.min(calls - started);
            results.extend(join_all((0..batch).map(|_| self.timed_call())).await);
            started += batch;
        }

        results
    }

    async fn timed_call(&self) -> AggregateResult {
        let started = Instant::now();
        let result = self.dispatcher.aggregate(&self.currency).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        self.metrics.lock().record_call(
            result.quotes.len(),
            self.dispatcher.registry().len(),
            latency_ms,
        );

        result
    }

    /// Get simulation metrics.
    pub fn get_metrics(&self) -> SimulationMetrics {
        self.metrics.lock().clone()
    }
}
