//! Fan-out/fan-in orchestration of one aggregation call.

use std::sync::Arc;

use rateagg_common::{AggregateResult, Currency, Quote};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, instrument, warn, Instrument};
use uuid::Uuid;

use crate::aggregator;
use crate::collector::Collector;
use crate::config::EngineConfig;
use crate::metrics::{EngineMetrics, SharedMetrics};
use crate::provider::ProviderRegistry;
use crate::worker::{Worker, WorkerOutcome};

/// Queries every registered provider in parallel under one deadline.
///
/// Each call to [`Dispatcher::aggregate`] owns its own token, queue and
/// worker set, so a dispatcher can serve concurrent calls.
pub struct Dispatcher {
    registry: ProviderRegistry,
    config: EngineConfig,
    metrics: SharedMetrics,
}

impl Dispatcher {
    /// Create a dispatcher over a fixed set of providers.
    pub fn new(registry: ProviderRegistry, config: EngineConfig) -> Self {
        Self {
            registry,
            config,
            metrics: Arc::new(EngineMetrics::new()),
        }
    }

    /// Report into a shared metrics instance.
    pub fn with_metrics(mut self, metrics: SharedMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Get the metrics.
    pub fn metrics(&self) -> &SharedMetrics {
        &self.metrics
    }

    /// Get the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get the registered providers.
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Query all providers for `currency` and average what arrives in time.
    ///
    /// Never fails. Providers that error or miss the deadline are left out;
    /// if none answer the result is empty with an average of zero.
    #[instrument(skip(self), fields(currency = %currency, call_id = %Uuid::now_v7()))]
    pub async fn aggregate(&self, currency: &Currency) -> AggregateResult {
        let started = Instant::now();
        let providers = self.registry.len();
        self.metrics.call_started();

        let cancel = CancellationToken::new();
        let _disarm = self.arm_deadline(&cancel);

        let (queue, results) = mpsc::channel(providers.max(1));
        let workers = self.spawn_workers(currency, &cancel, &queue);

        let (mut quotes, ()) = tokio::join!(
            Collector::drain(results),
            self.await_workers(workers, queue)
        );
        let average = aggregator::reduce(&mut quotes);

        self.metrics.call_finished(quotes.len(), providers);
        info!(
            quotes = quotes.len(),
            providers,
            average = %average,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Aggregation complete"
        );

        AggregateResult::new(currency.clone(), average, quotes)
    }

    /// Fire `cancel` once the deadline elapses.
    ///
    /// The returned guard cancels the token when dropped, which also stops
    /// the timer task.
    fn arm_deadline(&self, cancel: &CancellationToken) -> DropGuard {
        let deadline = self.config.deadline;
        let timer = cancel.clone();

        tokio::spawn(
            async move {
                tokio::select! {
                    _ = tokio::time::sleep(deadline) => {
                        debug!(?deadline, "Deadline elapsed, cancelling workers");
                        timer.cancel();
                    }
                    _ = timer.cancelled() => {}
                }
            }
            .in_current_span(),
        );

        cancel.clone().drop_guard()
    }

    fn spawn_workers(
        &self,
        currency: &Currency,
        cancel: &CancellationToken,
        queue: &mpsc::Sender<Quote>,
    ) -> JoinSet<WorkerOutcome> {
        let mut workers = JoinSet::new();

        for provider in self.registry.iter() {
            let worker = Worker::new(
                provider.clone(),
                currency.clone(),
                cancel.clone(),
                queue.clone(),
            );
            workers.spawn(worker.run().in_current_span());
        }

        workers
    }

    /// Completion barrier: wait for every worker, then close the queue.
    async fn await_workers(&self, mut workers: JoinSet<WorkerOutcome>, queue: mpsc::Sender<Quote>) {
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(outcome) => self.metrics.worker_finished(outcome),
                Err(e) => {
                    warn!(error = %e, "Worker task failed");
                    self.metrics.worker_panicked();
                }
            }
        }

        // Workers held the other senders; this one is the last.
        drop(queue);
    }
}
