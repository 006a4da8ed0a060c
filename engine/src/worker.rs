//! Per-provider worker.

use std::sync::Arc;

use rateagg_common::{Currency, Quote};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::provider::RateProvider;

/// How a worker finished. Used for logging and metrics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// Quote handed to the collector.
    Published,
    /// Deadline had already passed; the provider was not called.
    Skipped,
    /// Provider returned an error.
    Failed,
    /// Deadline passed while the provider call was in flight.
    TimedOut,
    /// Quote arrived but the deadline won the race to publish it.
    Abandoned,
}

/// Runs a single provider call for one aggregation.
pub struct Worker {
    provider: Arc<dyn RateProvider>,
    currency: Currency,
    cancel: CancellationToken,
    queue: mpsc::Sender<Quote>,
}

impl Worker {
    /// Create a worker bound to one provider.
    pub fn new(
        provider: Arc<dyn RateProvider>,
        currency: Currency,
        cancel: CancellationToken,
        queue: mpsc::Sender<Quote>,
    ) -> Self {
        Self {
            provider,
            currency,
            cancel,
            queue,
        }
    }

    /// Fetch from the provider and publish at most one quote.
    ///
    /// Every failure is absorbed here. The sender is dropped when this
    /// returns, which is what lets the result queue close.
    pub async fn run(self) -> WorkerOutcome {
        let provider = self.provider.name();

        if self.cancel.is_cancelled() {
            debug!(provider, "Deadline passed before start, skipping provider");
            return WorkerOutcome::Skipped;
        }

        let fetched = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!(provider, "Deadline passed during provider call");
                return WorkerOutcome::TimedOut;
            }
            fetched = self.provider.fetch(&self.currency) => fetched,
        };

        let quote = match fetched {
            Ok(quote) => quote,
            Err(e) => {
                // Dropped on purpose: a failed provider only shrinks the result.
                debug!(provider, error = %e, "Provider failed, dropping");
                return WorkerOutcome::Failed;
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!(provider, "Deadline passed before publish, abandoning quote");
                WorkerOutcome::Abandoned
            }
            sent = self.queue.send(quote) => match sent {
                Ok(()) => {
                    debug!(provider, "Quote published");
                    WorkerOutcome::Published
                }
                Err(_) => {
                    debug!(provider, "Result queue closed, abandoning quote");
                    WorkerOutcome::Abandoned
                }
            },
        }
    }
}
