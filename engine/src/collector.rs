//! Fan-in side of an aggregation call.

use rateagg_common::Quote;
use tokio::sync::mpsc;

/// Drains the result queue of one call.
pub struct Collector;

impl Collector {
    /// Receive quotes until the queue is closed and empty.
    ///
    /// Closure is the only stop signal; the deadline is enforced by the
    /// workers, not here.
    pub async fn drain(mut queue: mpsc::Receiver<Quote>) -> Vec<Quote> {
        let mut quotes = Vec::new();

        while let Some(quote) = queue.recv().await {
            quotes.push(quote);
        }

        quotes
    }
}
