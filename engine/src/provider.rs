//! Rate provider capability and the provider registry.

use async_trait::async_trait;
use rateagg_common::{Currency, Quote};
use std::sync::Arc;

use crate::error::ProviderResult;

/// Trait for currency rate providers.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Fetch the current rate for a currency.
    ///
    /// The returned quote carries the provider's own rounding rule.
    async fn fetch(&self, currency: &Currency) -> ProviderResult<Quote>;
}

/// The fixed set of providers queried by a dispatcher.
///
/// Built once at startup and moved into the dispatcher, after which it is
/// only read.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn RateProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider.
    pub fn register(mut self, provider: Arc<dyn RateProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Check if no provider is registered.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Provider names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Iterate over the providers.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn RateProvider>> {
        self.providers.iter()
    }
}

impl From<Vec<Arc<dyn RateProvider>>> for ProviderRegistry {
    fn from(providers: Vec<Arc<dyn RateProvider>>) -> Self {
        Self { providers }
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockRateProvider;

#[cfg(any(test, feature = "test-utils"))]
mod mock {
    use super::*;
    use crate::error::ProviderError;
    use rateagg_common::RoundingRule;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Clone, Copy)]
    enum Behavior {
        Respond(Decimal),
        Fail,
        Hang,
    }

    /// Scripted rate provider for testing.
    #[derive(Debug)]
    pub struct MockRateProvider {
        name: String,
        behavior: Behavior,
        delay: Duration,
        rounding: RoundingRule,
        calls: AtomicUsize,
        in_flight: Arc<AtomicUsize>,
    }

    struct InFlight(Arc<AtomicUsize>);

    impl InFlight {
        fn enter(counter: &Arc<AtomicUsize>) -> Self {
            counter.fetch_add(1, Ordering::SeqCst);
            Self(counter.clone())
        }
    }

    impl Drop for InFlight {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl MockRateProvider {
        fn with_behavior(name: impl Into<String>, behavior: Behavior) -> Self {
            Self {
                name: name.into(),
                behavior,
                delay: Duration::ZERO,
                rounding: RoundingRule::Exact,
                calls: AtomicUsize::new(0),
                in_flight: Arc::new(AtomicUsize::new(0)),
            }
        }

        /// Provider that answers with a fixed rate.
        pub fn new(name: impl Into<String>, rate: Decimal) -> Self {
            Self::with_behavior(name, Behavior::Respond(rate))
        }

        /// Provider whose every call fails.
        pub fn failing(name: impl Into<String>) -> Self {
            Self::with_behavior(name, Behavior::Fail)
        }

        /// Provider that never returns.
        pub fn hanging(name: impl Into<String>) -> Self {
            Self::with_behavior(name, Behavior::Hang)
        }

        /// Wait this long before answering.
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        /// Rounding rule stamped on produced quotes.
        pub fn with_rounding(mut self, rounding: RoundingRule) -> Self {
            self.rounding = rounding;
            self
        }

        /// Number of times `fetch` was invoked.
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// Number of `fetch` futures currently alive.
        pub fn in_flight(&self) -> usize {
            self.in_flight.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateProvider for MockRateProvider {
        fn name(&self) -> &str {
            &self.name
        }

        async fn fetch(&self, currency: &Currency) -> ProviderResult<Quote> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let _guard = InFlight::enter(&self.in_flight);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            match self.behavior {
                Behavior::Respond(rate) => {
                    Ok(Quote::new(&self.name, currency.clone(), rate).with_rounding(self.rounding))
                }
                Behavior::Fail => Err(ProviderError::Unavailable(self.name.clone())),
                Behavior::Hang => std::future::pending().await,
            }
        }
    }
}
