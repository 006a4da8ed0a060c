//! Simulated rate providers.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use rateagg_common::{Currency, Quote, RoundingRule};
use rateagg_engine::{ProviderError, ProviderResult, RateProvider};

/// Behaviour of one simulated provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderProfile {
    /// Provider name.
    pub name: String,
    /// Rate around which quotes are generated.
    pub base_rate: Decimal,
    /// Maximum deviation from the base rate, in basis points.
    #[serde(default)]
    pub jitter_bps: u32,
    /// Lower bound of the simulated response time.
    #[serde(default)]
    pub min_latency_ms: u64,
    /// Upper bound of the simulated response time.
    #[serde(default)]
    pub max_latency_ms: u64,
    /// Probability in [0, 1] that a call fails.
    #[serde(default)]
    pub failure_rate: f64,
    /// Probability in [0, 1] that a call returns an unreadable payload.
    #[serde(default)]
    pub malformed_rate: f64,
    /// Native precision of the source; `None` keeps rates exact.
    #[serde(default)]
    pub decimal_places: Option<u32>,
    /// Currencies quoted by the provider; empty means all.
    #[serde(default)]
    pub currencies: Vec<String>,
}

impl ProviderProfile {
    /// Profile that answers instantly and never fails.
    pub fn new(name: impl Into<String>, base_rate: Decimal) -> Self {
        Self {
            name: name.into(),
            base_rate,
            jitter_bps: 0,
            min_latency_ms: 0,
            max_latency_ms: 0,
            failure_rate: 0.0,
            malformed_rate: 0.0,
            decimal_places: None,
            currencies: Vec::new(),
        }
    }

    /// Set the response time range.
    pub fn with_latency(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.min_latency_ms = min_ms;
        self.max_latency_ms = max_ms.max(min_ms);
        self
    }

    /// Set the rate jitter.
    pub fn with_jitter(mut self, bps: u32) -> Self {
        self.jitter_bps = bps;
        self
    }

    /// Set the failure probability.
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Set the bad-payload probability.
    pub fn with_malformed_rate(mut self, rate: f64) -> Self {
        self.malformed_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Set the native precision.
    pub fn with_decimal_places(mut self, dp: u32) -> Self {
        self.decimal_places = Some(dp);
        self
    }

    /// Rounding rule stamped on the provider's quotes.
    pub fn rounding(&self) -> RoundingRule {
        match self.decimal_places {
            Some(dp) => RoundingRule::HalfAwayFromZero(dp),
            None => RoundingRule::Exact,
        }
    }

    fn supports(&self, currency: &Currency) -> bool {
        self.currencies.is_empty()
            || self
                .currencies
                .iter()
                .any(|c| c.eq_ignore_ascii_case(currency.code()))
    }
}

/// Draws for a single simulated call.
struct Draw {
    latency: Duration,
    fails: bool,
    malformed: bool,
    jitter: Decimal,
}

/// A provider that answers from a profile with random latency and failures.
pub struct SimulatedProvider {
    profile: ProviderProfile,
    rng: Mutex<StdRng>,
}

impl SimulatedProvider {
    /// Create a provider, seeded for reproducible runs when `seed` is set.
    pub fn new(profile: ProviderProfile, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        Self {
            profile,
            rng: Mutex::new(rng),
        }
    }

    fn draw(&self) -> Draw {
        let mut rng = self.rng.lock();
        let profile = &self.profile;

        let latency_ms = if profile.max_latency_ms > profile.min_latency_ms {
            rng.gen_range(profile.min_latency_ms..=profile.max_latency_ms)
        } else {
            profile.min_latency_ms
        };
        let fails = profile.failure_rate > 0.0 && rng.gen_bool(profile.failure_rate.min(1.0));
        let malformed =
            profile.malformed_rate > 0.0 && rng.gen_bool(profile.malformed_rate.min(1.0));
        let bps = i64::from(profile.jitter_bps);
        let jitter = if bps > 0 {
            Decimal::new(rng.gen_range(-bps..=bps), 4)
        } else {
            Decimal::ZERO
        };

        Draw {
            latency: Duration::from_millis(latency_ms),
            fails,
            malformed,
            jitter,
        }
    }
}

#[async_trait]
impl RateProvider for SimulatedProvider {
    fn name(&self) -> &str {
        &self.profile.name
    }

    async fn fetch(&self, currency: &Currency) -> ProviderResult<Quote> {
        if !self.profile.supports(currency) {
            return Err(ProviderError::UnsupportedCurrency {
                provider: self.profile.name.clone(),
                currency: currency.clone(),
            });
        }

        let draw = self.draw();
        tokio::time::sleep(draw.latency).await;

        if draw.fails {
            return Err(ProviderError::Unavailable(format!(
                "{} simulated outage",
                self.profile.name
            )));
        }

        if draw.malformed {
            return Err(ProviderError::Malformed(format!(
                "{} returned an unreadable payload",
                self.profile.name
            )));
        }

        let rate = self.profile.base_rate + self.profile.base_rate * draw.jitter;
        if rate <= Decimal::ZERO {
            return Err(ProviderError::Malformed(format!(
                "{} quoted non-positive rate {}",
                self.profile.name, rate
            )));
        }
        debug!(
            provider = %self.profile.name,
            currency = %currency,
            rate = %rate,
            latency_ms = draw.latency.as_millis() as u64,
            "Simulated quote"
        );

        Ok(Quote::new(&self.profile.name, currency.clone(), rate).with_rounding(self.profile.rounding()))
    }
}
