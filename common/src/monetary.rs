//! Currency codes and rate rounding rules.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// ISO 4217 style currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency(String);

impl Currency {
    /// Create a new currency from code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Check if the code is blank.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Common currencies
    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    pub fn btc() -> Self {
        Self::new("BTC")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Currency {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Currency {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// How a source normalizes its rates to its native precision.
///
/// Each provider picks the rule for the quotes it produces; the aggregator
/// only invokes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundingRule {
    /// Keep the rate as reported.
    #[default]
    Exact,
    /// Round to the given decimal places, ties away from zero.
    HalfAwayFromZero(u32),
    /// Round to the given decimal places, ties to even.
    HalfEven(u32),
    /// Drop digits beyond the given decimal places.
    Truncate(u32),
}

impl RoundingRule {
    /// Apply the rule to a rate.
    pub fn apply(&self, rate: Decimal) -> Decimal {
        match *self {
            RoundingRule::Exact => rate,
            RoundingRule::HalfAwayFromZero(dp) => {
                rate.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
            }
            RoundingRule::HalfEven(dp) => {
                rate.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven)
            }
            RoundingRule::Truncate(dp) => rate.round_dp_with_strategy(dp, RoundingStrategy::ToZero),
        }
    }

    /// Decimal places kept by this rule, if bounded.
    pub fn decimal_places(&self) -> Option<u32> {
        match *self {
            RoundingRule::Exact => None,
            RoundingRule::HalfAwayFromZero(dp)
            | RoundingRule::HalfEven(dp)
            | RoundingRule::Truncate(dp) => Some(dp),
        }
    }
}
