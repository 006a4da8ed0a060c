//! Provider quotes and the aggregated result.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::monetary::{Currency, RoundingRule};

/// One provider's rate observation for a currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Name of the provider that produced the quote.
    pub source: String,
    /// Currency the rate was requested for.
    pub currency: Currency,
    /// Reported rate. Serialized as a JSON number.
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
    /// When the provider returned the quote.
    pub quoted_at: DateTime<Utc>,
    /// The source's native rounding rule.
    #[serde(skip)]
    pub rounding: RoundingRule,
    #[serde(skip)]
    normalized: bool,
}

impl Quote {
    /// Create a new quote stamped with the current time.
    pub fn new(source: impl Into<String>, currency: Currency, rate: Decimal) -> Self {
        Self {
            source: source.into(),
            currency,
            rate,
            quoted_at: Utc::now(),
            rounding: RoundingRule::Exact,
            normalized: false,
        }
    }

    /// Set the rounding rule of the source.
    pub fn with_rounding(mut self, rounding: RoundingRule) -> Self {
        self.rounding = rounding;
        self
    }

    /// Normalize the rate in place to the source's native precision.
    ///
    /// Only the first call changes the rate.
    pub fn round(&mut self) {
        if self.normalized {
            return;
        }
        self.rate = self.rounding.apply(self.rate);
        self.normalized = true;
    }

    /// Whether `round` has already been applied.
    pub fn is_normalized(&self) -> bool {
        self.normalized
    }
}

/// Output of one aggregation call.
///
/// A degraded response has the same shape as a complete one; callers compare
/// `quotes.len()` against the number of providers to detect it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    /// Echo of the requested currency.
    pub currency_code: Currency,
    /// Rounded mean of the accepted quotes, zero when there are none.
    /// Serialized as a JSON number.
    #[serde(with = "rust_decimal::serde::float")]
    pub average: Decimal,
    /// Accepted quotes in arrival order.
    pub quotes: Vec<Quote>,
}

impl AggregateResult {
    /// Create a result.
    pub fn new(currency_code: Currency, average: Decimal, quotes: Vec<Quote>) -> Self {
        Self {
            currency_code,
            average,
            quotes,
        }
    }

    /// Result of a call where no provider answered in time.
    pub fn empty(currency_code: Currency) -> Self {
        Self::new(currency_code, Decimal::ZERO, Vec::new())
    }

    /// Check if no quote was accepted.
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Number of accepted quotes.
    pub fn quote_count(&self) -> usize {
        self.quotes.len()
    }

    /// Whether fewer than `expected` providers contributed.
    pub fn is_degraded(&self, expected: usize) -> bool {
        self.quotes.len() < expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quote_round_applies_once() {
        let mut quote = Quote::new("bank", Currency::usd(), dec!(100.125))
            .with_rounding(RoundingRule::HalfAwayFromZero(2));

        quote.round();
        assert_eq!(quote.rate, dec!(100.13));
        assert!(quote.is_normalized());

        quote.rounding = RoundingRule::Truncate(0);
        quote.round();
        assert_eq!(quote.rate, dec!(100.13));
    }

    #[test]
    fn test_exact_quote_keeps_rate() {
        let mut quote = Quote::new("exchange", Currency::btc(), dec!(64000.123456));
        quote.round();
        assert_eq!(quote.rate, dec!(64000.123456));
    }

    #[test]
    fn test_empty_result() {
        let result = AggregateResult::empty(Currency::eur());

        assert!(result.is_empty());
        assert_eq!(result.average, Decimal::ZERO);
        assert!(result.is_degraded(3));
        assert!(!result.is_degraded(0));
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let quote = Quote::new("bank", Currency::usd(), dec!(91.5))
            .with_rounding(RoundingRule::HalfEven(2));
        let result = AggregateResult::new(Currency::usd(), dec!(91.5), vec![quote]);

        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["currencyCode"], "USD");
        assert_eq!(json["average"].as_f64(), Some(91.5));
        assert_eq!(json["quotes"][0]["rate"].as_f64(), Some(91.5));
        assert_eq!(json["quotes"][0]["source"], "bank");
        assert!(json["quotes"][0].get("quotedAt").is_some());
        assert!(json["quotes"][0].get("rounding").is_none());
        assert_eq!(result.quote_count(), 1);
    }
}
