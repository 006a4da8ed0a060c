//! Reduction of collected quotes to a single rate.

use rateagg_common::Quote;
use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept on the aggregated mean.
pub const MEAN_DECIMAL_PLACES: u32 = 3;

/// Normalize each quote with its own source rule.
pub fn normalize(quotes: &mut [Quote]) {
    for quote in quotes.iter_mut() {
        quote.round();
    }
}

/// Mean of the quote rates rounded to [`MEAN_DECIMAL_PLACES`], ties away
/// from zero. Zero for an empty slice.
pub fn mean(quotes: &[Quote]) -> Decimal {
    if quotes.is_empty() {
        return Decimal::ZERO;
    }

    let count = Decimal::from(quotes.len());
    let mean = quotes
        .iter()
        .try_fold(Decimal::ZERO, |sum, q| sum.checked_add(q.rate))
        .and_then(|sum| sum.checked_div(count))
        .unwrap_or_else(|| scaled_sum(quotes, count));

    mean.round_dp_with_strategy(MEAN_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// `Σ(rate / count)`, used when the plain sum leaves the `Decimal` range.
/// Saturates rather than overflowing.
fn scaled_sum(quotes: &[Quote], count: Decimal) -> Decimal {
    quotes
        .iter()
        .map(|q| q.rate.checked_div(count).unwrap_or(q.rate))
        .fold(Decimal::ZERO, |sum, share| sum.saturating_add(share))
}

/// Normalize the quotes in place, then average them.
///
/// Both roundings are part of the result: per quote first, then on the mean.
pub fn reduce(quotes: &mut [Quote]) -> Decimal {
    normalize(quotes);
    mean(quotes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rateagg_common::{Currency, RoundingRule};
    use rust_decimal_macros::dec;

    fn quote(rate: Decimal, rounding: RoundingRule) -> Quote {
        Quote::new("test", Currency::usd(), rate).with_rounding(rounding)
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(reduce(&mut []), Decimal::ZERO);
    }

    #[test]
    fn test_simple_mean() {
        let mut quotes = vec![
            quote(dec!(100.000), RoundingRule::Exact),
            quote(dec!(102.000), RoundingRule::Exact),
        ];
        assert_eq!(reduce(&mut quotes), dec!(101));
    }

    #[test]
    fn test_rounds_quotes_before_mean() {
        let mut quotes = vec![
            quote(dec!(100.123), RoundingRule::HalfAwayFromZero(2)),
            quote(dec!(100.127), RoundingRule::HalfAwayFromZero(2)),
        ];

        assert_eq!(reduce(&mut quotes), dec!(100.125));
        assert_eq!(quotes[0].rate, dec!(100.12));
        assert_eq!(quotes[1].rate, dec!(100.13));
    }

    #[test]
    fn test_double_rounding_differs_from_single() {
        let raw = vec![
            quote(dec!(1.0004), RoundingRule::HalfAwayFromZero(2)),
            quote(dec!(1.0014), RoundingRule::HalfAwayFromZero(2)),
        ];
        let single = mean(&raw);

        let mut normalized = raw.clone();
        let double = reduce(&mut normalized);

        assert_eq!(single, dec!(1.001));
        assert_eq!(double, dec!(1.000));
    }

    #[test]
    fn test_mean_rounds_half_away_from_zero() {
        let quotes = vec![
            quote(dec!(1.0005), RoundingRule::Exact),
            quote(dec!(1.0005), RoundingRule::Exact),
        ];
        assert_eq!(mean(&quotes), dec!(1.001));
    }

    #[test]
    fn test_mean_survives_sum_overflow() {
        let rate = Decimal::MAX / Decimal::TWO + Decimal::ONE;
        let quotes = vec![
            quote(rate, RoundingRule::Exact),
            quote(rate, RoundingRule::Exact),
        ];
        assert!(rate.checked_add(rate).is_none());

        // Each share is rounded at the top of the range, so allow a unit or two.
        let average = mean(&quotes);
        assert!((average - rate).abs() <= Decimal::TWO);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut quotes = vec![quote(dec!(7.4449), RoundingRule::HalfEven(3))];
        normalize(&mut quotes);
        normalize(&mut quotes);
        assert_eq!(quotes[0].rate, dec!(7.445));
    }
}
