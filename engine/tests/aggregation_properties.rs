//! Property-based tests for the aggregation engine.
//!
//! These check the result-size bound, completeness when every provider
//! answers in time, and order independence of the average, using `proptest`
//! for input generation and a paused Tokio clock for deadlines.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use proptest::prelude::*;
use rateagg_common::{Currency, Quote, RoundingRule};
use rateagg_engine::aggregator::{mean, reduce};
use rateagg_engine::{
    Dispatcher, EngineConfig, ProviderError, ProviderRegistry, ProviderResult, RateProvider,
};
use rust_decimal::Decimal;

const DEADLINE: Duration = Duration::from_millis(1_000);

// =============================================================================
// Test provider
// =============================================================================

#[derive(Debug, Clone)]
enum Script {
    /// Answer with `rate` after `delay_ms`.
    OnTime { rate: Decimal, delay_ms: u64 },
    /// Answer only after the deadline.
    Late { delay_ms: u64 },
    /// Fail immediately.
    Fail,
}

struct ScriptedProvider {
    name: String,
    script: Script,
}

#[async_trait]
impl RateProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, currency: &Currency) -> ProviderResult<Quote> {
        match self.script {
            Script::OnTime { rate, delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(Quote::new(&self.name, currency.clone(), rate))
            }
            Script::Late { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(Quote::new(&self.name, currency.clone(), Decimal::ONE))
            }
            Script::Fail => Err(ProviderError::Transport("connection refused".into())),
        }
    }
}

fn run_aggregation(scripts: &[Script]) -> rateagg_common::AggregateResult {
    let registry = scripts
        .iter()
        .enumerate()
        .fold(ProviderRegistry::new(), |registry, (i, script)| {
            registry.register(Arc::new(ScriptedProvider {
                name: format!("provider-{i}"),
                script: script.clone(),
            }))
        });
    let dispatcher = Dispatcher::new(registry, EngineConfig::default().with_deadline(DEADLINE));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap();

    runtime.block_on(dispatcher.aggregate(&Currency::usd()))
}

// =============================================================================
// Generators
// =============================================================================

/// Generates a rate of at least 1 with up to six decimal places.
fn arb_rate() -> impl Strategy<Value = Decimal> {
    (1_000_000i64..10_000_000_000, 0u32..=6).prop_map(|(mantissa, scale)| Decimal::new(mantissa, scale))
}

fn arb_rule() -> impl Strategy<Value = RoundingRule> {
    prop_oneof![
        Just(RoundingRule::Exact),
        (0u32..=4).prop_map(RoundingRule::HalfAwayFromZero),
        (0u32..=4).prop_map(RoundingRule::HalfEven),
        (0u32..=4).prop_map(RoundingRule::Truncate),
    ]
}

fn arb_quote() -> impl Strategy<Value = Quote> {
    (arb_rate(), arb_rule())
        .prop_map(|(rate, rule)| Quote::new("generated", Currency::usd(), rate).with_rounding(rule))
}

fn arb_script() -> impl Strategy<Value = Script> {
    prop_oneof![
        (arb_rate(), 0u64..900).prop_map(|(rate, delay_ms)| Script::OnTime { rate, delay_ms }),
        (1_100u64..5_000).prop_map(|delay_ms| Script::Late { delay_ms }),
        Just(Script::Fail),
    ]
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The number of quotes never exceeds the number of providers, and equals
    /// the number of providers that answered before the deadline.
    #[test]
    fn prop_quote_count_bounded(scripts in prop::collection::vec(arb_script(), 0..8)) {
        let result = run_aggregation(&scripts);
        let on_time = scripts
            .iter()
            .filter(|s| matches!(s, Script::OnTime { .. }))
            .count();

        prop_assert!(result.quotes.len() <= scripts.len());
        prop_assert_eq!(result.quotes.len(), on_time);
        prop_assert_eq!(result.average.is_zero(), result.quotes.is_empty());
    }

    /// When every provider answers in time, every provider contributes and
    /// the average is the rounded mean of their rates.
    #[test]
    fn prop_all_on_time_is_complete(
        answers in prop::collection::vec((arb_rate(), 0u64..900), 1..8)
    ) {
        let scripts: Vec<Script> = answers
            .iter()
            .map(|&(rate, delay_ms)| Script::OnTime { rate, delay_ms })
            .collect();
        let expected: Vec<Quote> = answers
            .iter()
            .map(|&(rate, _)| Quote::new("expected", Currency::usd(), rate))
            .collect();

        let result = run_aggregation(&scripts);

        prop_assert_eq!(result.quotes.len(), scripts.len());
        prop_assert_eq!(result.average, mean(&expected));
    }

    /// Reducing the same quotes in any order yields the same average.
    #[test]
    fn prop_average_is_order_independent(
        quotes in prop::collection::vec(arb_quote(), 0..12),
        rotation in 0usize..12,
    ) {
        let mut forward = quotes.clone();
        let mut reversed: Vec<Quote> = quotes.iter().rev().cloned().collect();
        let mut rotated = quotes.clone();
        if !rotated.is_empty() {
            let by = rotation % rotated.len();
            rotated.rotate_left(by);
        }

        let average = reduce(&mut forward);
        prop_assert_eq!(average, reduce(&mut reversed));
        prop_assert_eq!(average, reduce(&mut rotated));
    }

    /// The average lies between the smallest and largest normalized rate.
    #[test]
    fn prop_average_within_range(quotes in prop::collection::vec(arb_quote(), 1..12)) {
        let mut quotes = quotes;
        let average = reduce(&mut quotes);

        let min = quotes.iter().map(|q| q.rate).min().unwrap();
        let max = quotes.iter().map(|q| q.rate).max().unwrap();
        let tolerance = Decimal::new(5, 4);

        prop_assert!(average >= min - tolerance);
        prop_assert!(average <= max + tolerance);
    }
}
