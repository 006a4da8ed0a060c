//! Simulation scenarios.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::provider::ProviderProfile;

/// A set of simulated providers and the deadline to run them under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Deadline override in milliseconds.
    #[serde(default)]
    pub deadline_ms: Option<u64>,
    /// Providers registered with the engine.
    pub providers: Vec<ProviderProfile>,
}

impl Scenario {
    /// Load a built-in scenario by name, or a JSON scenario file by path.
    pub fn load(name: &str) -> anyhow::Result<Self> {
        match name {
            "healthy" => Ok(Self::healthy()),
            "partial-failure" => Ok(Self::partial_failure()),
            "slow" => Ok(Self::slow()),
            "flaky" => Ok(Self::flaky()),
            path if path.ends_with(".json") => Self::from_file(path),
            _ => Err(anyhow::anyhow!("Unknown scenario: {}", name)),
        }
    }

    /// Read a scenario from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read scenario {}: {}", path.display(), e))?;
        let scenario: Scenario = serde_json::from_str(&raw)?;

        if scenario.providers.is_empty() {
            return Err(anyhow::anyhow!("Scenario {} has no providers", scenario.name));
        }

        Ok(scenario)
    }

    /// Three providers with different native precisions, all answering in time.
    fn healthy() -> Self {
        Self {
            name: "healthy".to_string(),
            description: "Three sources with different precisions, all on time".to_string(),
            deadline_ms: None,
            providers: vec![
                ProviderProfile::new("central-bank", Decimal::new(913_456, 4))
                    .with_latency(300, 900)
                    .with_decimal_places(4),
                ProviderProfile::new("exchange", Decimal::new(913_000, 4))
                    .with_latency(50, 200)
                    .with_jitter(20)
                    .with_decimal_places(2),
                ProviderProfile::new("market-data", Decimal::new(913_210, 4))
                    .with_latency(100, 600)
                    .with_jitter(10)
                    .with_decimal_places(3),
            ],
        }
    }

    /// One source is down for every call.
    fn partial_failure() -> Self {
        let mut scenario = Self::healthy();
        scenario.name = "partial-failure".to_string();
        scenario.description = "One source always fails".to_string();
        scenario.providers[1] = scenario.providers[1].clone().with_failure_rate(1.0);
        scenario
    }

    /// Every source answers after the deadline.
    fn slow() -> Self {
        let mut scenario = Self::healthy();
        scenario.name = "slow".to_string();
        scenario.description = "Every source exceeds the deadline".to_string();
        scenario.deadline_ms = Some(1_000);
        scenario.providers = scenario
            .providers
            .into_iter()
            .map(|p| p.with_latency(1_500, 3_000))
            .collect();
        scenario
    }

    /// Random outages, bad payloads and latencies straddling the deadline.
    fn flaky() -> Self {
        let mut scenario = Self::healthy();
        scenario.name = "flaky".to_string();
        scenario.description = "Random failures and latencies around the deadline".to_string();
        scenario.deadline_ms = Some(1_000);
        scenario.providers = scenario
            .providers
            .into_iter()
            .map(|p| {
                p.with_latency(200, 1_500)
                    .with_failure_rate(0.2)
                    .with_malformed_rate(0.1)
            })
            .collect();
        scenario
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_scenarios() {
        for name in ["healthy", "partial-failure", "slow", "flaky"] {
            let scenario = Scenario::load(name).unwrap();
            assert_eq!(scenario.name, name);
            assert_eq!(scenario.providers.len(), 3);
        }
    }

    #[test]
    fn test_unknown_scenario() {
        assert!(Scenario::load("does-not-exist").is_err());
    }

    #[test]
    fn test_slow_scenario_exceeds_deadline() {
        let scenario = Scenario::load("slow").unwrap();
        let deadline = scenario.deadline_ms.unwrap();
        assert!(scenario.providers.iter().all(|p| p.min_latency_ms > deadline));
    }

    #[test]
    fn test_scenario_json_defaults() {
        let raw = r#"{
            "name": "custom",
            "description": "single source",
            "providers": [{ "name": "solo", "base_rate": "1.2345" }]
        }"#;

        let scenario: Scenario = serde_json::from_str(raw).unwrap();

        assert_eq!(scenario.deadline_ms, None);
        assert_eq!(scenario.providers[0].jitter_bps, 0);
        assert_eq!(scenario.providers[0].decimal_places, None);
        assert_eq!(scenario.providers[0].base_rate, Decimal::new(12345, 4));
    }
}
