//! Engine configuration.

use std::time::Duration;

use tracing::warn;

use crate::error::ConfigError;

/// Deadline applied to each aggregation call unless configured otherwise.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);

/// Upper bound accepted by [`EngineConfig::validate`].
pub const MAX_DEADLINE: Duration = Duration::from_secs(300);

/// Environment variable holding the deadline in milliseconds.
pub const DEADLINE_ENV: &str = "RATEAGG_DEADLINE_MS";

/// Configuration for the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Wall-clock bound for one aggregation call.
    pub deadline: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            deadline: DEFAULT_DEADLINE,
        }
    }
}

impl EngineConfig {
    /// Set the per-call deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var(DEADLINE_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.deadline = Duration::from_millis(ms),
                Err(e) => warn!(
                    var = DEADLINE_ENV,
                    value = %raw,
                    error = %e,
                    "Ignoring unparsable deadline"
                ),
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deadline.is_zero() {
            return Err(ConfigError::ZeroDeadline);
        }

        if self.deadline > MAX_DEADLINE {
            return Err(ConfigError::DeadlineTooLong {
                deadline: self.deadline,
                max: MAX_DEADLINE,
            });
        }

        Ok(())
    }
}
