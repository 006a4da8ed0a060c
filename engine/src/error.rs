//! Engine error types.

use rateagg_common::Currency;
use std::time::Duration;
use thiserror::Error;

/// Errors a rate provider can report.
///
/// Workers absorb these; they never reach the caller of `aggregate`.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider does not quote this currency.
    #[error("Currency {currency} not supported by {provider}")]
    UnsupportedCurrency { provider: String, currency: Currency },

    /// The request to the upstream source failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The upstream response could not be interpreted.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The provider is temporarily unavailable.
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

/// Result type for provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Invalid engine configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Deadline of zero would cancel every worker before it starts.
    #[error("Deadline must be greater than zero")]
    ZeroDeadline,

    /// Deadline above the allowed maximum.
    #[error("Deadline {deadline:?} exceeds maximum {max:?}")]
    DeadlineTooLong { deadline: Duration, max: Duration },
}
