//! RateAgg Engine
//!
//! Concurrent rate aggregation across independent providers.
//!
//! # Features
//!
//! - One worker task per registered provider, launched in parallel
//! - A single deadline bounding every call
//! - Partial failure tolerance: failed or late providers are dropped
//! - Deterministic average of the quotes that arrived in time
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rateagg_common::Currency;
//! use rateagg_engine::{Dispatcher, EngineConfig, ProviderRegistry};
//!
//! let registry = ProviderRegistry::new()
//!     .register(Arc::new(central_bank))
//!     .register(Arc::new(exchange));
//! let dispatcher = Dispatcher::new(registry, EngineConfig::default());
//!
//! let result = dispatcher.aggregate(&Currency::usd()).await;
//! println!("{} from {} quotes", result.average, result.quotes.len());
//! ```

pub mod aggregator;
pub mod collector;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod provider;
pub mod worker;

pub use collector::Collector;
pub use config::EngineConfig;
pub use dispatcher::Dispatcher;
pub use error::{ConfigError, ProviderError, ProviderResult};
pub use metrics::{EngineMetrics, EngineMetricsSnapshot};
pub use provider::{ProviderRegistry, RateProvider};
pub use worker::{Worker, WorkerOutcome};
