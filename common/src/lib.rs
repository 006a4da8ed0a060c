//! RateAgg Common Types
//!
//! Shared data model for the rate aggregator: currency codes, per-source
//! rounding rules, provider quotes and the aggregated result handed to
//! delivery layers.

pub mod monetary;
pub mod quote;

pub use monetary::*;
pub use quote::*;
