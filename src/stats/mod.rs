//! Stats module - Per-region vote aggregation

mod aggregator;

pub use aggregator::{AggregateError, RegionResult, ResultAggregator};
