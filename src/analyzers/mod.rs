//! Tank history aggregation.
//!
//! Filters readings to a trailing period, groups them into hourly, 6-hourly
//! or daily buckets, and summarizes the resulting series into level
//! statistics, a trend, and net consumption. Everything here is a pure
//! function of its arguments.

pub mod analyzer;
pub mod bucket;
pub mod period;
pub mod summary;
pub mod trend;
pub mod types;
pub mod utility;
