//! Data types used by the aggregation pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analyzers::bucket::Granularity;
use crate::analyzers::period::Period;

/// One bucket of readings reduced to a single representative point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedPoint {
    /// Timestamp of the bucket's representative reading.
    pub recorded_at: DateTime<Utc>,
    /// Mean gas level percentage over the bucket.
    pub percentage: f64,
    /// Mean gas level in liters over the bucket.
    pub liters: f64,
    /// Number of readings folded into this point.
    pub count: usize,
}

/// Direction of the gas level over the most recent points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    #[default]
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Stable => "stable",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary statistics over an aggregated series.
///
/// `consumption` is the raw first-minus-last liters and goes negative when a
/// refill happened inside the window. Use
/// [`Statistics::displayed_consumption`] for anything shown to a person.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub average_level: f64,
    pub min_level: f64,
    pub max_level: f64,
    pub trend: Trend,
    pub consumption: f64,
}

impl Statistics {
    /// Net consumption clamped at zero.
    pub fn displayed_consumption(&self) -> f64 {
        self.consumption.max(0.0)
    }
}

/// Result of running the pipeline over one tank's history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryAnalysis {
    pub period: Period,
    /// Granularity actually applied, `None` when readings passed through 1:1.
    pub granularity: Option<Granularity>,
    /// Number of readings left after the period filter.
    pub filtered_readings: usize,
    pub points: Vec<AggregatedPoint>,
    pub statistics: Statistics,
}
