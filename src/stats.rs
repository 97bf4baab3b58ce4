use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analyzers::types::HistoryAnalysis;

/// One row of the per-tank summary CSV written by `batch`.
#[derive(Debug, Default, Serialize)]
pub struct TankSummary {
    pub timestamp: DateTime<Utc>,
    pub tank_id: Option<String>,
    pub period: Option<String>,

    // series shape
    pub readings: usize,
    pub points: usize,

    // statistics
    pub average_level: f64,
    pub min_level: f64,
    pub max_level: f64,
    pub trend: Option<String>,
    pub consumption: f64,

    // error tracking
    pub error_type: Option<String>,
    pub error_message: Option<String>,
}

impl TankSummary {
    pub fn from_analysis(analysis: &HistoryAnalysis, timestamp: DateTime<Utc>) -> Self {
        let stats = &analysis.statistics;
        TankSummary {
            timestamp,
            period: Some(analysis.period.to_string()),
            readings: analysis.filtered_readings,
            points: analysis.points.len(),
            average_level: stats.average_level,
            min_level: stats.min_level,
            max_level: stats.max_level,
            trend: Some(stats.trend.to_string()),
            consumption: stats.consumption,
            ..Default::default()
        }
    }

    /// Create an error record with timestamp and error information
    pub fn from_error(timestamp: DateTime<Utc>, error_type: &str, error_message: &str) -> Self {
        TankSummary {
            timestamp,
            error_type: Some(error_type.to_string()),
            error_message: Some(error_message.to_string()),
            ..Default::default()
        }
    }

    pub fn with_tank_id(mut self, tank_id: &str) -> Self {
        self.tank_id = Some(tank_id.to_string());
        self
    }

    pub fn is_error(&self) -> bool {
        self.error_type.is_some()
    }
}
