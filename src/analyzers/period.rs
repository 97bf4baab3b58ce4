//! Trailing time windows and the period filter.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::str::FromStr;

use crate::error::HistoryError;
use crate::reading::Reading;

/// Trailing window selected for a history view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Period {
    #[serde(rename = "24h")]
    Last24Hours,
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "all")]
    All,
}

impl Period {
    pub const ALL_PERIODS: [Period; 4] = [
        Period::Last24Hours,
        Period::Last7Days,
        Period::Last30Days,
        Period::All,
    ];

    /// Length of the trailing window, `None` for all time.
    pub fn window(&self) -> Option<Duration> {
        match self {
            Period::Last24Hours => Some(Duration::hours(24)),
            Period::Last7Days => Some(Duration::days(7)),
            Period::Last30Days => Some(Duration::days(30)),
            Period::All => None,
        }
    }

    /// The selector string accepted by [`FromStr`].
    pub fn selector(&self) -> &'static str {
        match self {
            Period::Last24Hours => "24h",
            Period::Last7Days => "7d",
            Period::Last30Days => "30d",
            Period::All => "all",
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.selector())
    }
}

impl FromStr for Period {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "24h" => Ok(Period::Last24Hours),
            "7d" => Ok(Period::Last7Days),
            "30d" => Ok(Period::Last30Days),
            "all" => Ok(Period::All),
            _ => Err(HistoryError::InvalidPeriod(s.to_string())),
        }
    }
}

/// Keeps the readings recorded inside `[now - window, now]`.
///
/// `Period::All` returns every reading, including ones stamped after `now`.
/// Input order is preserved.
pub fn filter_by_period(readings: &[Reading], period: Period, now: DateTime<Utc>) -> Vec<Reading> {
    match period.window() {
        None => readings.to_vec(),
        Some(window) => {
            let start = now - window;
            readings
                .iter()
                .filter(|r| r.recorded_at >= start && r.recorded_at <= now)
                .copied()
                .collect()
        }
    }
}
