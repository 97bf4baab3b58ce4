use serde::{Deserialize, Serialize};

use crate::analyzers::types::{AggregatedPoint, Trend};
use crate::error::HistoryError;

/// Number of most recent points the trend looks at.
pub const TREND_WINDOW: usize = 5;

/// Change in percentage points across the window needed to call a trend.
pub const TREND_THRESHOLD_PCT: f64 = 5.0;

/// Tunable knobs for [`classify_trend`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPolicy {
    pub window: usize,
    pub threshold_pct: f64,
}

impl Default for TrendPolicy {
    fn default() -> Self {
        Self {
            window: TREND_WINDOW,
            threshold_pct: TREND_THRESHOLD_PCT,
        }
    }
}

impl TrendPolicy {
    /// Rejects windows that can never produce a trend and negative or
    /// non-finite thresholds.
    pub fn validate(&self) -> Result<(), HistoryError> {
        if self.window < 2 {
            return Err(HistoryError::config(
                "trend_window",
                format!("must be at least 2, got {}", self.window),
            ));
        }
        if !self.threshold_pct.is_finite() || self.threshold_pct < 0.0 {
            return Err(HistoryError::config(
                "trend_threshold_pct",
                format!("must be a non-negative number, got {}", self.threshold_pct),
            ));
        }
        Ok(())
    }
}

/// Classifies the direction of the last `policy.window` points.
///
/// | Change over window (last - first) | Trend      |
/// |-----------------------------------|------------|
/// | < -threshold                      | decreasing |
/// | > threshold                       | increasing |
/// | otherwise, or fewer than 2 points | stable     |
pub fn classify_trend(points: &[AggregatedPoint], policy: &TrendPolicy) -> Trend {
    let recent = &points[points.len().saturating_sub(policy.window)..];

    let (Some(first), Some(last)) = (recent.first(), recent.last()) else {
        return Trend::Stable;
    };
    if recent.len() < 2 {
        return Trend::Stable;
    }

    match last.percentage - first.percentage {
        delta if delta < -policy.threshold_pct => Trend::Decreasing,
        delta if delta > policy.threshold_pct => Trend::Increasing,
        _ => Trend::Stable,
    }
}
