use chrono::{DateTime, TimeZone, Utc};
use tracing::debug;

use crate::analyzers::bucket::{Granularity, bucket_readings};
use crate::analyzers::period::{Period, filter_by_period};
use crate::analyzers::summary::summarize;
use crate::analyzers::trend::TrendPolicy;
use crate::analyzers::types::HistoryAnalysis;
use crate::reading::Reading;

/// Runs one tank's history through filter, bucketing and summary.
///
/// `now` anchors the trailing window and `tz` decides where hour and day
/// boundaries fall. Nothing is cached: every call starts from `readings`.
pub fn analyze_history<Tz: TimeZone>(
    readings: &[Reading],
    period: Period,
    now: DateTime<Utc>,
    tz: &Tz,
    policy: &TrendPolicy,
) -> HistoryAnalysis {
    let filtered = filter_by_period(readings, period, now);
    let granularity = Granularity::for_period(period, filtered.len());
    let points = bucket_readings(&filtered, period, tz);
    let statistics = summarize(&points, policy);

    debug!(
        period = %period,
        total = readings.len(),
        filtered = filtered.len(),
        points = points.len(),
        ?granularity,
        trend = %statistics.trend,
        "History aggregated"
    );

    HistoryAnalysis {
        period,
        granularity,
        filtered_readings: filtered.len(),
        points,
        statistics,
    }
}
