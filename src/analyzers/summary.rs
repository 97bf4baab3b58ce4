use crate::analyzers::trend::{TrendPolicy, classify_trend};
use crate::analyzers::types::{AggregatedPoint, Statistics};
use crate::analyzers::utility::{extrema, mean};

/// Summarizes an ordered series of points into [`Statistics`].
///
/// Level statistics run over point percentages. Consumption is the first
/// point's liters minus the last point's, kept raw so a refill inside the
/// window shows up as a negative value. An empty series yields
/// `Statistics::default()`.
pub fn summarize(points: &[AggregatedPoint], policy: &TrendPolicy) -> Statistics {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Statistics::default();
    };

    let levels: Vec<f64> = points.iter().map(|p| p.percentage).collect();
    let (min_level, max_level) = extrema(&levels);

    Statistics {
        average_level: mean(&levels),
        min_level,
        max_level,
        trend: classify_trend(points, policy),
        consumption: first.liters - last.liters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::Trend;
    use chrono::{Duration, TimeZone, Utc};

    fn points(values: &[(f64, f64)]) -> Vec<AggregatedPoint> {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &(percentage, liters))| AggregatedPoint {
                recorded_at: start + Duration::hours(i as i64),
                percentage,
                liters,
                count: 1,
            })
            .collect()
    }

    #[test]
    fn test_empty_series_defaults() {
        let stats = summarize(&[], &TrendPolicy::default());
        assert_eq!(stats, Statistics::default());
        assert_eq!(stats.trend, Trend::Stable);
    }

    #[test]
    fn test_levels_trend_and_consumption() {
        let series = points(&[
            (80.0, 240.0),
            (78.0, 234.0),
            (75.0, 225.0),
            (70.0, 210.0),
            (65.0, 195.0),
        ]);

        let stats = summarize(&series, &TrendPolicy::default());

        assert_eq!(stats.average_level, 73.6);
        assert_eq!(stats.min_level, 65.0);
        assert_eq!(stats.max_level, 80.0);
        assert_eq!(stats.trend, Trend::Decreasing);
        assert_eq!(stats.consumption, 45.0);
    }

    #[test]
    fn test_refill_gives_negative_raw_consumption() {
        let series = points(&[(20.0, 60.0), (85.0, 255.0)]);

        let stats = summarize(&series, &TrendPolicy::default());

        assert_eq!(stats.consumption, -195.0);
        assert_eq!(stats.displayed_consumption(), 0.0);
        assert_eq!(stats.trend, Trend::Increasing);
    }

    #[test]
    fn test_single_point() {
        let stats = summarize(&points(&[(42.0, 126.0)]), &TrendPolicy::default());
        assert_eq!(stats.average_level, 42.0);
        assert_eq!(stats.min_level, 42.0);
        assert_eq!(stats.max_level, 42.0);
        assert_eq!(stats.trend, Trend::Stable);
        assert_eq!(stats.consumption, 0.0);
    }
}
