//! Chart-ready formatting of an aggregated history.
//!
//! Turns [`AggregatedPoint`]s into labeled records and bundles them with the
//! statistics and axis hints a chart front end needs. No numeric policy
//! lives here beyond rounding.

use chrono::{DateTime, TimeZone};
use serde::Serialize;
use std::fmt::Display;

use crate::analyzers::bucket::Granularity;
use crate::analyzers::period::Period;
use crate::analyzers::types::{AggregatedPoint, HistoryAnalysis, Statistics, Trend};

/// Gas level below which a tank is critical.
pub const CRITICAL_LEVEL_PCT: f64 = 20.0;

/// Gas level marking the middle of the tank.
pub const MEDIUM_LEVEL_PCT: f64 = 50.0;

/// One point of the series as handed to a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub label: String,
    pub full_date: String,
    pub percentage: f64,
    pub liters: f64,
    pub count: usize,
}

impl ChartPoint {
    /// Tooltip footnote for points that average several readings.
    pub fn tooltip_note(&self) -> Option<String> {
        (self.count > 1).then(|| format!("average of {} readings", self.count))
    }
}

/// Horizontal marker drawn across the level axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub level: f64,
    pub label: &'static str,
}

/// Everything a history chart view renders for one tank and period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryReport {
    pub tank_id: Option<String>,
    pub capacity_liters: Option<f64>,
    pub period: Period,
    pub grouping: &'static str,
    pub tick_interval: usize,
    pub reference_lines: Vec<ReferenceLine>,
    pub points: Vec<ChartPoint>,
    pub statistics: Statistics,
    pub trend_headline: &'static str,
    pub displayed_consumption: f64,
    /// Latest point's liters over capacity, when capacity is known.
    pub current_fill: Option<f64>,
}

impl Trend {
    /// Short human-readable reading of the trend.
    pub fn headline(&self) -> &'static str {
        match self {
            Trend::Decreasing => "High consumption",
            Trend::Increasing => "Refill detected",
            Trend::Stable => "Stable consumption",
        }
    }
}

/// Rounds to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Maps points to labeled chart records, with labels in `tz`.
///
/// | Period      | Label         |
/// |-------------|---------------|
/// | 24h         | `14:05`       |
/// | 7d          | `3 May, 18h`  |
/// | 30d, all    | `3 May`       |
pub fn format_series<Tz>(points: &[AggregatedPoint], period: Period, tz: &Tz) -> Vec<ChartPoint>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    points
        .iter()
        .map(|p| {
            let local = p.recorded_at.with_timezone(tz);
            ChartPoint {
                label: label(&local, period),
                full_date: local.format("%d/%m/%Y, %H:%M:%S").to_string(),
                percentage: round1(p.percentage),
                liters: round1(p.liters),
                count: p.count,
            }
        })
        .collect()
}

fn label<Tz>(local: &DateTime<Tz>, period: Period) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let fmt = match period {
        Period::Last24Hours => "%H:%M",
        Period::Last7Days => "%-d %b, %Hh",
        Period::Last30Days | Period::All => "%-d %b",
    };
    local.format(fmt).to_string()
}

/// How many axis labels to skip between drawn ones.
///
/// | Points | Interval   |
/// |--------|------------|
/// | <= 8   | 0          |
/// | <= 15  | 1          |
/// | <= 30  | points/10  |
/// | > 30   | points/12  |
pub fn tick_interval(points: usize) -> usize {
    match points {
        0..=8 => 0,
        9..=15 => 1,
        16..=30 => points / 10,
        _ => points / 12,
    }
}

/// Caption describing how the series was grouped.
pub fn grouping_description(granularity: Option<Granularity>) -> &'static str {
    match granularity {
        Some(Granularity::Hour) => "grouped by hour",
        Some(Granularity::SixHours) => "grouped every 6h",
        Some(Granularity::Day) => "grouped by day",
        None => "individual readings",
    }
}

pub fn reference_lines() -> Vec<ReferenceLine> {
    vec![
        ReferenceLine {
            level: CRITICAL_LEVEL_PCT,
            label: "critical",
        },
        ReferenceLine {
            level: MEDIUM_LEVEL_PCT,
            label: "medium",
        },
    ]
}

/// `liters / capacity`, or `None` when capacity is missing or not positive.
pub fn fill_fraction(liters: f64, capacity: Option<f64>) -> Option<f64> {
    capacity
        .filter(|c| c.is_finite() && *c > 0.0)
        .map(|c| liters / c)
}

/// Bundles an analysis into a [`HistoryReport`].
pub fn build_report<Tz>(
    analysis: &HistoryAnalysis,
    tank_id: Option<&str>,
    capacity_liters: Option<f64>,
    tz: &Tz,
) -> HistoryReport
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let points = format_series(&analysis.points, analysis.period, tz);
    let current_fill = analysis
        .points
        .last()
        .and_then(|p| fill_fraction(p.liters, capacity_liters));

    HistoryReport {
        tank_id: tank_id.map(str::to_string),
        capacity_liters,
        period: analysis.period,
        grouping: grouping_description(analysis.granularity),
        tick_interval: tick_interval(points.len()),
        reference_lines: reference_lines(),
        points,
        statistics: analysis.statistics,
        trend_headline: analysis.statistics.trend.headline(),
        displayed_consumption: analysis.statistics.displayed_consumption(),
        current_fill,
    }
}
