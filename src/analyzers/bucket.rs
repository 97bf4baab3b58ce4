//! Temporal bucketing of readings.
//!
//! Buckets are keyed by calendar fields in the display time zone, so an
//! hourly bucket is a wall-clock hour and a daily bucket a wall-clock day
//! wherever the caller is looking at the chart from.

use chrono::{NaiveDate, TimeZone, Timelike};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::analyzers::period::Period;
use crate::analyzers::types::AggregatedPoint;
use crate::analyzers::utility::mean;
use crate::reading::Reading;

/// Above this many readings, the all-time view switches to daily buckets.
pub const ALL_TIME_BUCKETING_THRESHOLD: usize = 60;

/// Hours covered by one [`Granularity::SixHours`] bucket.
const HOURS_PER_BLOCK: u32 = 6;

/// Size of the time buckets readings are grouped into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Hour,
    SixHours,
    Day,
}

/// Which reading of a bucket lends the point its timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representative {
    Last,
    /// Index `len / 2`, i.e. the lower middle for even-sized buckets.
    Middle,
}

/// Calendar date plus the slot within that day (hour, 6-hour block, or 0).
type BucketKey = (NaiveDate, u32);

impl Granularity {
    /// Bucket size used for `period` given how many readings survived the
    /// period filter. `None` means readings pass through unbucketed.
    pub fn for_period(period: Period, reading_count: usize) -> Option<Granularity> {
        match period {
            Period::Last24Hours => Some(Granularity::Hour),
            Period::Last7Days => Some(Granularity::SixHours),
            Period::Last30Days => Some(Granularity::Day),
            Period::All if reading_count > ALL_TIME_BUCKETING_THRESHOLD => Some(Granularity::Day),
            Period::All => None,
        }
    }

    pub fn representative(&self) -> Representative {
        match self {
            Granularity::Hour => Representative::Last,
            Granularity::SixHours | Granularity::Day => Representative::Middle,
        }
    }

    fn bucket_key<Tz: TimeZone>(&self, reading: &Reading, tz: &Tz) -> BucketKey {
        let local = reading.recorded_at.with_timezone(tz);
        let slot = match self {
            Granularity::Hour => local.hour(),
            Granularity::SixHours => local.hour() / HOURS_PER_BLOCK,
            Granularity::Day => 0,
        };
        (local.date_naive(), slot)
    }
}

impl Representative {
    fn index(&self, len: usize) -> usize {
        match self {
            Representative::Last => len - 1,
            Representative::Middle => len / 2,
        }
    }
}

impl AggregatedPoint {
    /// A point standing for exactly one reading.
    pub fn from_reading(reading: &Reading) -> Self {
        Self {
            recorded_at: reading.recorded_at,
            percentage: reading.gas_level_percentage,
            liters: reading.gas_level_liters,
            count: 1,
        }
    }
}

/// Sorts `readings` chronologically and folds them into points using the
/// granularity policy for `period`.
///
/// Every input reading ends up in exactly one point, and points come out in
/// ascending time order.
pub fn bucket_readings<Tz: TimeZone>(
    readings: &[Reading],
    period: Period,
    tz: &Tz,
) -> Vec<AggregatedPoint> {
    let mut sorted = readings.to_vec();
    sorted.sort_by_key(|r| r.recorded_at);

    match Granularity::for_period(period, sorted.len()) {
        Some(granularity) => group(&sorted, granularity, tz),
        None => sorted.iter().map(AggregatedPoint::from_reading).collect(),
    }
}

/// Groups already-sorted readings by bucket key and reduces each bucket.
fn group<Tz: TimeZone>(
    sorted: &[Reading],
    granularity: Granularity,
    tz: &Tz,
) -> Vec<AggregatedPoint> {
    let mut buckets: BTreeMap<BucketKey, Vec<Reading>> = BTreeMap::new();

    for reading in sorted {
        buckets
            .entry(granularity.bucket_key(reading, tz))
            .or_default()
            .push(*reading);
    }

    buckets
        .values()
        .map(|bucket| reduce(bucket, granularity.representative()))
        .collect()
}

fn reduce(bucket: &[Reading], representative: Representative) -> AggregatedPoint {
    let percentages: Vec<f64> = bucket.iter().map(|r| r.gas_level_percentage).collect();
    let liters: Vec<f64> = bucket.iter().map(|r| r.gas_level_liters).collect();

    AggregatedPoint {
        recorded_at: bucket[representative.index(bucket.len())].recorded_at,
        percentage: mean(&percentages),
        liters: mean(&liters),
        count: bucket.len(),
    }
}
