//! JSON parser for tank history payloads.

use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use crate::reading::{RawReading, Reading};

/// Object keys the history array has been seen wrapped under.
const ENVELOPE_KEYS: [&str; 3] = ["data", "history", "readings"];

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Decodes a history payload into raw readings.
///
/// Accepts a bare JSON array or an object wrapping the array under `data`,
/// `history`, or `readings`.
///
/// # Errors
///
/// Returns an error if the bytes are not JSON or hold no reading array. A
/// malformed element inside the array is not an error.
pub fn parse_history(bytes: &[u8]) -> Result<Vec<RawReading>> {
    let value: Value = serde_json::from_slice(bytes)?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match ENVELOPE_KEYS.iter().find_map(|k| map.remove(*k)) {
            Some(Value::Array(items)) => items,
            _ => bail!("history payload object has no reading array"),
        },
        other => bail!("history payload must be an array, got {}", kind(&other)),
    };

    Ok(items.into_iter().map(raw_reading).collect())
}

/// Decodes one array element. Elements that are not reading objects become
/// an empty [`RawReading`], which [`normalize_readings`] drops and counts.
fn raw_reading(item: Value) -> RawReading {
    let shape = kind(&item);
    serde_json::from_value(item).unwrap_or_else(|e| {
        debug!(element = shape, error = %e, "Malformed history element");
        RawReading::default()
    })
}

/// Converts raw readings into [`Reading`]s.
///
/// Readings whose `recordedAt` is missing or unparsable are dropped and
/// counted in a single warning. Naive timestamps are read as wall-clock
/// time in `tz`.
pub fn normalize_readings<Tz: TimeZone>(raw: &[RawReading], tz: &Tz) -> Vec<Reading> {
    let readings: Vec<Reading> = raw
        .iter()
        .filter_map(|r| {
            let recorded_at = r.recorded_at.as_ref().and_then(|v| parse_timestamp(v, tz))?;
            Some(Reading::new(recorded_at, r.percentage_or_zero(), r.liters_or_zero()))
        })
        .collect();

    let dropped = raw.len() - readings.len();
    if dropped > 0 {
        warn!(dropped, total = raw.len(), "Dropped malformed readings or unparsable timestamps");
    }
    debug!(kept = readings.len(), "Readings normalized");

    readings
}

/// Parses and normalizes a history payload in one step.
pub fn load_readings<Tz: TimeZone>(bytes: &[u8], tz: &Tz) -> Result<Vec<Reading>> {
    let raw = parse_history(bytes)?;
    Ok(normalize_readings(&raw, tz))
}

/// Parses a `recordedAt` value: RFC 3339 text, naive date-time text in `tz`,
/// or integer epoch milliseconds.
pub fn parse_timestamp<Tz: TimeZone>(value: &Value, tz: &Tz) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp_str(s.trim(), tz),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64))
            .and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn parse_timestamp_str<Tz: TimeZone>(s: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return tz
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc));
    }

    // A bare date is midnight UTC, as the dashboard's `new Date("YYYY-MM-DD")` reads it.
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
