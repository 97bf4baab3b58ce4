use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One gas-level sample for a tank, as delivered by the history endpoint.
///
/// Fields are kept loosely typed: the backend has been seen sending nulls
/// and numeric strings, and timestamps as either ISO-8601 text or epoch
/// milliseconds. [`crate::parser::normalize_readings`] turns these into
/// [`Reading`]s.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReading {
    #[serde(default)]
    pub recorded_at: Option<Value>,
    #[serde(default)]
    pub gas_level_percentage: Option<Value>,
    #[serde(default)]
    pub gas_level_liters: Option<Value>,
}

/// A normalized reading with an absolute timestamp and numeric levels.
///
/// Percentage and liters are independent fields; neither is derived from
/// the other and they are never reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    pub recorded_at: DateTime<Utc>,
    pub gas_level_percentage: f64,
    pub gas_level_liters: f64,
}

impl Reading {
    pub fn new(recorded_at: DateTime<Utc>, gas_level_percentage: f64, gas_level_liters: f64) -> Self {
        Self {
            recorded_at,
            gas_level_percentage,
            gas_level_liters,
        }
    }
}

impl RawReading {
    /// Percentage as a number, or 0 when missing or not numeric.
    pub fn percentage_or_zero(&self) -> f64 {
        level_or_zero(self.gas_level_percentage.as_ref())
    }

    /// Liters as a number, or 0 when missing or not numeric.
    pub fn liters_or_zero(&self) -> f64 {
        level_or_zero(self.gas_level_liters.as_ref())
    }
}

fn level_or_zero(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_levels_are_zero() {
        let raw = RawReading::default();
        assert_eq!(raw.percentage_or_zero(), 0.0);
        assert_eq!(raw.liters_or_zero(), 0.0);
    }

    #[test]
    fn test_numeric_string_levels_parse() {
        let raw = RawReading {
            gas_level_percentage: Some(json!("42.5")),
            gas_level_liters: Some(json!(" 120 ")),
            ..Default::default()
        };
        assert_eq!(raw.percentage_or_zero(), 42.5);
        assert_eq!(raw.liters_or_zero(), 120.0);
    }

    #[test]
    fn test_non_numeric_levels_are_zero() {
        let raw = RawReading {
            gas_level_percentage: Some(json!("full")),
            gas_level_liters: Some(json!({ "value": 3 })),
            ..Default::default()
        };
        assert_eq!(raw.percentage_or_zero(), 0.0);
        assert_eq!(raw.liters_or_zero(), 0.0);
    }

    #[test]
    fn test_deserialize_camel_case_with_nulls() {
        let raw: RawReading = serde_json::from_value(json!({
            "recordedAt": "2024-05-01T12:00:00Z",
            "gasLevelPercentage": null,
            "gasLevelLiters": 264.0,
            "sensorId": 7
        }))
        .unwrap();

        assert_eq!(raw.recorded_at, Some(json!("2024-05-01T12:00:00Z")));
        assert_eq!(raw.percentage_or_zero(), 0.0);
        assert_eq!(raw.liters_or_zero(), 264.0);
    }
}
