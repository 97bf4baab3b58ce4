use anyhow::{Context, Result};
use chrono::FixedOffset;
use chrono_tz::Tz;
use serde::Deserialize;
use std::str::FromStr;

use crate::analyzers::trend::{TREND_THRESHOLD_PCT, TREND_WINDOW, TrendPolicy};
use crate::error::HistoryError;

/// Time zone that hour and day buckets and labels are computed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zone {
    /// The machine's local zone, DST included.
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
    /// An IANA zone such as `Europe/Madrid`, DST included.
    Named(Tz),
}

impl FromStr for Zone {
    type Err = HistoryError;

    /// Accepts `local`, `utc` (or `z`), offsets such as `+02:00` or
    /// `-05:30`, and IANA names such as `America/Bogota`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        match input.to_ascii_lowercase().as_str() {
            "local" => return Ok(Zone::Local),
            "utc" | "z" => return Ok(Zone::Utc),
            _ => {}
        }

        if input.starts_with(['+', '-']) {
            return input
                .parse::<FixedOffset>()
                .map(Zone::Fixed)
                .map_err(|_| HistoryError::InvalidTimeZone(s.to_string()));
        }

        input
            .parse::<Tz>()
            .map(Zone::Named)
            .map_err(|_| HistoryError::InvalidTimeZone(s.to_string()))
    }
}

/// Settings for the CLI, read from an optional JSON file:
///
/// ```json
/// {
///   "api_url": "https://gas.example.com/api",
///   "timezone": "local",
///   "trend_window": 5,
///   "trend_threshold_pct": 5.0
/// }
/// ```
///
/// Every key is optional. The API token is never read from the file; it
/// comes from the environment only.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistoryConfig {
    pub api_url: Option<String>,
    #[serde(skip)]
    pub api_token: Option<String>,
    pub timezone: String,
    pub trend_window: usize,
    pub trend_threshold_pct: f64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_token: None,
            timezone: "local".to_string(),
            trend_window: TREND_WINDOW,
            trend_threshold_pct: TREND_THRESHOLD_PCT,
        }
    }
}

impl HistoryConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{path}'"))?;
        Self::from_json(&content).with_context(|| format!("invalid config file '{path}'"))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Applies `TANK_API_URL`, `TANK_API_TOKEN` and `TANK_TIMEZONE` from
    /// `lookup` on top of the current values.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("TANK_API_URL") {
            self.api_url = Some(url);
        }
        if let Some(token) = lookup("TANK_API_TOKEN") {
            self.api_token = Some(token);
        }
        if let Some(zone) = lookup("TANK_TIMEZONE") {
            self.timezone = zone;
        }
        self
    }

    pub fn trend_policy(&self) -> TrendPolicy {
        TrendPolicy {
            window: self.trend_window,
            threshold_pct: self.trend_threshold_pct,
        }
    }

    pub fn zone(&self) -> Result<Zone, HistoryError> {
        self.timezone.parse()
    }

    pub fn validate(&self) -> Result<(), HistoryError> {
        self.trend_policy().validate()?;
        self.zone()?;
        if let Some(url) = &self.api_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(HistoryError::config(
                    "api_url",
                    format!("expected an http(s) URL, got '{url}'"),
                ));
            }
        }
        Ok(())
    }
}
