//! Typed errors for caller defects.
//!
//! Data-quality problems in a history payload are never errors: they are
//! normalized away by the parser. What lands here is a caller passing
//! something the library cannot interpret at all.

use thiserror::Error;

/// Invalid arguments handed to the library by its caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HistoryError {
    /// Period selector outside `24h`, `7d`, `30d`, `all`.
    #[error("invalid period selector '{0}' (expected one of 24h, 7d, 30d, all)")]
    InvalidPeriod(String),

    /// Time zone string that is neither `local`, `utc`, nor a `±HH:MM` offset.
    #[error("invalid time zone '{0}' (expected local, utc, or an offset like +02:00)")]
    InvalidTimeZone(String),

    /// A configuration value outside its allowed range.
    #[error("invalid configuration value for {field}: {message}")]
    InvalidConfig { field: &'static str, message: String },
}

impl HistoryError {
    pub fn config(field: &'static str, message: impl Into<String>) -> Self {
        HistoryError::InvalidConfig {
            field,
            message: message.into(),
        }
    }
}
