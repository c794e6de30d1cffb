//! Error types for the bloom_core library.

use chrono::NaiveDate;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for bloom_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A period ends before it starts
    #[error("Invalid date range: period ends on {end} before it starts on {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// Too few logged periods for the requested prediction
    #[error("Not enough data: need at least {required} logged period(s), have {available}")]
    NotEnoughData { required: usize, available: usize },

    /// A predicted date falls outside the representable calendar
    #[error("Date out of range: {date} shifted by {days} days")]
    DateOutOfRange { date: NaiveDate, days: i64 },

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for the "log more periods" class of failures
    pub fn is_not_enough_data(&self) -> bool {
        matches!(self, Error::NotEnoughData { .. })
    }
}
