//! Core domain types for Bloom.
//!
//! - Periods (one logged occurrence, optionally still ongoing)
//! - Fertile windows derived by the predictor

use chrono::{DateTime, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Period
// ============================================================================

/// A single logged period.
///
/// Dates are calendar dates, so time of day never takes part in comparisons.
/// Inside a [`Ledger`](crate::Ledger) an entry is identified by its
/// `start_date`; the `id` is only a stable handle for storage.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Period {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl Period {
    /// Create a new period with a fresh id
    pub fn new(start_date: NaiveDate, end_date: Option<NaiveDate>) -> Self {
        Self {
            id: Uuid::new_v4(),
            start_date,
            end_date,
        }
    }

    /// Create a period that has started but not yet ended
    pub fn ongoing(start_date: NaiveDate) -> Self {
        Self::new(start_date, None)
    }

    /// Create a period from timestamps, keeping only their local calendar date
    pub fn from_datetimes<Tz: TimeZone>(start: DateTime<Tz>, end: Option<DateTime<Tz>>) -> Self {
        Self::new(start.date_naive(), end.map(|e| e.date_naive()))
    }

    pub fn is_ongoing(&self) -> bool {
        self.end_date.is_none()
    }

    /// Whether the end date (if any) is not before the start date
    pub fn has_valid_range(&self) -> bool {
        self.end_date.map_or(true, |end| end >= self.start_date)
    }

    /// Inclusive day count, or `ongoing_days` when the period has no end date
    pub fn duration_days(&self, ongoing_days: i64) -> i64 {
        match self.end_date {
            Some(end) => (end - self.start_date).num_days() + 1,
            None => ongoing_days,
        }
    }
}

// ============================================================================
// Prediction results
// ============================================================================

/// Inclusive range of dates considered fertile
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FertileWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FertileWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}
