//! Cycle predictions over a ledger snapshot.
//!
//! Every operation is a pure function of the periods passed in and, where
//! relevant, an as-of date:
//! - Average cycle length falls back to the configured default (28 days)
//! - Everything else fails with [`Error::NotEnoughData`] instead of guessing
//!
//! Averages are rounded half-up to whole days.

use crate::{Error, FertileWindow, Period, PredictionSettings, Result};
use chrono::{Duration, NaiveDate};

/// Stateless predictor parameterised by domain constants
#[derive(Clone, Debug, Default)]
pub struct CyclePredictor {
    settings: PredictionSettings,
}

impl CyclePredictor {
    pub fn new(settings: PredictionSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PredictionSettings {
        &self.settings
    }

    /// Mean gap in days between consecutive period starts
    ///
    /// With fewer than two periods the default cycle length is returned.
    /// `max_recent_cycles` restricts the average to the most recent entries;
    /// a window of one or less has no gaps to average, so all entries are used.
    pub fn average_cycle_length(
        &self,
        snapshot: &[Period],
        max_recent_cycles: Option<usize>,
    ) -> i64 {
        if snapshot.len() < 2 {
            return self.settings.default_cycle_length;
        }

        let starts = sorted_starts(snapshot);
        let window = match max_recent_cycles {
            Some(k) if k >= 2 && k < starts.len() => &starts[starts.len() - k..],
            _ => &starts[..],
        };

        let gaps: Vec<i64> = window
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).num_days())
            .collect();

        round_half_up(gaps.iter().sum(), gaps.len())
    }

    /// Mean period duration in days, counting ongoing periods at the fallback length
    pub fn average_period_length(&self, snapshot: &[Period]) -> Result<i64> {
        require(snapshot, 1)?;

        let total: i64 = snapshot
            .iter()
            .map(|p| p.duration_days(self.settings.ongoing_period_days))
            .sum();

        Ok(round_half_up(total, snapshot.len()))
    }

    /// First predicted period start on or after `as_of`
    ///
    /// Steps forward from the latest logged start one average cycle at a
    /// time, so a stale ledger still yields an upcoming date. Fails with
    /// [`Error::DateOutOfRange`] if the walk runs off the calendar.
    pub fn predict_next_period(&self, snapshot: &[Period], as_of: NaiveDate) -> Result<NaiveDate> {
        let latest = latest_start(snapshot)?;

        // Duplicate starts in a raw snapshot can average to zero
        let cycle_length = self.average_cycle_length(snapshot, None).max(1);

        let mut candidate = latest;
        while candidate < as_of {
            candidate = shift(candidate, cycle_length)?;
        }

        tracing::debug!(
            "Predicted next period {} (latest start {}, cycle {} days, as of {})",
            candidate,
            latest,
            cycle_length,
            as_of
        );
        Ok(candidate)
    }

    /// Predicted ovulation: the luteal phase length before the next period
    pub fn ovulation_date(&self, snapshot: &[Period], as_of: NaiveDate) -> Result<NaiveDate> {
        require(snapshot, 2)?;
        let next_period = self.predict_next_period(snapshot, as_of)?;
        shift(next_period, self.settings.luteal_phase_days.saturating_neg())
    }

    /// Dates within the configured margin of the predicted ovulation
    pub fn fertile_window(&self, snapshot: &[Period], as_of: NaiveDate) -> Result<FertileWindow> {
        let ovulation = self.ovulation_date(snapshot, as_of)?;
        let margin = self.settings.fertile_window_margin_days;
        Ok(FertileWindow {
            start: shift(ovulation, margin.saturating_neg())?,
            end: shift(ovulation, margin)?,
        })
    }

    /// 1-based day of the current cycle, counted from the latest start
    ///
    /// Not clamped: an `as_of` before the latest start yields zero or a
    /// negative day.
    pub fn cycle_day(&self, snapshot: &[Period], as_of: NaiveDate) -> Result<i64> {
        let latest = latest_start(snapshot)?;
        Ok((as_of - latest).num_days() + 1)
    }
}

/// `date` moved by `days`, or [`Error::DateOutOfRange`] past the calendar limits
fn shift(date: NaiveDate, days: i64) -> Result<NaiveDate> {
    Duration::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or(Error::DateOutOfRange { date, days })
}

fn require(snapshot: &[Period], required: usize) -> Result<()> {
    if snapshot.len() < required {
        return Err(Error::NotEnoughData {
            required,
            available: snapshot.len(),
        });
    }
    Ok(())
}

fn latest_start(snapshot: &[Period]) -> Result<NaiveDate> {
    snapshot
        .iter()
        .map(|p| p.start_date)
        .max()
        .ok_or(Error::NotEnoughData {
            required: 1,
            available: 0,
        })
}

fn sorted_starts(snapshot: &[Period]) -> Vec<NaiveDate> {
    let mut starts: Vec<NaiveDate> = snapshot.iter().map(|p| p.start_date).collect();
    starts.sort_unstable();
    starts
}

/// `total / count` rounded to the nearest integer, halves rounding up
fn round_half_up(total: i64, count: usize) -> i64 {
    let count = count as i64;
    (2 * total + count).div_euclid(2 * count)
}
