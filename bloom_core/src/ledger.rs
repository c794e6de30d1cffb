//! The period ledger.
//!
//! Holds every logged period sorted ascending by start date, with at most one
//! entry per start date. Adding a period whose start date is already present
//! replaces the existing entry.

use crate::{Error, Period, Result};
use chrono::NaiveDate;

/// Sorted, start-date-unique collection of periods
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ledger {
    periods: Vec<Period>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from stored periods
    ///
    /// Entries are added one by one, so later duplicates win. Entries with an
    /// end date before their start date are skipped.
    pub fn from_periods<I>(periods: I) -> Self
    where
        I: IntoIterator<Item = Period>,
    {
        let mut ledger = Self::new();
        for period in periods {
            if let Err(e) = ledger.add(period) {
                tracing::warn!("Skipping stored period: {}", e);
            }
        }
        tracing::debug!("Hydrated ledger with {} periods", ledger.len());
        ledger
    }

    /// Insert a period, replacing any entry with the same start date
    ///
    /// Returns the replaced entry. Fails with [`Error::InvalidDateRange`] if
    /// the period ends before it starts, in which case nothing changes.
    pub fn add(&mut self, period: Period) -> Result<Option<Period>> {
        if let Some(end) = period.end_date {
            if end < period.start_date {
                return Err(Error::InvalidDateRange {
                    start: period.start_date,
                    end,
                });
            }
        }

        let replaced = self.take(period.start_date);
        if replaced.is_some() {
            tracing::debug!("Replacing period starting {}", period.start_date);
        }

        self.periods.push(period);
        self.periods.sort_by_key(|p| p.start_date);
        Ok(replaced)
    }

    /// Remove the entry sharing `period`'s start date, if there is one
    pub fn delete(&mut self, period: &Period) -> Option<Period> {
        self.delete_starting(period.start_date)
    }

    /// Remove the entry starting on `start_date`, if there is one
    pub fn delete_starting(&mut self, start_date: NaiveDate) -> Option<Period> {
        let removed = self.take(start_date);
        if removed.is_some() {
            tracing::debug!("Deleted period starting {}", start_date);
        }
        removed
    }

    /// Owned snapshot of all periods, oldest first
    pub fn all(&self) -> Vec<Period> {
        self.periods.clone()
    }

    /// Borrowed view of all periods, oldest first
    pub fn as_slice(&self) -> &[Period] {
        &self.periods
    }

    pub fn get(&self, start_date: NaiveDate) -> Option<&Period> {
        self.position(start_date).map(|idx| &self.periods[idx])
    }

    /// Most recently started period
    pub fn latest(&self) -> Option<&Period> {
        self.periods.last()
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn clear(&mut self) {
        self.periods.clear();
    }

    fn position(&self, start_date: NaiveDate) -> Option<usize> {
        self.periods
            .binary_search_by_key(&start_date, |p| p.start_date)
            .ok()
    }

    fn take(&mut self, start_date: NaiveDate) -> Option<Period> {
        self.position(start_date).map(|idx| self.periods.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn period(start: &str, end: Option<&str>) -> Period {
        Period::new(date(start), end.map(date))
    }

    fn starts(ledger: &Ledger) -> Vec<NaiveDate> {
        ledger.as_slice().iter().map(|p| p.start_date).collect()
    }

    #[test]
    fn test_new_ledger_is_empty() {
        let ledger = Ledger::new();
        assert!(ledger.is_empty());
        assert!(ledger.all().is_empty());
        assert!(ledger.latest().is_none());
    }

    #[test]
    fn test_sorted_regardless_of_insertion_order() {
        let mut ledger = Ledger::new();
        ledger.add(period("2025-03-01", None)).unwrap();
        ledger.add(period("2025-01-01", Some("2025-01-04"))).unwrap();
        ledger.add(period("2025-02-01", None)).unwrap();

        assert_eq!(
            starts(&ledger),
            vec![date("2025-01-01"), date("2025-02-01"), date("2025-03-01")]
        );
        assert_eq!(ledger.latest().unwrap().start_date, date("2025-03-01"));
    }

    #[test]
    fn test_readding_same_start_replaces_entry() {
        let mut ledger = Ledger::new();
        ledger.add(period("2025-01-01", None)).unwrap();
        ledger.add(period("2025-02-01", None)).unwrap();

        let update = period("2025-01-01", Some("2025-01-06"));
        let update_id = update.id;
        let replaced = ledger.add(update).unwrap();

        assert!(replaced.unwrap().end_date.is_none());
        assert_eq!(ledger.len(), 2);
        let entry = ledger.get(date("2025-01-01")).unwrap();
        assert_eq!(entry.end_date, Some(date("2025-01-06")));
        assert_eq!(entry.id, update_id);
    }

    #[test]
    fn test_invalid_range_rejected_and_ledger_unchanged() {
        let mut ledger = Ledger::new();
        ledger.add(period("2025-01-10", Some("2025-01-12"))).unwrap();
        let before = ledger.clone();

        let result = ledger.add(period("2025-01-10", Some("2025-01-05")));

        assert!(matches!(result, Err(Error::InvalidDateRange { .. })));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_same_day_period_is_valid() {
        let mut ledger = Ledger::new();
        assert!(ledger.add(period("2025-01-10", Some("2025-01-10"))).is_ok());
    }

    #[test]
    fn test_overlapping_ranges_are_accepted() {
        let mut ledger = Ledger::new();
        ledger.add(period("2025-01-01", Some("2025-01-10"))).unwrap();
        ledger.add(period("2025-01-05", Some("2025-01-08"))).unwrap();
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_delete_matches_on_start_date() {
        let mut ledger = Ledger::new();
        ledger.add(period("2025-01-01", Some("2025-01-05"))).unwrap();
        ledger.add(period("2025-02-01", None)).unwrap();

        // Different id and end date, same start
        let removed = ledger.delete(&period("2025-01-01", None));

        assert!(removed.is_some());
        assert_eq!(starts(&ledger), vec![date("2025-02-01")]);
    }

    #[test]
    fn test_delete_absent_is_noop() {
        let mut ledger = Ledger::new();
        ledger.add(period("2025-01-01", None)).unwrap();

        assert!(ledger.delete(&period("2025-06-01", None)).is_none());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_all_is_a_snapshot() {
        let mut ledger = Ledger::new();
        ledger.add(period("2025-01-01", None)).unwrap();

        let snapshot = ledger.all();
        ledger.add(period("2025-02-01", None)).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_from_periods_dedups_and_skips_invalid() {
        crate::logging::init_test();

        let ledger = Ledger::from_periods(vec![
            period("2025-03-01", None),
            period("2025-01-01", Some("2025-01-03")),
            period("2025-02-01", Some("2025-01-20")), // invalid
            period("2025-01-01", Some("2025-01-05")), // later duplicate wins
        ]);

        assert_eq!(starts(&ledger), vec![date("2025-01-01"), date("2025-03-01")]);
        assert_eq!(
            ledger.get(date("2025-01-01")).unwrap().end_date,
            Some(date("2025-01-05"))
        );
    }

    #[test]
    fn test_unique_sorted_for_many_inserts() {
        let mut ledger = Ledger::new();
        let base = date("2025-01-01");
        // Scrambled offsets with repeats
        for offset in [40, 3, 17, 3, 88, 40, 0, 56, 17, 21] {
            ledger
                .add(Period::ongoing(base + chrono::Duration::days(offset)))
                .unwrap();
        }

        let dates = starts(&ledger);
        assert_eq!(dates.len(), 7);
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_clear() {
        let mut ledger = Ledger::new();
        ledger.add(period("2025-01-01", None)).unwrap();
        ledger.clear();
        assert!(ledger.is_empty());
    }
}
