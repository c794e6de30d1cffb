//! Period tracking service.
//!
//! Owns one [`Ledger`] and one [`PeriodStore`]. Each mutation takes the
//! store lock, reloads the stored periods, applies the change to that fresh
//! copy and persists it before committing. A failed save never leaves memory
//! and storage out of step, and another process's write is never discarded.

use crate::{
    CyclePredictor, FertileWindow, Ledger, Period, PeriodStore, PredictionSettings, Result,
};
use chrono::NaiveDate;

pub struct PeriodTracker<S: PeriodStore> {
    ledger: Ledger,
    store: S,
    predictor: CyclePredictor,
}

impl<S: PeriodStore> PeriodTracker<S> {
    /// Hydrate a tracker from the periods already in `store`
    pub fn open(store: S, settings: PredictionSettings) -> Result<Self> {
        let ledger = Ledger::from_periods(store.load_all()?);
        tracing::info!("Opened period tracker with {} periods", ledger.len());
        Ok(Self {
            ledger,
            store,
            predictor: CyclePredictor::new(settings),
        })
    }

    /// Add or replace a period and persist the result
    pub fn add_period(&mut self, period: Period) -> Result<Option<Period>> {
        let _lock = self.store.lock()?;
        let mut next = self.reload()?;
        let replaced = next.add(period)?;
        self.commit(next)?;
        Ok(replaced)
    }

    /// Delete the period sharing `period`'s start date and persist the result
    pub fn delete_period(&mut self, period: &Period) -> Result<Option<Period>> {
        self.delete_starting(period.start_date)
    }

    pub fn delete_starting(&mut self, start_date: NaiveDate) -> Result<Option<Period>> {
        let _lock = self.store.lock()?;
        let mut next = self.reload()?;
        let removed = next.delete_starting(start_date);
        if removed.is_some() {
            self.commit(next)?;
        } else {
            self.ledger = next;
        }
        Ok(removed)
    }

    /// Remove every period from memory and storage
    pub fn clear(&mut self) -> Result<()> {
        let _lock = self.store.lock()?;
        self.store.clear()?;
        self.ledger.clear();
        Ok(())
    }

    /// Current stored state; callers hold the store lock
    fn reload(&self) -> Result<Ledger> {
        Ok(Ledger::from_periods(self.store.load_all()?))
    }

    fn commit(&mut self, next: Ledger) -> Result<()> {
        self.store.save_all(next.as_slice())?;
        self.ledger = next;
        Ok(())
    }

    /// Snapshot of all periods, oldest first
    pub fn periods(&self) -> Vec<Period> {
        self.ledger.all()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn predictor(&self) -> &CyclePredictor {
        &self.predictor
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn average_cycle_length(&self, max_recent_cycles: Option<usize>) -> i64 {
        self.predictor
            .average_cycle_length(self.ledger.as_slice(), max_recent_cycles)
    }

    pub fn average_period_length(&self) -> Result<i64> {
        self.predictor.average_period_length(self.ledger.as_slice())
    }

    pub fn predict_next_period(&self, as_of: NaiveDate) -> Result<NaiveDate> {
        self.predictor
            .predict_next_period(self.ledger.as_slice(), as_of)
    }

    pub fn ovulation_date(&self, as_of: NaiveDate) -> Result<NaiveDate> {
        self.predictor.ovulation_date(self.ledger.as_slice(), as_of)
    }

    pub fn fertile_window(&self, as_of: NaiveDate) -> Result<FertileWindow> {
        self.predictor.fertile_window(self.ledger.as_slice(), as_of)
    }

    pub fn cycle_day(&self, as_of: NaiveDate) -> Result<i64> {
        self.predictor.cycle_day(self.ledger.as_slice(), as_of)
    }
}
