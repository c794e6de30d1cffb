#![forbid(unsafe_code)]

//! Core domain model and cycle math for Bloom.
//!
//! This crate provides:
//! - Domain types (periods, fertile windows)
//! - The period ledger (sorted, deduplicated by start date)
//! - The cycle predictor (averages, next period, ovulation, fertile window)
//! - Persistence (JSON file store) and the tracker service tying both together

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod ledger;
pub mod predictor;
pub mod store;
pub mod tracker;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::{Config, PredictionSettings};
pub use ledger::Ledger;
pub use predictor::CyclePredictor;
pub use store::{JsonFileStore, MemoryStore, PeriodStore, StoreLock};
pub use tracker::PeriodTracker;
