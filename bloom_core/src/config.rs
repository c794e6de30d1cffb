//! Configuration file support for Bloom.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/bloom/config.toml`, or from
//! the file named by `BLOOM_CONFIG` when that variable is set.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location
pub const CONFIG_ENV_VAR: &str = "BLOOM_CONFIG";

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub prediction: PredictionSettings,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Domain constants used by the cycle predictor
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PredictionSettings {
    /// Cycle length assumed until two periods are logged
    #[serde(default = "default_cycle_length")]
    pub default_cycle_length: i64,

    /// Duration counted for a period without an end date
    #[serde(default = "default_ongoing_period_days")]
    pub ongoing_period_days: i64,

    /// Days between ovulation and the next period start
    #[serde(default = "default_luteal_phase_days")]
    pub luteal_phase_days: i64,

    /// Days on either side of ovulation counted as fertile
    #[serde(default = "default_fertile_window_margin_days")]
    pub fertile_window_margin_days: i64,

    /// Window for the averaged cycle length shown in the overview
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_cycles: Option<usize>,
}

impl Default for PredictionSettings {
    fn default() -> Self {
        Self {
            default_cycle_length: default_cycle_length(),
            ongoing_period_days: default_ongoing_period_days(),
            luteal_phase_days: default_luteal_phase_days(),
            fertile_window_margin_days: default_fertile_window_margin_days(),
            recent_cycles: None,
        }
    }
}

impl PredictionSettings {
    /// Longest accepted default cycle length, in days
    pub const MAX_CYCLE_LENGTH: i64 = 365;

    /// Longest accepted duration or offset setting, in days
    pub const MAX_PHASE_DAYS: i64 = 60;

    /// Reject values that would make predictions meaningless
    pub fn validate(&self) -> Result<()> {
        check_range(
            "default_cycle_length",
            self.default_cycle_length,
            1,
            Self::MAX_CYCLE_LENGTH,
        )?;
        check_range(
            "ongoing_period_days",
            self.ongoing_period_days,
            1,
            Self::MAX_PHASE_DAYS,
        )?;
        check_range(
            "luteal_phase_days",
            self.luteal_phase_days,
            0,
            Self::MAX_PHASE_DAYS,
        )?;
        check_range(
            "fertile_window_margin_days",
            self.fertile_window_margin_days,
            0,
            Self::MAX_PHASE_DAYS,
        )?;
        if self.recent_cycles == Some(0) {
            return Err(Error::Config("recent_cycles must be at least 1".into()));
        }
        Ok(())
    }
}

fn check_range(name: &str, value: i64, min: i64, max: i64) -> Result<()> {
    if value < min || value > max {
        return Err(Error::Config(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )));
    }
    Ok(())
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("bloom")
}

fn default_cycle_length() -> i64 {
    28
}

fn default_ongoing_period_days() -> i64 {
    5
}

fn default_luteal_phase_days() -> i64 {
    14
}

fn default_fertile_window_margin_days() -> i64 {
    5
}

impl Config {
    /// Load configuration from `BLOOM_CONFIG` or the standard config path
    pub fn load() -> Result<Self> {
        let config_path = std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_config_path);

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.prediction.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("bloom").join("config.toml")
    }

    /// Path of the period store inside a data directory
    pub fn periods_path(data_dir: &Path) -> PathBuf {
        data_dir.join("periods.json")
    }
}
