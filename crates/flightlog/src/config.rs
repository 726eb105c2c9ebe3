//! Configuration management for flightlog.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults. The
//! fleet's battery table lives here too, as `[[battery.models]]` rows.

use std::collections::HashSet;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::battery::{
    default_battery_models, BatteryConfig, BatteryTable, DEFAULT_IMBALANCE_THRESHOLD,
};
use crate::error::{Error, Result};
use crate::ingest::DEFAULT_PREVIEW_ROWS;
use crate::metrics::{DEFAULT_NO_ISSUE_SENTINEL, DEFAULT_TOP_OBJECTIVES};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "flightlog";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "flights.db";

/// Environment variable prefix. Nested keys are separated by `__`, e.g.
/// `FLIGHTLOG_ANALYTICS__NO_ISSUE_SENTINEL`.
const ENV_PREFIX: &str = "FLIGHTLOG_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FLIGHTLOG_`)
/// 2. TOML config file at `~/.config/flightlog/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Dashboard analytics configuration.
    pub analytics: AnalyticsConfig,
    /// Spreadsheet import configuration.
    pub import: ImportConfig,
    /// Fleet battery table.
    pub battery: FleetConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/flightlog/flights.db`
    pub database_path: Option<PathBuf>,
}

/// Analytics-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Comment text meaning "no issues", compared case-insensitively.
    pub no_issue_sentinel: String,
    /// Per-cell takeoff/landing delta (volts) above which imbalance is flagged.
    pub imbalance_threshold_volts: f64,
    /// Number of objectives in the top-objectives breakdown.
    pub top_objectives: usize,
}

/// Import-related configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Number of header candidate rows offered.
    pub preview_rows: usize,
    /// CSV field delimiter.
    pub delimiter: char,
}

/// The fleet's battery configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// One row per drone model.
    pub models: Vec<BatteryConfig>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            no_issue_sentinel: DEFAULT_NO_ISSUE_SENTINEL.to_string(),
            imbalance_threshold_volts: DEFAULT_IMBALANCE_THRESHOLD,
            top_objectives: DEFAULT_TOP_OBJECTIVES,
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            preview_rows: DEFAULT_PREVIEW_ROWS,
            delimiter: ',',
        }
    }
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            models: default_battery_models(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing, or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| -> Result<()> { Err(Error::ConfigValidation { message }) };

        let threshold = self.analytics.imbalance_threshold_volts;
        if !threshold.is_finite() || threshold <= 0.0 {
            return invalid(format!(
                "imbalance_threshold_volts must be greater than 0 (got {threshold})"
            ));
        }
        if self.analytics.top_objectives == 0 {
            return invalid("top_objectives must be greater than 0".to_string());
        }
        if self.import.preview_rows == 0 {
            return invalid("preview_rows must be greater than 0".to_string());
        }
        if !self.import.delimiter.is_ascii() {
            return invalid(format!(
                "delimiter must be a single ASCII character (got '{}')",
                self.import.delimiter
            ));
        }

        let mut seen = HashSet::new();
        for row in &self.battery.models {
            let key = row.model.trim().to_lowercase();
            if key.is_empty() {
                return invalid("battery model name cannot be empty".to_string());
            }
            if !seen.insert(key) {
                return invalid(format!("duplicate battery model: {}", row.model));
            }
            if row.slot1_cells == 0 || row.slot2_cells == Some(0) {
                return invalid(format!(
                    "cell counts for {} must be greater than 0",
                    row.model
                ));
            }
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Build the battery lookup table.
    #[must_use]
    pub fn battery_table(&self) -> BatteryTable {
        BatteryTable::new(self.battery.models.clone())
    }

    /// The CSV delimiter as a byte.
    #[must_use]
    pub fn delimiter(&self) -> u8 {
        u8::try_from(self.import.delimiter).unwrap_or(b',')
    }
}
