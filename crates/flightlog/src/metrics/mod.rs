//! Dashboard analytics.
//!
//! Everything here is a pure function of a record set plus an
//! [`AnalyticsContext`]. The context carries what would otherwise be global:
//! the battery table, the no-issue sentinel, and the clock.

pub mod aggregate;
pub mod derived;
pub mod export;
pub mod filter;
pub mod score;
pub mod snapshot;

pub use aggregate::{BucketStats, HistogramBin};
pub use derived::{DerivedMetrics, RecordSummary};
pub use export::ExportPayload;
pub use filter::{known_family, DashboardFilter, DateWindow, ModelFilter, RecordQuery, FAMILIES};
pub use score::{performance_score, HealthBand, PerformanceScore};
pub use snapshot::{build_snapshot, DashboardSnapshot, FleetSummary};

use chrono::{DateTime, Utc};

use crate::battery::{BatteryAnalyzer, BatteryTable, DEFAULT_IMBALANCE_THRESHOLD};
use crate::config::Config;

/// Default sentinel comment meaning "nothing to report".
pub const DEFAULT_NO_ISSUE_SENTINEL: &str = "no issues.";

/// Default number of objectives in the top-objectives breakdown.
pub const DEFAULT_TOP_OBJECTIVES: usize = 5;

/// Inputs every analytics computation shares.
#[derive(Debug, Clone)]
pub struct AnalyticsContext {
    /// Model-to-battery reference table.
    pub battery_table: BatteryTable,
    /// Comment that does not count as an issue.
    pub no_issue_sentinel: String,
    /// Battery health classifier.
    pub analyzer: BatteryAnalyzer,
    /// Size of the top-objectives breakdown.
    pub top_objectives: usize,
    /// The instant date windows end at.
    pub now: DateTime<Utc>,
}

impl AnalyticsContext {
    /// Create a context with default thresholds.
    #[must_use]
    pub fn new(battery_table: BatteryTable, now: DateTime<Utc>) -> Self {
        Self {
            battery_table,
            no_issue_sentinel: DEFAULT_NO_ISSUE_SENTINEL.to_string(),
            analyzer: BatteryAnalyzer::new(DEFAULT_IMBALANCE_THRESHOLD),
            top_objectives: DEFAULT_TOP_OBJECTIVES,
            now,
        }
    }

    /// Create a context from loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config, now: DateTime<Utc>) -> Self {
        Self {
            battery_table: config.battery_table(),
            no_issue_sentinel: config.analytics.no_issue_sentinel.clone(),
            analyzer: BatteryAnalyzer::new(config.analytics.imbalance_threshold_volts),
            top_objectives: config.analytics.top_objectives,
            now,
        }
    }

    /// Derive metrics for every record, unfiltered.
    #[must_use]
    pub fn derive_all<'a>(
        &self,
        records: &'a [crate::record::FlightRecord],
    ) -> Vec<DerivedMetrics<'a>> {
        records
            .iter()
            .map(|r| DerivedMetrics::derive(r, self))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::TimeZone;

    use super::*;
    use crate::battery::default_battery_models;
    use crate::record::{FlightRecord, VoltageReading};

    /// Context pinned to 2025-03-15 12:00 UTC with the default fleet.
    pub fn context() -> AnalyticsContext {
        let now = Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap();
        AnalyticsContext::new(BatteryTable::new(default_battery_models()), now)
    }

    /// An `Arsenio 004` record with no objective; empty strings mean absent.
    pub fn record(
        date: &str,
        duration: &str,
        battery1: (f64, f64),
        battery2: (f64, f64),
        comment: &str,
    ) -> FlightRecord {
        let text = |s: &str| Some(s.to_string()).filter(|s| !s.is_empty());
        FlightRecord {
            drone_model: Some("Arsenio 004".to_string()),
            mission_date: text(date),
            flight_id: Some(format!("F-{date}")),
            total_flight_time: text(duration),
            battery1: VoltageReading {
                takeoff: Some(battery1.0),
                landing: Some(battery1.1),
                used: None,
            },
            battery2: VoltageReading {
                takeoff: Some(battery2.0),
                landing: Some(battery2.1),
                used: None,
            },
            comment: text(comment),
            ..FlightRecord::default()
        }
    }
}
