//! Per-record derived metrics.

use serde::Serialize;

use super::AnalyticsContext;
use crate::battery::{efficiency, BatteryHealth};
use crate::record::{FlightRecord, VoltageReading};
use crate::temporal::{parse_date, parse_duration, ParsedDate};

/// Values computed from one record and its model's battery configuration.
///
/// Never stored; recomputed whenever a dashboard is built.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedMetrics<'a> {
    /// The source record.
    pub record: &'a FlightRecord,
    /// Parsed mission date.
    pub date: ParsedDate,
    /// Airborne minutes; `0.0` when unknown.
    pub duration_minutes: f64,
    /// Slot 1 discharge efficiency percentage.
    pub battery1_efficiency: f64,
    /// Slot 2 discharge efficiency percentage.
    pub battery2_efficiency: f64,
    /// Slot 1 voltage consumed.
    pub battery1_used: f64,
    /// Slot 2 voltage consumed.
    pub battery2_used: f64,
    /// Whether the comment reports a problem.
    pub has_issues: bool,
    /// Battery health per slot.
    pub health: BatteryHealth,
    /// Engine run time in hours; `0.0` when absent.
    pub engine_hours: f64,
    /// Fuel consumed; `0.0` when absent.
    pub fuel_used: f64,
}

impl<'a> DerivedMetrics<'a> {
    /// Compute every derived value for a record.
    #[must_use]
    pub fn derive(record: &'a FlightRecord, ctx: &AnalyticsContext) -> Self {
        let config = record
            .drone_model
            .as_deref()
            .and_then(|model| ctx.battery_table.get(model));
        Self {
            record,
            date: parse_date(record.mission_date.as_deref()),
            duration_minutes: record
                .total_flight_time
                .as_deref()
                .map_or(0.0, parse_duration),
            battery1_efficiency: efficiency(record.battery1.takeoff, record.battery1.landing),
            battery2_efficiency: efficiency(record.battery2.takeoff, record.battery2.landing),
            battery1_used: used_voltage(&record.battery1),
            battery2_used: used_voltage(&record.battery2),
            has_issues: record.has_issues(&ctx.no_issue_sentinel),
            health: ctx.analyzer.analyze(record, config),
            engine_hours: record.engine_hours.unwrap_or(0.0),
            fuel_used: record.fuel_used.unwrap_or(0.0),
        }
    }

    /// Calendar month bucket, e.g. `Mar 2025`.
    #[must_use]
    pub fn month(&self) -> Option<&str> {
        self.date.info().map(|info| info.month.as_str())
    }

    /// Day-of-week bucket, e.g. `Sat`.
    #[must_use]
    pub fn day_of_week(&self) -> Option<&str> {
        self.date.info().map(|info| info.day_of_week.as_str())
    }

    /// Quarter bucket, e.g. `Q1 2025`.
    #[must_use]
    pub fn quarter(&self) -> Option<&str> {
        self.date.info().map(|info| info.quarter.as_str())
    }

    /// Mean of the positive slot efficiencies, if any slot has one.
    #[must_use]
    pub fn combined_efficiency(&self) -> Option<f64> {
        (self.battery1_efficiency > 0.0 || self.battery2_efficiency > 0.0)
            .then(|| (self.battery1_efficiency + self.battery2_efficiency) / 2.0)
    }
}

/// Recorded used voltage, or takeoff minus landing when it was left blank.
fn used_voltage(reading: &VoltageReading) -> f64 {
    match (reading.used, reading.takeoff, reading.landing) {
        (Some(used), _, _) => used,
        (None, Some(t), Some(l)) => t - l,
        _ => 0.0,
    }
}

/// Serializable per-record summary used in listings and `show` output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordSummary {
    /// Short date or `Unknown` / `Invalid Date`.
    pub date: String,
    /// Airborne minutes.
    pub duration_minutes: f64,
    /// Slot 1 efficiency percentage.
    pub battery1_efficiency: f64,
    /// Slot 2 efficiency percentage.
    pub battery2_efficiency: f64,
    /// Whether the flight reported a problem.
    pub has_issues: bool,
    /// Battery health per slot.
    pub health: BatteryHealth,
}

impl From<&DerivedMetrics<'_>> for RecordSummary {
    fn from(m: &DerivedMetrics<'_>) -> Self {
        Self {
            date: m.date.short_or_sentinel().to_string(),
            duration_minutes: m.duration_minutes,
            battery1_efficiency: m.battery1_efficiency,
            battery2_efficiency: m.battery2_efficiency,
            has_issues: m.has_issues,
            health: m.health.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battery::HealthStatus;
    use crate::metrics::test_support::{context, record};

    #[test]
    fn test_derive_arsenio_record() {
        let ctx = context();
        let rec = record("2025-03-10", "0:04:40", (12.32, 12.26), (59.41, 53.91), "No issues.");
        let m = DerivedMetrics::derive(&rec, &ctx);

        assert!((m.duration_minutes - 4.666_666).abs() < 1e-4);
        assert!((m.battery1_efficiency - 0.487_012).abs() < 1e-4);
        assert!(!m.has_issues);
        assert_eq!(m.month(), Some("Mar 2025"));
        assert_eq!(m.day_of_week(), Some("Mon"));
        assert_eq!(m.quarter(), Some("Q1 2025"));
        assert_eq!(m.health.slot1.status, HealthStatus::Nominal);
        assert!((m.battery1_used - 0.06).abs() < 1e-9);
    }

    #[test]
    fn test_absent_values_default_to_zero() {
        let ctx = context();
        let rec = FlightRecord::default();
        let m = DerivedMetrics::derive(&rec, &ctx);
        assert_eq!(m.date, ParsedDate::Absent);
        assert!(m.duration_minutes.abs() < f64::EPSILON);
        assert!(m.engine_hours.abs() < f64::EPSILON);
        assert!(m.fuel_used.abs() < f64::EPSILON);
        assert_eq!(m.combined_efficiency(), None);
        assert_eq!(m.health.slot1.status, HealthStatus::NotApplicable);
    }

    #[test]
    fn test_summary_uses_date_sentinel() {
        let ctx = context();
        let rec = FlightRecord {
            mission_date: Some("garbage".to_string()),
            ..FlightRecord::default()
        };
        let summary = RecordSummary::from(&DerivedMetrics::derive(&rec, &ctx));
        assert_eq!(summary.date, "Invalid Date");
    }
}
