//! Dashboard export payload.
//!
//! Field names are camelCase to match the JSON consumers of earlier exports.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::filter::DateWindow;
use super::score::{HealthBand, PerformanceScore};
use super::snapshot::DashboardSnapshot;

/// Headline metrics in the export.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetrics {
    /// Flights in the filtered set.
    pub total_flights: usize,
    /// Sum of flight durations in minutes.
    pub total_flight_time: f64,
    /// Mean flight duration in minutes.
    pub avg_flight_time: f64,
    /// Mean slot 1 efficiency.
    pub avg_battery1_efficiency: f64,
    /// Mean slot 2 efficiency.
    pub avg_battery2_efficiency: f64,
    /// Flights reporting a problem.
    pub flights_with_issues: usize,
    /// Percentage of flights reporting a problem.
    pub issue_rate: f64,
}

/// The filter an export was taken under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportDateRange {
    /// Window code.
    pub selected: DateWindow,
    /// Range label.
    pub label: String,
    /// Flights in range.
    pub count: usize,
}

/// Flat summary block for quick reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSummary {
    /// Range label.
    pub date_range: String,
    /// Flights in the filtered set.
    pub total_flights: usize,
    /// Flights in range.
    pub date_range_count: usize,
    /// Composite score.
    pub performance_score: u8,
    /// Band of the score.
    pub health_status: HealthBand,
}

/// Everything written by a dashboard export.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    /// Composite score.
    pub performance_score: PerformanceScore,
    /// Headline metrics.
    pub metrics: ExportMetrics,
    /// Filter description.
    pub date_range: ExportDateRange,
    /// Model filter name.
    pub drone_model: String,
    /// When the export was taken.
    pub export_date: DateTime<Utc>,
    /// Flat summary.
    pub data_summary: DataSummary,
    /// Every statistic the dashboard shows, under the same filter.
    pub snapshot: DashboardSnapshot,
}

impl ExportPayload {
    /// Build a payload from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &DashboardSnapshot, exported_at: DateTime<Utc>) -> Self {
        let totals = &snapshot.totals;
        let filter = &snapshot.filter;
        Self {
            performance_score: snapshot.score,
            metrics: ExportMetrics {
                total_flights: totals.flights,
                total_flight_time: totals.total_minutes,
                avg_flight_time: totals.avg_minutes,
                avg_battery1_efficiency: totals.avg_battery1_efficiency,
                avg_battery2_efficiency: totals.avg_battery2_efficiency,
                flights_with_issues: totals.flights_with_issues,
                issue_rate: totals.issue_rate,
            },
            date_range: ExportDateRange {
                selected: filter.window,
                label: filter.range_label.clone(),
                count: filter.count,
            },
            drone_model: filter.model.clone(),
            export_date: exported_at,
            data_summary: DataSummary {
                date_range: filter.range_label.clone(),
                total_flights: totals.flights,
                date_range_count: filter.count,
                performance_score: snapshot.score.score,
                health_status: snapshot.score.health,
            },
            snapshot: snapshot.clone(),
        }
    }

    /// Suggested file name, e.g. `flightlog-dashboard-all-models-2025-03-15.json`.
    #[must_use]
    pub fn file_name(&self) -> String {
        let model: String = self
            .drone_model
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        format!(
            "flightlog-dashboard-{model}-{}.json",
            self.export_date.format("%Y-%m-%d")
        )
    }
}
