//! Dashboard snapshots.
//!
//! A snapshot is rebuilt from scratch on every call: filter, derive, then
//! aggregate. Nothing is cached between calls.

use serde::Serialize;
use tracing::debug;

use super::aggregate::{
    day_of_week, duration_histogram, efficiency_histogram, monthly, top_objectives, BucketStats,
    HistogramBin, PositiveMean,
};
use super::derived::DerivedMetrics;
use super::filter::{DashboardFilter, DateWindow};
use super::score::{performance_score, PerformanceScore};
use super::AnalyticsContext;
use crate::battery::HealthStatus;
use crate::record::FlightRecord;

/// What a snapshot was filtered by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterDescription {
    /// Window code, e.g. `30d`.
    pub window: DateWindow,
    /// Window name, e.g. `Last 30 Days`.
    pub window_label: String,
    /// Covered range, e.g. `Feb 13 - Mar 15, 2025`, or `All Time`.
    pub range_label: String,
    /// Model filter name, e.g. `All Models`.
    pub model: String,
    /// Flights that passed the filter.
    pub count: usize,
}

/// Headline totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    /// Flights in the filtered set.
    pub flights: usize,
    /// Sum of flight durations in minutes.
    pub total_minutes: f64,
    /// Mean flight duration in minutes.
    pub avg_minutes: f64,
    /// Flights reporting a problem.
    pub flights_with_issues: usize,
    /// Percentage of flights reporting a problem.
    pub issue_rate: f64,
    /// Mean slot 1 efficiency over positive values.
    pub avg_battery1_efficiency: f64,
    /// Mean slot 2 efficiency over positive values.
    pub avg_battery2_efficiency: f64,
}

/// A flight that reported a problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueFlight {
    /// Store identifier, if persisted.
    pub id: Option<i64>,
    /// Operator flight identifier.
    pub flight_id: Option<String>,
    /// Short date or sentinel.
    pub date: String,
    /// Airframe model.
    pub drone_model: Option<String>,
    /// The reported problem.
    pub comment: String,
}

/// Fleet-level battery and usage widgets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetSummary {
    /// Flights with a slot at Low Voltage.
    pub batteries_to_replace: usize,
    /// Flights with a slot flagged imbalanced.
    pub batteries_imbalanced: usize,
    /// Pack slots per health status, across both slots of every flight.
    pub status_counts: Vec<(HealthStatus, usize)>,
    /// Flights per configured model, in table order, zero counts included.
    pub flights_per_model: Vec<(String, usize)>,
    /// Sum of engine hours.
    pub total_engine_hours: f64,
    /// Sum of fuel used.
    pub total_fuel_used: f64,
    /// Mean slot 1 used voltage over positive values.
    pub avg_battery1_used: f64,
    /// Mean slot 2 used voltage over positive values.
    pub avg_battery2_used: f64,
    /// Flights reporting a problem, in input order.
    pub issue_flights: Vec<IssueFlight>,
}

/// Slot voltages of one dated flight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoltagePoint {
    /// Short date, e.g. `Mar 8, 2025`.
    pub date: String,
    /// Long date, e.g. `Saturday, March 8, 2025`.
    pub full_date: String,
    /// Slot 1 takeoff voltage, `0.0` when absent.
    pub battery1_takeoff: f64,
    /// Slot 1 landing voltage, `0.0` when absent.
    pub battery1_landing: f64,
    /// Slot 2 takeoff voltage, `0.0` when absent.
    pub battery2_takeoff: f64,
    /// Slot 2 landing voltage, `0.0` when absent.
    pub battery2_landing: f64,
    /// Slot 1 efficiency.
    pub battery1_efficiency: f64,
    /// Slot 2 efficiency.
    pub battery2_efficiency: f64,
    /// Airborne minutes.
    pub duration_minutes: f64,
}

/// Efficiency against flight duration for one flight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EfficiencyPoint {
    /// Operator flight identifier.
    pub flight_id: Option<String>,
    /// Airborne minutes.
    pub duration_minutes: f64,
    /// Slot 1 efficiency.
    pub battery1_efficiency: f64,
    /// Slot 2 efficiency.
    pub battery2_efficiency: f64,
}

/// Slot 1 takeoff against landing voltage for one flight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationPoint {
    /// Operator flight identifier.
    pub flight_id: Option<String>,
    /// Takeoff voltage.
    pub takeoff: f64,
    /// Landing voltage.
    pub landing: f64,
}

/// Point series for charts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    /// Dated flights sorted by date.
    pub battery_voltage: Vec<VoltagePoint>,
    /// Flights with a duration and any positive efficiency.
    pub efficiency_vs_duration: Vec<EfficiencyPoint>,
    /// Flights with positive slot 1 takeoff and landing voltages.
    pub takeoff_vs_landing: Vec<CorrelationPoint>,
}

/// Every dashboard statistic for a filtered flight set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    /// Filter applied.
    pub filter: FilterDescription,
    /// Headline totals.
    pub totals: Totals,
    /// Composite score.
    pub score: PerformanceScore,
    /// Per-month statistics, chronological.
    pub monthly: Vec<BucketStats>,
    /// Per-weekday statistics, Monday first.
    pub day_of_week: Vec<BucketStats>,
    /// Most flown objectives.
    pub objectives: Vec<BucketStats>,
    /// Duration distribution.
    pub duration_histogram: Vec<HistogramBin>,
    /// Per-slot efficiency distribution.
    pub efficiency_histogram: Vec<HistogramBin>,
    /// Fleet widgets.
    pub fleet: FleetSummary,
    /// Chart point series.
    pub charts: ChartSeries,
}

/// Build a snapshot of `records` after filtering.
#[must_use]
pub fn build_snapshot(
    records: &[FlightRecord],
    filter: &DashboardFilter,
    ctx: &AnalyticsContext,
) -> DashboardSnapshot {
    let metrics: Vec<_> = records
        .iter()
        .map(|r| DerivedMetrics::derive(r, ctx))
        .filter(|m| filter.matches(m, ctx.now))
        .collect();
    debug!(
        total = records.len(),
        selected = metrics.len(),
        window = %filter.window,
        "Building dashboard snapshot"
    );

    DashboardSnapshot {
        filter: FilterDescription {
            window: filter.window,
            window_label: filter.window.label().to_string(),
            range_label: filter.window.range_label(ctx.now),
            model: filter.model.label(),
            count: metrics.len(),
        },
        totals: totals(&metrics),
        score: performance_score(&metrics),
        monthly: monthly(&metrics),
        day_of_week: day_of_week(&metrics),
        objectives: top_objectives(&metrics, ctx.top_objectives),
        duration_histogram: duration_histogram(&metrics),
        efficiency_histogram: efficiency_histogram(&metrics),
        fleet: fleet_summary(&metrics, ctx),
        charts: chart_series(&metrics),
    }
}

#[allow(clippy::cast_precision_loss)]
fn totals(metrics: &[DerivedMetrics<'_>]) -> Totals {
    let flights = metrics.len();
    let total_minutes: f64 = metrics.iter().map(|m| m.duration_minutes).sum();
    let flights_with_issues = metrics.iter().filter(|m| m.has_issues).count();
    let mut battery1 = PositiveMean::default();
    let mut battery2 = PositiveMean::default();
    for m in metrics {
        battery1.push(m.battery1_efficiency);
        battery2.push(m.battery2_efficiency);
    }
    let (avg_minutes, issue_rate) = if flights == 0 {
        (0.0, 0.0)
    } else {
        (
            total_minutes / flights as f64,
            flights_with_issues as f64 / flights as f64 * 100.0,
        )
    };
    Totals {
        flights,
        total_minutes,
        avg_minutes,
        flights_with_issues,
        issue_rate,
        avg_battery1_efficiency: battery1.mean(),
        avg_battery2_efficiency: battery2.mean(),
    }
}

/// Fleet widgets over a derived flight set.
#[must_use]
pub fn fleet_summary(metrics: &[DerivedMetrics<'_>], ctx: &AnalyticsContext) -> FleetSummary {
    let mut used1 = PositiveMean::default();
    let mut used2 = PositiveMean::default();
    for m in metrics {
        used1.push(m.battery1_used);
        used2.push(m.battery2_used);
    }

    let flights_per_model = ctx
        .battery_table
        .models()
        .map(|model| {
            let count = metrics
                .iter()
                .filter(|m| {
                    m.record
                        .drone_model
                        .as_deref()
                        .is_some_and(|d| d.trim().eq_ignore_ascii_case(model))
                })
                .count();
            (model.to_string(), count)
        })
        .collect();

    let issue_flights = metrics
        .iter()
        .filter(|m| m.has_issues)
        .map(|m| IssueFlight {
            id: m.record.id,
            flight_id: m.record.flight_id.clone(),
            date: m.date.short_or_sentinel().to_string(),
            drone_model: m.record.drone_model.clone(),
            comment: m.record.comment.clone().unwrap_or_default(),
        })
        .collect();

    FleetSummary {
        batteries_to_replace: metrics
            .iter()
            .filter(|m| m.health.needs_replacement())
            .count(),
        batteries_imbalanced: metrics
            .iter()
            .filter(|m| m.health.is_imbalanced())
            .count(),
        status_counts: status_counts(metrics),
        flights_per_model,
        total_engine_hours: metrics.iter().map(|m| m.engine_hours).sum(),
        total_fuel_used: metrics.iter().map(|m| m.fuel_used).sum(),
        avg_battery1_used: used1.mean(),
        avg_battery2_used: used2.mean(),
        issue_flights,
    }
}

/// Chart point series over a derived flight set.
#[must_use]
pub fn chart_series(metrics: &[DerivedMetrics<'_>]) -> ChartSeries {
    let mut dated: Vec<_> = metrics
        .iter()
        .filter_map(|m| m.date.info().map(|info| (info, m)))
        .collect();
    dated.sort_by_key(|(info, _)| info.timestamp);

    let battery_voltage = dated
        .into_iter()
        .map(|(info, m)| VoltagePoint {
            date: info.short.clone(),
            full_date: info.long.clone(),
            battery1_takeoff: m.record.battery1.takeoff.unwrap_or(0.0),
            battery1_landing: m.record.battery1.landing.unwrap_or(0.0),
            battery2_takeoff: m.record.battery2.takeoff.unwrap_or(0.0),
            battery2_landing: m.record.battery2.landing.unwrap_or(0.0),
            battery1_efficiency: m.battery1_efficiency,
            battery2_efficiency: m.battery2_efficiency,
            duration_minutes: m.duration_minutes,
        })
        .collect();

    let efficiency_vs_duration = metrics
        .iter()
        .filter(|m| m.duration_minutes > 0.0 && m.combined_efficiency().is_some())
        .map(|m| EfficiencyPoint {
            flight_id: m.record.flight_id.clone(),
            duration_minutes: m.duration_minutes,
            battery1_efficiency: m.battery1_efficiency,
            battery2_efficiency: m.battery2_efficiency,
        })
        .collect();

    let takeoff_vs_landing = metrics
        .iter()
        .filter_map(|m| match (m.record.battery1.takeoff, m.record.battery1.landing) {
            (Some(t), Some(l)) if t > 0.0 && l > 0.0 => Some(CorrelationPoint {
                flight_id: m.record.flight_id.clone(),
                takeoff: t,
                landing: l,
            }),
            _ => None,
        })
        .collect();

    ChartSeries {
        battery_voltage,
        efficiency_vs_duration,
        takeoff_vs_landing,
    }
}

/// Count of flights per health status across both slots.
#[must_use]
pub fn status_counts(metrics: &[DerivedMetrics<'_>]) -> Vec<(HealthStatus, usize)> {
    [
        HealthStatus::FullyCharged,
        HealthStatus::Nominal,
        HealthStatus::LowVoltage,
        HealthStatus::Unknown,
        HealthStatus::NotApplicable,
    ]
    .into_iter()
    .map(|status| {
        let count = metrics
            .iter()
            .flat_map(|m| m.health.slots())
            .filter(|slot| slot.status == status)
            .count();
        (status, count)
    })
    .collect()
}
