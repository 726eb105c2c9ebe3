//! Bucketed aggregation and histograms.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::derived::DerivedMetrics;

/// Day-of-week buckets in display order.
pub const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Objective bucket for records with no objective.
pub const UNKNOWN_OBJECTIVE: &str = "Unknown";

/// Statistics for one group of flights.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketStats {
    /// Bucket label: month, weekday, or objective.
    pub label: String,
    /// Flights in the bucket.
    pub flights: usize,
    /// Sum of flight durations in minutes.
    pub total_minutes: f64,
    /// Mean flight duration in minutes.
    pub avg_minutes: f64,
    /// Flights reporting a problem.
    pub issues: usize,
    /// Percentage of flights reporting a problem.
    pub issue_rate: f64,
    /// Mean of per-flight combined efficiency, over flights with any.
    pub avg_efficiency: f64,
    /// Mean slot 1 efficiency over positive values.
    pub avg_battery1_efficiency: f64,
    /// Mean slot 2 efficiency over positive values.
    pub avg_battery2_efficiency: f64,
}

/// Running mean over positive samples.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PositiveMean {
    sum: f64,
    count: usize,
}

impl PositiveMean {
    pub(crate) fn push(&mut self, value: f64) {
        if value > 0.0 {
            self.sum += value;
            self.count += 1;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn mean(self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Accumulator {
    flights: usize,
    minutes: f64,
    issues: usize,
    combined: PositiveMean,
    battery1: PositiveMean,
    battery2: PositiveMean,
}

impl Accumulator {
    fn push(&mut self, m: &DerivedMetrics<'_>) {
        self.flights += 1;
        self.minutes += m.duration_minutes;
        if m.has_issues {
            self.issues += 1;
        }
        if let Some(combined) = m.combined_efficiency() {
            self.combined.push(combined);
        }
        self.battery1.push(m.battery1_efficiency);
        self.battery2.push(m.battery2_efficiency);
    }

    #[allow(clippy::cast_precision_loss)]
    fn finish(self, label: String) -> BucketStats {
        let (avg_minutes, issue_rate) = if self.flights == 0 {
            (0.0, 0.0)
        } else {
            let n = self.flights as f64;
            (self.minutes / n, self.issues as f64 / n * 100.0)
        };
        BucketStats {
            label,
            flights: self.flights,
            total_minutes: self.minutes,
            avg_minutes,
            issues: self.issues,
            issue_rate,
            avg_efficiency: self.combined.mean(),
            avg_battery1_efficiency: self.battery1.mean(),
            avg_battery2_efficiency: self.battery2.mean(),
        }
    }
}

/// Per-month statistics in chronological order. Undated flights are left out.
#[must_use]
pub fn monthly(metrics: &[DerivedMetrics<'_>]) -> Vec<BucketStats> {
    let mut months: HashMap<NaiveDate, (String, Accumulator)> = HashMap::new();
    for m in metrics {
        if let Some(info) = m.date.info() {
            months
                .entry(info.month_start())
                .or_insert_with(|| (info.month.clone(), Accumulator::default()))
                .1
                .push(m);
        }
    }
    let mut ordered: Vec<_> = months.into_iter().collect();
    ordered.sort_by_key(|(start, _)| *start);
    ordered
        .into_iter()
        .map(|(_, (label, acc))| acc.finish(label))
        .collect()
}

/// Per-weekday statistics, Monday first. Every weekday is present.
#[must_use]
pub fn day_of_week(metrics: &[DerivedMetrics<'_>]) -> Vec<BucketStats> {
    let mut days: [Accumulator; 7] = Default::default();
    for m in metrics {
        if let Some(i) = m
            .day_of_week()
            .and_then(|d| WEEKDAYS.iter().position(|w| *w == d))
        {
            days[i].push(m);
        }
    }
    days.into_iter()
        .zip(WEEKDAYS)
        .map(|(acc, day)| acc.finish(day.to_string()))
        .collect()
}

/// The `limit` most flown objectives by count.
///
/// Ties keep first-encountered order. Missing objectives group as `Unknown`.
#[must_use]
pub fn top_objectives(metrics: &[DerivedMetrics<'_>], limit: usize) -> Vec<BucketStats> {
    let mut order: Vec<(String, Accumulator)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for m in metrics {
        let objective = m
            .record
            .mission_objective
            .clone()
            .unwrap_or_else(|| UNKNOWN_OBJECTIVE.to_string());
        let i = *index.entry(objective.clone()).or_insert_with(|| {
            order.push((objective, Accumulator::default()));
            order.len() - 1
        });
        order[i].1.push(m);
    }
    order.sort_by(|a, b| b.1.flights.cmp(&a.1.flights));
    order
        .into_iter()
        .take(limit)
        .map(|(label, acc)| acc.finish(label))
        .collect()
}

/// One histogram bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistogramBin {
    /// Range label such as `5-10 min`.
    pub label: String,
    /// Count for slot 1, or for the whole flight in single-series histograms.
    pub count: usize,
    /// Count for slot 2 in per-slot histograms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<usize>,
}

const DURATION_BINS: [(&str, f64, f64); 5] = [
    ("0-5 min", 0.0, 5.0),
    ("5-10 min", 5.0, 10.0),
    ("10-15 min", 10.0, 15.0),
    ("15-20 min", 15.0, 20.0),
    ("20+ min", 20.0, f64::INFINITY),
];

const EFFICIENCY_BINS: [(&str, f64); 5] = [
    ("0-10%", 10.0),
    ("10-20%", 20.0),
    ("20-30%", 30.0),
    ("30-40%", 40.0),
    ("40%+", f64::INFINITY),
];

/// Flight-duration histogram; lower bounds inclusive.
#[must_use]
pub fn duration_histogram(metrics: &[DerivedMetrics<'_>]) -> Vec<HistogramBin> {
    DURATION_BINS
        .iter()
        .map(|&(label, min, max)| HistogramBin {
            label: label.to_string(),
            count: metrics
                .iter()
                .filter(|m| m.duration_minutes >= min && m.duration_minutes < max)
                .count(),
            secondary: None,
        })
        .collect()
}

fn efficiency_bin(eff: f64) -> usize {
    EFFICIENCY_BINS
        .iter()
        .position(|&(_, upper)| eff <= upper)
        .unwrap_or(EFFICIENCY_BINS.len() - 1)
}

/// Efficiency histogram per slot over positive efficiencies; upper bounds
/// inclusive.
#[must_use]
pub fn efficiency_histogram(metrics: &[DerivedMetrics<'_>]) -> Vec<HistogramBin> {
    let mut slot1 = [0usize; 5];
    let mut slot2 = [0usize; 5];
    for m in metrics {
        if m.battery1_efficiency > 0.0 {
            slot1[efficiency_bin(m.battery1_efficiency)] += 1;
        }
        if m.battery2_efficiency > 0.0 {
            slot2[efficiency_bin(m.battery2_efficiency)] += 1;
        }
    }
    EFFICIENCY_BINS
        .iter()
        .enumerate()
        .map(|(i, &(label, _))| HistogramBin {
            label: label.to_string(),
            count: slot1[i],
            secondary: Some(slot2[i]),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_support::{context, record};

    #[test]
    fn test_monthly_is_chronological() {
        let ctx = context();
        let records = vec![
            record("2025-03-10", "0:10:00", (12.0, 11.0), (0.0, 0.0), "No issues."),
            record("2024-12-01", "0:20:00", (12.0, 11.0), (0.0, 0.0), "Bent prop."),
            record("2025-03-20", "0:30:00", (0.0, 0.0), (0.0, 0.0), ""),
            record("", "0:30:00", (0.0, 0.0), (0.0, 0.0), ""),
        ];
        let metrics = ctx.derive_all(&records);
        let months = monthly(&metrics);

        let labels: Vec<_> = months.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Dec 2024", "Mar 2025"]);
        assert_eq!(months[0].issues, 1);
        assert!((months[0].issue_rate - 100.0).abs() < 1e-9);
        assert_eq!(months[1].flights, 2);
        assert!((months[1].avg_minutes - 20.0).abs() < 1e-9);
        // Only the first March flight has a positive slot 1 efficiency.
        assert!((months[1].avg_battery1_efficiency - 100.0 / 12.0).abs() < 1e-9);
        assert!(months[1].avg_battery2_efficiency.abs() < f64::EPSILON);
    }

    #[test]
    fn test_day_of_week_has_all_days_in_order() {
        let ctx = context();
        // 2025-03-10 is a Monday, 2025-03-16 a Sunday.
        let records = vec![
            record("2025-03-10", "0:05:00", (0.0, 0.0), (0.0, 0.0), ""),
            record("2025-03-16", "0:05:00", (0.0, 0.0), (0.0, 0.0), ""),
            record("2025-03-16", "0:05:00", (0.0, 0.0), (0.0, 0.0), ""),
        ];
        let days = day_of_week(&ctx.derive_all(&records));
        assert_eq!(days.len(), 7);
        assert_eq!(days[0].label, "Mon");
        assert_eq!(days[0].flights, 1);
        assert_eq!(days[6].label, "Sun");
        assert_eq!(days[6].flights, 2);
        assert_eq!(days[3].flights, 0);
    }

    #[test]
    fn test_top_objectives_ties_keep_first_seen() {
        let ctx = context();
        let mut records = Vec::new();
        for objective in ["QLOITER", "FBWA", "AUTO", "FBWA", "QLOITER", "RTL", "X", "Y"] {
            let mut r = record("2025-03-10", "0:05:00", (0.0, 0.0), (0.0, 0.0), "");
            r.mission_objective = Some(objective.to_string());
            records.push(r);
        }
        records.push(record("2025-03-10", "0:05:00", (0.0, 0.0), (0.0, 0.0), ""));
        let top = top_objectives(&ctx.derive_all(&records), 5);

        let labels: Vec<_> = top.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["QLOITER", "FBWA", "AUTO", "RTL", "X"]);
    }

    #[test]
    fn test_missing_objective_groups_as_unknown() {
        let ctx = context();
        let records = vec![record("2025-03-10", "0:05:00", (0.0, 0.0), (0.0, 0.0), "")];
        let top = top_objectives(&ctx.derive_all(&records), 5);
        assert_eq!(top[0].label, UNKNOWN_OBJECTIVE);
    }

    #[test]
    fn test_objective_efficiency_uses_slot_mean() {
        let ctx = context();
        let mut r = record("2025-03-10", "0:05:00", (10.0, 9.0), (0.0, 0.0), "");
        r.mission_objective = Some("FBWA".to_string());
        let records = vec![r];
        let top = top_objectives(&ctx.derive_all(&records), 5);
        assert!((top[0].avg_efficiency - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_duration_histogram_lower_bound_inclusive() {
        let ctx = context();
        let records: Vec<_> = ["0:00:00", "0:04:59", "0:05:00", "0:19:59", "0:20:00", "1:00:00"]
            .iter()
            .map(|d| record("2025-03-10", d, (0.0, 0.0), (0.0, 0.0), ""))
            .collect();
        let bins = duration_histogram(&ctx.derive_all(&records));
        let counts: Vec<_> = bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 1, 0, 1, 2]);
    }

    #[test]
    fn test_efficiency_histogram_upper_bound_inclusive() {
        let ctx = context();
        // Slot 1 efficiencies: 10%, 10.5%, 40%, 41%; slot 2: none.
        let records: Vec<_> = [(100.0, 90.0), (100.0, 89.5), (100.0, 60.0), (100.0, 59.0)]
            .iter()
            .map(|&b1| record("2025-03-10", "0:05:00", b1, (0.0, 0.0), ""))
            .collect();
        let bins = efficiency_histogram(&ctx.derive_all(&records));
        let slot1: Vec<_> = bins.iter().map(|b| b.count).collect();
        assert_eq!(slot1, vec![1, 1, 0, 1, 1]);
        assert!(bins.iter().all(|b| b.secondary == Some(0)));
    }
}
