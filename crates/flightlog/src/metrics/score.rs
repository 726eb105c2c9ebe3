//! Composite performance score.
//!
//! Blends the issue-free rate (40%), a battery component equal to twice the
//! mean discharge efficiency (40%), and the mean efficiency itself capped at
//! 100 (20%).

use serde::{Deserialize, Serialize};

use super::aggregate::PositiveMean;
use super::derived::DerivedMetrics;

/// Qualitative band for a performance score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthBand {
    /// 85 and above.
    Excellent,
    /// 75 to 84.
    Good,
    /// 60 to 74.
    Poor,
    /// Below 60.
    Critical,
    /// No flights to score.
    Unknown,
}

impl HealthBand {
    /// Band for a score.
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=59 => Self::Critical,
            60..=74 => Self::Poor,
            75..=84 => Self::Good,
            _ => Self::Excellent,
        }
    }
}

impl std::fmt::Display for HealthBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Poor => "poor",
            Self::Critical => "critical",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A scored flight set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceScore {
    /// Composite score in `0..=100`.
    pub score: u8,
    /// Band of the score.
    pub health: HealthBand,
    /// Issue-free percentage component.
    pub issue_component: f64,
    /// Battery component (twice the mean efficiency).
    pub battery_component: f64,
    /// Efficiency component (mean efficiency, capped at 100).
    pub efficiency_component: f64,
}

impl PerformanceScore {
    /// The score of an empty set.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            score: 0,
            health: HealthBand::Unknown,
            issue_component: 0.0,
            battery_component: 0.0,
            efficiency_component: 0.0,
        }
    }
}

/// Score a flight set.
#[must_use]
pub fn performance_score(metrics: &[DerivedMetrics<'_>]) -> PerformanceScore {
    if metrics.is_empty() {
        return PerformanceScore::empty();
    }

    let mut battery1 = PositiveMean::default();
    let mut battery2 = PositiveMean::default();
    let mut issues = 0usize;
    for m in metrics {
        battery1.push(m.battery1_efficiency);
        battery2.push(m.battery2_efficiency);
        if m.has_issues {
            issues += 1;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let issue_rate = issues as f64 / metrics.len() as f64 * 100.0;
    let avg_efficiency = (battery1.mean() + battery2.mean()) / 2.0;

    let issue_component = (100.0 - issue_rate).max(0.0);
    let battery_component = avg_efficiency * 2.0;
    let efficiency_component = avg_efficiency.min(100.0);

    let raw = 0.4 * issue_component + 0.4 * battery_component + 0.2 * efficiency_component;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let score = raw.round().clamp(0.0, 100.0) as u8;

    PerformanceScore {
        score,
        health: HealthBand::from_score(score),
        issue_component,
        battery_component,
        efficiency_component,
    }
}
