//! Date-window and model filters.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::derived::DerivedMetrics;
use crate::record::FlightRecord;

/// Model families in the fleet.
pub const FAMILIES: [&str; 4] = ["Arsenio", "Argini", "Damisa", "Xander"];

/// The canonical spelling of a fleet family, matched case-insensitively.
#[must_use]
pub fn known_family(name: &str) -> Option<&'static str> {
    FAMILIES
        .into_iter()
        .find(|family| family.eq_ignore_ascii_case(name.trim()))
}

/// A trailing date window ending now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateWindow {
    /// Last 30 days.
    #[serde(rename = "30d")]
    Last30Days,
    /// Last 90 days.
    #[serde(rename = "90d")]
    Last90Days,
    /// Last 180 days.
    #[serde(rename = "6m")]
    Last6Months,
    /// Last 365 days.
    #[serde(rename = "1y")]
    LastYear,
    /// No date restriction.
    #[default]
    #[serde(rename = "all")]
    AllTime,
}

impl DateWindow {
    /// Every window, narrowest first.
    pub const ALL: [Self; 5] = [
        Self::Last30Days,
        Self::Last90Days,
        Self::Last6Months,
        Self::LastYear,
        Self::AllTime,
    ];

    /// Short code: `30d`, `90d`, `6m`, `1y`, `all`.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Last30Days => "30d",
            Self::Last90Days => "90d",
            Self::Last6Months => "6m",
            Self::LastYear => "1y",
            Self::AllTime => "all",
        }
    }

    /// Display name such as `Last 30 Days`.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Last30Days => "Last 30 Days",
            Self::Last90Days => "Last 90 Days",
            Self::Last6Months => "Last 6 Months",
            Self::LastYear => "Last Year",
            Self::AllTime => "All Time",
        }
    }

    /// Window length; `None` for [`DateWindow::AllTime`].
    #[must_use]
    pub fn length(self) -> Option<Duration> {
        let days = match self {
            Self::Last30Days => 30,
            Self::Last90Days => 90,
            Self::Last6Months => 180,
            Self::LastYear => 365,
            Self::AllTime => return None,
        };
        Duration::try_days(days)
    }

    /// Earliest included instant for a window ending at `now`.
    #[must_use]
    pub fn start(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.length().map(|len| now - len)
    }

    /// Whether a record dated `date` falls in `[now - window, now]`.
    ///
    /// Undated records pass only [`DateWindow::AllTime`].
    #[must_use]
    pub fn contains(self, date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match (self.start(now), date) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(start), Some(ts)) => start <= ts && ts <= now,
        }
    }

    /// Human-readable range: `All Time` or `Feb 13 - Mar 15, 2025`.
    #[must_use]
    pub fn range_label(self, now: DateTime<Utc>) -> String {
        match self.start(now) {
            None => "All Time".to_string(),
            Some(start) => format!(
                "{} - {}",
                start.format("%b %-d"),
                now.format("%b %-d, %Y")
            ),
        }
    }
}

impl std::str::FromStr for DateWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|w| w.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown date window '{s}' (expected 30d, 90d, 6m, 1y, all)"))
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Restricts records by airframe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFilter {
    /// Every model.
    #[default]
    All,
    /// One model, matched case-insensitively on the trimmed name.
    Model(String),
    /// A family, matched as a case-insensitive model-name prefix.
    Family(String),
}

impl ModelFilter {
    /// Whether a record passes the filter.
    #[must_use]
    pub fn matches(&self, record: &FlightRecord) -> bool {
        let model = record.drone_model.as_deref().map(str::trim);
        match self {
            Self::All => true,
            Self::Model(wanted) => model.is_some_and(|m| m.eq_ignore_ascii_case(wanted.trim())),
            Self::Family(family) => model.is_some_and(|m| {
                m.to_lowercase()
                    .starts_with(&family.trim().to_lowercase())
            }),
        }
    }

    /// Display name for reports.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::All => "All Models".to_string(),
            Self::Model(m) => m.clone(),
            Self::Family(f) => format!("{f} family"),
        }
    }
}

/// Everything that narrows a dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardFilter {
    /// Date window.
    pub window: DateWindow,
    /// Model restriction.
    pub model: ModelFilter,
    /// Restrict to flights with this flight ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight_id: Option<String>,
}

impl DashboardFilter {
    /// Whether a record passes the model and flight filters.
    #[must_use]
    pub fn matches_record(&self, record: &FlightRecord) -> bool {
        self.model.matches(record)
            && self
                .flight_id
                .as_deref()
                .map_or(true, |id| record.flight_id.as_deref() == Some(id))
    }

    /// Whether derived metrics pass every filter, the date window included.
    #[must_use]
    pub fn matches(&self, metrics: &DerivedMetrics<'_>, now: DateTime<Utc>) -> bool {
        self.matches_record(metrics.record)
            && self
                .window
                .contains(metrics.date.info().map(|info| info.timestamp), now)
    }
}

/// Listing filter used by record browsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordQuery {
    /// Case-insensitive substring across every field.
    pub search: Option<String>,
    /// Model restriction.
    pub model: ModelFilter,
}

impl RecordQuery {
    /// Whether a record passes.
    #[must_use]
    pub fn matches(&self, record: &FlightRecord) -> bool {
        self.model.matches(record)
            && self
                .search
                .as_deref()
                .map_or(true, |q| record.matches_search(q))
    }

    /// Keep matching records, in order.
    #[must_use]
    pub fn apply<'a>(&self, records: &'a [FlightRecord]) -> Vec<&'a FlightRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
    }

    fn model(name: &str) -> FlightRecord {
        FlightRecord {
            drone_model: Some(name.to_string()),
            ..FlightRecord::default()
        }
    }

    #[test]
    fn test_thirty_day_boundary_is_inclusive() {
        let now = now();
        let edge = now - Duration::days(30);
        assert!(DateWindow::Last30Days.contains(Some(edge), now));
        assert!(!DateWindow::Last30Days.contains(Some(edge - Duration::seconds(1)), now));
        assert!(DateWindow::Last30Days.contains(Some(now), now));
        assert!(!DateWindow::Last30Days.contains(Some(now + Duration::seconds(1)), now));
    }

    #[test]
    fn test_undated_records_only_in_all_time() {
        assert!(DateWindow::AllTime.contains(None, now()));
        assert!(!DateWindow::LastYear.contains(None, now()));
    }

    #[test]
    fn test_six_months_is_180_days() {
        assert_eq!(DateWindow::Last6Months.length(), Some(Duration::days(180)));
        assert_eq!(DateWindow::LastYear.length(), Some(Duration::days(365)));
        assert_eq!(DateWindow::AllTime.length(), None);
    }

    #[test]
    fn test_range_label() {
        assert_eq!(
            DateWindow::Last30Days.range_label(now()),
            "Feb 13 - Mar 15, 2025"
        );
        assert_eq!(DateWindow::AllTime.range_label(now()), "All Time");
    }

    #[test]
    fn test_window_codes_parse() {
        assert_eq!("6m".parse::<DateWindow>(), Ok(DateWindow::Last6Months));
        assert_eq!("ALL".parse::<DateWindow>(), Ok(DateWindow::AllTime));
        assert!("2w".parse::<DateWindow>().is_err());
    }

    #[test]
    fn test_model_filter() {
        let record = model("Arsenio 004");
        assert!(ModelFilter::All.matches(&record));
        assert!(ModelFilter::Model("ARSENIO 004".to_string()).matches(&record));
        assert!(!ModelFilter::Model("Arsenio 003".to_string()).matches(&record));
        assert!(ModelFilter::Family("arsenio".to_string()).matches(&record));
        assert!(!ModelFilter::Family("Xander".to_string()).matches(&record));
        assert!(!ModelFilter::Family("Arsenio".to_string()).matches(&FlightRecord::default()));
    }

    #[test]
    fn test_known_family() {
        assert_eq!(known_family(" xander "), Some("Xander"));
        assert_eq!(known_family("ARGINI"), Some("Argini"));
        assert_eq!(known_family("Arsenio 004"), None);
    }

    #[test]
    fn test_record_query_combines_search_and_family() {
        let mut a = model("Arsenio 004");
        a.mission_objective = Some("FBWA".to_string());
        let mut b = model("Xander 001");
        b.mission_objective = Some("FBWA".to_string());
        let records = vec![a, b];

        let query = RecordQuery {
            search: Some("fbwa".to_string()),
            model: ModelFilter::Family("Xander".to_string()),
        };
        let hits = query.apply(&records);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].drone_model.as_deref(), Some("Xander 001"));
    }

    #[test]
    fn test_flight_id_filter() {
        let mut record = model("Arsenio 004");
        record.flight_id = Some("F1".to_string());
        let filter = DashboardFilter {
            flight_id: Some("F1".to_string()),
            ..DashboardFilter::default()
        };
        assert!(filter.matches_record(&record));
        record.flight_id = Some("F2".to_string());
        assert!(!filter.matches_record(&record));
    }
}
