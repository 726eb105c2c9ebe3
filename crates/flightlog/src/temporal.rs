//! Date and duration parsing.
//!
//! Spreadsheet exports carry mission dates in whatever format the operator
//! typed, and durations as `H:MM:SS`, `H:MM`, or plain minutes. Nothing here
//! fails: unparseable input maps to [`ParsedDate::Invalid`] or to `0.0`.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;

use crate::record::parse_number;

/// Date-only layouts tried in order.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%A, %B %d, %Y",
];

/// Date-time layouts tried in order, after RFC 3339.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Outcome of parsing a mission date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedDate {
    /// No date was supplied.
    Absent,
    /// A date was supplied but could not be understood.
    Invalid,
    /// A usable date.
    Valid(DateInfo),
}

impl ParsedDate {
    /// The parsed date, if any.
    #[must_use]
    pub fn info(&self) -> Option<&DateInfo> {
        match self {
            Self::Valid(info) => Some(info),
            Self::Absent | Self::Invalid => None,
        }
    }

    /// Short display form, or the sentinel used in listings.
    #[must_use]
    pub fn short_or_sentinel(&self) -> &str {
        match self {
            Self::Valid(info) => &info.short,
            Self::Absent => "Unknown",
            Self::Invalid => "Invalid Date",
        }
    }
}

/// Calendar buckets and display forms derived from a mission date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateInfo {
    /// Instant the date denotes; date-only input means midnight UTC.
    pub timestamp: DateTime<Utc>,
    /// `Mar 8, 2025`
    pub short: String,
    /// `Mar 2025`
    pub month: String,
    /// `Sat`
    pub day_of_week: String,
    /// `Q1 2025`
    pub quarter: String,
    /// `Saturday, March 8, 2025`
    pub long: String,
}

impl DateInfo {
    fn from_timestamp(timestamp: DateTime<Utc>) -> Self {
        let quarter = timestamp.month0() / 3 + 1;
        Self {
            short: timestamp.format("%b %-d, %Y").to_string(),
            month: timestamp.format("%b %Y").to_string(),
            day_of_week: timestamp.format("%a").to_string(),
            quarter: format!("Q{quarter} {}", timestamp.year()),
            long: timestamp.format("%A, %B %-d, %Y").to_string(),
            timestamp,
        }
    }

    /// The calendar date.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// First day of the month bucket, for chronological ordering.
    #[must_use]
    pub fn month_start(&self) -> NaiveDate {
        self.date().with_day(1).unwrap_or_else(|| self.date())
    }
}

/// Parse a mission date.
///
/// `None` and blank strings are [`ParsedDate::Absent`]; anything else that no
/// known layout accepts is [`ParsedDate::Invalid`].
#[must_use]
pub fn parse_date(raw: Option<&str>) -> ParsedDate {
    let Some(s) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return ParsedDate::Absent;
    };
    parse_timestamp(s).map_or(ParsedDate::Invalid, |ts| {
        ParsedDate::Valid(DateInfo::from_timestamp(ts))
    })
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.and_utc());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

/// Normalize a date cell to ISO `YYYY-MM-DD`.
///
/// Returns the trimmed input unchanged when it does not parse, so the record
/// still carries what the operator typed.
#[must_use]
pub fn normalize_date(raw: &str) -> String {
    match parse_date(Some(raw)) {
        ParsedDate::Valid(info) => info.date().format("%Y-%m-%d").to_string(),
        ParsedDate::Absent | ParsedDate::Invalid => raw.trim().to_string(),
    }
}

/// Convert a spreadsheet serial day number to a date.
///
/// Serial 1 is 1900-01-01 in the 1900 date system; the epoch below absorbs
/// the phantom 1900-02-29.
#[must_use]
pub fn date_from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    #[allow(clippy::cast_possible_truncation)]
    let days = serial.floor() as i64;
    epoch.checked_add_signed(Duration::try_days(days)?)
}

/// Parse a flight duration into minutes.
///
/// `H:MM:SS` and `H:MM` convert each unit to minutes; anything else is read
/// as decimal minutes. Unparseable input yields `0.0`, which callers must read
/// as "unknown or zero".
#[must_use]
pub fn parse_duration(raw: &str) -> f64 {
    let s = raw.trim();
    if s.contains(':') {
        let parts: Option<Vec<f64>> = s.split(':').map(|p| p.trim().parse::<f64>().ok()).collect();
        return match parts.as_deref() {
            Some([h, m, sec]) => h * 60.0 + m + sec / 60.0,
            Some([h, m]) => h * 60.0 + m,
            _ => 0.0,
        };
    }
    parse_number(s).unwrap_or(0.0)
}

/// Format minutes as `H:MM:SS`, rounding to the nearest second.
#[must_use]
pub fn format_duration(minutes: f64) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total = (minutes.max(0.0) * 60.0).round() as u64;
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

/// Parse a wall-clock time such as `10:05`, `16:52:53`, or `4:52 PM`.
#[must_use]
pub fn parse_clock(raw: &str) -> Option<NaiveTime> {
    let s = raw.trim();
    let upper = s.to_ascii_uppercase();
    if upper.ends_with("AM") || upper.ends_with("PM") {
        let compact = upper.replace(' ', "");
        return ["%I:%M:%S%p", "%I:%M%p"]
            .iter()
            .find_map(|f| NaiveTime::parse_from_str(&compact, f).ok());
    }
    ["%H:%M:%S", "%H:%M"]
        .iter()
        .find_map(|f| NaiveTime::parse_from_str(s, f).ok())
}

/// Elapsed time between takeoff and landing clock times as `HH:MM:SS`.
///
/// A landing earlier than takeoff is an overnight flight and wraps by 24h.
#[must_use]
pub fn flight_time_between(takeoff: &str, landing: &str) -> Option<String> {
    let start = parse_clock(takeoff)?;
    let end = parse_clock(landing)?;
    let mut secs = (end - start).num_seconds();
    if secs < 0 {
        secs += 24 * 3600;
    }
    Some(format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    ))
}
