//! Canonical flight record types.
//!
//! This module defines the fixed field catalogue every import maps into, and
//! the [`FlightRecord`] entity built from it. Absent values are always `None`;
//! an empty string never reaches a record.

use serde::{Deserialize, Serialize};

/// How a canonical field's raw cell value is coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Free text, kept trimmed.
    Text,
    /// A calendar date, normalized to ISO `YYYY-MM-DD` when parseable.
    Date,
    /// A clock time or duration string such as `0:12:45`.
    Time,
    /// A decimal quantity (voltage, fuel, hours).
    Numeric,
}

/// One of the fixed target names a source column may be mapped to.
///
/// The catalogue order is the contract order: [`CanonicalField::ALL`] lists
/// the fields exactly as consumers see them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    /// Airframe model, e.g. `Arsenio 004`.
    DroneModel,
    /// Date the mission was flown.
    MissionDate,
    /// What the flight was for.
    MissionObjective,
    /// Operator-assigned flight identifier.
    FlightId,
    /// Wall-clock takeoff time.
    TakeoffTime,
    /// Wall-clock landing time.
    LandingTime,
    /// Airborne duration.
    TotalFlightTime,
    /// Engine run time in hours.
    EngineHours,
    /// Fuel level before the flight.
    FuelBefore,
    /// Fuel level after the flight.
    FuelAfter,
    /// Fuel consumed.
    FuelUsed,
    /// Battery slot 1 voltage at takeoff.
    Battery1Takeoff,
    /// Battery slot 1 voltage at landing.
    Battery1Landing,
    /// Battery slot 1 voltage consumed.
    Battery1Used,
    /// Battery slot 2 voltage at takeoff.
    Battery2Takeoff,
    /// Battery slot 2 voltage at landing.
    Battery2Landing,
    /// Battery slot 2 voltage consumed.
    Battery2Used,
    /// Free-text remarks; drives the issue flag.
    Comment,
}

impl CanonicalField {
    /// The full catalogue in contract order.
    pub const ALL: [Self; 18] = [
        Self::DroneModel,
        Self::MissionDate,
        Self::MissionObjective,
        Self::FlightId,
        Self::TakeoffTime,
        Self::LandingTime,
        Self::TotalFlightTime,
        Self::EngineHours,
        Self::FuelBefore,
        Self::FuelAfter,
        Self::FuelUsed,
        Self::Battery1Takeoff,
        Self::Battery1Landing,
        Self::Battery1Used,
        Self::Battery2Takeoff,
        Self::Battery2Landing,
        Self::Battery2Used,
        Self::Comment,
    ];

    /// The canonical column name imports are matched against.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::DroneModel => "DRONE MODEL",
            Self::MissionDate => "MISSION DATE",
            Self::MissionObjective => "MISSION OBJECTIVE",
            Self::FlightId => "FLIGHT ID",
            Self::TakeoffTime => "TAKE-OFF TIME",
            Self::LandingTime => "LANDING TIME",
            Self::TotalFlightTime => "TOTAL FLIGHT TIME",
            Self::EngineHours => "ENGINE TIME (HOURS)",
            Self::FuelBefore => "FUEL LEVEL BEFORE FLIGHT",
            Self::FuelAfter => "FUEL LEVEL AFTER FLIGHT",
            Self::FuelUsed => "FUEL USED",
            Self::Battery1Takeoff => "BATTERY 1 (S) TAKE-OFF VOLTAGE",
            Self::Battery1Landing => "BATTERY 1 (S) LANDING VOLTAGE",
            Self::Battery1Used => "BATTERY 1 (S) VOLTAGE USED",
            Self::Battery2Takeoff => "BATTERY 2 (S) TAKE-OFF VOLTAGE",
            Self::Battery2Landing => "BATTERY 2 (S) LANDING VOLTAGE",
            Self::Battery2Used => "BATTERY 2 (S) VOLTAGE USED",
            Self::Comment => "COMMENT",
        }
    }

    /// Human-readable label used in validation messages and listings.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::DroneModel => "Drone Model",
            Self::MissionDate => "Mission Date",
            Self::MissionObjective => "Mission Objective",
            Self::FlightId => "Flight ID",
            Self::TakeoffTime => "Take-off Time",
            Self::LandingTime => "Landing Time",
            Self::TotalFlightTime => "Total Flight Time",
            Self::EngineHours => "Engine Hours",
            Self::FuelBefore => "Fuel Before",
            Self::FuelAfter => "Fuel After",
            Self::FuelUsed => "Fuel Used",
            Self::Battery1Takeoff => "Battery 1 Take-off V",
            Self::Battery1Landing => "Battery 1 Landing V",
            Self::Battery1Used => "Battery 1 Used V",
            Self::Battery2Takeoff => "Battery 2 Take-off V",
            Self::Battery2Landing => "Battery 2 Landing V",
            Self::Battery2Used => "Battery 2 Used V",
            Self::Comment => "Comment",
        }
    }

    /// Column name in the record store.
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            Self::DroneModel => "drone_model",
            Self::MissionDate => "mission_date",
            Self::MissionObjective => "mission_objective",
            Self::FlightId => "flight_id",
            Self::TakeoffTime => "takeoff_time",
            Self::LandingTime => "landing_time",
            Self::TotalFlightTime => "total_flight_time",
            Self::EngineHours => "engine_time_hours",
            Self::FuelBefore => "fuel_level_before_flight",
            Self::FuelAfter => "fuel_level_after_flight",
            Self::FuelUsed => "fuel_used",
            Self::Battery1Takeoff => "battery1_takeoff_voltage",
            Self::Battery1Landing => "battery1_landing_voltage",
            Self::Battery1Used => "battery1_voltage_used",
            Self::Battery2Takeoff => "battery2_takeoff_voltage",
            Self::Battery2Landing => "battery2_landing_voltage",
            Self::Battery2Used => "battery2_voltage_used",
            Self::Comment => "comment",
        }
    }

    /// How raw cells targeting this field are coerced.
    #[must_use]
    pub fn kind(self) -> FieldKind {
        match self {
            Self::DroneModel | Self::MissionObjective | Self::FlightId | Self::Comment => {
                FieldKind::Text
            }
            Self::MissionDate => FieldKind::Date,
            Self::TakeoffTime | Self::LandingTime | Self::TotalFlightTime => FieldKind::Time,
            Self::EngineHours
            | Self::FuelBefore
            | Self::FuelAfter
            | Self::FuelUsed
            | Self::Battery1Takeoff
            | Self::Battery1Landing
            | Self::Battery1Used
            | Self::Battery2Takeoff
            | Self::Battery2Landing
            | Self::Battery2Used => FieldKind::Numeric,
        }
    }

    /// Fields a manually entered record must carry.
    #[must_use]
    pub fn is_required_on_entry(self) -> bool {
        matches!(
            self,
            Self::MissionDate | Self::MissionObjective | Self::FlightId
        )
    }

    /// Resolve a canonical name, snake-case identifier, or column name.
    ///
    /// Matching is case-insensitive and whitespace-tolerant. Import header
    /// aliases are handled by the column mapper, not here.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let wanted = name.split_whitespace().collect::<Vec<_>>().join(" ");
        Self::ALL.into_iter().find(|field| {
            field.name().eq_ignore_ascii_case(&wanted)
                || field.column().eq_ignore_ascii_case(&wanted)
                || serde_json::to_value(field)
                    .ok()
                    .and_then(|v| v.as_str().map(|s| s.eq_ignore_ascii_case(&wanted)))
                    .unwrap_or(false)
        })
    }
}

impl std::fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A coerced field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Text, date, or time value.
    Text(String),
    /// Numeric value.
    Number(f64),
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Takeoff, landing, and consumed voltage for one battery slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VoltageReading {
    /// Pack voltage at takeoff.
    pub takeoff: Option<f64>,
    /// Pack voltage at landing.
    pub landing: Option<f64>,
    /// Voltage consumed during the flight.
    pub used: Option<f64>,
}

/// A canonical flight record, one per flight mission.
///
/// Edits replace the whole record; there is no partial update path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    /// Identifier assigned by the record store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Airframe model name.
    pub drone_model: Option<String>,
    /// ISO `YYYY-MM-DD` when the source parsed, otherwise the raw text.
    pub mission_date: Option<String>,
    /// What the flight was for.
    pub mission_objective: Option<String>,
    /// Operator flight identifier. Not unique; duplicates are allowed.
    pub flight_id: Option<String>,
    /// Wall-clock takeoff time as entered.
    pub takeoff_time: Option<String>,
    /// Wall-clock landing time as entered.
    pub landing_time: Option<String>,
    /// Airborne duration, usually `H:MM:SS`.
    pub total_flight_time: Option<String>,
    /// Engine run time in hours.
    pub engine_hours: Option<f64>,
    /// Fuel level before the flight.
    pub fuel_before: Option<f64>,
    /// Fuel level after the flight.
    pub fuel_after: Option<f64>,
    /// Fuel consumed.
    pub fuel_used: Option<f64>,
    /// Battery slot 1 voltages.
    pub battery1: VoltageReading,
    /// Battery slot 2 voltages.
    pub battery2: VoltageReading,
    /// Free-text remarks.
    pub comment: Option<String>,
}

impl FlightRecord {
    /// Read a field as a [`FieldValue`].
    #[must_use]
    pub fn get(&self, field: CanonicalField) -> Option<FieldValue> {
        match field.kind() {
            FieldKind::Numeric => self.number(field).map(FieldValue::Number),
            FieldKind::Text | FieldKind::Date | FieldKind::Time => {
                self.text(field).map(|s| FieldValue::Text(s.to_string()))
            }
        }
    }

    /// Overwrite a field. Empty text is stored as `None`.
    ///
    /// A number written to a text field is stored as its decimal form; text
    /// written to a numeric field is parsed, and stored as `None` if that
    /// fails.
    pub fn set(&mut self, field: CanonicalField, value: Option<FieldValue>) {
        match field.kind() {
            FieldKind::Numeric => {
                let number = match value {
                    Some(FieldValue::Number(n)) => Some(n),
                    Some(FieldValue::Text(s)) => parse_number(&s),
                    None => None,
                };
                *self.number_slot_mut(field) = number;
            }
            FieldKind::Text | FieldKind::Date | FieldKind::Time => {
                let text = value
                    .map(|v| v.to_string().trim().to_string())
                    .filter(|s| !s.is_empty());
                *self.text_slot_mut(field) = text;
            }
        }
    }

    /// Whether the comment reports a problem.
    ///
    /// A non-blank comment counts as an issue unless it equals `no_issue`
    /// case-insensitively.
    #[must_use]
    pub fn has_issues(&self, no_issue: &str) -> bool {
        self.comment.as_deref().is_some_and(|c| {
            let c = c.trim();
            !c.is_empty() && !c.eq_ignore_ascii_case(no_issue.trim())
        })
    }

    /// The voltage reading for battery slot 1 or 2.
    #[must_use]
    pub fn battery(&self, slot: BatterySlot) -> &VoltageReading {
        match slot {
            BatterySlot::One => &self.battery1,
            BatterySlot::Two => &self.battery2,
        }
    }

    /// Case-insensitive substring match across every populated field.
    #[must_use]
    pub fn matches_search(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        CanonicalField::ALL.into_iter().any(|field| {
            self.get(field)
                .is_some_and(|v| v.to_string().to_lowercase().contains(&needle))
        })
    }

    fn text(&self, field: CanonicalField) -> Option<&str> {
        match field {
            CanonicalField::DroneModel => self.drone_model.as_deref(),
            CanonicalField::MissionDate => self.mission_date.as_deref(),
            CanonicalField::MissionObjective => self.mission_objective.as_deref(),
            CanonicalField::FlightId => self.flight_id.as_deref(),
            CanonicalField::TakeoffTime => self.takeoff_time.as_deref(),
            CanonicalField::LandingTime => self.landing_time.as_deref(),
            CanonicalField::TotalFlightTime => self.total_flight_time.as_deref(),
            CanonicalField::Comment => self.comment.as_deref(),
            _ => None,
        }
    }

    fn number(&self, field: CanonicalField) -> Option<f64> {
        match field {
            CanonicalField::EngineHours => self.engine_hours,
            CanonicalField::FuelBefore => self.fuel_before,
            CanonicalField::FuelAfter => self.fuel_after,
            CanonicalField::FuelUsed => self.fuel_used,
            CanonicalField::Battery1Takeoff => self.battery1.takeoff,
            CanonicalField::Battery1Landing => self.battery1.landing,
            CanonicalField::Battery1Used => self.battery1.used,
            CanonicalField::Battery2Takeoff => self.battery2.takeoff,
            CanonicalField::Battery2Landing => self.battery2.landing,
            CanonicalField::Battery2Used => self.battery2.used,
            _ => None,
        }
    }

    fn text_slot_mut(&mut self, field: CanonicalField) -> &mut Option<String> {
        match field {
            CanonicalField::DroneModel => &mut self.drone_model,
            CanonicalField::MissionDate => &mut self.mission_date,
            CanonicalField::MissionObjective => &mut self.mission_objective,
            CanonicalField::FlightId => &mut self.flight_id,
            CanonicalField::TakeoffTime => &mut self.takeoff_time,
            CanonicalField::LandingTime => &mut self.landing_time,
            CanonicalField::TotalFlightTime => &mut self.total_flight_time,
            _ => &mut self.comment,
        }
    }

    fn number_slot_mut(&mut self, field: CanonicalField) -> &mut Option<f64> {
        match field {
            CanonicalField::EngineHours => &mut self.engine_hours,
            CanonicalField::FuelBefore => &mut self.fuel_before,
            CanonicalField::FuelAfter => &mut self.fuel_after,
            CanonicalField::FuelUsed => &mut self.fuel_used,
            CanonicalField::Battery1Takeoff => &mut self.battery1.takeoff,
            CanonicalField::Battery1Landing => &mut self.battery1.landing,
            CanonicalField::Battery1Used => &mut self.battery1.used,
            CanonicalField::Battery2Takeoff => &mut self.battery2.takeoff,
            CanonicalField::Battery2Landing => &mut self.battery2.landing,
            _ => &mut self.battery2.used,
        }
    }
}

/// One of the two battery slots an airframe may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BatterySlot {
    /// Primary (avionics) pack.
    One,
    /// Secondary (propulsion) pack, absent on single-battery models.
    Two,
}

impl BatterySlot {
    /// Both slots in order.
    pub const BOTH: [Self; 2] = [Self::One, Self::Two];
}

/// Parse a decimal number leniently.
///
/// Accepts a leading numeric prefix the way spreadsheet users type values
/// (`12.3V`, ` 59.43 `). Returns `None` when no digits lead the string.
#[must_use]
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if let Ok(n) = s.parse::<f64>() {
        return n.is_finite().then_some(n);
    }
    let end = s
        .char_indices()
        .take_while(|(i, c)| {
            c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '-' || *c == '+'))
        })
        .map(|(i, c)| i + c.len_utf8())
        .last()?;
    s[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_order_and_size() {
        assert_eq!(CanonicalField::ALL.len(), 18);
        assert_eq!(CanonicalField::ALL[0], CanonicalField::DroneModel);
        assert_eq!(CanonicalField::ALL[17], CanonicalField::Comment);
    }

    #[test]
    fn test_catalogue_names_are_unique() {
        let mut names: Vec<_> = CanonicalField::ALL.iter().map(|f| f.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CanonicalField::ALL.len());
    }

    #[test]
    fn test_parse_field_by_name_column_and_ident() {
        assert_eq!(
            CanonicalField::parse("flight id"),
            Some(CanonicalField::FlightId)
        );
        assert_eq!(
            CanonicalField::parse("battery1_landing_voltage"),
            Some(CanonicalField::Battery1Landing)
        );
        assert_eq!(
            CanonicalField::parse("battery2_takeoff"),
            Some(CanonicalField::Battery2Takeoff)
        );
        assert_eq!(CanonicalField::parse("altitude"), None);
    }

    #[test]
    fn test_set_empty_text_is_none() {
        let mut record = FlightRecord::default();
        record.set(
            CanonicalField::Comment,
            Some(FieldValue::Text("   ".to_string())),
        );
        assert!(record.comment.is_none());
    }

    #[test]
    fn test_set_numeric_from_text() {
        let mut record = FlightRecord::default();
        record.set(
            CanonicalField::Battery1Takeoff,
            Some(FieldValue::Text("12.32".to_string())),
        );
        assert_eq!(record.battery1.takeoff, Some(12.32));

        record.set(
            CanonicalField::Battery1Takeoff,
            Some(FieldValue::Text("NIL".to_string())),
        );
        assert_eq!(record.battery1.takeoff, None);
    }

    #[test]
    fn test_set_text_from_number() {
        let mut record = FlightRecord::default();
        record.set(CanonicalField::FlightId, Some(FieldValue::Number(42.0)));
        assert_eq!(record.flight_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_get_round_trips_every_field() {
        let mut record = FlightRecord::default();
        for field in CanonicalField::ALL {
            let value = match field.kind() {
                FieldKind::Numeric => FieldValue::Number(1.5),
                _ => FieldValue::Text("x".to_string()),
            };
            record.set(field, Some(value.clone()));
            assert_eq!(record.get(field), Some(value), "field {field}");
        }
    }

    #[test]
    fn test_has_issues() {
        let mut record = FlightRecord::default();
        assert!(!record.has_issues("no issues."));

        record.comment = Some("No Issues.".to_string());
        assert!(!record.has_issues("no issues."));

        record.comment = Some("Boom tip clipped off.".to_string());
        assert!(record.has_issues("no issues."));
    }

    #[test]
    fn test_matches_search() {
        let record = FlightRecord {
            flight_id: Some("BRIECHUAS_14032025_1005".to_string()),
            mission_objective: Some("FBWA".to_string()),
            ..FlightRecord::default()
        };
        assert!(record.matches_search("fbwa"));
        assert!(record.matches_search("14032025"));
        assert!(!record.matches_search("qloiter"));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("12.30"), Some(12.3));
        assert_eq!(parse_number(" 59.43 "), Some(59.43));
        assert_eq!(parse_number("12.3V"), Some(12.3));
        assert_eq!(parse_number("-0.5"), Some(-0.5));
        assert_eq!(parse_number("NIL"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_record_serialization_skips_missing_id() {
        let record = FlightRecord::default();
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("\"id\""));
    }
}
