//! Manual flight entry.
//!
//! Unlike batch import, records typed in by an operator must carry a mission
//! date, objective, and flight ID. Derived columns the operator leaves blank
//! are filled in from the values they did give.

use tracing::debug;

use crate::error::{Error, Result};
use crate::record::{
    parse_number, CanonicalField, FieldKind, FieldValue, FlightRecord, VoltageReading,
};
use crate::temporal::{flight_time_between, parse_date, ParsedDate};

/// Check that every field required on entry is present.
///
/// # Errors
///
/// Returns [`Error::MissingField`] naming the first missing field in
/// catalogue order, or [`Error::InvalidField`] if the mission date does not
/// parse.
pub fn validate_entry(record: &FlightRecord) -> Result<()> {
    for field in CanonicalField::ALL {
        if field.is_required_on_entry() && record.get(field).is_none() {
            return Err(Error::MissingField {
                field: field.label(),
            });
        }
    }
    if let ParsedDate::Invalid = parse_date(record.mission_date.as_deref()) {
        return Err(Error::invalid_field(
            CanonicalField::MissionDate.label(),
            "not a recognised date",
        ));
    }
    Ok(())
}

/// Fill derived fields.
///
/// Total flight time is recomputed whenever both clock times parse. Used
/// voltage is computed for a slot only when it was left blank.
pub fn complete_entry(record: &mut FlightRecord) {
    if let (Some(takeoff), Some(landing)) = (&record.takeoff_time, &record.landing_time) {
        if let Some(total) = flight_time_between(takeoff, landing) {
            debug!(%total, "Computed total flight time");
            record.total_flight_time = Some(total);
        }
    }
    fill_used(&mut record.battery1);
    fill_used(&mut record.battery2);
}

fn fill_used(reading: &mut VoltageReading) {
    if reading.used.is_some() {
        return;
    }
    if let (Some(t), Some(l)) = (reading.takeoff, reading.landing) {
        reading.used = Some(((t - l) * 100.0).round() / 100.0);
    }
}

/// Validate and complete a manually entered record.
///
/// The mission date is normalized to ISO form.
///
/// # Errors
///
/// Returns a validation error if a required field is missing or invalid.
pub fn prepare_entry(mut record: FlightRecord) -> Result<FlightRecord> {
    validate_entry(&record)?;
    if let ParsedDate::Valid(info) = parse_date(record.mission_date.as_deref()) {
        record.mission_date = Some(info.date().format("%Y-%m-%d").to_string());
    }
    complete_entry(&mut record);
    Ok(record)
}

/// Apply one `FIELD=VALUE` assignment typed by an operator.
///
/// `FIELD` is anything [`CanonicalField::parse`] accepts. An empty value
/// clears the field.
///
/// # Errors
///
/// Returns [`Error::UnknownField`] if the field does not resolve, or
/// [`Error::InvalidField`] if a numeric field gets a non-numeric value.
pub fn apply_assignment(record: &mut FlightRecord, assignment: &str) -> Result<()> {
    let (name, value) = assignment.split_once('=').ok_or_else(|| {
        Error::invalid_field(
            "assignment",
            format!("expected FIELD=VALUE, got {assignment}"),
        )
    })?;
    let field = CanonicalField::parse(name).ok_or_else(|| Error::UnknownField {
        name: name.trim().to_string(),
    })?;

    let value = value.trim();
    let value = if value.is_empty() {
        None
    } else if field.kind() == FieldKind::Numeric {
        let number = parse_number(value)
            .ok_or_else(|| Error::invalid_field(field.label(), format!("not a number: {value}")))?;
        Some(FieldValue::Number(number))
    } else {
        Some(FieldValue::Text(value.to_string()))
    };

    debug!(%field, "Set field");
    record.set(field, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> FlightRecord {
        FlightRecord {
            drone_model: Some("Arsenio 004".to_string()),
            mission_date: Some("03/14/2025".to_string()),
            mission_objective: Some("FBWA".to_string()),
            flight_id: Some("BRIECHUAS_14032025_1005".to_string()),
            takeoff_time: Some("10:05".to_string()),
            landing_time: Some("10:09:40".to_string()),
            battery1: VoltageReading {
                takeoff: Some(12.32),
                landing: Some(12.26),
                used: None,
            },
            ..FlightRecord::default()
        }
    }

    #[test]
    fn test_missing_required_fields_in_order() {
        let mut record = entry();
        record.flight_id = None;
        let err = validate_entry(&record).unwrap_err();
        assert_eq!(err.to_string(), "Flight ID is required.");

        record.mission_date = None;
        let err = validate_entry(&record).unwrap_err();
        assert_eq!(err.to_string(), "Mission Date is required.");
    }

    #[test]
    fn test_missing_objective() {
        let mut record = entry();
        record.mission_objective = None;
        assert!(matches!(
            validate_entry(&record),
            Err(Error::MissingField {
                field: "Mission Objective"
            })
        ));
    }

    #[test]
    fn test_invalid_date_rejected() {
        let mut record = entry();
        record.mission_date = Some("yesterday".to_string());
        let err = validate_entry(&record).unwrap_err();
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_prepare_entry_fills_derived_fields() {
        let record = prepare_entry(entry()).unwrap();
        assert_eq!(record.mission_date.as_deref(), Some("2025-03-14"));
        assert_eq!(record.total_flight_time.as_deref(), Some("00:04:40"));
        assert_eq!(record.battery1.used, Some(0.06));
        assert_eq!(record.battery2.used, None);
    }

    #[test]
    fn test_overnight_flight_wraps() {
        let mut record = entry();
        record.takeoff_time = Some("11:50 PM".to_string());
        record.landing_time = Some("12:10 AM".to_string());
        let record = prepare_entry(record).unwrap();
        assert_eq!(record.total_flight_time.as_deref(), Some("00:20:00"));
    }

    #[test]
    fn test_explicit_used_voltage_is_kept() {
        let mut record = entry();
        record.battery1.used = Some(0.5);
        let record = prepare_entry(record).unwrap();
        assert_eq!(record.battery1.used, Some(0.5));
    }

    #[test]
    fn test_unparseable_times_keep_given_total() {
        let mut record = entry();
        record.landing_time = Some("NIL".to_string());
        record.total_flight_time = Some("0:05:00".to_string());
        let record = prepare_entry(record).unwrap();
        assert_eq!(record.total_flight_time.as_deref(), Some("0:05:00"));
    }

    #[test]
    fn test_apply_assignment() {
        let mut record = FlightRecord::default();
        apply_assignment(&mut record, "Flight ID=F-12").unwrap();
        apply_assignment(&mut record, "battery1_takeoff_voltage = 12.32").unwrap();
        apply_assignment(&mut record, "comment=").unwrap();

        assert_eq!(record.flight_id.as_deref(), Some("F-12"));
        assert_eq!(record.battery1.takeoff, Some(12.32));
        assert_eq!(record.comment, None);
    }

    #[test]
    fn test_apply_assignment_errors() {
        let mut record = FlightRecord::default();
        assert!(matches!(
            apply_assignment(&mut record, "altitude=100"),
            Err(Error::UnknownField { .. })
        ));
        assert!(matches!(
            apply_assignment(&mut record, "fuel_used=lots"),
            Err(Error::InvalidField { .. })
        ));
        assert!(apply_assignment(&mut record, "flight_id").is_err());
    }
}
