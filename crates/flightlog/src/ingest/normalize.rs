//! Mapped rows to canonical records.

use tracing::{debug, trace};

use super::mapping::{ColumnMapping, ColumnTarget};
use super::workbook::{Cell, RawRow};
use crate::record::{parse_number, CanonicalField, FieldKind, FieldValue, FlightRecord};
use crate::temporal::{date_from_serial, format_duration, normalize_date, parse_date};

/// Coerce one cell for a field. Blank cells are always `None`.
///
/// Only numeric and date fields read a cell as a number. Every other field
/// keeps the trimmed text, except spreadsheet times stored as day fractions.
#[must_use]
pub fn coerce_cell(field: CanonicalField, cell: &Cell) -> Option<FieldValue> {
    if cell.is_empty() {
        return None;
    }
    match (field.kind(), cell) {
        (FieldKind::Numeric, Cell::Number(n)) => Some(FieldValue::Number(*n)),
        (FieldKind::Numeric, other) => parse_number(&other.as_text()).map(FieldValue::Number),
        (FieldKind::Date, Cell::Number(serial)) => Some(FieldValue::Text(serial_date(*serial))),
        (FieldKind::Date, other) => Some(FieldValue::Text(date_text(&other.as_text()))),
        // Spreadsheet times arrive as fractions of a day.
        (FieldKind::Time, Cell::Number(n)) if (0.0..1.0).contains(n) => {
            Some(FieldValue::Text(format_duration(n * 24.0 * 60.0)))
        }
        (_, other) => Some(FieldValue::Text(other.as_text())),
    }
}

fn serial_date(serial: f64) -> String {
    date_from_serial(serial).map_or_else(
        || serial.to_string(),
        |d| d.format("%Y-%m-%d").to_string(),
    )
}

/// A typed date, or a bare serial number from a CSV export of a workbook.
fn date_text(raw: &str) -> String {
    if parse_date(Some(raw)).info().is_some() {
        return normalize_date(raw);
    }
    match raw.parse::<f64>() {
        Ok(serial) if date_from_serial(serial).is_some() => serial_date(serial),
        _ => raw.to_string(),
    }
}

/// Build a record from one data row, or `None` if every cell is empty.
#[must_use]
pub fn normalize_row(row: &RawRow, mapping: &ColumnMapping) -> Option<FlightRecord> {
    if row.iter().all(Cell::is_empty) {
        return None;
    }
    let mut record = FlightRecord::default();
    for (position, cell) in row.iter().enumerate() {
        if let ColumnTarget::Field(field) = mapping.target(position) {
            record.set(field, coerce_cell(field, cell));
        }
    }
    Some(record)
}

/// Build records from data rows, in source order, skipping blank rows.
#[must_use]
pub fn normalize_rows(rows: &[RawRow], mapping: &ColumnMapping) -> Vec<FlightRecord> {
    let records: Vec<_> = rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let record = normalize_row(row, mapping);
            if record.is_none() {
                trace!(row = i, "Skipping blank row");
            }
            record
        })
        .collect();
    debug!(
        rows = rows.len(),
        records = records.len(),
        "Normalized data rows"
    );
    records
}
