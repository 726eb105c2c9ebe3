//! End-to-end: spreadsheet file to stored records to dashboard.

use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use flightlog::battery::{default_battery_models, HealthStatus};
use flightlog::ingest::ColumnTarget;
use flightlog::metrics::{DateWindow, HealthBand, ModelFilter};
use flightlog::storage::ImportSource;
use flightlog::{
    build_snapshot, AnalyticsContext, BatteryTable, CanonicalField, CsvWorkbookReader,
    DashboardFilter, ExportPayload, ImportSession, RecordStore, Storage, WorkbookReader,
};

const SHEET: &str = "\
BRIECHUAS FLIGHT LOG,,,,,,,,,,
,,,,,,,,,,
S/N,DRONE MODEL,MISSION DATE,MISSION OBJECTIVE,FLIGHT ID,TOTAL FLIGHT TIME,BATTERY 1 (3S) TAKE-OFF VOLTAGE,BATTERY 1 (3S) LANDING VOLTAGE,BATTERY 2 (7S) TAKE-OFF VOLTAGE,BATTERY 2 (7S) LANDING VOLTAGE,COMMENT
1,Arsenio 004,2025-03-10,FBWA,F-1,0:12:00,12.32,12.26,29.10,27.50,No issues.
2,Arsenio 004,2025-03-12,Mapping,F-2,0:18:30,12.40,10.05,29.00,26.00,Battery 1 sagged
3,Xander 002,2025-01-05,Mapping,F-3,0:30:00,25.10,22.80,,,NO ISSUES.
4,Argini 001,not a date,FBWA,F-4,,12.20,11.90,49.00,47.00,
,,,,,,,,,,
";

fn write_sheet(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("q1_flights.csv");
    std::fs::write(&path, SHEET).unwrap();
    path
}

fn context() -> AnalyticsContext {
    let now = Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap();
    AnalyticsContext::new(BatteryTable::new(default_battery_models()), now)
}

#[test]
fn csv_to_store_to_dashboard() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sheet(&dir);

    let sheets = CsvWorkbookReader::new().read(&path).unwrap();
    assert_eq!(sheets.len(), 1);
    assert_eq!(sheets[0].name, "q1_flights");

    let session = ImportSession::open(sheets.into_iter().next().unwrap(), 5).unwrap();
    let offered: Vec<_> = session.candidates().iter().map(|c| c.index).collect();
    assert_eq!(offered, [0, 2, 3, 4, 5]);

    let mapping = session.select_header(2).unwrap();
    assert_eq!(mapping.mapping().target(0), ColumnTarget::Ignored);
    assert_eq!(
        mapping.mapping().target(8),
        ColumnTarget::Field(CanonicalField::Battery2Takeoff)
    );
    let batch = mapping.commit();
    assert_eq!(batch.records.len(), 4);
    assert_eq!(batch.skipped_rows, 1);

    let storage = Storage::open(dir.path().join("db").join("flights.db")).unwrap();
    let source = ImportSource::from_file(&path).unwrap();
    let import = storage.record_import(&source, &batch).unwrap();
    assert_eq!(import.record_count, 4);
    assert_eq!(
        storage.find_import_by_hash(&source.file_hash).unwrap().map(|i| i.id),
        Some(import.id)
    );

    let records = storage.list().unwrap();
    assert_eq!(records.len(), 4);
    assert_eq!(records[3].mission_date.as_deref(), Some("not a date"));
    assert_eq!(records[2].battery2.takeoff, None);

    let ctx = context();
    let all = build_snapshot(&records, &DashboardFilter::default(), &ctx);
    assert_eq!(all.filter.count, 4);
    assert_eq!(all.filter.range_label, "All Time");
    // "No issues." and "NO ISSUES." match the sentinel; the blank comment is no issue.
    assert_eq!(all.totals.flights_with_issues, 1);
    assert_eq!(all.fleet.issue_flights[0].comment, "Battery 1 sagged");
    assert_eq!(all.fleet.batteries_to_replace, 1);

    let recent = build_snapshot(
        &records,
        &DashboardFilter {
            window: DateWindow::Last30Days,
            model: ModelFilter::Family("arsenio".to_string()),
            flight_id: None,
        },
        &ctx,
    );
    assert_eq!(recent.filter.count, 2);
    assert_eq!(recent.filter.model, "arsenio family");
    assert!((recent.totals.total_minutes - 30.5).abs() < 1e-9);
    assert_ne!(recent.score.health, HealthBand::Unknown);

    let payload = ExportPayload::from_snapshot(&recent, ctx.now);
    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(json["dateRange"]["selected"], "30d");
    assert_eq!(json["dateRange"]["count"], 2);
}

#[test]
fn stored_records_keep_battery_health() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sheet(&dir);
    let sheet = CsvWorkbookReader::new()
        .read(&path)
        .unwrap()
        .into_iter()
        .next()
        .unwrap();
    let batch = ImportSession::open(sheet, 5)
        .unwrap()
        .select_header(2)
        .unwrap()
        .commit();

    let storage = Storage::open_in_memory().unwrap();
    let ids = storage.bulk_create(&batch.records).unwrap();
    let stored = storage.get(ids[1]).unwrap();

    let ctx = context();
    let config = ctx.battery_table.get("Arsenio 004");
    let health = ctx.analyzer.analyze(&stored, config);
    // 10.05 V over 3 cells is 3.35 V/cell.
    assert_eq!(health.slot1.status, HealthStatus::LowVoltage);
    assert!(health.needs_replacement());
}

#[test]
fn mapping_override_changes_stored_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sheet(&dir);
    let sheet = CsvWorkbookReader::new()
        .read(&path)
        .unwrap()
        .into_iter()
        .next()
        .unwrap();

    let mut mapping = ImportSession::open(sheet, 5)
        .unwrap()
        .select_header(2)
        .unwrap();
    mapping
        .mapping_mut()
        .apply_override("MISSION OBJECTIVE=ignore")
        .unwrap();
    let batch = mapping.commit();

    assert!(batch.records.iter().all(|r| r.mission_objective.is_none()));
    assert!(batch.records.iter().all(|r| r.flight_id.is_some()));
}
