//! Command execution.
//!
//! Every handler writes its report to the given writer; logs go to stderr
//! through `tracing`.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::commands::{
    AddCommand, ConfigCommand, DashboardCommand, EditCommand, ExportCommand, ImportCommand,
    ListCommand, ShowCommand,
};
use super::Command;
use crate::record::BatterySlot;
use crate::config::Config;
use crate::entry::{apply_assignment, prepare_entry};
use crate::error::{Error, Result};
use crate::ingest::{reader_for_path, ImportSession, MappingSession, Sheet};
use crate::metrics::{
    build_snapshot, AnalyticsContext, DashboardSnapshot, DerivedMetrics, ExportPayload,
    RecordSummary,
};
use crate::record::{CanonicalField, FlightRecord};
use crate::storage::{ImportSource, RecordStore, Storage};

/// Run one command against the configured database.
///
/// `now` is the instant dashboard date windows end at.
///
/// # Errors
///
/// Returns the first error raised by the store, the importer, or the writer.
pub fn execute(
    command: Command,
    config: &Config,
    now: DateTime<Utc>,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        Command::Import(cmd) => import(&cmd, config, out),
        Command::List(cmd) => list(&cmd, config, now, out),
        Command::Show(cmd) => show(&cmd, config, now, out),
        Command::Add(cmd) => add(&cmd, config, out),
        Command::Edit(cmd) => edit(&cmd, config, out),
        Command::Delete(cmd) => {
            open_storage(config)?.delete(cmd.id)?;
            writeln!(out, "Deleted record {}", cmd.id)?;
            Ok(())
        }
        Command::Dashboard(cmd) => dashboard(&cmd, config, now, out),
        Command::Export(cmd) => export(&cmd, config, now, out),
        Command::Models => models(config, out),
        Command::Imports => imports(config, out),
        Command::Config(cmd) => config_command(cmd, config, out),
    }
}

fn open_storage(config: &Config) -> Result<Storage> {
    Storage::open(config.database_path())
}

fn import(cmd: &ImportCommand, config: &Config, out: &mut dyn Write) -> Result<()> {
    let reader = reader_for_path(&cmd.file, config.delimiter());
    info!(reader = reader.name(), file = %cmd.file.display(), "Reading workbook");
    let sheets = reader.read(&cmd.file)?;
    let sheet_names: Vec<String> = sheets.iter().map(|s| s.name.clone()).collect();
    let sheet = select_sheet(sheets, cmd.sheet.as_deref(), &cmd.file)?;
    let session = ImportSession::open(sheet, config.import.preview_rows)?;

    let Some(header_row) = cmd.header_row else {
        if sheet_names.len() > 1 {
            writeln!(
                out,
                "Sheets: {} (choose with --sheet NAME)",
                sheet_names.join(", ")
            )?;
        }
        writeln!(out, "Header row candidates in '{}':", session.sheet().name)?;
        for candidate in session.candidates() {
            writeln!(out, "  [{}] {}", candidate.index, candidate.cells.join(" | "))?;
        }
        writeln!(out, "Re-run with --header-row ROW to import.")?;
        return Ok(());
    };

    let mut mapping = session.select_header(header_row)?;
    for rule in &cmd.map {
        mapping.mapping_mut().apply_override(rule)?;
    }
    write_mapping(&mapping, out)?;

    if cmd.dry_run {
        let batch = mapping.commit();
        writeln!(
            out,
            "Would import {} records ({} blank rows skipped).",
            batch.records.len(),
            batch.skipped_rows
        )?;
        return Ok(());
    }

    let source = ImportSource::from_file(&cmd.file)?;
    let storage = open_storage(config)?;
    if let Some(previous) = storage.find_import_by_hash(&source.file_hash)? {
        if !cmd.force {
            warn!(import = previous.id, "File was already imported");
            writeln!(
                out,
                "This file was already imported on {} (import #{}). Use --force to import it again.",
                previous.imported_at.format("%Y-%m-%d %H:%M"),
                previous.id
            )?;
            return Ok(());
        }
    }

    let batch = mapping.commit();
    let record = storage.record_import(&source, &batch)?;
    writeln!(
        out,
        "Imported {} records from sheet '{}' (import #{}, {} blank rows skipped).",
        record.record_count, record.sheet_name, record.id, record.skipped_rows
    )?;
    Ok(())
}

fn select_sheet(sheets: Vec<Sheet>, wanted: Option<&str>, path: &Path) -> Result<Sheet> {
    match wanted {
        Some(name) => sheets
            .into_iter()
            .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| Error::workbook_read(path, format!("no sheet named '{name}'"))),
        None => sheets
            .into_iter()
            .next()
            .ok_or_else(|| Error::workbook_read(path, "workbook has no sheets")),
    }
}

fn write_mapping(session: &MappingSession, out: &mut dyn Write) -> Result<()> {
    writeln!(
        out,
        "Header row {} ({} data rows):",
        session.header_index(),
        session.data_row_count()
    )?;
    for column in session.mapping().columns() {
        writeln!(
            out,
            "  {:>3}  {:<40} -> {} ({})",
            column.position, column.header, column.target, column.origin
        )?;
    }

    let mapped = session.mapping().mapped_fields();
    writeln!(
        out,
        "Mapped {} of {} fields.",
        mapped.len(),
        CanonicalField::ALL.len()
    )?;
    let missing: Vec<&str> = CanonicalField::ALL
        .into_iter()
        .filter(|field| !mapped.contains(field))
        .map(CanonicalField::name)
        .collect();
    if !missing.is_empty() {
        writeln!(out, "Not mapped: {}", missing.join(", "))?;
    }
    Ok(())
}

fn list(cmd: &ListCommand, config: &Config, now: DateTime<Utc>, out: &mut dyn Write) -> Result<()> {
    let records = open_storage(config)?.list()?;
    let query = cmd.query();
    let mut matched = query.apply(&records);
    if let Some(limit) = cmd.limit {
        matched.truncate(limit);
    }
    info!(total = records.len(), matched = matched.len(), "Listing records");

    if cmd.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&matched)?)?;
        return Ok(());
    }

    let ctx = AnalyticsContext::from_config(config, now);
    writeln!(
        out,
        "{:>5}  {:<12}  {:<14}  {:<24}  {:>8}  {:<6}  {}",
        "ID", "DATE", "MODEL", "FLIGHT ID", "MINUTES", "ISSUE", "OBJECTIVE"
    )?;
    for record in &matched {
        let metrics = DerivedMetrics::derive(record, &ctx);
        writeln!(
            out,
            "{:>5}  {:<12}  {:<14}  {:<24}  {:>8.1}  {:<6}  {}",
            record.id.map_or_else(String::new, |id| id.to_string()),
            metrics.date.short_or_sentinel(),
            record.drone_model.as_deref().unwrap_or("-"),
            record.flight_id.as_deref().unwrap_or("-"),
            metrics.duration_minutes,
            if metrics.has_issues { "yes" } else { "" },
            record.mission_objective.as_deref().unwrap_or(""),
        )?;
    }
    writeln!(out, "{} of {} records", matched.len(), records.len())?;
    Ok(())
}

fn show(cmd: &ShowCommand, config: &Config, now: DateTime<Utc>, out: &mut dyn Write) -> Result<()> {
    let record = open_storage(config)?.get(cmd.id)?;
    let ctx = AnalyticsContext::from_config(config, now);
    let summary = RecordSummary::from(&DerivedMetrics::derive(&record, &ctx));

    if cmd.json {
        let value = serde_json::json!({ "record": record, "summary": summary });
        writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
        return Ok(());
    }

    writeln!(out, "Record {}", cmd.id)?;
    for field in CanonicalField::ALL {
        let value = record
            .get(field)
            .map_or_else(|| "-".to_string(), |v| v.to_string());
        writeln!(out, "  {:<22} {value}", field.label())?;
    }
    writeln!(out)?;
    writeln!(out, "  {:<22} {}", "Date", summary.date)?;
    writeln!(out, "  {:<22} {:.1}", "Duration (min)", summary.duration_minutes)?;
    writeln!(out, "  {:<22} {}", "Issues", if summary.has_issues { "yes" } else { "no" })?;

    let battery = record
        .drone_model
        .as_deref()
        .and_then(|model| ctx.battery_table.get(model));
    for slot_health in summary.health.slots() {
        let pack = battery
            .and_then(|b| b.pack_label(slot_health.slot))
            .unwrap_or_else(|| "?".to_string());
        let number = match slot_health.slot {
            BatterySlot::One => 1,
            BatterySlot::Two => 2,
        };
        let per_cell = slot_health
            .per_cell_landing
            .map_or_else(|| "-".to_string(), |v| format!("{v:.3} V/cell"));
        writeln!(
            out,
            "  Battery {number} ({pack}): {}, {per_cell}, efficiency {:.2}%",
            slot_health.status, slot_health.efficiency
        )?;
        if let Some(advice) = slot_health.status.advice() {
            writeln!(out, "    {advice}")?;
        }
        if let Some(warning) = slot_health.imbalance_warning() {
            writeln!(out, "    {warning}")?;
        }
    }
    Ok(())
}

fn add(cmd: &AddCommand, config: &Config, out: &mut dyn Write) -> Result<()> {
    let mut record = FlightRecord::default();
    for assignment in &cmd.set {
        apply_assignment(&mut record, assignment)?;
    }
    let record = prepare_entry(record)?;
    let id = open_storage(config)?.create(&record)?;
    writeln!(out, "Added record {id}")?;
    Ok(())
}

fn edit(cmd: &EditCommand, config: &Config, out: &mut dyn Write) -> Result<()> {
    let storage = open_storage(config)?;
    let mut record = storage.get(cmd.id)?;
    for assignment in &cmd.set {
        apply_assignment(&mut record, assignment)?;
    }
    let record = prepare_entry(record)?;
    storage.update(cmd.id, &record)?;
    writeln!(out, "Updated record {}", cmd.id)?;
    Ok(())
}

fn snapshot(
    filter: &super::FilterArgs,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<DashboardSnapshot> {
    let records = open_storage(config)?.list()?;
    let ctx = AnalyticsContext::from_config(config, now);
    Ok(build_snapshot(&records, &filter.to_filter(), &ctx))
}

fn dashboard(
    cmd: &DashboardCommand,
    config: &Config,
    now: DateTime<Utc>,
    out: &mut dyn Write,
) -> Result<()> {
    let snap = snapshot(&cmd.filter, config, now)?;
    if cmd.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&snap)?)?;
        return Ok(());
    }
    write_dashboard(&snap, out)
}

fn write_dashboard(snap: &DashboardSnapshot, out: &mut dyn Write) -> Result<()> {
    let filter = &snap.filter;
    let totals = &snap.totals;
    let fleet = &snap.fleet;

    writeln!(
        out,
        "{} ({}), {}: {} flights",
        filter.window_label, filter.range_label, filter.model, filter.count
    )?;
    writeln!(
        out,
        "Performance score: {} ({})",
        snap.score.score, snap.score.health
    )?;
    writeln!(
        out,
        "Flight time: {:.1} min total, {:.1} min average",
        totals.total_minutes, totals.avg_minutes
    )?;
    writeln!(
        out,
        "Issues: {} ({:.1}%)",
        totals.flights_with_issues, totals.issue_rate
    )?;
    writeln!(
        out,
        "Battery efficiency: slot 1 {:.2}%, slot 2 {:.2}%",
        totals.avg_battery1_efficiency, totals.avg_battery2_efficiency
    )?;
    writeln!(
        out,
        "Batteries to replace: {}, imbalanced: {}",
        fleet.batteries_to_replace, fleet.batteries_imbalanced
    )?;
    let statuses: Vec<String> = fleet
        .status_counts
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(status, count)| format!("{status} {count}"))
        .collect();
    if !statuses.is_empty() {
        writeln!(out, "Battery status: {}", statuses.join(", "))?;
    }
    writeln!(
        out,
        "Engine hours: {:.1}, fuel used: {:.1}",
        fleet.total_engine_hours, fleet.total_fuel_used
    )?;

    if !snap.monthly.is_empty() {
        writeln!(out, "\nMonthly:")?;
        for bucket in &snap.monthly {
            writeln!(
                out,
                "  {:<10} {:>4} flights  {:>7.1} min avg  {:>3} issues",
                bucket.label, bucket.flights, bucket.avg_minutes, bucket.issues
            )?;
        }
    }
    if !snap.objectives.is_empty() {
        writeln!(out, "\nTop objectives:")?;
        for bucket in &snap.objectives {
            writeln!(out, "  {:<30} {:>4} flights", bucket.label, bucket.flights)?;
        }
    }

    let flown: Vec<_> = fleet
        .flights_per_model
        .iter()
        .filter(|(_, count)| *count > 0)
        .collect();
    if !flown.is_empty() {
        writeln!(out, "\nFlights per model:")?;
        for (model, count) in flown {
            writeln!(out, "  {model:<14} {count:>4}")?;
        }
    }
    if !fleet.issue_flights.is_empty() {
        writeln!(out, "\nReported issues:")?;
        for issue in &fleet.issue_flights {
            writeln!(
                out,
                "  {:<12} {:<24} {}",
                issue.date,
                issue.flight_id.as_deref().unwrap_or("-"),
                issue.comment
            )?;
        }
    }
    Ok(())
}

fn export(
    cmd: &ExportCommand,
    config: &Config,
    now: DateTime<Utc>,
    out: &mut dyn Write,
) -> Result<()> {
    let snap = snapshot(&cmd.filter, config, now)?;
    let payload = ExportPayload::from_snapshot(&snap, now);
    let path = cmd
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(payload.file_name()));

    std::fs::write(&path, serde_json::to_string_pretty(&payload)?)?;
    info!(path = %path.display(), "Exported dashboard");
    writeln!(out, "Exported dashboard to {}", path.display())?;
    Ok(())
}

fn models(config: &Config, out: &mut dyn Write) -> Result<()> {
    let table = config.battery_table();
    writeln!(out, "{:<16} {:<8} {:<8}", "MODEL", "SLOT 1", "SLOT 2")?;
    for row in table.rows() {
        writeln!(
            out,
            "{:<16} {:<8} {:<8}",
            row.model,
            row.pack_label(BatterySlot::One).unwrap_or_default(),
            row.pack_label(BatterySlot::Two)
                .unwrap_or_else(|| "-".to_string()),
        )?;
    }
    Ok(())
}

fn imports(config: &Config, out: &mut dyn Write) -> Result<()> {
    let history = open_storage(config)?.list_imports()?;
    if history.is_empty() {
        writeln!(out, "No imports yet.")?;
        return Ok(());
    }
    writeln!(
        out,
        "{:>4}  {:<17}  {:<24}  {:<12}  {:>7}  {}",
        "ID", "IMPORTED", "FILE", "SHEET", "RECORDS", "HASH"
    )?;
    for record in history {
        writeln!(
            out,
            "{:>4}  {:<17}  {:<24}  {:<12}  {:>7}  {}",
            record.id,
            record.imported_at.format("%Y-%m-%d %H:%M"),
            record.file_name.as_deref().unwrap_or("-"),
            record.sheet_name,
            record.record_count,
            &record.file_hash[..12.min(record.file_hash.len())],
        )?;
    }
    Ok(())
}

fn config_command(cmd: ConfigCommand, config: &Config, out: &mut dyn Write) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(config)?)?;
            } else {
                writeln!(out, "Current Configuration")?;
                writeln!(out, "=====================")?;
                writeln!(out)?;
                writeln!(out, "[Storage]")?;
                writeln!(out, "  Database path:      {}", config.database_path().display())?;
                writeln!(out)?;
                writeln!(out, "[Analytics]")?;
                writeln!(out, "  No-issue comment:   {}", config.analytics.no_issue_sentinel)?;
                writeln!(
                    out,
                    "  Imbalance (V/cell): {}",
                    config.analytics.imbalance_threshold_volts
                )?;
                writeln!(out, "  Top objectives:     {}", config.analytics.top_objectives)?;
                writeln!(out)?;
                writeln!(out, "[Import]")?;
                writeln!(out, "  Preview rows:       {}", config.import.preview_rows)?;
                writeln!(out, "  Delimiter:          {:?}", config.import.delimiter)?;
                writeln!(out)?;
                writeln!(out, "[Battery]")?;
                writeln!(out, "  Models:             {}", config.battery.models.len())?;
            }
        }
        ConfigCommand::Path => {
            writeln!(out, "{}", Config::default_config_path().display())?;
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            writeln!(out, "Validating configuration: {}", path.display())?;
            match Config::load_from(Some(path)) {
                Ok(_) => writeln!(out, "Configuration is valid.")?,
                Err(e) => writeln!(out, "Configuration error: {e}")?,
            }
        }
    }
    Ok(())
}
