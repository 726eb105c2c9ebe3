//! `SQLite` schema definitions for flightlog.
//!
//! Flight log columns are all nullable: a batch import keeps whatever the
//! spreadsheet had, including rows missing every required field.

/// SQL statement to create the flight logs table.
pub const CREATE_FLIGHT_LOGS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS flight_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    drone_model TEXT,
    mission_date TEXT,
    mission_objective TEXT,
    flight_id TEXT,
    takeoff_time TEXT,
    landing_time TEXT,
    total_flight_time TEXT,
    engine_time_hours REAL,
    fuel_level_before_flight REAL,
    fuel_level_after_flight REAL,
    fuel_used REAL,
    battery1_takeoff_voltage REAL,
    battery1_landing_voltage REAL,
    battery1_voltage_used REAL,
    battery2_takeoff_voltage REAL,
    battery2_landing_voltage REAL,
    battery2_voltage_used REAL,
    comment TEXT,
    import_id INTEGER REFERENCES imports(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create an index on mission date for dashboard windows.
pub const CREATE_MISSION_DATE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_flight_logs_mission_date ON flight_logs(mission_date DESC)
";

/// SQL statement to create an index on `drone_model` for filtering.
pub const CREATE_MODEL_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_flight_logs_model ON flight_logs(drone_model)
";

/// SQL statement to create the import history table.
pub const CREATE_IMPORTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_hash TEXT NOT NULL,
    file_name TEXT,
    sheet_name TEXT NOT NULL,
    header_row INTEGER NOT NULL,
    record_count INTEGER NOT NULL,
    skipped_rows INTEGER NOT NULL DEFAULT 0,
    imported_at TEXT NOT NULL
)
";

/// SQL statement to create an index on `file_hash` for re-import detection.
pub const CREATE_IMPORT_HASH_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_imports_hash ON imports(file_hash)
";

/// SQL statement to create an index on `import_id` for per-import lookups.
pub const CREATE_IMPORT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_flight_logs_import ON flight_logs(import_id)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_IMPORTS_TABLE,
    CREATE_IMPORT_HASH_INDEX,
    CREATE_FLIGHT_LOGS_TABLE,
    CREATE_MISSION_DATE_INDEX,
    CREATE_MODEL_INDEX,
    CREATE_IMPORT_INDEX,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CanonicalField;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.is_empty());
        }
    }

    #[test]
    fn test_flight_logs_has_every_canonical_column() {
        for field in CanonicalField::ALL {
            assert!(
                CREATE_FLIGHT_LOGS_TABLE.contains(&format!("    {} ", field.column())),
                "missing column for {field}"
            );
        }
    }

    #[test]
    fn test_flight_log_columns_are_nullable() {
        for field in CanonicalField::ALL {
            let line = CREATE_FLIGHT_LOGS_TABLE
                .lines()
                .find(|l| l.trim_start().starts_with(&format!("{} ", field.column())))
                .unwrap();
            assert!(!line.contains("NOT NULL"), "{line}");
        }
    }

    #[test]
    fn test_create_metadata_table_structure() {
        assert!(CREATE_METADATA_TABLE.contains("key TEXT PRIMARY KEY"));
        assert!(CREATE_METADATA_TABLE.contains("value TEXT NOT NULL"));
    }
}
