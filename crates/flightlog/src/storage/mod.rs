//! Storage layer for flightlog.
//!
//! This module provides `SQLite`-based persistent storage for flight records
//! and the history of spreadsheet imports that produced them.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::ingest::ImportBatch;
use crate::record::{CanonicalField, FieldKind, FieldValue, FlightRecord};

/// The operations the rest of the crate needs from a record store.
///
/// Failures are returned as-is; nothing here retries.
pub trait RecordStore {
    /// All records, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn list(&self) -> Result<Vec<FlightRecord>>;

    /// One record by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordNotFound`] if no record has this id.
    fn get(&self, id: i64) -> Result<FlightRecord>;

    /// Insert a record, returning its new id. Any `id` on the input is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    fn create(&self, record: &FlightRecord) -> Result<i64>;

    /// Overwrite every field of an existing record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordNotFound`] if no record has this id.
    fn update(&self, id: i64, record: &FlightRecord) -> Result<()>;

    /// Delete a record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordNotFound`] if no record has this id.
    fn delete(&self, id: i64) -> Result<()>;

    /// Insert many records atomically, returning their ids in input order.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails; no record is stored in that case.
    fn bulk_create(&self, records: &[FlightRecord]) -> Result<Vec<i64>>;
}

/// Where an import came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSource {
    /// File name without directories, if the import came from a file.
    pub file_name: Option<String>,
    /// Hex `blake3` digest of the source bytes.
    pub file_hash: String,
}

impl ImportSource {
    /// Hash a file on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self {
            file_name: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            file_hash: hash_bytes(&bytes),
        })
    }

    /// Describe an in-memory source.
    #[must_use]
    pub fn from_bytes(file_name: Option<&str>, bytes: &[u8]) -> Self {
        Self {
            file_name: file_name.map(str::to_string),
            file_hash: hash_bytes(bytes),
        }
    }
}

/// Hex `blake3` digest of `bytes`.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// A committed import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportRecord {
    /// Store-assigned id.
    pub id: i64,
    /// Hex `blake3` digest of the source file.
    pub file_hash: String,
    /// Source file name.
    pub file_name: Option<String>,
    /// Sheet the rows came from.
    pub sheet_name: String,
    /// Zero-based header row used.
    pub header_row: usize,
    /// Records stored.
    pub record_count: usize,
    /// Blank rows dropped.
    pub skipped_rows: usize,
    /// When the import was committed.
    pub imported_at: DateTime<Utc>,
}

/// `SQLite`-backed [`RecordStore`].
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Count stored records.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM flight_logs", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Store an import batch and its history entry in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails; nothing is stored in that case.
    pub fn record_import(
        &self,
        source: &ImportSource,
        batch: &ImportBatch,
    ) -> Result<ImportRecord> {
        let imported_at = Utc::now();
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            r"
            INSERT INTO imports
                (file_hash, file_name, sheet_name, header_row, record_count, skipped_rows, imported_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
            params![
                source.file_hash,
                source.file_name,
                batch.sheet_name,
                to_i64(batch.header_index),
                to_i64(batch.records.len()),
                to_i64(batch.skipped_rows),
                imported_at.to_rfc3339(),
            ],
        )?;
        let import_id = tx.last_insert_rowid();
        insert_records(&tx, &batch.records, Some(import_id))?;
        tx.commit()?;

        info!(
            "Stored import {} from sheet '{}' ({} records)",
            import_id,
            batch.sheet_name,
            batch.records.len()
        );
        Ok(ImportRecord {
            id: import_id,
            file_hash: source.file_hash.clone(),
            file_name: source.file_name.clone(),
            sheet_name: batch.sheet_name.clone(),
            header_row: batch.header_index,
            record_count: batch.records.len(),
            skipped_rows: batch.skipped_rows,
            imported_at,
        })
    }

    /// Import history, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_imports(&self) -> Result<Vec<ImportRecord>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, file_hash, file_name, sheet_name, header_row, record_count,
                   skipped_rows, imported_at
            FROM imports ORDER BY id DESC
            ",
        )?;
        let imports = stmt
            .query_map([], Self::row_to_import)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(imports)
    }

    /// The most recent import of a file with this digest, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_import_by_hash(&self, file_hash: &str) -> Result<Option<ImportRecord>> {
        let found = self
            .conn
            .query_row(
                r"
                SELECT id, file_hash, file_name, sheet_name, header_row, record_count,
                       skipped_rows, imported_at
                FROM imports WHERE file_hash = ?1 ORDER BY id DESC LIMIT 1
                ",
                [file_hash],
                Self::row_to_import,
            )
            .optional()?;
        Ok(found)
    }

    fn row_to_import(row: &rusqlite::Row) -> rusqlite::Result<ImportRecord> {
        let imported_at: String = row.get(7)?;
        let imported_at = DateTime::parse_from_rfc3339(&imported_at)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?
            .with_timezone(&Utc);
        let count = |idx: usize| -> rusqlite::Result<usize> {
            let value: i64 = row.get(idx)?;
            Ok(usize::try_from(value).unwrap_or(0))
        };

        Ok(ImportRecord {
            id: row.get(0)?,
            file_hash: row.get(1)?,
            file_name: row.get(2)?,
            sheet_name: row.get(3)?,
            header_row: count(4)?,
            record_count: count(5)?,
            skipped_rows: count(6)?,
            imported_at,
        })
    }

    /// Convert a `flight_logs` row selected with [`select_sql`] to a record.
    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<FlightRecord> {
        let mut record = FlightRecord {
            id: Some(row.get(0)?),
            ..FlightRecord::default()
        };
        for (offset, field) in CanonicalField::ALL.into_iter().enumerate() {
            let idx = offset + 1;
            let value = match field.kind() {
                FieldKind::Numeric => row.get::<_, Option<f64>>(idx)?.map(FieldValue::Number),
                FieldKind::Text | FieldKind::Date | FieldKind::Time => {
                    row.get::<_, Option<String>>(idx)?.map(FieldValue::Text)
                }
            };
            record.set(field, value);
        }
        Ok(record)
    }
}

impl RecordStore for Storage {
    fn list(&self) -> Result<Vec<FlightRecord>> {
        let sql = format!("{} ORDER BY id ASC", select_sql());
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map([], Self::row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!("Loaded {} records", records.len());
        Ok(records)
    }

    fn get(&self, id: i64) -> Result<FlightRecord> {
        let sql = format!("{} WHERE id = ?1", select_sql());
        self.conn
            .query_row(&sql, [id], Self::row_to_record)
            .optional()?
            .ok_or(Error::RecordNotFound { id })
    }

    fn create(&self, record: &FlightRecord) -> Result<i64> {
        let ids = insert_records(&self.conn, std::slice::from_ref(record), None)?;
        let id = ids.first().copied().ok_or_else(|| Error::internal("insert returned no id"))?;
        debug!("Inserted record with id {}", id);
        Ok(id)
    }

    fn update(&self, id: i64, record: &FlightRecord) -> Result<()> {
        let assignments = CanonicalField::ALL
            .into_iter()
            .enumerate()
            .map(|(i, field)| format!("{} = ?{}", field.column(), i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE flight_logs SET {assignments}, updated_at = datetime('now') WHERE id = ?{}",
            CanonicalField::ALL.len() + 1
        );

        let mut values = record_values(record);
        values.push(Value::Integer(id));
        let affected = self.conn.execute(&sql, params_from_iter(values))?;
        if affected == 0 {
            return Err(Error::RecordNotFound { id });
        }
        debug!("Updated record {}", id);
        Ok(())
    }

    fn delete(&self, id: i64) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM flight_logs WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(Error::RecordNotFound { id });
        }
        debug!("Deleted record {}", id);
        Ok(())
    }

    fn bulk_create(&self, records: &[FlightRecord]) -> Result<Vec<i64>> {
        let tx = self.conn.unchecked_transaction()?;
        let ids = insert_records(&tx, records, None)?;
        tx.commit()?;
        info!("Inserted {} records", ids.len());
        Ok(ids)
    }
}

fn column_list() -> String {
    CanonicalField::ALL
        .into_iter()
        .map(CanonicalField::column)
        .collect::<Vec<_>>()
        .join(", ")
}

fn select_sql() -> String {
    format!("SELECT id, {} FROM flight_logs", column_list())
}

fn record_values(record: &FlightRecord) -> Vec<Value> {
    CanonicalField::ALL
        .into_iter()
        .map(|field| match record.get(field) {
            Some(FieldValue::Number(n)) => Value::Real(n),
            Some(FieldValue::Text(s)) => Value::Text(s),
            None => Value::Null,
        })
        .collect()
}

fn insert_records(
    conn: &Connection,
    records: &[FlightRecord],
    import_id: Option<i64>,
) -> Result<Vec<i64>> {
    let placeholders = (1..=CanonicalField::ALL.len() + 1)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO flight_logs ({}, import_id) VALUES ({placeholders})",
        column_list()
    );
    let mut stmt = conn.prepare(&sql)?;

    let mut ids = Vec::with_capacity(records.len());
    for record in records {
        let mut values = record_values(record);
        values.push(import_id.map_or(Value::Null, Value::Integer));
        stmt.execute(params_from_iter(values))?;
        ids.push(conn.last_insert_rowid());
    }
    Ok(ids)
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
