//! Error types for flightlog.
//!
//! Malformed cell values never surface here: the ingestion pipeline replaces
//! them with sentinels. These errors cover the store boundary, configuration,
//! workbook reading, and manual-entry validation.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for flightlog operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// No flight record exists with the given identifier.
    #[error("flight record {id} not found")]
    RecordNotFound {
        /// Store-assigned record identifier.
        id: i64,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Import Errors ===
    /// A workbook could not be read into raw rows.
    #[error("failed to read workbook {path}: {message}")]
    WorkbookRead {
        /// Path of the workbook.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    /// CSV decoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The selected header row is not one of the sheet's rows.
    #[error("header row {index} is out of range (sheet has {rows} rows)")]
    HeaderRowOutOfRange {
        /// Requested row index.
        index: usize,
        /// Number of rows in the sheet.
        rows: usize,
    },

    /// A column reference did not match any source column.
    #[error("unknown column: {name}")]
    UnknownColumn {
        /// The header label or position that failed to resolve.
        name: String,
    },

    /// A name did not match any canonical field.
    #[error("unknown field: {name}")]
    UnknownField {
        /// The name that failed to resolve.
        name: String,
    },

    // === Validation Errors ===
    /// A required field was missing on manual entry.
    #[error("{field} is required.")]
    MissingField {
        /// Human-readable field label.
        field: &'static str,
    },

    /// A field value was rejected on manual entry.
    #[error("invalid {field}: {message}")]
    InvalidField {
        /// Human-readable field label.
        field: &'static str,
        /// Why the value was rejected.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for flightlog operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a workbook read error.
    #[must_use]
    pub fn workbook_read(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::WorkbookRead {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid field error.
    #[must_use]
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            message: message.into(),
        }
    }

    /// Check if this error is a manual-entry validation failure.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::MissingField { .. } | Self::InvalidField { .. })
    }

    /// Check if this error means the requested record does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RecordNotFound { .. })
    }
}
