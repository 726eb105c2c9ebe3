//! `flightlog` - Flight log ingestion and fleet health analytics
//!
//! This library imports flight log spreadsheets into canonical records,
//! stores them in `SQLite`, and derives battery health, performance scores,
//! and dashboard statistics from them.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod battery;
pub mod cli;
pub mod config;
pub mod entry;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod record;
pub mod storage;
pub mod temporal;

pub use battery::{BatteryAnalyzer, BatteryConfig, BatteryHealth, BatteryTable, HealthStatus};
pub use config::Config;
pub use error::{Error, Result};
pub use ingest::{
    reader_for_path, CsvWorkbookReader, ImportBatch, ImportSession, MappingSession,
    SpreadsheetReader, WorkbookReader,
};
pub use logging::init_logging;
pub use metrics::{
    build_snapshot, AnalyticsContext, DashboardFilter, DashboardSnapshot, ExportPayload,
};
pub use record::{CanonicalField, FlightRecord};
pub use storage::{RecordStore, Storage};
