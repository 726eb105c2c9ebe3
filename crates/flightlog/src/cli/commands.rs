//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::metrics::{known_family, DashboardFilter, DateWindow, ModelFilter, RecordQuery, FAMILIES};

/// Import command arguments.
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// Spreadsheet to import: CSV, or an .xlsx/.xls/.ods workbook
    pub file: PathBuf,

    /// Sheet to import, by name (defaults to the first sheet)
    #[arg(long)]
    pub sheet: Option<String>,

    /// Zero-based row holding the column headers. Without it, header
    /// candidates are listed and nothing is imported.
    #[arg(short = 'H', long, value_name = "ROW")]
    pub header_row: Option<usize>,

    /// Override a column mapping, e.g. `--map "BATT 1 TO=battery1_takeoff_voltage"`
    /// or `--map 3=ignore`
    #[arg(short, long = "map", value_name = "COL=FIELD")]
    pub map: Vec<String>,

    /// Show the mapping and record count without storing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Import even if this file was imported before
    #[arg(short, long)]
    pub force: bool,
}

/// Model and family selection shared by listing and dashboards.
#[derive(Debug, Clone, Default, Args)]
pub struct ModelArgs {
    /// Only this drone model
    #[arg(long, conflicts_with = "family")]
    pub model: Option<String>,

    /// Only models of this family, e.g. `Arsenio`
    #[arg(long, value_parser = parse_family)]
    pub family: Option<String>,
}

fn parse_family(raw: &str) -> Result<String, String> {
    known_family(raw).map(str::to_string).ok_or_else(|| {
        format!(
            "unknown family '{raw}' (expected one of {})",
            FAMILIES.join(", ")
        )
    })
}

impl ModelArgs {
    /// The selected model filter.
    #[must_use]
    pub fn to_filter(&self) -> ModelFilter {
        match (&self.model, &self.family) {
            (Some(model), _) => ModelFilter::Model(model.clone()),
            (None, Some(family)) => ModelFilter::Family(family.clone()),
            (None, None) => ModelFilter::All,
        }
    }
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Case-insensitive text to look for in any field
    #[arg(short, long)]
    pub search: Option<String>,

    #[command(flatten)]
    pub models: ModelArgs,

    /// Maximum number of records
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

impl ListCommand {
    /// The record query these arguments describe.
    #[must_use]
    pub fn query(&self) -> RecordQuery {
        RecordQuery {
            search: self.search.clone().filter(|s| !s.trim().is_empty()),
            model: self.models.to_filter(),
        }
    }
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Record id
    pub id: i64,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Field values, e.g. `--set "Flight ID=F-12" --set mission_date=2025-03-14`
    #[arg(short, long = "set", value_name = "FIELD=VALUE", required = true)]
    pub set: Vec<String>,
}

/// Edit command arguments.
#[derive(Debug, Args)]
pub struct EditCommand {
    /// Record id
    pub id: i64,

    /// Field values to change; an empty value clears the field
    #[arg(short, long = "set", value_name = "FIELD=VALUE", required = true)]
    pub set: Vec<String>,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Record id
    pub id: i64,
}

/// Dashboard filter arguments.
#[derive(Debug, Clone, Args)]
pub struct FilterArgs {
    /// Date window: 30d, 90d, 6m, 1y, or all
    #[arg(short, long, default_value = "all")]
    pub window: DateWindow,

    #[command(flatten)]
    pub models: ModelArgs,

    /// Only flights with this flight ID
    #[arg(long)]
    pub flight: Option<String>,
}

impl FilterArgs {
    /// The dashboard filter these arguments describe.
    #[must_use]
    pub fn to_filter(&self) -> DashboardFilter {
        DashboardFilter {
            window: self.window,
            model: self.models.to_filter(),
            flight_id: self.flight.clone(),
        }
    }
}

/// Dashboard command arguments.
#[derive(Debug, Args)]
pub struct DashboardCommand {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Output the full snapshot as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Output file (defaults to a dated name in the current directory)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        file: Option<PathBuf>,
    },
}
