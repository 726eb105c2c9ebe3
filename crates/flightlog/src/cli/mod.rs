//! Command-line interface for flightlog.
//!
//! This module provides the CLI structure and command handlers for the
//! `flightlog` binary.

mod commands;
mod handlers;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, ConfigCommand, DashboardCommand, DeleteCommand, EditCommand, ExportCommand,
    FilterArgs, ImportCommand, ListCommand, ModelArgs, ShowCommand,
};
pub use handlers::execute;

use crate::logging::Verbosity;

/// flightlog - Flight log ingestion and fleet health analytics
///
/// Imports flight log spreadsheets, keeps the records in a local database,
/// and reports battery health and fleet performance.
#[derive(Debug, Parser)]
#[command(name = "flightlog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import a flight log spreadsheet
    Import(ImportCommand),

    /// List stored flight records
    List(ListCommand),

    /// Show one flight record with its battery health
    Show(ShowCommand),

    /// Add a flight record by hand
    Add(AddCommand),

    /// Change fields of a flight record
    Edit(EditCommand),

    /// Delete a flight record
    Delete(DeleteCommand),

    /// Show fleet performance for a date window and model
    Dashboard(DashboardCommand),

    /// Write the dashboard summary as JSON
    Export(ExportCommand),

    /// List the configured drone models and their battery packs
    Models,

    /// List past imports
    Imports,

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{DateWindow, ModelFilter};
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "flightlog");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_flags() {
        assert_eq!(parse(&["flightlog", "models"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["flightlog", "-v", "models"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["flightlog", "-vv", "models"]).verbosity(), Verbosity::Debug);
        assert_eq!(parse(&["flightlog", "-q", "-v", "models"]).verbosity(), Verbosity::Quiet);
    }

    #[test]
    fn test_parse_with_config() {
        let cli = parse(&["flightlog", "-c", "/custom/config.toml", "models"]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_import() {
        let cli = parse(&[
            "flightlog",
            "import",
            "march.csv",
            "--header-row",
            "1",
            "--map",
            "BATT 1 TO=battery1_takeoff_voltage",
            "--map",
            "3=ignore",
            "--dry-run",
        ]);
        let Command::Import(cmd) = cli.command else {
            panic!("expected import");
        };
        assert_eq!(cmd.file, PathBuf::from("march.csv"));
        assert_eq!(cmd.header_row, Some(1));
        assert_eq!(cmd.map.len(), 2);
        assert!(cmd.dry_run);
        assert!(!cmd.force);
    }

    #[test]
    fn test_parse_list_filters() {
        let cli = parse(&["flightlog", "list", "--search", "landing", "--family", "Arsenio"]);
        let Command::List(cmd) = cli.command else {
            panic!("expected list");
        };
        let query = cmd.query();
        assert_eq!(query.search.as_deref(), Some("landing"));
        assert_eq!(query.model, ModelFilter::Family("Arsenio".to_string()));
    }

    #[test]
    fn test_model_and_family_conflict() {
        let result = Cli::try_parse_from([
            "flightlog", "list", "--model", "Arsenio 004", "--family", "Arsenio",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_family_is_normalized_and_checked() {
        let cli = parse(&["flightlog", "dashboard", "--family", "damisa"]);
        let Command::Dashboard(cmd) = cli.command else {
            panic!("expected dashboard");
        };
        assert_eq!(cmd.filter.to_filter().model, ModelFilter::Family("Damisa".to_string()));

        assert!(Cli::try_parse_from(["flightlog", "list", "--family", "Cessna"]).is_err());
    }

    #[test]
    fn test_parse_dashboard_window() {
        let cli = parse(&["flightlog", "dashboard", "--window", "30d", "--json"]);
        let Command::Dashboard(cmd) = cli.command else {
            panic!("expected dashboard");
        };
        assert_eq!(cmd.filter.window, DateWindow::Last30Days);
        assert!(cmd.json);
    }

    #[test]
    fn test_dashboard_window_defaults_to_all() {
        let cli = parse(&["flightlog", "export"]);
        let Command::Export(cmd) = cli.command else {
            panic!("expected export");
        };
        assert_eq!(cmd.filter.window, DateWindow::AllTime);
        assert!(cmd.output.is_none());
    }

    #[test]
    fn test_rejects_unknown_window() {
        assert!(Cli::try_parse_from(["flightlog", "dashboard", "--window", "2w"]).is_err());
    }

    #[test]
    fn test_add_requires_fields() {
        assert!(Cli::try_parse_from(["flightlog", "add"]).is_err());
        let cli = parse(&["flightlog", "add", "--set", "flight_id=F-1"]);
        assert!(matches!(cli.command, Command::Add(_)));
    }

    #[test]
    fn test_parse_config_validate() {
        let cli = parse(&["flightlog", "config", "validate", "/tmp/config.toml"]);
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Validate { file: Some(_) })
        ));
    }
}
