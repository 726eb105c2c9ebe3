//! `flightlog` - CLI for flight log ingestion and fleet analytics
//!
//! This binary loads configuration, initializes logging, and hands the
//! parsed command to the library.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::Context;
use chrono::Utc;
use clap::Parser;

use flightlog::cli::{execute, Cli};
use flightlog::{init_logging, Config};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(cli.command, &config, Utc::now(), &mut out)?;
    Ok(())
}
