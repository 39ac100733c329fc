mod cli;
mod commands;
mod config;
mod logging;

use std::io;
use std::process;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;

use prenatal_core::db::Database;
use prenatal_core::gestation::calendar_date;

use crate::cli::{Cli, Command};
use crate::commands::Session;
use crate::config::PrenatalConfig;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let reference = cli.on.unwrap_or_else(|| calendar_date(&Local::now()));
    let mut out = io::stdout().lock();

    if let Command::Calc(args) = &cli.command {
        return commands::calc(args, reference, &mut out);
    }

    let config = PrenatalConfig::load(cli.config.as_deref())?;
    let db_path = cli.database.unwrap_or_else(|| config.database.clone());
    let db = Database::open(&db_path)
        .with_context(|| format!("failed to open database: {}", db_path.display()))?;

    let session = Session {
        db: &db,
        config: &config,
        reference,
    };
    session.run(cli.command, &mut out)
}
