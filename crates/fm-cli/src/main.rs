//! fuzzermon migration CLI

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use commands::{delete, migrate, showmigrations, sqlmigrate, unapply};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        cli::Commands::Migrate(args) => migrate::execute(args, &cli.global),
        cli::Commands::Showmigrations(args) => showmigrations::execute(args, &cli.global),
        cli::Commands::Sqlmigrate(args) => sqlmigrate::execute(args, &cli.global),
        cli::Commands::Unapply(args) => unapply::execute(args, &cli.global),
        cli::Commands::Delete(args) => delete::execute(args, &cli.global),
    }
}
