//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// fm - apply and inspect fuzzermon schema migrations
#[derive(Parser, Debug)]
#[command(name = "fm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override database path
    #[arg(short, long, global = true, env = "FM_DATABASE")]
    pub database: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply pending migrations
    Migrate(MigrateArgs),

    /// List migrations and whether each is applied
    Showmigrations(ShowArgs),

    /// Print the SQL for a migration
    Sqlmigrate(SqlArgs),

    /// Reverse an applied migration (requires allow_rollback)
    Unapply(UnapplyArgs),

    /// Delete a row, cascading along declared foreign keys
    Delete(DeleteArgs),
}

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Migrate up to and including this migration (`app.name`)
    pub target: Option<String>,

    /// Record the target as applied without running it
    #[arg(long, requires = "target")]
    pub fake: bool,

    /// Show the plan without applying anything
    #[arg(long, conflicts_with = "fake")]
    pub plan: bool,
}

/// Arguments for the showmigrations command
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: ShowOutput,
}

/// showmigrations output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowOutput {
    /// `[X]`/`[ ]` list
    Text,
    /// JSON array
    Json,
}

/// Arguments for the sqlmigrate command
#[derive(Args, Debug)]
pub struct SqlArgs {
    /// Migration to render (`app.name`)
    pub migration: String,

    /// Render the reverse statements
    #[arg(long)]
    pub backwards: bool,
}

/// Arguments for the unapply command
#[derive(Args, Debug)]
pub struct UnapplyArgs {
    /// Migration to reverse (`app.name`)
    pub migration: String,
}

/// Arguments for the delete command
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Table to delete from
    pub table: String,

    /// Primary-key value of the row
    pub id: i64,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
