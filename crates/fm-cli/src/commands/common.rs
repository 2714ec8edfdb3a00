//! Shared helpers for loading the project, catalog, and database

use anyhow::{Context, Result};
use fm_core::{load_catalog, Config, MigrationKey};
use fm_db::{MigrationDb, Migrator, MigratorOptions};
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;

/// Loaded configuration plus an open database for one command invocation
pub(crate) struct ProjectContext {
    pub root: PathBuf,
    pub config: Config,
    pub db: MigrationDb,
    pub verbose: bool,
}

impl ProjectContext {
    /// Load config from `--config` or the project directory and open the
    /// database (`--database` overrides the configured path).
    pub(crate) fn load(global: &GlobalArgs) -> Result<Self> {
        let root = PathBuf::from(&global.project_dir);

        let config = if let Some(config_path) = &global.config {
            Config::load(Path::new(config_path)).context("Failed to load configuration file")?
        } else {
            Config::load_from_dir(&root).context("Failed to load project configuration")?
        };

        let db_path = global
            .database
            .clone()
            .unwrap_or_else(|| config.database_path(&root));
        log::debug!("Opening database {db_path}");
        let db = MigrationDb::new(&db_path)
            .with_context(|| format!("Failed to open database {db_path}"))?;

        let ctx = Self {
            root,
            config,
            db,
            verbose: global.verbose,
        };
        ctx.verbose(&format!("Project '{}', database {db_path}", ctx.config.name));
        Ok(ctx)
    }

    /// Build a migrator over the full catalog
    pub(crate) fn migrator(&self) -> Result<Migrator<'_>> {
        let records =
            load_catalog(&self.config, &self.root).context("Failed to load migrations")?;
        self.verbose(&format!("Loaded {} migration(s)", records.len()));
        let options = MigratorOptions {
            allow_rollback: self.config.allow_rollback,
        };
        Ok(Migrator::new(&self.db, records, options)?)
    }

    /// Print verbose output if enabled
    pub(crate) fn verbose(&self, msg: &str) {
        if self.verbose {
            eprintln!("[verbose] {}", msg);
        }
    }
}

/// Parse an `app.name` argument
pub(crate) fn parse_key(value: &str) -> Result<MigrationKey> {
    value
        .parse()
        .with_context(|| format!("Invalid migration '{value}'"))
}
