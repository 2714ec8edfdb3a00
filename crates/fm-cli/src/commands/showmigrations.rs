//! Showmigrations command implementation

use anyhow::Result;
use fm_db::MigrationStatus;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::cli::{GlobalArgs, ShowArgs, ShowOutput};
use crate::commands::common::ProjectContext;

/// JSON row for one migration
#[derive(Serialize)]
struct StatusRow {
    migration: String,
    applied: bool,
    applied_at: Option<String>,
    external: bool,
    operations: Vec<String>,
}

/// Execute the showmigrations command
pub(crate) fn execute(args: &ShowArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = ProjectContext::load(global)?;
    let migrator = ctx.migrator()?;
    let status = migrator.status()?;

    match args.output {
        ShowOutput::Json => {
            let rows: Vec<StatusRow> = status
                .into_iter()
                .map(|s| StatusRow {
                    migration: s.key.to_string(),
                    applied: s.is_applied(),
                    applied_at: s.applied_at,
                    external: s.external,
                    operations: s.operations,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        ShowOutput::Text => {
            let mut by_app: BTreeMap<&str, Vec<&MigrationStatus>> = BTreeMap::new();
            for s in &status {
                by_app.entry(s.key.app()).or_default().push(s);
            }
            for (app, rows) in by_app {
                println!("{app}");
                for s in rows {
                    let mark = if s.is_applied() { "X" } else { " " };
                    let suffix = if s.external { " (external)" } else { "" };
                    println!(" [{mark}] {}{suffix}", s.key.name());
                }
            }
        }
    }
    Ok(())
}
