//! Migrations compiled into the binary.
//!
//! Each record is a YAML document embedded via `include_str!`, in the same
//! shape as the files read from `migration_paths`.

use crate::error::{CoreError, CoreResult};
use crate::record::SchemaChangeRecord;

/// An embedded migration document.
pub struct EmbeddedMigration {
    /// File name, used in parse errors
    pub file: &'static str,
    /// Raw YAML
    pub source: &'static str,
}

/// All embedded migrations, in order.
pub static BUILTIN_MIGRATIONS: &[EmbeddedMigration] = &[EmbeddedMigration {
    file: "0009_testsignalerror.yml",
    source: include_str!("catalog/0009_testsignalerror.yml"),
}];

/// Parse every embedded migration.
pub fn builtin_migrations() -> CoreResult<Vec<SchemaChangeRecord>> {
    BUILTIN_MIGRATIONS
        .iter()
        .map(|m| {
            SchemaChangeRecord::from_yaml(m.source).map_err(|e| CoreError::MigrationParseError {
                path: format!("<builtin>/{}", m.file),
                details: e.to_string(),
            })
        })
        .collect()
}
