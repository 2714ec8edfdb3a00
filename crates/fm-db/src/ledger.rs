//! Applied-migration ledger.
//!
//! Records which schema change records have been applied to the target
//! database in `fm_meta.applied_migrations`.

use crate::error::{MigrateError, MigrateResult};
use duckdb::Connection;
use fm_core::MigrationKey;
use std::collections::BTreeMap;

/// Ensure the `fm_meta` schema and ledger table exist.
pub(crate) fn ensure_ledger_table(conn: &Connection) -> MigrateResult<()> {
    conn.execute_batch(
        "CREATE SCHEMA IF NOT EXISTS fm_meta;
         CREATE TABLE IF NOT EXISTS fm_meta.applied_migrations (
             app        VARCHAR NOT NULL,
             name       VARCHAR NOT NULL,
             applied_at VARCHAR NOT NULL,
             PRIMARY KEY (app, name)
         );",
    )
    .map_err(|e| MigrateError::LedgerError(format!("failed to create ledger table: {e}")))?;
    Ok(())
}

/// Insert a ledger row for `key`, returning its RFC 3339 timestamp.
pub(crate) fn record_applied(conn: &Connection, key: &MigrationKey) -> MigrateResult<String> {
    let applied_at = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO fm_meta.applied_migrations (app, name, applied_at) VALUES (?, ?, ?)",
        duckdb::params![key.app(), key.name(), applied_at],
    )
    .map_err(|e| MigrateError::LedgerError(format!("failed to record {key}: {e}")))?;
    Ok(applied_at)
}

/// Delete the ledger row for `key`.
pub(crate) fn remove_applied(conn: &Connection, key: &MigrationKey) -> MigrateResult<()> {
    conn.execute(
        "DELETE FROM fm_meta.applied_migrations WHERE app = ? AND name = ?",
        duckdb::params![key.app(), key.name()],
    )
    .map_err(|e| MigrateError::LedgerError(format!("failed to remove {key}: {e}")))?;
    Ok(())
}

/// Whether the ledger holds a row for `key`.
pub(crate) fn is_recorded(conn: &Connection, key: &MigrationKey) -> MigrateResult<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM fm_meta.applied_migrations WHERE app = ? AND name = ?",
            duckdb::params![key.app(), key.name()],
            |row| row.get(0),
        )
        .map_err(|e| MigrateError::LedgerError(format!("failed to read ledger: {e}")))?;
    Ok(count > 0)
}

/// The set of applied records with their timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedSet {
    entries: BTreeMap<MigrationKey, String>,
}

impl AppliedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the whole ledger.
    pub fn load(conn: &Connection) -> MigrateResult<Self> {
        let ledger_err = |e: duckdb::Error| MigrateError::LedgerError(format!("failed to read ledger: {e}"));
        let mut stmt = conn
            .prepare("SELECT app, name, applied_at FROM fm_meta.applied_migrations ORDER BY app, name")
            .map_err(ledger_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(ledger_err)?;

        let mut entries = BTreeMap::new();
        for row in rows {
            let (app, name, applied_at) = row.map_err(ledger_err)?;
            let key = MigrationKey::try_new(app, name)
                .map_err(|e| MigrateError::LedgerError(format!("corrupt ledger row: {e}")))?;
            entries.insert(key, applied_at);
        }
        Ok(Self { entries })
    }

    pub fn contains(&self, key: &MigrationKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Timestamp recorded when `key` was applied
    pub fn applied_at(&self, key: &MigrationKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: MigrationKey, applied_at: String) {
        self.entries.insert(key, applied_at);
    }

    pub fn remove(&mut self, key: &MigrationKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &MigrationKey> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
