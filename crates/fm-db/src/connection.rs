//! Target database connection wrapper.
//!
//! [`MigrationDb`] owns a DuckDB [`Connection`] and provides helpers for
//! opening the target database and running statements in a transaction.

use crate::error::{MigrateError, MigrateResult};
use crate::ledger::ensure_ledger_table;
use duckdb::Connection;
use std::path::Path;

/// Wrapper around a DuckDB connection to the database being migrated.
///
/// Single-threaded: one runner holds the connection for the whole sequence,
/// so no two records ever execute concurrently.
pub struct MigrationDb {
    conn: Connection,
}

impl MigrationDb {
    /// Open (or create) the database at `path` and ensure the ledger exists.
    pub fn open(path: &Path) -> MigrateResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| MigrateError::ConnectionError(format!("{e}: {}", path.display())))?;
        ensure_ledger_table(&conn)?;
        Ok(Self { conn })
    }

    /// Create an in-memory database with an empty ledger.
    pub fn open_memory() -> MigrateResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| MigrateError::ConnectionError(e.to_string()))?;
        ensure_ledger_table(&conn)?;
        Ok(Self { conn })
    }

    /// Open from a path string, treating `:memory:` specially.
    pub fn new(path: &str) -> MigrateResult<Self> {
        if path == ":memory:" {
            Self::open_memory()
        } else {
            Self::open(Path::new(path))
        }
    }

    /// Borrow the underlying DuckDB connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Execute `body` within a `BEGIN` / `COMMIT` transaction, rolling back on
    /// error.
    pub fn transaction<F, T>(&self, body: F) -> MigrateResult<T>
    where
        F: FnOnce(&Connection) -> MigrateResult<T>,
    {
        self.conn
            .execute_batch("BEGIN TRANSACTION")
            .map_err(|e| MigrateError::TransactionError(format!("BEGIN failed: {e}")))?;

        let result = body(&self.conn);

        match &result {
            Ok(_) => {
                if let Err(commit_err) = self.conn.execute_batch("COMMIT") {
                    let _ = self.conn.execute_batch("ROLLBACK");
                    return Err(MigrateError::TransactionError(format!(
                        "COMMIT failed: {commit_err}"
                    )));
                }
            }
            Err(_) => {
                let _ = self.conn.execute_batch("ROLLBACK");
            }
        }
        result
    }
}

#[cfg(test)]
#[path = "connection_test.rs"]
mod tests;
