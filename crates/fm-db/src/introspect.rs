//! Read-only queries against the DuckDB catalog.

use crate::error::{MigrateError, MigrateResult};
use duckdb::Connection;

/// Schema that migrated tables live in
pub const TARGET_SCHEMA: &str = "main";

/// A column as reported by `information_schema.columns`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

/// Whether a table exists, compared case-insensitively.
pub fn table_exists(conn: &Connection, table: &str) -> MigrateResult<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM information_schema.tables
             WHERE table_schema = ? AND lower(table_name) = lower(?)",
            duckdb::params![TARGET_SCHEMA, table],
            |row| row.get(0),
        )
        .map_err(|e| MigrateError::QueryError(format!("table_exists({table}): {e}")))?;
    Ok(count > 0)
}

/// All base tables in the target schema, sorted by name.
pub fn list_tables(conn: &Connection) -> MigrateResult<Vec<String>> {
    let query_err = |e: duckdb::Error| MigrateError::QueryError(format!("list_tables: {e}"));
    let mut stmt = conn
        .prepare(
            "SELECT table_name FROM information_schema.tables
             WHERE table_schema = ? AND table_type = 'BASE TABLE'
             ORDER BY table_name",
        )
        .map_err(query_err)?;
    let rows = stmt
        .query_map(duckdb::params![TARGET_SCHEMA], |row| row.get::<_, String>(0))
        .map_err(query_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(query_err)
}

/// Columns of `table` in ordinal order.
pub fn describe_table(conn: &Connection, table: &str) -> MigrateResult<Vec<ColumnInfo>> {
    let query_err =
        |e: duckdb::Error| MigrateError::QueryError(format!("describe_table({table}): {e}"));
    let mut stmt = conn
        .prepare(
            "SELECT column_name, data_type, is_nullable FROM information_schema.columns
             WHERE table_schema = ? AND lower(table_name) = lower(?)
             ORDER BY ordinal_position",
        )
        .map_err(query_err)?;
    let rows = stmt
        .query_map(duckdb::params![TARGET_SCHEMA, table], |row| {
            Ok(ColumnInfo {
                name: row.get(0)?,
                data_type: row.get(1)?,
                nullable: row.get::<_, String>(2)? == "YES",
            })
        })
        .map_err(query_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(query_err)
}

/// Primary-key column of `table`, when it has a single-column primary key.
pub fn primary_key(conn: &Connection, table: &str) -> MigrateResult<Option<String>> {
    let query_err =
        |e: duckdb::Error| MigrateError::QueryError(format!("primary_key({table}): {e}"));
    let mut stmt = conn
        .prepare(
            "SELECT constraint_column_names[1] FROM duckdb_constraints()
             WHERE schema_name = ? AND lower(table_name) = lower(?)
               AND constraint_type = 'PRIMARY KEY'
               AND len(constraint_column_names) = 1",
        )
        .map_err(query_err)?;
    let mut rows = stmt
        .query_map(duckdb::params![TARGET_SCHEMA, table], |row| {
            row.get::<_, String>(0)
        })
        .map_err(query_err)?;
    rows.next().transpose().map_err(query_err)
}

/// Number of foreign-key constraints declared on `table`.
pub fn foreign_key_count(conn: &Connection, table: &str) -> MigrateResult<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM duckdb_constraints()
         WHERE schema_name = ? AND lower(table_name) = lower(?)
           AND constraint_type = 'FOREIGN KEY'",
        duckdb::params![TARGET_SCHEMA, table],
        |row| row.get(0),
    )
    .map_err(|e| MigrateError::QueryError(format!("foreign_key_count({table}): {e}")))
}
