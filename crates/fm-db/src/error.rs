//! Error types for migration application.

use fm_core::CoreError;
use thiserror::Error;

/// Migration runner errors.
///
/// Every variant is fatal for the run that produced it: the runner never
/// retries DDL.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Failed to open or create the database (M001).
    #[error("[M001] Database connection failed: {0}")]
    ConnectionError(String),

    /// A dependency of the record has not been applied (M002).
    #[error("[M002] Cannot apply {migration}: dependency {dependency} is not applied")]
    DependencyNotSatisfied {
        migration: String,
        dependency: String,
    },

    /// A table the record creates already exists (M003).
    #[error("[M003] Cannot apply {migration}: table '{table}' already exists")]
    TableAlreadyExists { migration: String, table: String },

    /// The database schema does not match the expected pre-state (M004).
    #[error("[M004] Schema conflict for {migration}: {reason}")]
    SchemaConflict { migration: String, reason: String },

    /// The database rejected the DDL (M005).
    #[error("[M005] Database rejected {migration}: {message}")]
    ConstraintViolationOnApply { migration: String, message: String },

    /// Applied-migration ledger could not be read or written (M006).
    #[error("[M006] Migration ledger error: {0}")]
    LedgerError(String),

    /// Transaction management error (M007).
    #[error("[M007] Transaction failed: {0}")]
    TransactionError(String),

    /// Reversal requested while `allow_rollback` is off (M008).
    #[error("[M008] Cannot unapply {migration}: rollback is disabled (set allow_rollback: true)")]
    RollbackDisabled { migration: String },

    /// Reversal requested while a dependent record is still applied (M009).
    #[error("[M009] Cannot unapply {migration}: {dependent} depends on it and is applied")]
    DependentStillApplied {
        migration: String,
        dependent: String,
    },

    /// Delete refused by a restrict foreign key (M010).
    #[error("[M010] Cannot delete {table} row {id}: referenced by {rows} row(s) in {child}")]
    RestrictedDelete {
        table: String,
        id: i64,
        child: String,
        rows: i64,
    },

    /// Cascade would revisit a table (M011).
    #[error("[M011] Cascade cycle through table '{table}'")]
    CascadeCycle { table: String },

    /// Table is not part of the migrated schema (M012).
    #[error("[M012] Unknown table '{0}'")]
    UnknownTable(String),

    /// SQL execution error (M013).
    #[error("[M013] Query failed: {0}")]
    QueryError(String),

    /// DuckDB driver error with preserved source chain (M014).
    #[error("[M014] DuckDB error")]
    DuckDb(#[source] duckdb::Error),

    /// Catalog or graph error from fm-core.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;

impl From<duckdb::Error> for MigrateError {
    fn from(err: duckdb::Error) -> Self {
        MigrateError::DuckDb(err)
    }
}
