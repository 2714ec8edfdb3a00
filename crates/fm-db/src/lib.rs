//! fm-db - DuckDB migration runner for fuzzermon
//!
//! Applies schema change records from `fm-core` to a DuckDB database, tracks
//! them in an applied-migration ledger, and deletes rows according to the
//! declared foreign-key policies.

pub mod cascade;
pub mod connection;
pub mod ddl;
pub mod error;
pub mod introspect;
pub mod ledger;
pub mod migrator;

pub use cascade::delete_cascade;
pub use connection::MigrationDb;
pub use error::{MigrateError, MigrateResult};
pub use ledger::AppliedSet;
pub use migrator::{apply, MigrationReport, MigrationStatus, Migrator, MigratorOptions};
