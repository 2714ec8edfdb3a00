//! fm-core - Core library for fuzzermon schema migrations
//!
//! Provides the declarative schema model, schema change records, the
//! dependency graph that orders them, project-state folding, configuration,
//! and migration discovery. Nothing here touches a database; see `fm-db`.

pub mod catalog;
pub mod config;
pub mod error;
pub mod graph;
pub mod loading;
pub mod migration_key;
pub mod names;
mod newtype_string;
pub mod record;
pub mod schema;
pub mod state;

pub use catalog::builtin_migrations;
pub use config::{Config, DatabaseConfig};
pub use error::{CoreError, CoreResult};
pub use graph::MigrationGraph;
pub use loading::{discover_migrations, load_catalog};
pub use migration_key::MigrationKey;
pub use names::{FieldName, TableName};
pub use record::{Operation, SchemaChangeRecord};
pub use schema::{FieldDef, FieldKind, ForeignKeyRef, OnDelete, TableDef};
pub use state::{ProjectState, Reference};
