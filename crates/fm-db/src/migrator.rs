//! Schema change application.
//!
//! [`apply`] is the guarded transition of a single record from pending to
//! applied. [`Migrator`] plans a catalog against the ledger and drives
//! [`apply`] in dependency order, halting at the first failure.

use crate::connection::MigrationDb;
use crate::ddl::{backward_sql, forward_sql, DEFAULT_PRIMARY_KEY};
use crate::error::{MigrateError, MigrateResult};
use crate::introspect::{list_tables, primary_key, table_exists};
use crate::ledger::{is_recorded, record_applied, remove_applied, AppliedSet};
use fm_core::{
    MigrationGraph, MigrationKey, Operation, ProjectState, SchemaChangeRecord, TableDef,
    TableName,
};
use std::collections::{BTreeMap, HashSet};

/// Apply one record to `db`.
///
/// Checks, in order: every dependency is in `applied`; the record is not
/// already applied; none of its tables exist; every foreign-key target
/// exists. The DDL and the ledger row are then written in one transaction and
/// the key is added to `applied`.
pub fn apply(
    db: &MigrationDb,
    record: &SchemaChangeRecord,
    applied: &mut AppliedSet,
) -> MigrateResult<()> {
    let key = record.key()?;
    let migration = key.to_string();

    for dep in &record.dependencies {
        if !applied.contains(dep) {
            return Err(MigrateError::DependencyNotSatisfied {
                migration,
                dependency: dep.to_string(),
            });
        }
    }

    if applied.contains(&key) || is_recorded(db.conn(), &key)? {
        return Err(MigrateError::SchemaConflict {
            migration,
            reason: "already applied".to_string(),
        });
    }

    let mut target_pks: BTreeMap<String, String> = BTreeMap::new();
    for op in &record.operations {
        let Operation::CreateTable(table) = op;
        if table_exists(db.conn(), &table.name)? {
            return Err(MigrateError::TableAlreadyExists {
                migration,
                table: table.name.to_string(),
            });
        }
    }
    let created: HashSet<String> = record
        .created_tables()
        .iter()
        .map(|t| t.to_lowercase())
        .collect();
    for op in &record.operations {
        let Operation::CreateTable(table) = op;
        for fk in table.foreign_keys() {
            let target = fk.target.to_lowercase();
            if created.contains(&target) || target_pks.contains_key(&target) {
                continue;
            }
            if !table_exists(db.conn(), fk.target)? {
                return Err(MigrateError::ConstraintViolationOnApply {
                    migration,
                    message: format!(
                        "foreign key {}.{} references missing table '{}'",
                        table.name, fk.column, fk.target
                    ),
                });
            }
            let pk = primary_key(db.conn(), fk.target)?
                .unwrap_or_else(|| DEFAULT_PRIMARY_KEY.to_string());
            target_pks.insert(target, pk);
        }
    }

    let statements = forward_sql(record, |t: &TableName| {
        let pk = target_pks.get(&t.to_lowercase()).cloned();
        pk.or_else(|| created_primary_key(record, t))
            .unwrap_or_else(|| DEFAULT_PRIMARY_KEY.to_string())
    });

    let applied_at = db.transaction(|conn| {
        for sql in &statements {
            conn.execute_batch(sql)
                .map_err(|e| MigrateError::ConstraintViolationOnApply {
                    migration: migration.clone(),
                    message: e.to_string(),
                })?;
        }
        record_applied(conn, &key)
    })?;

    log::debug!("Applied {key}");
    applied.insert(key, applied_at);
    Ok(())
}

/// Primary key of a table created earlier in the same record
fn created_primary_key(record: &SchemaChangeRecord, table: &TableName) -> Option<String> {
    find_table(std::iter::once(record), table).and_then(TableDef::primary_key)
}

/// Find the definition of `table` among the create-table operations of `records`
fn find_table<'a, I>(records: I, table: &str) -> Option<&'a TableDef>
where
    I: IntoIterator<Item = &'a SchemaChangeRecord>,
{
    let lower = table.to_lowercase();
    records
        .into_iter()
        .flat_map(|r| r.operations.iter())
        .map(|op| match op {
            Operation::CreateTable(t) => t,
        })
        .find(|t| t.name.to_lowercase() == lower)
}

/// Runner options taken from configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct MigratorOptions {
    /// Permit [`Migrator::unapply`]
    pub allow_rollback: bool,
}

/// Applied/pending status of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub key: MigrationKey,
    /// When the record was applied, if it was
    pub applied_at: Option<String>,
    /// Named as a dependency but absent from the catalog
    pub external: bool,
    /// Operation descriptions; empty for external records
    pub operations: Vec<String>,
}

impl MigrationStatus {
    pub fn is_applied(&self) -> bool {
        self.applied_at.is_some()
    }
}

/// Summary of one `migrate` run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Records applied by this run, in order
    pub applied: Vec<MigrationKey>,
}

/// Applies a catalog of records to one database.
pub struct Migrator<'a> {
    db: &'a MigrationDb,
    graph: MigrationGraph,
    options: MigratorOptions,
}

impl<'a> Migrator<'a> {
    /// Build the dependency graph for `records`.
    pub fn new(
        db: &'a MigrationDb,
        records: Vec<SchemaChangeRecord>,
        options: MigratorOptions,
    ) -> MigrateResult<Self> {
        let graph = MigrationGraph::build(records)?;
        Ok(Self { db, graph, options })
    }

    pub fn graph(&self) -> &MigrationGraph {
        &self.graph
    }

    /// Current ledger contents
    pub fn applied(&self) -> MigrateResult<AppliedSet> {
        AppliedSet::load(self.db.conn())
    }

    /// Records `migrate(target)` would apply, in order.
    pub fn plan(&self, target: Option<&MigrationKey>) -> MigrateResult<Vec<&SchemaChangeRecord>> {
        let applied = self.applied()?;
        Ok(self.graph.plan(|k| applied.contains(k), target)?)
    }

    /// Apply every pending record (or those leading up to `target`).
    ///
    /// Stops at the first failure and returns it unchanged; records applied
    /// before the failure stay applied.
    pub fn migrate(&self, target: Option<&MigrationKey>) -> MigrateResult<MigrationReport> {
        let mut applied = self.applied()?;
        let plan = self.graph.plan(|k| applied.contains(k), target)?;
        if plan.is_empty() {
            log::info!("No migrations to apply");
            return Ok(MigrationReport::default());
        }

        let mut report = MigrationReport::default();
        for record in plan {
            let key = record.key()?;
            if let Err(e) = apply(self.db, record, &mut applied) {
                log::warn!("Migration {key} failed, halting: {e}");
                return Err(e);
            }
            report.applied.push(key);
        }
        log::info!("Applied {} migration(s)", report.applied.len());
        Ok(report)
    }

    /// Mark `key` applied without running its DDL.
    ///
    /// Catalog records must have their dependencies applied. Keys that are
    /// only known as external dependencies are recorded as-is.
    pub fn fake(&self, key: &MigrationKey) -> MigrateResult<()> {
        let applied = self.applied()?;
        if applied.contains(key) {
            return Err(MigrateError::SchemaConflict {
                migration: key.to_string(),
                reason: "already applied".to_string(),
            });
        }

        if let Some(record) = self.graph.get(key) {
            if let Some(dep) = record.dependencies.iter().find(|d| !applied.contains(d)) {
                return Err(MigrateError::DependencyNotSatisfied {
                    migration: key.to_string(),
                    dependency: dep.to_string(),
                });
            }
        } else if !self.graph.external_dependencies().contains(key) {
            return Err(fm_core::CoreError::MigrationNotFound {
                key: key.to_string(),
            }
            .into());
        }

        record_applied(self.db.conn(), key)?;
        log::info!("Faked {key}");
        Ok(())
    }

    /// Reverse an applied record. Requires `allow_rollback`.
    pub fn unapply(&self, key: &MigrationKey) -> MigrateResult<()> {
        if !self.options.allow_rollback {
            return Err(MigrateError::RollbackDisabled {
                migration: key.to_string(),
            });
        }
        let record = self.graph.require(key)?;
        let applied = self.applied()?;
        if !applied.contains(key) {
            return Err(MigrateError::SchemaConflict {
                migration: key.to_string(),
                reason: "not applied".to_string(),
            });
        }
        if let Some(dependent) = self
            .graph
            .dependents(key)
            .into_iter()
            .find(|d| applied.contains(d))
        {
            return Err(MigrateError::DependentStillApplied {
                migration: key.to_string(),
                dependent: dependent.to_string(),
            });
        }

        let statements = backward_sql(record);
        self.db.transaction(|conn| {
            for sql in &statements {
                conn.execute_batch(sql)
                    .map_err(|e| MigrateError::ConstraintViolationOnApply {
                        migration: key.to_string(),
                        message: e.to_string(),
                    })?;
            }
            remove_applied(conn, key)
        })?;
        log::info!("Unapplied {key}");
        Ok(())
    }

    /// Status of every external dependency and catalog record, externals
    /// first, then apply order.
    pub fn status(&self) -> MigrateResult<Vec<MigrationStatus>> {
        let applied = self.applied()?;
        let mut out: Vec<MigrationStatus> = self
            .graph
            .external_dependencies()
            .iter()
            .map(|key| MigrationStatus {
                key: key.clone(),
                applied_at: applied.applied_at(key).map(str::to_string),
                external: true,
                operations: Vec::new(),
            })
            .collect();

        for key in self.graph.topological_order()? {
            let record = self.graph.require(key)?;
            out.push(MigrationStatus {
                key: key.clone(),
                applied_at: applied.applied_at(key).map(str::to_string),
                external: false,
                operations: record.operations.iter().map(Operation::describe).collect(),
            });
        }
        Ok(out)
    }

    /// Rendered DDL for a catalog record, forward or backward.
    pub fn sql_for(&self, key: &MigrationKey, backwards: bool) -> MigrateResult<Vec<String>> {
        let record = self.graph.require(key)?;
        if backwards {
            return Ok(backward_sql(record));
        }
        Ok(forward_sql(record, |t: &TableName| {
            find_table(self.graph.records(), t)
                .and_then(TableDef::primary_key)
                .unwrap_or_else(|| DEFAULT_PRIMARY_KEY.to_string())
        }))
    }

    /// Schema of the applied catalog records, folded in apply order.
    ///
    /// Tables present in the database but created by no applied record are
    /// declared external so foreign keys into them resolve.
    pub fn project_state(&self) -> MigrateResult<ProjectState> {
        let applied = self.applied()?;
        let records: Vec<&SchemaChangeRecord> = self
            .graph
            .topological_order()?
            .into_iter()
            .filter(|k| applied.contains(k))
            .map(|k| self.graph.require(k))
            .collect::<Result<_, _>>()?;

        let created: HashSet<String> = records
            .iter()
            .flat_map(|r| r.created_tables())
            .map(|t| t.to_lowercase())
            .collect();

        let mut state = ProjectState::new();
        for table in list_tables(self.db.conn())? {
            if !created.contains(&table.to_lowercase()) {
                state.declare_external(&table);
            }
        }
        for record in records {
            state.apply(record)?;
        }
        Ok(state)
    }
}

#[cfg(test)]
#[path = "migrator_test.rs"]
mod tests;
