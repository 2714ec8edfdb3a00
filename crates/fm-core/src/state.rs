//! Schema implied by an ordered sequence of applied records.

use crate::error::{CoreError, CoreResult};
use crate::names::TableName;
use crate::record::{Operation, SchemaChangeRecord};
use crate::schema::{OnDelete, TableDef};
use std::collections::{BTreeMap, BTreeSet};

/// A foreign key pointing at some table, seen from the referencing side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Referencing (child) table
    pub table: TableName,
    /// Foreign-key column on the child
    pub column: String,
    pub on_delete: OnDelete,
}

/// Tables known after folding records operation by operation.
///
/// Lookups are case-insensitive, matching DuckDB identifier semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectState {
    tables: BTreeMap<String, TableDef>,
    /// Tables that exist in the database but were not created by any record
    external: BTreeSet<String>,
}

impl ProjectState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold `records` in the given order.
    pub fn from_records<'a, I>(records: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = &'a SchemaChangeRecord>,
    {
        let mut state = Self::new();
        for record in records {
            state.apply(record)?;
        }
        Ok(state)
    }

    /// Register a table that exists outside the catalog so foreign keys may
    /// target it.
    pub fn declare_external(&mut self, table: &str) {
        let lower = table.to_lowercase();
        if !self.tables.contains_key(&lower) {
            self.external.insert(lower);
        }
    }

    /// Apply every operation of `record`.
    pub fn apply(&mut self, record: &SchemaChangeRecord) -> CoreResult<()> {
        let key = record.key()?.to_string();
        for op in &record.operations {
            match op {
                Operation::CreateTable(table) => self.create_table(&key, table)?,
            }
        }
        Ok(())
    }

    fn create_table(&mut self, key: &str, table: &TableDef) -> CoreResult<()> {
        let lower = table.name.to_lowercase();
        if self.contains(&lower) {
            return Err(CoreError::SchemaConflict {
                key: key.to_string(),
                reason: format!("table '{}' already exists", table.name),
            });
        }
        for fk in table.foreign_keys() {
            let target = fk.target.to_lowercase();
            if target != lower && !self.contains(&target) {
                return Err(CoreError::UnknownTable {
                    key: key.to_string(),
                    table: fk.target.to_string(),
                });
            }
        }
        self.tables.insert(lower, table.clone());
        Ok(())
    }

    /// Check whether a table is known, declared or external
    pub fn contains(&self, table: &str) -> bool {
        let lower = table.to_lowercase();
        self.tables.contains_key(&lower) || self.external.contains(&lower)
    }

    /// Definition of a table created by some record
    pub fn get(&self, table: &str) -> Option<&TableDef> {
        self.tables.get(&table.to_lowercase())
    }

    /// Tables created by records, ordered by lowercase name
    pub fn tables(&self) -> impl Iterator<Item = &TableDef> {
        self.tables.values()
    }

    /// Every foreign key that targets `table`, ordered by child table name
    pub fn referencing(&self, table: &str) -> Vec<Reference> {
        let target = table.to_lowercase();
        self.tables
            .values()
            .flat_map(|child| {
                child
                    .foreign_keys()
                    .into_iter()
                    .filter(|fk| fk.target.to_lowercase() == target)
                    .map(|fk| Reference {
                        table: child.name.clone(),
                        column: fk.column,
                        on_delete: fk.on_delete,
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
