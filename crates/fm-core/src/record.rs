//! Schema change records and the operations they carry.

use crate::error::{CoreError, CoreResult};
use crate::migration_key::MigrationKey;
use crate::names::TableName;
use crate::schema::TableDef;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One schema operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Create a new table.
    CreateTable(TableDef),
}

impl Operation {
    /// One-line human description, e.g. `Create table TestSignalError`.
    pub fn describe(&self) -> String {
        match self {
            Operation::CreateTable(table) => format!("Create table {}", table.name),
        }
    }

    /// Tables this operation brings into existence.
    pub fn created_table(&self) -> Option<&TableName> {
        match self {
            Operation::CreateTable(table) => Some(&table.name),
        }
    }
}

/// A named, dependency-linked schema mutation.
///
/// Records are immutable once loaded. Amending one that has already been
/// applied somewhere is a user error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaChangeRecord {
    /// Owning application label
    pub app: String,

    /// Record name, unique within `app`
    pub name: String,

    /// Records that must be applied first
    #[serde(default)]
    pub dependencies: Vec<MigrationKey>,

    /// Operations, executed in order
    pub operations: Vec<Operation>,
}

impl SchemaChangeRecord {
    pub fn key(&self) -> CoreResult<MigrationKey> {
        MigrationKey::try_new(&self.app, &self.name)
    }

    /// Parse a single record from YAML and validate it.
    pub fn from_yaml(content: &str) -> CoreResult<Self> {
        let record: SchemaChangeRecord = serde_yaml::from_str(content)?;
        record.validate()?;
        Ok(record)
    }

    /// Tables created by this record, in operation order.
    pub fn created_tables(&self) -> Vec<&TableName> {
        self.operations
            .iter()
            .filter_map(Operation::created_table)
            .collect()
    }

    /// Structural validation independent of any other record.
    pub fn validate(&self) -> CoreResult<()> {
        let key = self.key()?;
        let invalid = |reason: String| CoreError::InvalidMigration {
            key: key.to_string(),
            reason,
        };

        if self.operations.is_empty() {
            return Err(invalid("no operations".to_string()));
        }

        let mut deps = HashSet::new();
        for dep in &self.dependencies {
            if *dep == key {
                return Err(invalid("depends on itself".to_string()));
            }
            if !deps.insert(dep) {
                return Err(invalid(format!("dependency {dep} listed twice")));
            }
        }

        let mut created = HashSet::new();
        for op in &self.operations {
            match op {
                Operation::CreateTable(table) => {
                    table.validate(&key.to_string())?;
                    if !created.insert(table.name.to_lowercase()) {
                        return Err(invalid(format!("table '{}' created twice", table.name)));
                    }
                }
            }
        }
        Ok(())
    }
}
