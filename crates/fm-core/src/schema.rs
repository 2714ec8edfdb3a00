//! Declarative table definitions carried by schema change records.

use crate::error::{CoreError, CoreResult};
use crate::names::{FieldName, TableName};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What happens to referencing rows when the referenced row is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnDelete {
    /// Delete the referencing rows too.
    Cascade,
    /// Refuse to delete while referencing rows exist.
    Restrict,
}

impl std::fmt::Display for OnDelete {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OnDelete::Cascade => write!(f, "cascade"),
            OnDelete::Restrict => write!(f, "restrict"),
        }
    }
}

/// Scalar type and constraints of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Auto-incrementing integer primary key
    Auto,
    /// Bounded-length text
    Char { max_length: u32 },
    /// Plain integer
    Integer,
    /// Integer column referencing the primary key of `to`
    ForeignKey { to: TableName, on_delete: OnDelete },
}

/// One field of a table definition.
///
/// Read and written through [`RawFieldDef`] so that unknown keys, and
/// options that do not belong to the field's `type`, are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFieldDef", into = "RawFieldDef")]
pub struct FieldDef {
    pub name: FieldName,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum FieldType {
    Auto,
    Char,
    Integer,
    ForeignKey,
}

/// On-disk shape of a field: `type` plus every option any type accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFieldDef {
    name: FieldName,
    #[serde(rename = "type")]
    field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    to: Option<TableName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    on_delete: Option<OnDelete>,
}

impl TryFrom<RawFieldDef> for FieldDef {
    type Error = String;

    fn try_from(raw: RawFieldDef) -> Result<Self, Self::Error> {
        let RawFieldDef {
            name,
            field_type,
            max_length,
            to,
            on_delete,
        } = raw;

        let mut extra = Vec::new();
        let kind = match field_type {
            FieldType::Auto | FieldType::Integer => {
                if max_length.is_some() {
                    extra.push("max_length");
                }
                if to.is_some() {
                    extra.push("to");
                }
                if on_delete.is_some() {
                    extra.push("on_delete");
                }
                if field_type == FieldType::Auto {
                    FieldKind::Auto
                } else {
                    FieldKind::Integer
                }
            }
            FieldType::Char => {
                if to.is_some() {
                    extra.push("to");
                }
                if on_delete.is_some() {
                    extra.push("on_delete");
                }
                let max_length = max_length
                    .ok_or_else(|| format!("char field '{name}' requires max_length"))?;
                FieldKind::Char { max_length }
            }
            FieldType::ForeignKey => {
                if max_length.is_some() {
                    extra.push("max_length");
                }
                let to = to.ok_or_else(|| format!("foreign_key field '{name}' requires to"))?;
                let on_delete = on_delete
                    .ok_or_else(|| format!("foreign_key field '{name}' requires on_delete"))?;
                FieldKind::ForeignKey { to, on_delete }
            }
        };

        if !extra.is_empty() {
            return Err(format!(
                "field '{name}' does not accept {}",
                extra.join(", ")
            ));
        }
        Ok(Self { name, kind })
    }
}

impl From<FieldDef> for RawFieldDef {
    fn from(field: FieldDef) -> Self {
        let mut raw = RawFieldDef {
            name: field.name,
            field_type: FieldType::Auto,
            max_length: None,
            to: None,
            on_delete: None,
        };
        match field.kind {
            FieldKind::Auto => {}
            FieldKind::Char { max_length } => {
                raw.field_type = FieldType::Char;
                raw.max_length = Some(max_length);
            }
            FieldKind::Integer => raw.field_type = FieldType::Integer,
            FieldKind::ForeignKey { to, on_delete } => {
                raw.field_type = FieldType::ForeignKey;
                raw.to = Some(to);
                raw.on_delete = Some(on_delete);
            }
        }
        raw
    }
}

impl FieldDef {
    pub fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: FieldName::new(name),
            kind,
        }
    }

    /// Stored column name. Foreign keys are stored as `<field>_id`.
    pub fn column(&self) -> String {
        match self.kind {
            FieldKind::ForeignKey { .. } => format!("{}_id", self.name),
            _ => self.name.to_string(),
        }
    }

    pub fn is_primary_key(&self) -> bool {
        matches!(self.kind, FieldKind::Auto)
    }
}

/// A foreign-key relationship resolved to column names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRef<'a> {
    pub column: String,
    pub target: &'a TableName,
    pub on_delete: OnDelete,
}

/// A table as declared by a create-table operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableDef {
    pub name: TableName,
    pub fields: Vec<FieldDef>,
}

impl TableDef {
    /// Column name of the auto primary key, if one is declared.
    pub fn primary_key(&self) -> Option<String> {
        self.fields
            .iter()
            .find(|f| f.is_primary_key())
            .map(FieldDef::column)
    }

    /// Stored column names in declaration order.
    pub fn columns(&self) -> Vec<String> {
        self.fields.iter().map(FieldDef::column).collect()
    }

    pub fn foreign_keys(&self) -> Vec<ForeignKeyRef<'_>> {
        self.fields
            .iter()
            .filter_map(|f| match &f.kind {
                FieldKind::ForeignKey { to, on_delete } => Some(ForeignKeyRef {
                    column: f.column(),
                    target: to,
                    on_delete: *on_delete,
                }),
                _ => None,
            })
            .collect()
    }

    /// Check structural rules: at least one field, exactly one auto primary
    /// key, unique column names, positive char lengths.
    ///
    /// `key` is only used for error context.
    pub fn validate(&self, key: &str) -> CoreResult<()> {
        let invalid = |reason: String| CoreError::InvalidMigration {
            key: key.to_string(),
            reason,
        };

        if self.fields.is_empty() {
            return Err(invalid(format!("table '{}' has no fields", self.name)));
        }

        let pk_count = self.fields.iter().filter(|f| f.is_primary_key()).count();
        if pk_count != 1 {
            return Err(invalid(format!(
                "table '{}' must declare exactly one auto primary key, found {pk_count}",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            let column = field.column();
            if !seen.insert(column.to_lowercase()) {
                return Err(invalid(format!(
                    "table '{}' declares column '{column}' more than once",
                    self.name
                )));
            }
            if let FieldKind::Char { max_length: 0 } = field.kind {
                return Err(invalid(format!(
                    "field '{}.{}' has max_length 0",
                    self.name, field.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;
