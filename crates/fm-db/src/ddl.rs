//! DuckDB DDL rendering for schema operations.
//!
//! Identifiers are always double-quoted so mixed-case table names such as
//! `TestSignalError` keep their spelling in the catalog.

use fm_core::{FieldDef, FieldKind, Operation, SchemaChangeRecord, TableDef, TableName};

/// Primary-key column assumed for a referenced table nobody declared
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Quote an identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Escape a string literal, doubling embedded single quotes.
fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Sequence backing the auto primary key of `table`.
pub fn sequence_name(table: &str) -> String {
    format!("{table}_id_seq")
}

fn index_name(table: &str, column: &str) -> String {
    format!("{table}_{column}_idx")
}

fn column_sql(table: &TableDef, field: &FieldDef) -> String {
    let column = quote_ident(&field.column());
    match &field.kind {
        FieldKind::Auto => format!(
            "{column} INTEGER PRIMARY KEY DEFAULT nextval({})",
            quote_literal(&quote_ident(&sequence_name(&table.name)))
        ),
        // DuckDB accepts but ignores VARCHAR lengths, so the bound is a CHECK
        FieldKind::Char { max_length } => format!(
            "{column} VARCHAR({max_length}) NOT NULL CHECK (length({column}) <= {max_length})"
        ),
        FieldKind::Integer | FieldKind::ForeignKey { .. } => format!("{column} INTEGER NOT NULL"),
    }
}

/// Statements creating `table`: its sequence, the table itself with foreign
/// key constraints, then one index per foreign-key column.
///
/// `primary_key_of` names the referenced column for each foreign-key target.
pub fn create_table_sql<F>(table: &TableDef, primary_key_of: F) -> Vec<String>
where
    F: Fn(&TableName) -> String,
{
    let name = quote_ident(&table.name);
    let mut lines: Vec<String> = table
        .fields
        .iter()
        .map(|f| format!("    {}", column_sql(table, f)))
        .collect();

    let fks = table.foreign_keys();
    for fk in &fks {
        let target_pk = if *fk.target == table.name {
            table
                .primary_key()
                .unwrap_or_else(|| DEFAULT_PRIMARY_KEY.to_string())
        } else {
            primary_key_of(fk.target)
        };
        lines.push(format!(
            "    FOREIGN KEY ({}) REFERENCES {} ({})",
            quote_ident(&fk.column),
            quote_ident(fk.target),
            quote_ident(&target_pk)
        ));
    }

    let mut statements = vec![
        format!("CREATE SEQUENCE {} START 1", quote_ident(&sequence_name(&table.name))),
        format!("CREATE TABLE {name} (\n{}\n)", lines.join(",\n")),
    ];
    for fk in &fks {
        statements.push(format!(
            "CREATE INDEX {} ON {name} ({})",
            quote_ident(&index_name(&table.name, &fk.column)),
            quote_ident(&fk.column)
        ));
    }
    statements
}

/// Statements dropping `table` and its sequence.
pub fn drop_table_sql(table: &TableDef) -> Vec<String> {
    vec![
        format!("DROP TABLE {}", quote_ident(&table.name)),
        format!("DROP SEQUENCE {}", quote_ident(&sequence_name(&table.name))),
    ]
}

/// Forward statements for every operation of `record`, in order.
pub fn forward_sql<F>(record: &SchemaChangeRecord, primary_key_of: F) -> Vec<String>
where
    F: Fn(&TableName) -> String,
{
    record
        .operations
        .iter()
        .flat_map(|op| match op {
            Operation::CreateTable(table) => create_table_sql(table, &primary_key_of),
        })
        .collect()
}

/// Reverse statements for `record`: operations undone last-first.
pub fn backward_sql(record: &SchemaChangeRecord) -> Vec<String> {
    record
        .operations
        .iter()
        .rev()
        .flat_map(|op| match op {
            Operation::CreateTable(table) => drop_table_sql(table),
        })
        .collect()
}

#[cfg(test)]
#[path = "ddl_test.rs"]
mod tests;
