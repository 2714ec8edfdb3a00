//! Row deletion that honours declared foreign-key delete policies.
//!
//! DuckDB does not support `ON DELETE CASCADE`, so the policy attached to
//! each foreign-key field drives explicit `DELETE` statements, deepest
//! children first.

use crate::connection::MigrationDb;
use crate::ddl::{quote_ident, DEFAULT_PRIMARY_KEY};
use crate::error::{MigrateError, MigrateResult};
use crate::introspect::primary_key;
use fm_core::{OnDelete, ProjectState};

/// Statements needed to delete one row, each taking the row id as its only
/// parameter.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DeletePlan {
    /// `(child table, COUNT(*) query)` for restrict references
    pub restrict_checks: Vec<(String, String)>,
    /// `DELETE` statements, children before parents, root last
    pub deletes: Vec<String>,
}

/// Build the delete plan for one row of `table`.
///
/// `root_pk` is the primary-key column of `table`.
pub fn plan_delete(state: &ProjectState, table: &str, root_pk: &str) -> MigrateResult<DeletePlan> {
    let mut plan = DeletePlan::default();
    let selector = format!(
        "SELECT {pk} FROM {t} WHERE {pk} = ?",
        pk = quote_ident(root_pk),
        t = quote_ident(table)
    );
    let mut path = vec![table.to_lowercase()];
    collect(state, table, &selector, &mut path, &mut plan)?;
    plan.deletes.push(format!(
        "DELETE FROM {} WHERE {} = ?",
        quote_ident(table),
        quote_ident(root_pk)
    ));
    Ok(plan)
}

/// Append statements for every row referencing the rows `selector` returns.
fn collect(
    state: &ProjectState,
    table: &str,
    selector: &str,
    path: &mut Vec<String>,
    plan: &mut DeletePlan,
) -> MigrateResult<()> {
    for reference in state.referencing(table) {
        let child = quote_ident(&reference.table);
        let column = quote_ident(&reference.column);
        match reference.on_delete {
            OnDelete::Restrict => {
                plan.restrict_checks.push((
                    reference.table.to_string(),
                    format!("SELECT COUNT(*) FROM {child} WHERE {column} IN ({selector})"),
                ));
            }
            OnDelete::Cascade => {
                let lower = reference.table.to_lowercase();
                if path.contains(&lower) {
                    return Err(MigrateError::CascadeCycle {
                        table: reference.table.to_string(),
                    });
                }
                let child_pk = state
                    .get(&reference.table)
                    .and_then(|t| t.primary_key())
                    .unwrap_or_else(|| DEFAULT_PRIMARY_KEY.to_string());
                let child_selector = format!(
                    "SELECT {} FROM {child} WHERE {column} IN ({selector})",
                    quote_ident(&child_pk)
                );

                path.push(lower);
                collect(state, &reference.table, &child_selector, path, plan)?;
                path.pop();

                plan.deletes.push(format!(
                    "DELETE FROM {child} WHERE {column} IN ({selector})"
                ));
            }
        }
    }
    Ok(())
}

/// Delete row `id` of `table` and every row that cascades from it.
///
/// Restrict references with live rows abort before anything is deleted.
/// Returns the total number of rows removed.
pub fn delete_cascade(
    db: &MigrationDb,
    state: &ProjectState,
    table: &str,
    id: i64,
) -> MigrateResult<usize> {
    if !state.contains(table) {
        return Err(MigrateError::UnknownTable(table.to_string()));
    }
    let root_pk = match state.get(table).and_then(|t| t.primary_key()) {
        Some(pk) => pk,
        None => primary_key(db.conn(), table)?.unwrap_or_else(|| DEFAULT_PRIMARY_KEY.to_string()),
    };
    let plan = plan_delete(state, table, &root_pk)?;

    for (child, sql) in &plan.restrict_checks {
        let rows: i64 = db
            .conn()
            .query_row(sql, duckdb::params![id], |row| row.get(0))
            .map_err(|e| MigrateError::QueryError(format!("{e}: {sql}")))?;
        if rows > 0 {
            return Err(MigrateError::RestrictedDelete {
                table: table.to_string(),
                id,
                child: child.clone(),
                rows,
            });
        }
    }

    // Each statement commits on its own: DuckDB checks foreign keys against
    // uncommitted deletes, so parent and child cannot share a transaction.
    let mut deleted = 0;
    for sql in &plan.deletes {
        deleted += db
            .conn()
            .execute(sql, duckdb::params![id])
            .map_err(|e| MigrateError::QueryError(format!("{e}: {sql}")))?;
    }
    log::debug!("Deleted {deleted} row(s) starting at {table} id {id}");
    Ok(deleted)
}

#[cfg(test)]
#[path = "cascade_test.rs"]
mod tests;
