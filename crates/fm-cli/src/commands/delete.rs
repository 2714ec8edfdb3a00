//! Delete command implementation

use anyhow::Result;
use fm_db::delete_cascade;

use crate::cli::{DeleteArgs, GlobalArgs};
use crate::commands::common::ProjectContext;

/// Execute the delete command
pub(crate) fn execute(args: &DeleteArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = ProjectContext::load(global)?;
    let migrator = ctx.migrator()?;
    let state = migrator.project_state()?;

    for reference in state.referencing(&args.table) {
        ctx.verbose(&format!(
            "{}.{} -> {} ({})",
            reference.table, reference.column, args.table, reference.on_delete
        ));
    }

    let deleted = delete_cascade(&ctx.db, &state, &args.table, args.id)?;
    println!("Deleted {deleted} row(s)");
    Ok(())
}
