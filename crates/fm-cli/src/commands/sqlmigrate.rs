//! Sqlmigrate command implementation

use anyhow::Result;

use crate::cli::{GlobalArgs, SqlArgs};
use crate::commands::common::{parse_key, ProjectContext};

/// Execute the sqlmigrate command
pub(crate) fn execute(args: &SqlArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = ProjectContext::load(global)?;
    let migrator = ctx.migrator()?;
    let key = parse_key(&args.migration)?;

    println!("BEGIN;");
    for sql in migrator.sql_for(&key, args.backwards)? {
        println!("{sql};");
    }
    println!("COMMIT;");
    Ok(())
}
