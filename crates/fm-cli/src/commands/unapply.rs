//! Unapply command implementation

use anyhow::Result;

use crate::cli::{GlobalArgs, UnapplyArgs};
use crate::commands::common::{parse_key, ProjectContext};

/// Execute the unapply command
pub(crate) fn execute(args: &UnapplyArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = ProjectContext::load(global)?;
    let migrator = ctx.migrator()?;
    let key = parse_key(&args.migration)?;

    migrator.unapply(&key)?;
    println!("Unapplied {key}");
    Ok(())
}
