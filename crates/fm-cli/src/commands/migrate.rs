//! Migrate command implementation

use anyhow::Result;

use crate::cli::{GlobalArgs, MigrateArgs};
use crate::commands::common::{parse_key, ProjectContext};

/// Execute the migrate command
pub(crate) fn execute(args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = ProjectContext::load(global)?;
    let migrator = ctx.migrator()?;
    let target = args.target.as_deref().map(parse_key).transpose()?;

    if args.fake {
        if let Some(key) = &target {
            migrator.fake(key)?;
            println!("Faked {key}");
        }
        return Ok(());
    }

    if args.plan {
        let plan = migrator.plan(target.as_ref())?;
        if plan.is_empty() {
            println!("No planned migration operations.");
            return Ok(());
        }
        println!("Planned operations:");
        for record in plan {
            println!("{}.{}", record.app, record.name);
            for op in &record.operations {
                println!("    {}", op.describe());
            }
        }
        return Ok(());
    }

    println!("Running migrations:");
    let report = migrator.migrate(target.as_ref())?;
    if report.applied.is_empty() {
        println!("  No migrations to apply.");
    }
    for key in &report.applied {
        println!("  Applying {key}... OK");
    }
    Ok(())
}
