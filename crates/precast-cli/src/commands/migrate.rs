//! Schema migration command

use super::{open_db, DEFAULT_DB};
use clap::Args;

#[derive(Debug, Args)]
pub struct MigrateArgs {
    #[arg(long, default_value = DEFAULT_DB)]
    pub db: String,
}

pub fn execute(args: MigrateArgs) -> anyhow::Result<()> {
    let conn = open_db(&args.db)?;
    let applied = precast_store::migrations::applied_migrations(&conn)?;

    println!("Schema up to date ({} migrations)", applied.len());
    for id in applied {
        println!("  {}", id);
    }
    Ok(())
}
