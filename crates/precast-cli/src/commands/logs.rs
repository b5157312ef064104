//! Adjustment ledger listing

use super::{open_db, print_json, DEFAULT_DB};
use clap::Args;
use precast_engine::{apply_engine_query, EngineQuery};

#[derive(Debug, Args)]
pub struct LogsArgs {
    #[arg(long, default_value = DEFAULT_DB)]
    pub db: String,

    #[arg(long)]
    pub project: i64,
}

pub fn execute(args: LogsArgs) -> anyhow::Result<()> {
    let conn = open_db(&args.db)?;
    print_json(&apply_engine_query(
        EngineQuery::AdjustmentLogs {
            project_id: args.project,
        },
        &conn,
    )?)
}
