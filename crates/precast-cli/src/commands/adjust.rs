//! Inventory adjustment command

use super::{open_db, print_json, read_json, DEFAULT_DB};
use anyhow::bail;
use clap::Args;
use precast_core::adjustment::{InventoryAdjustmentRequest, NoopAdjustmentHook};
use precast_core::types::RequestContext;
use precast_engine::{apply_engine_command, EngineCommand, EngineCommandResult};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct AdjustArgs {
    #[arg(long, default_value = DEFAULT_DB)]
    pub db: String,

    /// JSON file holding `{element_type_id, element_count, project_id, bom}`
    #[arg(long)]
    pub file: PathBuf,

    /// Name recorded as `adjusted_by` on every ledger row
    #[arg(long)]
    pub actor: String,
}

pub fn execute(args: AdjustArgs) -> anyhow::Result<()> {
    let request: InventoryAdjustmentRequest = read_json(&args.file)?;
    let mut conn = open_db(&args.db)?;

    let cmd = EngineCommand::InventoryAdjustment {
        request,
        ctx: RequestContext::new(args.actor),
    };
    match apply_engine_command(cmd, &mut conn, &NoopAdjustmentHook)? {
        EngineCommandResult::InventoryAdjustment(response) => print_json(&response),
        other => bail!("unexpected command result {:?}", other),
    }
}
