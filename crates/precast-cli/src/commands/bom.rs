//! BOM revision and latch commands

use super::{open_db, read_json, DEFAULT_DB};
use anyhow::bail;
use clap::Args;
use precast_core::adjustment::NoopAdjustmentHook;
use precast_core::model::BomLineInput;
use precast_engine::{apply_engine_command, EngineCommand, EngineCommandResult};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ReviseBomArgs {
    #[arg(long, default_value = DEFAULT_DB)]
    pub db: String,

    #[arg(long)]
    pub project: i64,

    #[arg(long)]
    pub element_type: i64,

    /// JSON array of `{product_id, product_name, quantity}`
    #[arg(long)]
    pub file: PathBuf,

    /// New element type version, e.g. RV-3
    #[arg(long = "set-version")]
    pub new_version: Option<String>,
}

#[derive(Debug, Args)]
pub struct ResetLatchArgs {
    #[arg(long, default_value = DEFAULT_DB)]
    pub db: String,

    #[arg(long)]
    pub project: i64,

    #[arg(long)]
    pub element_type: i64,
}

pub fn execute_revise(args: ReviseBomArgs) -> anyhow::Result<()> {
    let lines: Vec<BomLineInput> = read_json(&args.file)?;
    let mut conn = open_db(&args.db)?;

    let cmd = EngineCommand::ReviseBom {
        project_id: args.project,
        element_type_id: args.element_type,
        lines,
        new_version: args.new_version,
    };
    match apply_engine_command(cmd, &mut conn, &NoopAdjustmentHook)? {
        EngineCommandResult::BomRevised { revision_id } => {
            println!("BOM revised: revision {}", revision_id);
            Ok(())
        }
        other => bail!("unexpected command result {:?}", other),
    }
}

pub fn execute_reset(args: ResetLatchArgs) -> anyhow::Result<()> {
    let mut conn = open_db(&args.db)?;

    let cmd = EngineCommand::ResetAdjustmentLatch {
        project_id: args.project,
        element_type_id: args.element_type,
    };
    match apply_engine_command(cmd, &mut conn, &NoopAdjustmentHook)? {
        EngineCommandResult::LatchReset { was_set: true } => {
            println!("Latch cleared for element type {}", args.element_type);
            Ok(())
        }
        EngineCommandResult::LatchReset { was_set: false } => {
            println!("Latch was not set for element type {}", args.element_type);
            Ok(())
        }
        other => bail!("unexpected command result {:?}", other),
    }
}
