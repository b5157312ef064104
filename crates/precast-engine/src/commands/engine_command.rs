//! Engine-level write commands.

#![allow(clippy::result_large_err)]

use crate::commands::adjustment;
use precast_core::adjustment::{
    AdjustmentHook, InventoryAdjustmentRequest, InventoryAdjustmentResponse,
};
use precast_core::model::BomLineInput;
use precast_core::types::RequestContext;
use precast_store::errors::Result;
use precast_store::repo::NewElement;
use rusqlite::Connection;

/// Engine-level commands that mutate the store.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Validate and apply an inventory adjustment atomically.
    InventoryAdjustment {
        request: InventoryAdjustmentRequest,
        ctx: RequestContext,
    },
    /// Clear an element type's adjustment latch.
    ResetAdjustmentLatch {
        project_id: i64,
        element_type_id: i64,
    },
    /// Replace an element type's BOM under a fresh revision.
    ReviseBom {
        project_id: i64,
        element_type_id: i64,
        lines: Vec<BomLineInput>,
        new_version: Option<String>,
    },
    /// Record a produced element against the current revision.
    StampElement(NewElement),
}

/// Result of applying an engine command.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommandResult {
    InventoryAdjustment(InventoryAdjustmentResponse),
    /// `was_set` reports the latch state before the reset.
    LatchReset { was_set: bool },
    BomRevised { revision_id: i64 },
    ElementStamped { element_id: i64 },
}

/// Apply an engine command.
///
/// `hook` is consulted before each adjustment line; other commands ignore it.
pub fn apply_engine_command(
    cmd: EngineCommand,
    conn: &mut Connection,
    hook: &dyn AdjustmentHook,
) -> Result<EngineCommandResult> {
    match cmd {
        EngineCommand::InventoryAdjustment { request, ctx } => {
            adjustment::inventory_adjustment(conn, &request, &ctx, hook)
                .map(EngineCommandResult::InventoryAdjustment)
        }
        EngineCommand::ResetAdjustmentLatch {
            project_id,
            element_type_id,
        } => adjustment::reset_adjustment_latch(conn, project_id, element_type_id)
            .map(|was_set| EngineCommandResult::LatchReset { was_set }),
        EngineCommand::ReviseBom {
            project_id,
            element_type_id,
            lines,
            new_version,
        } => adjustment::revise_bom(
            conn,
            project_id,
            element_type_id,
            &lines,
            new_version.as_deref(),
        )
        .map(|revision_id| EngineCommandResult::BomRevised { revision_id }),
        EngineCommand::StampElement(element) => adjustment::stamp_element(conn, &element)
            .map(|element_id| EngineCommandResult::ElementStamped { element_id }),
    }
}
