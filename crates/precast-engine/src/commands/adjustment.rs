//! Adjustment write path.
//!
//! Wraps the store's transactional applier with request correlation and the
//! canonical operation logging, and exposes the neighbouring BOM writes the
//! adjustment cycle depends on.

#![allow(clippy::result_large_err)]

use chrono::Utc;
use precast_core::adjustment::{
    AdjustmentHook, InventoryAdjustmentRequest, InventoryAdjustmentResponse,
};
use precast_core::errors::{ExError, InventoryError};
use precast_core::model::BomLineInput;
use precast_core::types::RequestContext;
use precast_core::{log_op_end, log_op_error, log_op_start};
use precast_store::apply::apply_adjustment;
use precast_store::errors::{from_rusqlite, Result};
use precast_store::repo::{NewElement, SqliteRepo};
use rusqlite::Connection;

fn correlate(err: ExError, ctx: &RequestContext) -> ExError {
    let err = err.with_request_id(ctx.request_id.clone());
    match &ctx.trace_id {
        Some(trace_id) => err.with_trace_id(trace_id.clone()),
        None => err,
    }
}

/// Validate, plan and apply an adjustment in one transaction
///
/// # Errors
///
/// Validation failures from the planner, consistency failures from the
/// applier, storage failures. Errors carry the request's correlation ids.
pub fn inventory_adjustment(
    conn: &mut Connection,
    request: &InventoryAdjustmentRequest,
    ctx: &RequestContext,
    hook: &dyn AdjustmentHook,
) -> Result<InventoryAdjustmentResponse> {
    log_op_start!(
        "inventory_adjustment",
        request_id = ctx.request_id.as_str(),
        project_id = request.project_id,
        element_type_id = request.element_type_id,
        line_count = request.bom.len()
    );
    let start = std::time::Instant::now();

    let result = apply_adjustment(conn, request, &ctx.actor, hook, Utc::now())
        .map(|applied| InventoryAdjustmentResponse::committed(applied.first_log_id()))
        .map_err(|e| correlate(e, ctx));

    let elapsed = start.elapsed().as_millis() as u64;
    match &result {
        Ok(response) => log_op_end!(
            "inventory_adjustment",
            duration_ms = elapsed,
            request_id = ctx.request_id.as_str(),
            adjustment_id = response.adjustment_id.unwrap_or_default()
        ),
        Err(e) => log_op_error!(
            "inventory_adjustment",
            e,
            duration_ms = elapsed,
            request_id = ctx.request_id.as_str()
        ),
    }
    result
}

/// Clear an element type's adjustment latch so its diffs surface again
///
/// Element latches stay set. Returns whether the latch was set before.
///
/// # Errors
///
/// `NotFound` when the element type does not exist in the project.
pub fn reset_adjustment_latch(
    conn: &Connection,
    project_id: i64,
    element_type_id: i64,
) -> Result<bool> {
    log_op_start!(
        "reset_adjustment_latch",
        project_id = project_id,
        element_type_id = element_type_id
    );
    let start = std::time::Instant::now();

    let result = (|| -> Result<bool> {
        let element_type = SqliteRepo::get_element_type(conn, project_id, element_type_id)?
            .ok_or_else(|| {
                ExError::from(InventoryError::ElementTypeNotFound {
                    project_id,
                    element_type_id,
                })
                .with_op("reset_adjustment_latch")
            })?;
        SqliteRepo::set_element_type_latch(conn, project_id, element_type_id, false)?;
        Ok(element_type.inv_adjust)
    })();

    let elapsed = start.elapsed().as_millis() as u64;
    match &result {
        Ok(was_set) => log_op_end!(
            "reset_adjustment_latch",
            duration_ms = elapsed,
            was_set = *was_set
        ),
        Err(e) => log_op_error!("reset_adjustment_latch", e, duration_ms = elapsed),
    }
    result
}

/// Replace an element type's BOM, freezing the previous one as a revision
///
/// # Errors
///
/// `NotFound` for an unknown element type, `InvalidInput` for a duplicated
/// product, storage failures.
pub fn revise_bom(
    conn: &mut Connection,
    project_id: i64,
    element_type_id: i64,
    lines: &[BomLineInput],
    new_version: Option<&str>,
) -> Result<i64> {
    log_op_start!(
        "revise_bom",
        project_id = project_id,
        element_type_id = element_type_id,
        line_count = lines.len()
    );
    let start = std::time::Instant::now();

    let result = SqliteRepo::revise_bom(
        conn,
        project_id,
        element_type_id,
        lines,
        new_version,
        Utc::now(),
    );

    let elapsed = start.elapsed().as_millis() as u64;
    match &result {
        Ok(revision_id) => log_op_end!(
            "revise_bom",
            duration_ms = elapsed,
            revision_id = *revision_id
        ),
        Err(e) => log_op_error!("revise_bom", e, duration_ms = elapsed),
    }
    result
}

/// Record a produced element against the current revision of its type
///
/// # Errors
///
/// `NotFound` for an unknown element type; storage failures.
pub fn stamp_element(conn: &mut Connection, element: &NewElement) -> Result<i64> {
    log_op_start!(
        "stamp_element",
        project_id = element.project_id,
        element_type_id = element.element_type_id
    );
    let start = std::time::Instant::now();

    let result = (|| -> Result<i64> {
        let tx = conn.transaction().map_err(from_rusqlite)?;
        let id = SqliteRepo::stamp_element(&tx, element, Utc::now())?;
        tx.commit().map_err(from_rusqlite)?;
        Ok(id)
    })();

    let elapsed = start.elapsed().as_millis() as u64;
    match &result {
        Ok(id) => log_op_end!("stamp_element", duration_ms = elapsed, element_id = *id),
        Err(e) => log_op_error!("stamp_element", e, duration_ms = elapsed),
    }
    result
}
