//! Adjustment-log query

#![allow(clippy::result_large_err)]

use precast_core::errors::{ExError, InventoryError};
use precast_core::model::AdjustmentLogEntry;
use precast_core::{log_op_end, log_op_error, log_op_start};
use precast_store::errors::Result;
use precast_store::repo::SqliteRepo;
use rusqlite::Connection;

/// Ledger rows of a project, `adjusted_at DESC, id DESC`
///
/// # Errors
///
/// `InvalidInput` for a non-positive `project_id`; storage failures.
pub fn inventory_adjustment_logs(
    conn: &Connection,
    project_id: i64,
) -> Result<Vec<AdjustmentLogEntry>> {
    log_op_start!("adjustment_logs", project_id = project_id);
    let start = std::time::Instant::now();

    let result = if project_id <= 0 {
        Err(ExError::from(InventoryError::InvalidProjectId { project_id }).with_op("adjustment_logs"))
    } else {
        SqliteRepo::list_adjustment_logs(conn, project_id)
    };

    let elapsed = start.elapsed().as_millis() as u64;
    match &result {
        Ok(rows) => log_op_end!("adjustment_logs", duration_ms = elapsed, record_count = rows.len()),
        Err(e) => log_op_error!("adjustment_logs", e, duration_ms = elapsed),
    }
    result
}
