//! Transactional adjustment applier.
//!
//! Planning and applying share one `BEGIN IMMEDIATE` transaction, so the
//! balances the planner checked are the balances the applier writes. Any
//! error drops the transaction, which rolls every line back.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use crate::repo::{NewAdjustmentLog, NewInventoryTransaction, SqlitePlanningSnapshot, SqliteRepo};
use chrono::{DateTime, Utc};
use precast_core::adjustment::{
    plan_adjustment, AdjustmentHook, AdjustmentPlan, InventoryAdjustmentRequest, Operation,
};
use precast_core::diff::is_eligible;
use precast_core::model::TransactionStatus;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Outcome of a committed adjustment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedAdjustment {
    pub plan: AdjustmentPlan,
    /// One ledger id per plan line, in plan order
    pub log_ids: Vec<i64>,
    pub transaction_ids: Vec<i64>,
    /// Elements whose latch this adjustment set
    pub latched_elements: usize,
}

impl AppliedAdjustment {
    pub fn first_log_id(&self) -> Option<i64> {
        self.log_ids.first().copied()
    }
}

/// Plan and apply an adjustment atomically
///
/// # Errors
///
/// Planner rejections (validation), `NegativeBalance` on a stale balance,
/// hook aborts, and storage failures. Nothing is persisted on error.
pub fn apply_adjustment(
    conn: &mut Connection,
    req: &InventoryAdjustmentRequest,
    actor: &str,
    hook: &dyn AdjustmentHook,
    now: DateTime<Utc>,
) -> Result<AppliedAdjustment> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(from_rusqlite)?;

    let plan = plan_adjustment(req, &SqlitePlanningSnapshot::new(&tx))?;
    let applied = apply_plan_tx(&tx, plan, actor, hook, now)?;
    hook.before_commit()?;

    tx.commit().map_err(from_rusqlite)?;
    Ok(applied)
}

/// Apply a validated plan inside an open transaction
pub fn apply_plan_tx(
    tx: &Transaction,
    plan: AdjustmentPlan,
    actor: &str,
    hook: &dyn AdjustmentHook,
    now: DateTime<Utc>,
) -> Result<AppliedAdjustment> {
    let mut log_ids = Vec::with_capacity(plan.lines.len());
    let mut transaction_ids = Vec::with_capacity(plan.lines.len());

    for (index, line) in plan.lines.iter().enumerate() {
        hook.before_line(index, line)?;

        let moves = SqliteRepo::apply_delta(tx, plan.project_id, line.bom_id, line.delta, now)
            .map_err(|e| e.with_line_index(index))?;

        let status = match line.operation {
            Operation::Add => TransactionStatus::Added,
            Operation::Subtract => TransactionStatus::Subtract,
        };
        let transaction_id = SqliteRepo::append_transaction(
            tx,
            &NewInventoryTransaction {
                project_id: plan.project_id,
                product_id: line.bom_id,
                warehouse_id: moves.first().map(|m| m.warehouse_id).unwrap_or_default(),
                quantity: line.quantity(),
                status,
                created_by: actor,
            },
            now,
        )?;
        SqliteRepo::stamp_balance_transaction(
            tx,
            plan.project_id,
            line.bom_id,
            &moves,
            transaction_id,
        )?;

        let log_id = SqliteRepo::append_adjustment_log(
            tx,
            &NewAdjustmentLog {
                project_id: plan.project_id,
                element_type_id: plan.element_type_id,
                product_id: line.bom_id,
                quantity: line.quantity(),
                reason: &line.reason,
                adjusted_by: actor,
                element_count: plan.element_count,
            },
            now,
        )?;

        log_ids.push(log_id);
        transaction_ids.push(transaction_id);
    }

    let latched_elements = latch_element_type(tx, plan.project_id, plan.element_type_id)?;

    Ok(AppliedAdjustment {
        plan,
        log_ids,
        transaction_ids,
        latched_elements,
    })
}

/// Latch the element type and every element the diff reader would show
fn latch_element_type(tx: &Transaction, project_id: i64, element_type_id: i64) -> Result<usize> {
    let Some(element_type) = SqliteRepo::get_element_type(tx, project_id, element_type_id)? else {
        return Ok(0);
    };

    let eligible: Vec<i64> = SqliteRepo::list_element_candidates(tx, element_type_id)?
        .into_iter()
        .filter(|c| is_eligible(&element_type, c))
        .map(|c| c.element.id)
        .collect();

    let latched = SqliteRepo::latch_elements(tx, &eligible)?;
    SqliteRepo::set_element_type_latch(tx, project_id, element_type_id, true)?;
    Ok(latched)
}
