//! Adjustment planning.
//!
//! Turns a client request into an ordered list of signed line effects, or
//! rejects it. Planning never mutates; it reads through a [`PlanningSnapshot`]
//! which the store backs with the same transaction the applier commits.

#![allow(clippy::result_large_err)]

use crate::adjustment::request::{InventoryAdjustmentRequest, Operation};
use crate::errors::{ExError, InventoryError, Result};
use std::collections::HashMap;

/// Read-only view of the facts the planner checks
pub trait PlanningSnapshot {
    fn project_exists(&self, project_id: i64) -> Result<bool>;

    fn element_type_exists(&self, project_id: i64, element_type_id: i64) -> Result<bool>;

    fn product_exists(&self, product_id: i64) -> Result<bool>;

    /// On-hand quantity for a product in a project, summed across warehouses
    fn on_hand(&self, project_id: i64, product_id: i64) -> Result<i64>;
}

/// One validated line effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLine {
    pub bom_id: i64,
    pub operation: Operation,
    /// `+quantity` for add, `-quantity` for subtract
    pub delta: i64,
    pub reason: String,
}

impl PlannedLine {
    pub fn quantity(&self) -> i64 {
        self.delta.abs()
    }
}

/// A request that passed every validation rule, in client order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustmentPlan {
    pub project_id: i64,
    pub element_type_id: i64,
    pub element_count: i64,
    pub lines: Vec<PlannedLine>,
}

/// Audit reason recorded for a line
pub fn reason_for(operation: Operation, bom_id: i64) -> String {
    format!("{} operation for BOM ID {}", operation, bom_id)
}

/// Validate a request and build its plan
///
/// Rules run in order and the first failure wins:
/// 1. project exists
/// 2. element type exists in the project
/// 3. each line names a known product and a known operation
/// 4. each subtract is covered by on-hand stock, projected through the
///    preceding lines of the same request
/// 5. every quantity is positive
///
/// Projection in rule 4 is checked arithmetic; a line that would take a
/// balance past `i64` is rejected as an invalid quantity.
///
/// # Errors
///
/// Returns the `InventoryError` of the first failing rule, converted to
/// `ExError` with `op = "plan_adjustment"` and the offending line index.
pub fn plan_adjustment(
    req: &InventoryAdjustmentRequest,
    snapshot: &dyn PlanningSnapshot,
) -> Result<AdjustmentPlan> {
    let fail = |err: InventoryError| ExError::from(err).with_op("plan_adjustment");

    if req.project_id <= 0 {
        return Err(fail(InventoryError::InvalidProjectId {
            project_id: req.project_id,
        }));
    }
    if req.bom.is_empty() {
        return Err(fail(InventoryError::EmptyPlan));
    }

    // Rule 1
    if !snapshot.project_exists(req.project_id)? {
        return Err(fail(InventoryError::ProjectNotFound {
            project_id: req.project_id,
        }));
    }

    // Rule 2
    if !snapshot.element_type_exists(req.project_id, req.element_type_id)? {
        return Err(fail(InventoryError::ElementTypeNotFound {
            project_id: req.project_id,
            element_type_id: req.element_type_id,
        }));
    }

    // Rule 3
    let mut operations = Vec::with_capacity(req.bom.len());
    for (index, line) in req.bom.iter().enumerate() {
        if !snapshot.product_exists(line.bom_id)? {
            return Err(fail(InventoryError::BomNotFound {
                bom_id: line.bom_id,
            })
            .with_line_index(index));
        }
        let operation = Operation::parse(&line.operation).ok_or_else(|| {
            fail(InventoryError::InvalidOperation {
                bom_id: line.bom_id,
                operation: line.operation.clone(),
            })
            .with_line_index(index)
        })?;
        operations.push(operation);
    }

    // Rule 4. Lines rule 5 will reject are not projected.
    let mut projected: HashMap<i64, i64> = HashMap::new();
    for (index, (line, operation)) in req.bom.iter().zip(&operations).enumerate() {
        if line.quantity <= 0 {
            continue;
        }
        let balance = match projected.get(&line.bom_id) {
            Some(balance) => *balance,
            None => snapshot.on_hand(req.project_id, line.bom_id)?,
        };
        if *operation == Operation::Subtract && balance < line.quantity {
            return Err(fail(InventoryError::InsufficientStock {
                bom_id: line.bom_id,
                on_hand: balance,
                requested: line.quantity,
            })
            .with_line_index(index));
        }
        let next = operation
            .signed(line.quantity)
            .and_then(|delta| balance.checked_add(delta))
            .ok_or_else(|| {
                fail(InventoryError::QuantityOutOfRange {
                    bom_id: line.bom_id,
                    quantity: line.quantity,
                    balance,
                })
                .with_line_index(index)
            })?;
        projected.insert(line.bom_id, next);
    }

    // Rule 5
    if let Some((index, line)) = req.bom.iter().enumerate().find(|(_, l)| l.quantity <= 0) {
        return Err(fail(InventoryError::NonPositiveQuantity {
            bom_id: line.bom_id,
            quantity: line.quantity,
        })
        .with_line_index(index));
    }

    let lines = req
        .bom
        .iter()
        .zip(operations)
        .enumerate()
        .map(|(index, (line, operation))| {
            let delta = operation.signed(line.quantity).ok_or_else(|| {
                fail(InventoryError::NonPositiveQuantity {
                    bom_id: line.bom_id,
                    quantity: line.quantity,
                })
                .with_line_index(index)
            })?;
            Ok(PlannedLine {
                bom_id: line.bom_id,
                operation,
                delta,
                reason: reason_for(operation, line.bom_id),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(AdjustmentPlan {
        project_id: req.project_id,
        element_type_id: req.element_type_id,
        element_count: req.element_count,
        lines,
    })
}
