//! Per-line hook consulted by the applier
//!
//! A hook error aborts the whole adjustment and rolls back every line
//! already written in the same transaction.

#![allow(clippy::result_large_err)]

use crate::adjustment::plan::PlannedLine;
use crate::errors::{ExError, ExErrorKind, Result};

pub trait AdjustmentHook {
    /// Called before line `index` of the plan is written
    ///
    /// # Errors
    ///
    /// Any error aborts the adjustment.
    fn before_line(&self, index: usize, line: &PlannedLine) -> Result<()>;

    /// Called once every line is written, before the transaction commits
    ///
    /// # Errors
    ///
    /// Any error rolls the whole adjustment back.
    fn before_commit(&self) -> Result<()> {
        Ok(())
    }
}

/// Hook that accepts every line
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAdjustmentHook;

impl AdjustmentHook for NoopAdjustmentHook {
    fn before_line(&self, _index: usize, _line: &PlannedLine) -> Result<()> {
        Ok(())
    }
}

/// Hook that fails on one line index
///
/// ```
/// use precast_core::adjustment::{AdjustmentHook, FailAtLineHook, Operation, PlannedLine};
///
/// let hook = FailAtLineHook::new(1);
/// let line = PlannedLine {
///     bom_id: 100,
///     operation: Operation::Add,
///     delta: 2,
///     reason: "add operation for BOM ID 100".to_string(),
/// };
/// assert!(hook.before_line(0, &line).is_ok());
/// assert!(hook.before_line(1, &line).is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FailAtLineHook {
    index: usize,
}

impl FailAtLineHook {
    pub fn new(index: usize) -> Self {
        Self { index }
    }
}

impl AdjustmentHook for FailAtLineHook {
    fn before_line(&self, index: usize, line: &PlannedLine) -> Result<()> {
        if index == self.index {
            return Err(ExError::new(ExErrorKind::AdjustmentAborted)
                .with_op("apply_adjustment")
                .with_entity_id(line.bom_id)
                .with_line_index(index)
                .with_message("adjustment aborted by hook"));
        }
        Ok(())
    }
}
