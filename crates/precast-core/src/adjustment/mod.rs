//! Inventory adjustment planning.
//!
//! The planner validates a client request against a [`PlanningSnapshot`] and
//! yields an [`AdjustmentPlan`]. Applying the plan lives in the store, which
//! consults an [`AdjustmentHook`] before each line.

pub mod hook;
pub mod plan;
pub mod request;

pub use hook::{AdjustmentHook, FailAtLineHook, NoopAdjustmentHook};
pub use plan::{plan_adjustment, reason_for, AdjustmentPlan, PlannedLine, PlanningSnapshot};
pub use request::{
    AdjustmentLineRequest, InventoryAdjustmentRequest, InventoryAdjustmentResponse, Operation,
};
