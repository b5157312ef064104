//! Precast Core - BOM revision diff and adjustment planning
//!
//! This crate holds the storage-free part of the inventory adjustment engine:
//! - Element type, element, BOM and inventory models
//! - The BOM diff (exact-match comparison, latest-revision window, eligibility)
//! - Adjustment request validation and planning
//! - The structured error facility and logging macros shared by every crate

pub mod adjustment;
pub mod diff;
pub mod errors;
pub mod logging_facility;
pub mod model;

pub use precast_core_types as types;

// Re-export commonly used types
pub use adjustment::{
    plan_adjustment, AdjustmentHook, AdjustmentPlan, InventoryAdjustmentRequest,
    InventoryAdjustmentResponse, NoopAdjustmentHook, Operation, PlanningSnapshot,
};
pub use diff::{compute_bom_diff, BomDiff, ElementTypeDiffRecord, MergeKey};
pub use errors::{ErrorClass, ExError, ExErrorKind, InventoryError, Result};
pub use model::{BomLine, BomRevisionLine, Element, ElementType};
