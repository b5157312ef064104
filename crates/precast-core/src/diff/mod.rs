//! BOM revision diff.
//!
//! Compares an element type's current BOM with the revision its produced
//! elements were built against.
//!
//! ## Guarantees
//!
//! - **Determinism**: identical inputs produce identical, sorted output.
//! - **Exact match**: rows match on link id plus coalesced quantity only.
//! - **Soundness**: every adjustment entry comes from at least one side and
//!   carries `quantity_change = current - revision`.

pub mod eligibility;
pub mod engine;
pub mod model;

pub use eligibility::{element_type_is_eligible, is_eligible, ElementCandidate};
pub use engine::{compute_bom_diff, latest_revision_window, LATEST_REVISION_WINDOW_MS};
pub use model::{
    BomDiff, BomProductRow, BomRequiredAdjustment, DiffElement, ElementTypeDiffRecord, MergeKey,
};
