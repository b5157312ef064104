//! BOM diff output types.
//!
//! Field names follow the JSON contract served to the adjustment UI.
//! Lists are sorted by `product_id` so identical inputs serialize identically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the two sides of a diff are joined when building the adjustment list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeKey {
    /// Join on the BOM row link (`element_type_bom_id = BomLine.id`)
    Link,
    /// Join on `product_id`, so a product deleted and re-added under a new
    /// row id is reported as one quantity change
    Product,
}

/// A BOM row reported on one side of the diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomProductRow {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
}

/// One actionable inventory delta
///
/// `quantity_change = quantity - revision_quantity`; a missing side counts as 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomRequiredAdjustment {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub revision_quantity: i64,
    pub quantity_change: i64,
}

/// The three row-sets produced by comparing a current BOM with a revision
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomDiff {
    /// Current rows without an identical (link, quantity) match in the revision
    pub bom_product: Vec<BomProductRow>,
    /// Revision rows without an identical (link, quantity) match in the current BOM
    pub bom_revision_product: Vec<BomProductRow>,
    pub bom_required_adjustment: Vec<BomRequiredAdjustment>,
}

impl BomDiff {
    pub fn is_empty(&self) -> bool {
        self.bom_product.is_empty()
            && self.bom_revision_product.is_empty()
            && self.bom_required_adjustment.is_empty()
    }
}

/// A produced element listed under a diff record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffElement {
    pub element_id: i64,
    pub element_code: String,
    pub bom_revision_id: Option<i64>,
    pub drawing_revision_id: Option<i64>,
    pub element_updated_at: Option<DateTime<Utc>>,
}

/// One element type whose produced elements were built against an older BOM
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementTypeDiffRecord {
    pub element_type_id: i64,
    pub element_type_name: String,
    pub project_id: i64,
    pub element_type_created_by: String,
    pub element_type_version: String,
    pub element_type_updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub diff: BomDiff,
    pub elements: Vec<DiffElement>,
}
