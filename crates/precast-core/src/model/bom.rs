use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row of an element type's current BOM
///
/// (`element_type_id`, `product_id`) is unique. The row `id` is the link
/// identity that revision rows point back to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomLine {
    pub id: i64,
    pub element_type_id: i64,
    pub project_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: Option<i64>,
}

impl BomLine {
    /// Quantity with NULL read as zero
    pub fn qty(&self) -> i64 {
        self.quantity.unwrap_or(0)
    }
}

/// A frozen row of a historical BOM revision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomRevisionLine {
    /// Id of the current-BOM row this snapshot was taken from
    pub element_type_bom_id: i64,
    pub revision_id: i64,
    pub element_type_id: i64,
    pub project_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: Option<i64>,
    pub changed_at: DateTime<Utc>,
}

impl BomRevisionLine {
    /// Quantity with NULL read as zero
    pub fn qty(&self) -> i64 {
        self.quantity.unwrap_or(0)
    }
}

/// One line of a BOM edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomLineInput {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: Option<i64>,
}
