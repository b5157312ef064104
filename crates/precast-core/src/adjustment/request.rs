//! Wire types for the adjustment endpoint.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One requested BOM line change
///
/// `operation` stays a raw string so an unknown literal is reported as a
/// validation failure for its line rather than a body parse error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentLineRequest {
    pub bom_id: i64,
    pub quantity: i64,
    pub operation: String,
}

impl AdjustmentLineRequest {
    pub fn new(bom_id: i64, quantity: i64, operation: Operation) -> Self {
        Self {
            bom_id,
            quantity,
            operation: operation.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryAdjustmentRequest {
    pub element_type_id: i64,
    /// Number of produced elements this adjustment covers; audit only
    pub element_count: i64,
    pub project_id: i64,
    pub bom: Vec<AdjustmentLineRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryAdjustmentResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjustment_id: Option<i64>,
}

impl InventoryAdjustmentResponse {
    pub fn committed(adjustment_id: Option<i64>) -> Self {
        Self {
            success: true,
            message: "Inventory adjusted successfully".to_string(),
            adjustment_id,
        }
    }
}

/// Direction of a line change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Subtract,
}

impl Operation {
    /// Parse the exact client literal; no case folding
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "add" => Some(Operation::Add),
            "subtract" => Some(Operation::Subtract),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Subtract => "subtract",
        }
    }

    /// Signed balance delta, `None` when the negation overflows
    pub fn signed(&self, quantity: i64) -> Option<i64> {
        match self {
            Operation::Add => Some(quantity),
            Operation::Subtract => quantity.checked_neg(),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
