use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// On-hand quantity for one (project, product, warehouse)
///
/// `bom_qty` is never negative after a committed operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryBalance {
    pub project_id: i64,
    pub product_id: i64,
    /// `0` is the project pool used when no warehouse row exists yet
    pub warehouse_id: i64,
    pub bom_qty: i64,
    pub last_updated: DateTime<Utc>,
    pub last_inv_transactionid: Option<i64>,
}

/// Append-only ledger row written once per adjusted line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentLogEntry {
    pub id: i64,
    pub element_type_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub reason: String,
    pub adjusted_by: String,
    pub adjusted_at: DateTime<Utc>,
    pub project_id: i64,
    /// How many produced elements the adjustment was meant to cover
    pub element_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Added,
    Subtract,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Added => "Added",
            TransactionStatus::Subtract => "Subtract",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Added" => Some(TransactionStatus::Added),
            "Subtract" => Some(TransactionStatus::Subtract),
            _ => None,
        }
    }
}

/// Audit movement row written next to each ledger row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryTransaction {
    pub id: i64,
    pub project_id: i64,
    pub product_id: i64,
    pub warehouse_id: i64,
    pub quantity: i64,
    pub status: TransactionStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}
