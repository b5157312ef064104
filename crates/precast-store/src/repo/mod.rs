//! Repository layer
//!
//! `SqliteRepo` groups the SQL for each table family. Every method takes a
//! `&Connection`, so it runs unchanged inside a `Transaction` (which derefs
//! to one).

use chrono::{DateTime, TimeZone, Utc};

mod bom_repo;
mod element_repo;
mod inventory_repo;
mod planning;
mod session_repo;

pub use bom_repo::NewElement;
pub use inventory_repo::{BalanceMove, NewAdjustmentLog, NewInventoryTransaction};
pub use planning::SqlitePlanningSnapshot;

/// SQLite repository for the adjustment engine's tables
pub struct SqliteRepo;

/// Epoch milliseconds column to UTC timestamp
pub(crate) fn ms_to_utc(idx: usize, ms: i64) -> rusqlite::Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, ms))
}

pub(crate) fn opt_ms_to_utc(idx: usize, ms: Option<i64>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    ms.map(|v| ms_to_utc(idx, v)).transpose()
}
