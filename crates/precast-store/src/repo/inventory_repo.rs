//! Balances, the adjustment ledger and movement rows

#![allow(clippy::result_large_err)]

use crate::errors::{decode_error, from_rusqlite, Result};
use crate::repo::{ms_to_utc, SqliteRepo};
use chrono::{DateTime, Utc};
use precast_core::errors::{ExError, InventoryError};
use precast_core::model::{
    AdjustmentLogEntry, InventoryBalance, InventoryTransaction, TransactionStatus,
};
use rusqlite::Connection;

/// Project pool row used when a product has no warehouse balance yet
pub const POOL_WAREHOUSE_ID: i64 = 0;

/// One balance row touched by a delta
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceMove {
    pub warehouse_id: i64,
    /// Signed change applied to this row
    pub delta: i64,
}

/// A ledger row to append
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAdjustmentLog<'a> {
    pub project_id: i64,
    pub element_type_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub reason: &'a str,
    pub adjusted_by: &'a str,
    pub element_count: i64,
}

/// A movement row to append
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInventoryTransaction<'a> {
    pub project_id: i64,
    pub product_id: i64,
    pub warehouse_id: i64,
    pub quantity: i64,
    pub status: TransactionStatus,
    pub created_by: &'a str,
}

impl SqliteRepo {
    /// On-hand quantity summed across warehouses
    pub fn on_hand(conn: &Connection, project_id: i64, product_id: i64) -> Result<i64> {
        conn.query_row(
            "SELECT COALESCE(SUM(bom_qty), 0) FROM inventory
             WHERE project_id = ?1 AND product_id = ?2",
            [project_id, product_id],
            |row| row.get(0),
        )
        .map_err(from_rusqlite)
    }

    /// Balance rows of a product, ordered by warehouse
    pub fn list_balances(
        conn: &Connection,
        project_id: i64,
        product_id: i64,
    ) -> Result<Vec<InventoryBalance>> {
        let mut stmt = conn
            .prepare(
                "SELECT project_id, product_id, warehouse_id, bom_qty, last_updated,
                        last_inv_transactionid
                 FROM inventory WHERE project_id = ?1 AND product_id = ?2
                 ORDER BY warehouse_id",
            )
            .map_err(from_rusqlite)?;
        let rows = stmt
            .query_map([project_id, product_id], |row| {
                Ok(InventoryBalance {
                    project_id: row.get(0)?,
                    product_id: row.get(1)?,
                    warehouse_id: row.get(2)?,
                    bom_qty: row.get(3)?,
                    last_updated: ms_to_utc(4, row.get(4)?)?,
                    last_inv_transactionid: row.get(5)?,
                })
            })
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(rows)
    }

    /// Apply a signed delta to a product's balance rows
    ///
    /// A credit goes to the lowest warehouse row, creating the pool row when
    /// none exists. A debit drains rows in ascending warehouse order. A debit
    /// larger than the summed balance fails with `NegativeBalance`, and a
    /// credit past `i64::MAX` fails with `InvalidQuantity`; both write nothing.
    pub fn apply_delta(
        conn: &Connection,
        project_id: i64,
        product_id: i64,
        delta: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<BalanceMove>> {
        let now_ms = now.timestamp_millis();
        let rows = Self::list_balances(conn, project_id, product_id)?;
        let out_of_range = |balance: i64| {
            ExError::from(InventoryError::QuantityOutOfRange {
                bom_id: product_id,
                quantity: delta,
                balance,
            })
            .with_op("apply_delta")
        };

        let moves = if delta >= 0 {
            let (warehouse_id, balance) = rows
                .first()
                .map(|b| (b.warehouse_id, b.bom_qty))
                .unwrap_or((POOL_WAREHOUSE_ID, 0));
            if balance.checked_add(delta).is_none() {
                return Err(out_of_range(balance));
            }
            vec![BalanceMove {
                warehouse_id,
                delta,
            }]
        } else {
            let total: i128 = rows.iter().map(|b| i128::from(b.bom_qty)).sum();
            let after = total + i128::from(delta);
            if after < 0 {
                return Err(ExError::from(InventoryError::NegativeBalance {
                    project_id,
                    bom_id: product_id,
                    balance: i64::try_from(after).unwrap_or(i64::MIN),
                })
                .with_op("apply_delta"));
            }
            let mut remaining = delta.checked_neg().ok_or_else(|| out_of_range(0))?;
            let mut moves = Vec::new();
            for balance in &rows {
                if remaining == 0 {
                    break;
                }
                let take = balance.bom_qty.min(remaining);
                if take > 0 {
                    moves.push(BalanceMove {
                        warehouse_id: balance.warehouse_id,
                        delta: -take,
                    });
                    remaining -= take;
                }
            }
            moves
        };

        for mv in &moves {
            conn.execute(
                "INSERT INTO inventory (project_id, product_id, warehouse_id, bom_qty, last_updated)
                 VALUES (?1, ?2, ?3, MAX(0, ?4), ?5)
                 ON CONFLICT(project_id, product_id, warehouse_id) DO UPDATE SET
                    bom_qty = bom_qty + ?4,
                    last_updated = excluded.last_updated",
                rusqlite::params![project_id, product_id, mv.warehouse_id, mv.delta, now_ms],
            )
            .map_err(from_rusqlite)?;
        }

        Ok(moves)
    }

    /// Record the movement that last touched a set of balance rows
    pub fn stamp_balance_transaction(
        conn: &Connection,
        project_id: i64,
        product_id: i64,
        moves: &[BalanceMove],
        transaction_id: i64,
    ) -> Result<()> {
        for mv in moves {
            conn.execute(
                "UPDATE inventory SET last_inv_transactionid = ?1
                 WHERE project_id = ?2 AND product_id = ?3 AND warehouse_id = ?4",
                rusqlite::params![transaction_id, project_id, product_id, mv.warehouse_id],
            )
            .map_err(from_rusqlite)?;
        }
        Ok(())
    }

    /// Append one ledger row; returns its id
    pub fn append_adjustment_log(
        conn: &Connection,
        entry: &NewAdjustmentLog<'_>,
        now: DateTime<Utc>,
    ) -> Result<i64> {
        conn.execute(
            "INSERT INTO inventory_adjustment_logs (
                element_type_id, product_id, quantity, reason, adjusted_by,
                adjusted_at, project_id, element_count
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                entry.element_type_id,
                entry.product_id,
                entry.quantity,
                entry.reason,
                entry.adjusted_by,
                now.timestamp_millis(),
                entry.project_id,
                entry.element_count,
            ],
        )
        .map_err(from_rusqlite)?;
        Ok(conn.last_insert_rowid())
    }

    /// Ledger rows of a project, newest first
    pub fn list_adjustment_logs(
        conn: &Connection,
        project_id: i64,
    ) -> Result<Vec<AdjustmentLogEntry>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, COALESCE(element_type_id, 0), product_id, COALESCE(quantity, 0),
                        reason, adjusted_by, adjusted_at, project_id,
                        COALESCE(element_count, 0)
                 FROM inventory_adjustment_logs
                 WHERE project_id = ?1
                 ORDER BY adjusted_at DESC, id DESC",
            )
            .map_err(from_rusqlite)?;
        let rows = stmt
            .query_map([project_id], |row| {
                Ok(AdjustmentLogEntry {
                    id: row.get(0)?,
                    element_type_id: row.get(1)?,
                    product_id: row.get(2)?,
                    quantity: row.get(3)?,
                    reason: row.get(4)?,
                    adjusted_by: row.get(5)?,
                    adjusted_at: ms_to_utc(6, row.get(6)?)?,
                    project_id: row.get(7)?,
                    element_count: row.get(8)?,
                })
            })
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(rows)
    }

    /// Append one movement row; returns its id
    pub fn append_transaction(
        conn: &Connection,
        txn: &NewInventoryTransaction<'_>,
        now: DateTime<Utc>,
    ) -> Result<i64> {
        conn.execute(
            "INSERT INTO inventory_transactions (
                project_id, product_id, warehouse_id, quantity, status, created_by, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                txn.project_id,
                txn.product_id,
                txn.warehouse_id,
                txn.quantity,
                txn.status.as_str(),
                txn.created_by,
                now.timestamp_millis(),
            ],
        )
        .map_err(from_rusqlite)?;
        Ok(conn.last_insert_rowid())
    }

    /// Movement rows of a project in insertion order
    pub fn list_transactions(
        conn: &Connection,
        project_id: i64,
    ) -> Result<Vec<InventoryTransaction>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, project_id, product_id, warehouse_id, quantity, status,
                        created_by, created_at
                 FROM inventory_transactions WHERE project_id = ?1 ORDER BY id",
            )
            .map_err(from_rusqlite)?;
        let raw = stmt
            .query_map([project_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    ms_to_utc(7, row.get(7)?)?,
                ))
            })
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        raw.into_iter()
            .map(
                |(id, project_id, product_id, warehouse_id, quantity, status, created_by, created_at)| {
                    let status = TransactionStatus::parse(&status)
                        .ok_or_else(|| decode_error("inventory_transactions.status", &status))?;
                    Ok(InventoryTransaction {
                        id,
                        project_id,
                        product_id,
                        warehouse_id,
                        quantity,
                        status,
                        created_by,
                        created_at,
                    })
                },
            )
            .collect()
    }
}
