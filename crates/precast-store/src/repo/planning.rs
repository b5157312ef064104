//! Planner reads backed by the applier's own transaction

#![allow(clippy::result_large_err)]

use crate::repo::SqliteRepo;
use precast_core::adjustment::PlanningSnapshot;
use precast_core::errors::Result;
use rusqlite::Connection;

/// [`PlanningSnapshot`] over a connection or open transaction
pub struct SqlitePlanningSnapshot<'a> {
    conn: &'a Connection,
}

impl<'a> SqlitePlanningSnapshot<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl PlanningSnapshot for SqlitePlanningSnapshot<'_> {
    fn project_exists(&self, project_id: i64) -> Result<bool> {
        SqliteRepo::project_exists(self.conn, project_id)
    }

    fn element_type_exists(&self, project_id: i64, element_type_id: i64) -> Result<bool> {
        SqliteRepo::element_type_exists(self.conn, project_id, element_type_id)
    }

    fn product_exists(&self, product_id: i64) -> Result<bool> {
        SqliteRepo::product_exists(self.conn, product_id)
    }

    fn on_hand(&self, project_id: i64, product_id: i64) -> Result<i64> {
        SqliteRepo::on_hand(self.conn, project_id, product_id)
    }
}
