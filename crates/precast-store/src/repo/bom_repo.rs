//! Current BOM, revision snapshots and element stamping

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use crate::repo::{ms_to_utc, SqliteRepo};
use chrono::{DateTime, Utc};
use precast_core::diff::LATEST_REVISION_WINDOW_MS;
use precast_core::errors::{ExError, ExErrorKind, InventoryError};
use precast_core::model::{BomLine, BomLineInput, BomRevisionLine};
use rusqlite::{Connection, OptionalExtension, Row, Transaction};
use std::collections::{HashMap, HashSet};

const REVISION_COLUMNS: &str = "element_type_bom_id, revision_id, element_type_id, project_id, \
     product_id, product_name, quantity, changed_at";

fn revision_from_row(row: &Row<'_>) -> rusqlite::Result<BomRevisionLine> {
    Ok(BomRevisionLine {
        element_type_bom_id: row.get(0)?,
        revision_id: row.get(1)?,
        element_type_id: row.get(2)?,
        project_id: row.get(3)?,
        product_id: row.get(4)?,
        product_name: row.get(5)?,
        quantity: row.get(6)?,
        changed_at: ms_to_utc(7, row.get(7)?)?,
    })
}

/// A produced element to stamp against the current revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewElement {
    pub project_id: i64,
    pub element_type_id: i64,
    pub element_code: String,
    pub drawing_revision_id: Option<i64>,
    pub instage: bool,
}

impl SqliteRepo {
    pub fn product_exists(conn: &Connection, product_id: i64) -> Result<bool> {
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM products WHERE product_id = ?1)",
            [product_id],
            |row| row.get(0),
        )
        .map_err(from_rusqlite)
    }

    /// Current BOM of an element type, ordered by product then row id
    pub fn list_bom_lines(conn: &Connection, element_type_id: i64) -> Result<Vec<BomLine>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, element_type_id, project_id, product_id, product_name, quantity
                 FROM element_type_bom WHERE element_type_id = ?1
                 ORDER BY product_id, id",
            )
            .map_err(from_rusqlite)?;
        let rows = stmt
            .query_map([element_type_id], |row| {
                Ok(BomLine {
                    id: row.get(0)?,
                    element_type_id: row.get(1)?,
                    project_id: row.get(2)?,
                    product_id: row.get(3)?,
                    product_name: row.get(4)?,
                    quantity: row.get(5)?,
                })
            })
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(rows)
    }

    /// Rows of one revision of an element type
    pub fn list_revision_lines(
        conn: &Connection,
        element_type_id: i64,
        revision_id: i64,
    ) -> Result<Vec<BomRevisionLine>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM element_type_bom_revisions
                 WHERE element_type_id = ?1 AND revision_id = ?2
                 ORDER BY product_id, element_type_bom_id",
                REVISION_COLUMNS
            ))
            .map_err(from_rusqlite)?;
        let rows = stmt
            .query_map([element_type_id, revision_id], revision_from_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(rows)
    }

    /// Pre-edit revision rows within one window of the newest `changed_at`
    ///
    /// Production snapshots are left out. Still needs `latest_revision_window` to collapse repeated links.
    pub fn list_latest_revision_rows(
        conn: &Connection,
        element_type_id: i64,
    ) -> Result<Vec<BomRevisionLine>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM element_type_bom_revisions
                 WHERE element_type_id = ?1 AND snapshot_kind = 'edit'
                   AND changed_at >= (SELECT MAX(changed_at) - ?2
                                      FROM element_type_bom_revisions
                                      WHERE element_type_id = ?1 AND snapshot_kind = 'edit')
                 ORDER BY changed_at, revision_id, element_type_bom_id",
                REVISION_COLUMNS
            ))
            .map_err(from_rusqlite)?;
        let rows = stmt
            .query_map([element_type_id, LATEST_REVISION_WINDOW_MS], revision_from_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(rows)
    }

    /// Most recent pre-edit `revision_id` recorded for an element type
    pub fn latest_revision_id(conn: &Connection, element_type_id: i64) -> Result<Option<i64>> {
        conn.query_row(
            "SELECT revision_id FROM element_type_bom_revisions
             WHERE element_type_id = ?1 AND snapshot_kind = 'edit'
             ORDER BY changed_at DESC, revision_id DESC
             LIMIT 1",
            [element_type_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(from_rusqlite)
    }

    /// Replace an element type's BOM, freezing the old one as a new revision
    ///
    /// Returns the new `revision_id`.
    pub fn revise_bom(
        conn: &mut Connection,
        project_id: i64,
        element_type_id: i64,
        lines: &[BomLineInput],
        new_version: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<i64> {
        let tx = conn.transaction().map_err(from_rusqlite)?;
        let revision_id =
            Self::revise_bom_tx(&tx, project_id, element_type_id, lines, new_version, now)?;
        tx.commit().map_err(from_rusqlite)?;
        Ok(revision_id)
    }

    /// Revise a BOM within an existing transaction
    pub fn revise_bom_tx(
        tx: &Transaction,
        project_id: i64,
        element_type_id: i64,
        lines: &[BomLineInput],
        new_version: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<i64> {
        let fail = |kind: ExErrorKind, message: String| {
            ExError::new(kind)
                .with_op("revise_bom")
                .with_entity_id(element_type_id)
                .with_message(message)
        };

        if !Self::element_type_exists(tx, project_id, element_type_id)? {
            return Err(ExError::from(InventoryError::ElementTypeNotFound {
                project_id,
                element_type_id,
            })
            .with_op("revise_bom"));
        }

        let mut seen = HashSet::new();
        for (index, line) in lines.iter().enumerate() {
            if !seen.insert(line.product_id) {
                return Err(fail(
                    ExErrorKind::InvalidInput,
                    format!("product {} listed twice", line.product_id),
                )
                .with_line_index(index));
            }
            if line.quantity.is_some_and(|q| q < 0) {
                return Err(fail(
                    ExErrorKind::InvalidQuantity,
                    format!("negative quantity for product {}", line.product_id),
                )
                .with_line_index(index));
            }
        }

        let now_ms = now.timestamp_millis();
        let revision_id = Self::freeze_current_bom(tx, element_type_id, SnapshotKind::Edit, now)?;

        let existing: HashMap<i64, i64> = Self::list_bom_lines(tx, element_type_id)?
            .into_iter()
            .map(|l| (l.product_id, l.id))
            .collect();

        for (product_id, id) in &existing {
            if !seen.contains(product_id) {
                tx.execute("DELETE FROM element_type_bom WHERE id = ?1", [id])
                    .map_err(from_rusqlite)?;
            }
        }

        for line in lines {
            match existing.get(&line.product_id) {
                Some(id) => {
                    tx.execute(
                        "UPDATE element_type_bom SET product_name = ?1, quantity = ?2 WHERE id = ?3",
                        rusqlite::params![line.product_name, line.quantity, id],
                    )
                    .map_err(from_rusqlite)?;
                }
                None => {
                    tx.execute(
                        "INSERT INTO element_type_bom
                            (element_type_id, project_id, product_id, product_name, quantity)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        rusqlite::params![
                            element_type_id,
                            project_id,
                            line.product_id,
                            line.product_name,
                            line.quantity
                        ],
                    )
                    .map_err(from_rusqlite)?;
                }
            }
        }

        tx.execute(
            "UPDATE element_types
             SET updated_at = ?1, version = COALESCE(?2, version)
             WHERE element_type_id = ?3",
            rusqlite::params![now_ms, new_version, element_type_id],
        )
        .map_err(from_rusqlite)?;

        tracing::debug!(
            element_type_id,
            revision_id,
            line_count = lines.len(),
            "Revised BOM"
        );

        Ok(revision_id)
    }

    /// Create an element stamped with the BOM it was produced against
    ///
    /// The current BOM is frozen as a production snapshot, or the newest
    /// production snapshot is reused when its rows still match. An element
    /// type with an empty BOM leaves `bom_revision_id` empty.
    pub fn stamp_element(conn: &Connection, element: &NewElement, now: DateTime<Utc>) -> Result<i64> {
        if !Self::element_type_exists(conn, element.project_id, element.element_type_id)? {
            return Err(ExError::from(InventoryError::ElementTypeNotFound {
                project_id: element.project_id,
                element_type_id: element.element_type_id,
            })
            .with_op("stamp_element"));
        }

        let bom_revision_id = Self::production_snapshot_id(conn, element.element_type_id, now)?;

        conn.execute(
            "INSERT INTO elements (
                element_type_id, project_id, element_code, bom_revision_id,
                drawing_revision_id, instage, inv_adjust, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
            rusqlite::params![
                element.element_type_id,
                element.project_id,
                element.element_code,
                bom_revision_id,
                element.drawing_revision_id,
                element.instage,
                now.timestamp_millis(),
            ],
        )
        .map_err(from_rusqlite)?;

        Ok(conn.last_insert_rowid())
    }

    /// Revision id holding exactly the current BOM, freezing one if needed
    fn production_snapshot_id(
        conn: &Connection,
        element_type_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<i64>> {
        let current = Self::list_bom_lines(conn, element_type_id)?;
        if current.is_empty() {
            return Ok(None);
        }

        let newest: Option<i64> = conn
            .query_row(
                "SELECT MAX(revision_id) FROM element_type_bom_revisions
                 WHERE element_type_id = ?1 AND snapshot_kind = 'production'",
                [element_type_id],
                |row| row.get(0),
            )
            .map_err(from_rusqlite)?;

        if let Some(revision_id) = newest {
            let frozen: HashSet<(i64, i64, i64)> =
                Self::list_revision_lines(conn, element_type_id, revision_id)?
                    .iter()
                    .map(|r| (r.element_type_bom_id, r.product_id, r.qty()))
                    .collect();
            let live: HashSet<(i64, i64, i64)> = current
                .iter()
                .map(|l| (l.id, l.product_id, l.qty()))
                .collect();
            if frozen == live {
                return Ok(Some(revision_id));
            }
        }

        Self::freeze_current_bom(conn, element_type_id, SnapshotKind::Production, now).map(Some)
    }

    /// Copy the current BOM into the revision table under a fresh id
    fn freeze_current_bom(
        conn: &Connection,
        element_type_id: i64,
        kind: SnapshotKind,
        now: DateTime<Utc>,
    ) -> Result<i64> {
        let revision_id: i64 = conn
            .query_row(
                "SELECT COALESCE(MAX(revision_id), 0) + 1 FROM element_type_bom_revisions",
                [],
                |row| row.get(0),
            )
            .map_err(from_rusqlite)?;

        conn.execute(
            "INSERT INTO element_type_bom_revisions (
                element_type_bom_id, revision_id, element_type_id, project_id,
                product_id, product_name, quantity, changed_at, snapshot_kind
             )
             SELECT id, ?1, element_type_id, project_id, product_id, product_name, quantity, ?2, ?3
             FROM element_type_bom WHERE element_type_id = ?4",
            rusqlite::params![revision_id, now.timestamp_millis(), kind.as_str(), element_type_id],
        )
        .map_err(from_rusqlite)?;

        Ok(revision_id)
    }
}

/// Why a set of revision rows was frozen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SnapshotKind {
    /// The BOM as it stood before an edit
    Edit,
    /// The BOM an element was produced against
    Production,
}

impl SnapshotKind {
    fn as_str(self) -> &'static str {
        match self {
            SnapshotKind::Edit => "edit",
            SnapshotKind::Production => "production",
        }
    }
}
