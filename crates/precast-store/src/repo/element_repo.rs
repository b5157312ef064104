//! Element types, produced elements and their adjustment latches

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use crate::repo::{opt_ms_to_utc, SqliteRepo};
use precast_core::diff::ElementCandidate;
use precast_core::model::{Element, ElementType};
use rusqlite::{Connection, OptionalExtension, Row};

const ELEMENT_TYPE_COLUMNS: &str = "element_type_id, project_id, element_type_name, version, \
     created_by, updated_at, inv_adjust";

fn element_type_from_row(row: &Row<'_>) -> rusqlite::Result<ElementType> {
    Ok(ElementType {
        element_type_id: row.get(0)?,
        project_id: row.get(1)?,
        element_type_name: row.get(2)?,
        version: row.get(3)?,
        created_by: row.get(4)?,
        updated_at: opt_ms_to_utc(5, row.get(5)?)?,
        inv_adjust: row.get(6)?,
    })
}

impl SqliteRepo {
    pub fn project_exists(conn: &Connection, project_id: i64) -> Result<bool> {
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM projects WHERE project_id = ?1)",
            [project_id],
            |row| row.get(0),
        )
        .map_err(from_rusqlite)
    }

    pub fn element_type_exists(
        conn: &Connection,
        project_id: i64,
        element_type_id: i64,
    ) -> Result<bool> {
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM element_types
             WHERE project_id = ?1 AND element_type_id = ?2)",
            [project_id, element_type_id],
            |row| row.get(0),
        )
        .map_err(from_rusqlite)
    }

    pub fn get_element_type(
        conn: &Connection,
        project_id: i64,
        element_type_id: i64,
    ) -> Result<Option<ElementType>> {
        conn.query_row(
            &format!(
                "SELECT {} FROM element_types WHERE project_id = ?1 AND element_type_id = ?2",
                ELEMENT_TYPE_COLUMNS
            ),
            [project_id, element_type_id],
            element_type_from_row,
        )
        .optional()
        .map_err(from_rusqlite)
    }

    /// Element types of a project, ordered by name then id
    pub fn list_element_types(conn: &Connection, project_id: i64) -> Result<Vec<ElementType>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM element_types WHERE project_id = ?1
                 ORDER BY element_type_name, element_type_id",
                ELEMENT_TYPE_COLUMNS
            ))
            .map_err(from_rusqlite)?;
        let rows = stmt
            .query_map([project_id], element_type_from_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(rows)
    }

    /// Every element of a type with its completed-activity flag, ordered by id
    pub fn list_element_candidates(
        conn: &Connection,
        element_type_id: i64,
    ) -> Result<Vec<ElementCandidate>> {
        let mut stmt = conn
            .prepare(
                "SELECT e.id, e.element_type_id, e.project_id, e.element_code,
                        e.bom_revision_id, e.drawing_revision_id, e.instage,
                        e.inv_adjust, e.updated_at,
                        EXISTS(SELECT 1 FROM activity a
                               WHERE a.element_id = e.id AND a.completed = 1)
                 FROM elements e
                 WHERE e.element_type_id = ?1
                 ORDER BY e.id",
            )
            .map_err(from_rusqlite)?;
        let rows = stmt
            .query_map([element_type_id], |row| {
                Ok(ElementCandidate {
                    element: Element {
                        id: row.get(0)?,
                        element_type_id: row.get(1)?,
                        project_id: row.get(2)?,
                        element_code: row.get(3)?,
                        bom_revision_id: row.get(4)?,
                        drawing_revision_id: row.get(5)?,
                        instage: row.get(6)?,
                        inv_adjust: row.get(7)?,
                        updated_at: opt_ms_to_utc(8, row.get(8)?)?,
                    },
                    has_completed_activity: row.get(9)?,
                })
            })
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(rows)
    }

    /// Set the element type latch; returns rows changed
    pub fn set_element_type_latch(
        conn: &Connection,
        project_id: i64,
        element_type_id: i64,
        inv_adjust: bool,
    ) -> Result<usize> {
        conn.execute(
            "UPDATE element_types SET inv_adjust = ?1
             WHERE project_id = ?2 AND element_type_id = ?3",
            rusqlite::params![inv_adjust, project_id, element_type_id],
        )
        .map_err(from_rusqlite)
    }

    /// Latch the given elements; latches only ever move false to true here
    pub fn latch_elements(conn: &Connection, element_ids: &[i64]) -> Result<usize> {
        let mut stmt = conn
            .prepare_cached("UPDATE elements SET inv_adjust = 1 WHERE id = ?1 AND inv_adjust = 0")
            .map_err(from_rusqlite)?;
        let mut changed = 0;
        for id in element_ids {
            changed += stmt.execute([id]).map_err(from_rusqlite)?;
        }
        Ok(changed)
    }
}
