//! Engine-level read queries.

#![allow(clippy::result_large_err)]

use crate::commands::{diff_reader, ledger};
use precast_core::diff::ElementTypeDiffRecord;
use precast_core::model::AdjustmentLogEntry;
use precast_store::errors::Result;
use rusqlite::Connection;
use serde::Serialize;

/// Read-only engine queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineQuery {
    /// Per-element diff for every element type of a project.
    ElementTypesWithUpdatedBom { project_id: i64 },
    /// Latest-revision diff for one element type.
    ElementTypeWithUpdatedBom {
        project_id: i64,
        element_type_id: i64,
    },
    /// Adjustment ledger of a project, newest first.
    AdjustmentLogs { project_id: i64 },
}

/// Result of an engine query; serializes as the bare payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EngineQueryResult {
    UpdatedBoms(Vec<ElementTypeDiffRecord>),
    UpdatedBom(Option<Box<ElementTypeDiffRecord>>),
    AdjustmentLogs(Vec<AdjustmentLogEntry>),
}

/// Apply a read-only query.
pub fn apply_engine_query(query: EngineQuery, conn: &Connection) -> Result<EngineQueryResult> {
    match query {
        EngineQuery::ElementTypesWithUpdatedBom { project_id } => {
            diff_reader::element_types_with_updated_bom(conn, project_id)
                .map(EngineQueryResult::UpdatedBoms)
        }
        EngineQuery::ElementTypeWithUpdatedBom {
            project_id,
            element_type_id,
        } => diff_reader::element_type_with_updated_bom(conn, project_id, element_type_id)
            .map(|r| EngineQueryResult::UpdatedBom(r.map(Box::new))),
        EngineQuery::AdjustmentLogs { project_id } => {
            ledger::inventory_adjustment_logs(conn, project_id)
                .map(EngineQueryResult::AdjustmentLogs)
        }
    }
}
