//! Diff Reader.
//!
//! Surfaces element types whose produced elements were built against a BOM
//! that has since been revised.
//!
//! Two modes:
//! - **Per-element**: every eligible element is compared against the revision
//!   stamped on it. Elements of one type carrying different revisions yield
//!   one record per revision, since each revision gives a different diff.
//! - **Latest revision**: one element type is compared against the rows of its
//!   most recent logical revision (one-second window), merged by product.

#![allow(clippy::result_large_err)]

use precast_core::diff::{
    compute_bom_diff, element_type_is_eligible, is_eligible, latest_revision_window, DiffElement,
    ElementCandidate, ElementTypeDiffRecord, MergeKey,
};
use precast_core::errors::{ExError, InventoryError};
use precast_core::model::{BomLine, ElementType};
use precast_core::{log_op_end, log_op_error, log_op_start};
use precast_store::errors::Result;
use precast_store::repo::SqliteRepo;
use rusqlite::Connection;
use std::collections::BTreeMap;

fn validate_project_id(op: &str, project_id: i64) -> Result<()> {
    if project_id <= 0 {
        return Err(ExError::from(InventoryError::InvalidProjectId { project_id }).with_op(op));
    }
    Ok(())
}

fn eligible_candidates(
    conn: &Connection,
    element_type: &ElementType,
) -> Result<Vec<ElementCandidate>> {
    Ok(SqliteRepo::list_element_candidates(conn, element_type.element_type_id)?
        .into_iter()
        .filter(|c| is_eligible(element_type, c))
        .collect())
}

fn diff_element(candidate: &ElementCandidate) -> DiffElement {
    let e = &candidate.element;
    DiffElement {
        element_id: e.id,
        element_code: e.element_code.clone(),
        bom_revision_id: e.bom_revision_id,
        drawing_revision_id: e.drawing_revision_id,
        element_updated_at: e.updated_at,
    }
}

fn record(
    element_type: &ElementType,
    diff: precast_core::diff::BomDiff,
    elements: Vec<DiffElement>,
) -> ElementTypeDiffRecord {
    ElementTypeDiffRecord {
        element_type_id: element_type.element_type_id,
        element_type_name: element_type.element_type_name.clone(),
        project_id: element_type.project_id,
        element_type_created_by: element_type.created_by.clone(),
        element_type_version: element_type.version.clone(),
        element_type_updated_at: element_type.updated_at,
        diff,
        elements,
    }
}

/// Per-element mode for a whole project
///
/// Records are ordered by element type name, then by lowest element id.
///
/// # Errors
///
/// `InvalidInput` for a non-positive `project_id`; storage failures.
pub fn element_types_with_updated_bom(
    conn: &Connection,
    project_id: i64,
) -> Result<Vec<ElementTypeDiffRecord>> {
    log_op_start!("diff_read_per_element", project_id = project_id);
    let start = std::time::Instant::now();

    let result = (|| -> Result<Vec<ElementTypeDiffRecord>> {
        validate_project_id("diff_read_per_element", project_id)?;

        let mut records = Vec::new();
        for element_type in SqliteRepo::list_element_types(conn, project_id)? {
            if !element_type_is_eligible(&element_type) {
                continue;
            }
            let candidates = eligible_candidates(conn, &element_type)?;
            if candidates.is_empty() {
                continue;
            }
            records.extend(per_revision_records(conn, &element_type, candidates)?);
        }
        Ok(records)
    })();

    let elapsed = start.elapsed().as_millis() as u64;
    match &result {
        Ok(records) => log_op_end!(
            "diff_read_per_element",
            duration_ms = elapsed,
            record_count = records.len()
        ),
        Err(e) => log_op_error!("diff_read_per_element", e, duration_ms = elapsed),
    }
    result
}

fn per_revision_records(
    conn: &Connection,
    element_type: &ElementType,
    candidates: Vec<ElementCandidate>,
) -> Result<Vec<ElementTypeDiffRecord>> {
    let mut by_revision: BTreeMap<i64, Vec<ElementCandidate>> = BTreeMap::new();
    for candidate in candidates {
        if let Some(revision_id) = candidate.element.bom_revision_id {
            by_revision.entry(revision_id).or_default().push(candidate);
        }
    }

    let current: Vec<BomLine> = SqliteRepo::list_bom_lines(conn, element_type.element_type_id)?;

    let mut records = Vec::with_capacity(by_revision.len());
    for (revision_id, group) in by_revision {
        let revision =
            SqliteRepo::list_revision_lines(conn, element_type.element_type_id, revision_id)?;
        let diff = compute_bom_diff(&current, &revision, MergeKey::Link);
        let first_element = group.iter().map(|c| c.element.id).min().unwrap_or_default();
        records.push((
            first_element,
            record(element_type, diff, group.iter().map(diff_element).collect()),
        ));
    }

    records.sort_by_key(|(first_element, _)| *first_element);
    Ok(records.into_iter().map(|(_, r)| r).collect())
}

/// Latest-revision mode for one element type
///
/// Returns `None` when the type is missing, ineligible, has no eligible
/// elements, or has never been revised.
///
/// # Errors
///
/// `InvalidInput` for a non-positive `project_id`; storage failures.
pub fn element_type_with_updated_bom(
    conn: &Connection,
    project_id: i64,
    element_type_id: i64,
) -> Result<Option<ElementTypeDiffRecord>> {
    log_op_start!(
        "diff_read_latest_revision",
        project_id = project_id,
        element_type_id = element_type_id
    );
    let start = std::time::Instant::now();

    let result = (|| -> Result<Option<ElementTypeDiffRecord>> {
        validate_project_id("diff_read_latest_revision", project_id)?;

        let Some(element_type) = SqliteRepo::get_element_type(conn, project_id, element_type_id)?
        else {
            return Ok(None);
        };
        if !element_type_is_eligible(&element_type) {
            return Ok(None);
        }

        let candidates = eligible_candidates(conn, &element_type)?;
        if candidates.is_empty() {
            return Ok(None);
        }

        let revision =
            latest_revision_window(&SqliteRepo::list_latest_revision_rows(conn, element_type_id)?);
        if revision.is_empty() {
            return Ok(None);
        }

        let current = SqliteRepo::list_bom_lines(conn, element_type_id)?;
        let diff = compute_bom_diff(&current, &revision, MergeKey::Product);

        Ok(Some(record(
            &element_type,
            diff,
            candidates.iter().map(diff_element).collect(),
        )))
    })();

    let elapsed = start.elapsed().as_millis() as u64;
    match &result {
        Ok(found) => log_op_end!(
            "diff_read_latest_revision",
            duration_ms = elapsed,
            record_count = usize::from(found.is_some())
        ),
        Err(e) => log_op_error!("diff_read_latest_revision", e, duration_ms = elapsed),
    }
    result
}
