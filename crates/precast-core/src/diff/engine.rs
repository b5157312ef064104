//! BOM diff computation.
//!
//! [`compute_bom_diff`] is pure: the store loads both sides, this module
//! decides what differs. Output lists are sorted by `product_id` then link id.

use crate::diff::model::{BomDiff, BomProductRow, BomRequiredAdjustment, MergeKey};
use crate::model::{BomLine, BomRevisionLine};
use chrono::Duration;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Revisions whose `changed_at` falls within this many milliseconds of the
/// newest one are treated as a single bulk edit
pub const LATEST_REVISION_WINDOW_MS: i64 = 1_000;

/// Select the rows of the most recent logical revision
///
/// Keeps every row with `changed_at >= max(changed_at) - 1s`. When the same
/// link appears more than once inside the window, the row with the latest
/// `changed_at` wins, then the highest `revision_id`.
pub fn latest_revision_window(rows: &[BomRevisionLine]) -> Vec<BomRevisionLine> {
    let Some(newest) = rows.iter().map(|r| r.changed_at).max() else {
        return Vec::new();
    };
    let cutoff = newest - Duration::milliseconds(LATEST_REVISION_WINDOW_MS);

    let mut by_link: BTreeMap<i64, &BomRevisionLine> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.changed_at >= cutoff) {
        by_link
            .entry(row.element_type_bom_id)
            .and_modify(|kept| {
                if (row.changed_at, row.revision_id) > (kept.changed_at, kept.revision_id) {
                    *kept = row;
                }
            })
            .or_insert(row);
    }

    by_link.into_values().cloned().collect()
}

/// Compare a current BOM with a revision snapshot
///
/// A current row and a revision row match when their link ids are equal and
/// their quantities are equal after coalescing null to zero. Name-only
/// changes never count as a difference.
///
/// Unmatched rows from both sides are merged by `merge` into the adjustment
/// list; merged entries whose `quantity_change` is zero are dropped.
pub fn compute_bom_diff(
    current: &[BomLine],
    revision: &[BomRevisionLine],
    merge: MergeKey,
) -> BomDiff {
    let current_pairs: HashSet<(i64, i64)> = current.iter().map(|l| (l.id, l.qty())).collect();
    let revision_pairs: HashSet<(i64, i64)> = revision
        .iter()
        .map(|r| (r.element_type_bom_id, r.qty()))
        .collect();

    let mut unmatched_current: Vec<&BomLine> = current
        .iter()
        .filter(|l| !revision_pairs.contains(&(l.id, l.qty())))
        .collect();
    let mut unmatched_revision: Vec<&BomRevisionLine> = revision
        .iter()
        .filter(|r| !current_pairs.contains(&(r.element_type_bom_id, r.qty())))
        .collect();

    unmatched_current.sort_by_key(|l| (l.product_id, l.id));
    unmatched_revision.sort_by_key(|r| (r.product_id, r.element_type_bom_id));

    let bom_product = unmatched_current
        .iter()
        .map(|l| BomProductRow {
            product_id: l.product_id,
            product_name: l.product_name.clone(),
            quantity: l.qty(),
        })
        .collect();
    let bom_revision_product = unmatched_revision
        .iter()
        .map(|r| BomProductRow {
            product_id: r.product_id,
            product_name: r.product_name.clone(),
            quantity: r.qty(),
        })
        .collect();

    let bom_required_adjustment = merge_adjustments(&unmatched_current, &unmatched_revision, merge);

    BomDiff {
        bom_product,
        bom_revision_product,
        bom_required_adjustment,
    }
}

#[derive(Default)]
struct MergeSlot {
    product_id: i64,
    current_name: Option<String>,
    revision_name: Option<String>,
    quantity: i64,
    revision_quantity: i64,
}

fn merge_adjustments(
    current: &[&BomLine],
    revision: &[&BomRevisionLine],
    merge: MergeKey,
) -> Vec<BomRequiredAdjustment> {
    let key_of_current = |l: &BomLine| match merge {
        MergeKey::Link => l.id,
        MergeKey::Product => l.product_id,
    };
    let key_of_revision = |r: &BomRevisionLine| match merge {
        MergeKey::Link => r.element_type_bom_id,
        MergeKey::Product => r.product_id,
    };

    let mut slots: HashMap<i64, MergeSlot> = HashMap::new();
    for line in current {
        let slot = slots.entry(key_of_current(*line)).or_default();
        slot.product_id = line.product_id;
        slot.current_name = Some(line.product_name.clone());
        slot.quantity += line.qty();
    }
    for row in revision {
        let slot = slots.entry(key_of_revision(*row)).or_default();
        if slot.current_name.is_none() {
            slot.product_id = row.product_id;
        }
        slot.revision_name.get_or_insert_with(|| row.product_name.clone());
        slot.revision_quantity += row.qty();
    }

    let mut out: Vec<(i64, BomRequiredAdjustment)> = slots
        .into_iter()
        .filter_map(|(key, slot)| {
            let quantity_change = slot.quantity - slot.revision_quantity;
            if quantity_change == 0 {
                return None;
            }
            let product_name = slot
                .current_name
                .or(slot.revision_name)
                .unwrap_or_default();
            Some((
                key,
                BomRequiredAdjustment {
                    product_id: slot.product_id,
                    product_name,
                    quantity: slot.quantity,
                    revision_quantity: slot.revision_quantity,
                    quantity_change,
                },
            ))
        })
        .collect();

    out.sort_by_key(|(key, adj)| (adj.product_id, *key));
    out.into_iter().map(|(_, adj)| adj).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn line(id: i64, product_id: i64, quantity: Option<i64>) -> BomLine {
        BomLine {
            id,
            element_type_id: 7,
            project_id: 1,
            product_id,
            product_name: format!("P{}", product_id),
            quantity,
        }
    }

    fn rev(link: i64, revision_id: i64, product_id: i64, quantity: Option<i64>, ms: i64) -> BomRevisionLine {
        BomRevisionLine {
            element_type_bom_id: link,
            revision_id,
            element_type_id: 7,
            project_id: 1,
            product_id,
            product_name: format!("P{}", product_id),
            quantity,
            changed_at: Utc.timestamp_millis_opt(ms).single().unwrap_or_default(),
        }
    }

    #[test]
    fn test_quantity_change_only() {
        let current = vec![line(1, 100, Some(5)), line(2, 101, Some(3))];
        let revision = vec![rev(1, 42, 100, Some(4), 0), rev(2, 42, 101, Some(3), 0)];

        let diff = compute_bom_diff(&current, &revision, MergeKey::Link);

        assert_eq!(diff.bom_product.len(), 1);
        assert_eq!(diff.bom_product[0].quantity, 5);
        assert_eq!(diff.bom_revision_product[0].quantity, 4);
        assert_eq!(
            diff.bom_required_adjustment,
            vec![BomRequiredAdjustment {
                product_id: 100,
                product_name: "P100".to_string(),
                quantity: 5,
                revision_quantity: 4,
                quantity_change: 1,
            }]
        );
    }

    #[test]
    fn test_identical_sides_produce_empty_diff() {
        let current = vec![line(1, 100, Some(5)), line(2, 101, None)];
        let revision = vec![rev(1, 3, 100, Some(5), 0), rev(2, 3, 101, Some(0), 0)];

        let diff = compute_bom_diff(&current, &revision, MergeKey::Link);
        assert!(diff.is_empty());
    }

    #[test]
    fn test_name_only_change_is_not_a_difference() {
        let current = vec![line(1, 100, Some(5))];
        let mut r = rev(1, 3, 100, Some(5), 0);
        r.product_name = "Old rebar name".to_string();

        let diff = compute_bom_diff(&current, &[r], MergeKey::Link);
        assert!(diff.is_empty());
    }

    #[test]
    fn test_removed_and_added_rows() {
        // Current gained product 102 and lost product 101.
        let current = vec![line(1, 100, Some(5)), line(3, 102, Some(2))];
        let revision = vec![rev(1, 9, 100, Some(5), 0), rev(2, 9, 101, Some(3), 0)];

        let diff = compute_bom_diff(&current, &revision, MergeKey::Link);

        let changes: Vec<(i64, i64)> = diff
            .bom_required_adjustment
            .iter()
            .map(|a| (a.product_id, a.quantity_change))
            .collect();
        assert_eq!(changes, vec![(101, -3), (102, 2)]);
    }

    #[test]
    fn test_product_merge_collapses_relinked_product() {
        // Product 100 deleted and re-added under a new row id with a new qty.
        let current = vec![line(5, 100, Some(6))];
        let revision = vec![rev(1, 9, 100, Some(4), 0)];

        let by_link = compute_bom_diff(&current, &revision, MergeKey::Link);
        assert_eq!(by_link.bom_required_adjustment.len(), 2);

        let by_product = compute_bom_diff(&current, &revision, MergeKey::Product);
        assert_eq!(by_product.bom_required_adjustment.len(), 1);
        assert_eq!(by_product.bom_required_adjustment[0].quantity_change, 2);
    }

    #[test]
    fn test_product_merge_drops_zero_net_change() {
        let current = vec![line(5, 100, Some(4))];
        let revision = vec![rev(1, 9, 100, Some(4), 0)];

        let diff = compute_bom_diff(&current, &revision, MergeKey::Product);
        assert_eq!(diff.bom_product.len(), 1);
        assert_eq!(diff.bom_revision_product.len(), 1);
        assert!(diff.bom_required_adjustment.is_empty());
    }

    #[test]
    fn test_window_groups_bulk_edit() {
        let rows = vec![
            rev(1, 1, 100, Some(1), 0),
            rev(1, 2, 100, Some(2), 10_000),
            rev(2, 3, 101, Some(3), 10_600),
        ];

        let window = latest_revision_window(&rows);
        let revision_ids: Vec<i64> = window.iter().map(|r| r.revision_id).collect();
        assert_eq!(revision_ids, vec![2, 3]);
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let rows = vec![rev(1, 1, 100, Some(1), 5_000), rev(2, 2, 101, Some(1), 6_000)];
        assert_eq!(latest_revision_window(&rows).len(), 2);

        let rows = vec![rev(1, 1, 100, Some(1), 4_999), rev(2, 2, 101, Some(1), 6_000)];
        assert_eq!(latest_revision_window(&rows).len(), 1);
    }

    #[test]
    fn test_window_dedupes_link_by_latest_then_revision() {
        let rows = vec![
            rev(1, 4, 100, Some(1), 2_000),
            rev(1, 5, 100, Some(9), 2_000),
            rev(1, 6, 100, Some(7), 1_500),
        ];

        let window = latest_revision_window(&rows);
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].revision_id, 5);
        assert_eq!(window[0].qty(), 9);
    }

    #[test]
    fn test_window_of_nothing_is_empty() {
        assert!(latest_revision_window(&[]).is_empty());
    }
}
