// Inventory adjustment through the engine command surface.

use precast_core::adjustment::{
    AdjustmentLineRequest, FailAtLineHook, InventoryAdjustmentRequest, NoopAdjustmentHook,
    Operation,
};
use precast_core::errors::{ErrorClass, ExErrorKind};
use precast_core::logging_facility::test_capture::init_test_capture;
use precast_core::model::BomLineInput;
use precast_core::types::{RequestContext, RequestId};
use precast_engine::{
    apply_engine_command, apply_engine_query, EngineCommand, EngineCommandResult, EngineQuery,
    EngineQueryResult,
};
use precast_store::repo::SqliteRepo;
use rusqlite::Connection;
use tempfile::TempDir;

/// Project 1, element type 7 built against revision 42 and since revised,
/// with balances 100:10 (pool), 101:1 (warehouse 3).
fn setup_test_repo() -> (TempDir, Connection) {
    let temp_dir = TempDir::new().unwrap();
    let mut conn = Connection::open(temp_dir.path().join("test.db")).unwrap();
    precast_store::migrations::apply_migrations(&mut conn).unwrap();

    conn.execute_batch(
        r#"
        INSERT INTO projects (project_id, name) VALUES (1, 'Harbour Tower');
        INSERT INTO products (product_id, product_name) VALUES
            (100, 'Rebar 12mm'), (101, 'Lifting anchor');
        INSERT INTO warehouses (warehouse_id, project_id, name) VALUES (3, 1, 'Yard A');
        INSERT INTO element_types (element_type_id, project_id, element_type_name, version, created_by)
        VALUES (7, 1, 'Column C1', 'RV-2', 'Planner');
        INSERT INTO element_type_bom (id, element_type_id, project_id, product_id, product_name, quantity)
        VALUES (1, 7, 1, 100, 'Rebar 12mm', 5);
        INSERT INTO element_type_bom_revisions
            (element_type_bom_id, revision_id, element_type_id, project_id, product_id, product_name, quantity, changed_at)
        VALUES (1, 42, 7, 1, 100, 'Rebar 12mm', 4, 1000);
        INSERT INTO elements (id, element_type_id, project_id, element_code, bom_revision_id, instage)
        VALUES (70, 7, 1, 'C1-001', 42, 1);
        INSERT INTO activity (element_id, project_id, stage, completed) VALUES (70, 1, 'casting', 1);
        INSERT INTO inventory (project_id, product_id, warehouse_id, bom_qty, last_updated) VALUES
            (1, 100, 0, 10, 0),
            (1, 101, 3, 1, 0);
        "#,
    )
    .unwrap();

    (temp_dir, conn)
}

fn request(lines: Vec<AdjustmentLineRequest>) -> InventoryAdjustmentRequest {
    InventoryAdjustmentRequest {
        element_type_id: 7,
        element_count: 1,
        project_id: 1,
        bom: lines,
    }
}

fn adjust(
    conn: &mut Connection,
    lines: Vec<AdjustmentLineRequest>,
) -> precast_core::Result<EngineCommandResult> {
    apply_engine_command(
        EngineCommand::InventoryAdjustment {
            request: request(lines),
            ctx: RequestContext::new("Asha Rao"),
        },
        conn,
        &NoopAdjustmentHook,
    )
}

fn on_hand(conn: &Connection, product_id: i64) -> i64 {
    SqliteRepo::on_hand(conn, 1, product_id).unwrap()
}

fn log_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM inventory_adjustment_logs", [], |r| r.get(0))
        .unwrap()
}

fn diff_records(conn: &Connection) -> usize {
    match apply_engine_query(EngineQuery::ElementTypesWithUpdatedBom { project_id: 1 }, conn)
        .unwrap()
    {
        EngineQueryResult::UpdatedBoms(records) => records.len(),
        other => panic!("unexpected result {:?}", other),
    }
}

fn revise(conn: &mut Connection, rebar_qty: i64) {
    apply_engine_command(
        EngineCommand::ReviseBom {
            project_id: 1,
            element_type_id: 7,
            lines: vec![BomLineInput {
                product_id: 100,
                product_name: "Rebar 12mm".to_string(),
                quantity: Some(rebar_qty),
            }],
            new_version: Some("RV-3".to_string()),
        },
        conn,
        &NoopAdjustmentHook,
    )
    .unwrap();
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_s4_apply_add() {
    let (_dir, mut conn) = setup_test_repo();

    let result = adjust(&mut conn, vec![AdjustmentLineRequest::new(100, 2, Operation::Add)]).unwrap();

    let EngineCommandResult::InventoryAdjustment(response) = result else {
        panic!("unexpected result {:?}", result);
    };
    assert!(response.success);
    assert_eq!(response.message, "Inventory adjusted successfully");
    assert_eq!(on_hand(&conn, 100), 12);

    let logs = SqliteRepo::list_adjustment_logs(&conn, 1).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].quantity, 2);
    assert!(logs[0].reason.contains("add"));
    assert!(logs[0].reason.contains("100"));
    assert_eq!(logs[0].adjusted_by, "Asha Rao");
    assert_eq!(response.adjustment_id, Some(logs[0].id));
}

#[test]
fn test_s5_subtract_with_insufficient_stock() {
    let (_dir, mut conn) = setup_test_repo();
    conn.execute("UPDATE inventory SET bom_qty = 1 WHERE product_id = 100", [])
        .unwrap();

    let err = adjust(
        &mut conn,
        vec![AdjustmentLineRequest::new(100, 2, Operation::Subtract)],
    )
    .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::InsufficientStock);
    assert_eq!(err.class(), ErrorClass::Validation);
    assert_eq!(on_hand(&conn, 100), 1);
    assert_eq!(log_count(&conn), 0);
}

#[test]
fn test_s6_mixed_plan_is_rejected_whole() {
    let (_dir, mut conn) = setup_test_repo();

    let err = adjust(
        &mut conn,
        vec![
            AdjustmentLineRequest::new(100, 3, Operation::Add),
            AdjustmentLineRequest::new(101, 100, Operation::Subtract),
        ],
    )
    .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::InsufficientStock);
    assert_eq!(err.line_index(), Some(1));
    assert_eq!(on_hand(&conn, 100), 10);
    assert_eq!(on_hand(&conn, 101), 1);
    assert_eq!(log_count(&conn), 0);
}

#[test]
fn test_unknown_operation_rejected() {
    let (_dir, mut conn) = setup_test_repo();
    let line = AdjustmentLineRequest {
        bom_id: 100,
        quantity: 1,
        operation: "Add".to_string(),
    };

    let err = adjust(&mut conn, vec![line]).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidOperation);
    assert_eq!(on_hand(&conn, 100), 10);
}

#[test]
fn test_errors_carry_request_id() {
    let (_dir, mut conn) = setup_test_repo();
    let ctx = RequestContext::new("Asha Rao")
        .with_request_id(RequestId::from_string("req-77".to_string()));

    let err = apply_engine_command(
        EngineCommand::InventoryAdjustment {
            request: request(vec![AdjustmentLineRequest::new(999, 1, Operation::Add)]),
            ctx,
        },
        &mut conn,
        &NoopAdjustmentHook,
    )
    .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::NotFound);
    assert_eq!(err.request_id().map(|r| r.as_str()), Some("req-77"));
}

// ---------------------------------------------------------------------------
// Atomicity
// ---------------------------------------------------------------------------

#[test]
fn test_failure_on_any_line_leaves_no_trace() {
    for fail_at in 0..3 {
        let (_dir, mut conn) = setup_test_repo();

        let err = apply_engine_command(
            EngineCommand::InventoryAdjustment {
                request: request(vec![
                    AdjustmentLineRequest::new(100, 3, Operation::Add),
                    AdjustmentLineRequest::new(101, 1, Operation::Subtract),
                    AdjustmentLineRequest::new(100, 2, Operation::Subtract),
                ]),
                ctx: RequestContext::new("Asha Rao"),
            },
            &mut conn,
            &FailAtLineHook::new(fail_at),
        )
        .unwrap_err();

        assert_eq!(err.kind(), ExErrorKind::AdjustmentAborted);
        assert_eq!(on_hand(&conn, 100), 10, "fail_at={}", fail_at);
        assert_eq!(on_hand(&conn, 101), 1, "fail_at={}", fail_at);
        assert_eq!(log_count(&conn), 0, "fail_at={}", fail_at);
        assert_eq!(diff_records(&conn), 1, "latch leaked at fail_at={}", fail_at);
    }
}

// ---------------------------------------------------------------------------
// Non-negativity and the ledger
// ---------------------------------------------------------------------------

#[test]
fn test_balances_stay_non_negative_across_sequence() {
    let (_dir, mut conn) = setup_test_repo();
    let steps = [
        (101, 1, Operation::Subtract),
        (101, 1, Operation::Subtract),
        (101, 4, Operation::Add),
        (101, 4, Operation::Subtract),
        (101, 1, Operation::Subtract),
    ];

    for (product_id, quantity, operation) in steps {
        let _ = adjust(
            &mut conn,
            vec![AdjustmentLineRequest::new(product_id, quantity, operation)],
        );
        assert!(on_hand(&conn, 101) >= 0);
    }

    assert_eq!(on_hand(&conn, 101), 0);
    // first subtract, add, second full subtract
    assert_eq!(log_count(&conn), 3);
}

#[test]
fn test_adjustment_logs_query_newest_first() {
    let (_dir, mut conn) = setup_test_repo();
    adjust(&mut conn, vec![AdjustmentLineRequest::new(100, 1, Operation::Add)]).unwrap();
    adjust(&mut conn, vec![AdjustmentLineRequest::new(100, 2, Operation::Add)]).unwrap();

    let EngineQueryResult::AdjustmentLogs(logs) =
        apply_engine_query(EngineQuery::AdjustmentLogs { project_id: 1 }, &conn).unwrap()
    else {
        panic!("expected adjustment logs");
    };

    assert_eq!(logs.len(), 2);
    assert!(logs[0].id > logs[1].id);
    assert_eq!(logs[0].quantity, 2);
}

#[test]
fn test_committed_log_rows_are_immutable() {
    let (_dir, mut conn) = setup_test_repo();
    adjust(&mut conn, vec![AdjustmentLineRequest::new(100, 1, Operation::Add)]).unwrap();

    assert!(conn
        .execute("UPDATE inventory_adjustment_logs SET quantity = 99", [])
        .is_err());
    assert!(conn.execute("DELETE FROM inventory_adjustment_logs", []).is_err());
    assert_eq!(log_count(&conn), 1);
}

// ---------------------------------------------------------------------------
// Latch
// ---------------------------------------------------------------------------

#[test]
fn test_latch_hides_type_until_reset() {
    let (_dir, mut conn) = setup_test_repo();
    assert_eq!(diff_records(&conn), 1);

    // GIVEN a committed adjustment
    adjust(&mut conn, vec![AdjustmentLineRequest::new(100, 1, Operation::Add)]).unwrap();
    assert_eq!(diff_records(&conn), 0);

    // WHEN the BOM is revised again
    revise(&mut conn, 9);

    // THEN the type stays hidden
    assert_eq!(diff_records(&conn), 0);

    // WHEN the type latch is reset
    let result = apply_engine_command(
        EngineCommand::ResetAdjustmentLatch {
            project_id: 1,
            element_type_id: 7,
        },
        &mut conn,
        &NoopAdjustmentHook,
    )
    .unwrap();
    assert_eq!(result, EngineCommandResult::LatchReset { was_set: true });

    // THEN the type is eligible again but the latched element stays hidden
    assert_eq!(diff_records(&conn), 0);

    // AND a newly produced element matches the BOM it was built against
    let stamped = apply_engine_command(
        EngineCommand::StampElement(precast_store::repo::NewElement {
            project_id: 1,
            element_type_id: 7,
            element_code: "C1-002".to_string(),
            drawing_revision_id: None,
            instage: true,
        }),
        &mut conn,
        &NoopAdjustmentHook,
    )
    .unwrap();
    let EngineCommandResult::ElementStamped { element_id } = stamped else {
        panic!("unexpected result {:?}", stamped);
    };
    conn.execute(
        "INSERT INTO activity (element_id, project_id, stage, completed) VALUES (?1, 1, 'casting', 1)",
        [element_id],
    )
    .unwrap();
    assert_eq!(diff_records(&conn), 0);

    // AND it surfaces once the BOM moves past it
    revise(&mut conn, 11);
    assert_eq!(diff_records(&conn), 1);
}

#[test]
fn test_reset_unknown_type_is_not_found() {
    let (_dir, mut conn) = setup_test_repo();
    let err = apply_engine_command(
        EngineCommand::ResetAdjustmentLatch {
            project_id: 1,
            element_type_id: 404,
        },
        &mut conn,
        &NoopAdjustmentHook,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[test]
fn test_adjustment_logs_one_start_and_one_end() {
    let capture = init_test_capture();
    let (_dir, mut conn) = setup_test_repo();
    let ctx = RequestContext::new("Asha Rao")
        .with_request_id(RequestId::from_string("req-log-1".to_string()));

    apply_engine_command(
        EngineCommand::InventoryAdjustment {
            request: request(vec![AdjustmentLineRequest::new(100, 1, Operation::Add)]),
            ctx,
        },
        &mut conn,
        &NoopAdjustmentHook,
    )
    .unwrap();

    let events: Vec<_> = capture
        .events_for_op("inventory_adjustment")
        .into_iter()
        .filter(|e| e.field("request_id") == Some("req-log-1"))
        .collect();
    let kinds: Vec<_> = events.iter().filter_map(|e| e.event.clone()).collect();
    assert_eq!(kinds, vec!["start".to_string(), "end".to_string()]);
}
