// HTTP surface: routing, authentication, status mapping and bodies.

use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, HeaderValue, Request, StatusCode};
use axum::Router;
use precast_core::adjustment::{AdjustmentLineRequest, InventoryAdjustmentRequest, Operation};
use precast_core::errors::ExErrorKind;
use precast_engine::{apply_engine_command, EngineCommand};
use precast_server::{build_router, AppState, ServerConfig};
use rusqlite::Connection;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

const SESSION: &str = "sess-live";

fn setup_db() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("precast.db");
    let mut conn = Connection::open(&db_path).unwrap();
    precast_store::migrations::apply_migrations(&mut conn).unwrap();

    conn.execute_batch(
        r#"
        INSERT INTO projects (project_id, name) VALUES (1, 'Harbour Tower');
        INSERT INTO products (product_id, product_name) VALUES
            (100, 'Rebar 12mm'), (101, 'Lifting anchor');
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
            (1, 101, 0, 1, 0);
        INSERT INTO users (id, first_name, last_name) VALUES (1, 'Asha', 'Rao');
        INSERT INTO sessions (session_id, user_id, expires_at) VALUES
            ('sess-live', 1, 4102444800000),
            ('sess-expired', 1, 1000);
        "#,
    )
    .unwrap();
    drop(conn);

    (temp_dir, db_path)
}

fn setup_app() -> (TempDir, Router) {
    let (temp_dir, db_path) = setup_db();
    let config = ServerConfig {
        database_path: db_path,
        ..ServerConfig::default()
    };
    (temp_dir, build_router(AppState::new(config)))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(session) = session {
        builder = builder.header("authorization", session);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_adjustment(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/inventory_adjustment")
        .header("authorization", format!("Bearer {}", SESSION))
        .header("content-type", "application/json")
        .header("x-request-id", "req-http-1")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_per_element_diff_lists_records() {
    let (_dir, app) = setup_app();

    let (status, body) = send(app, get("/element_types_with_updated_bom/1", Some(SESSION))).await;

    assert_eq!(status, StatusCode::OK);
    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["element_type_name"], "Column C1");
    assert_eq!(
        records[0]["bom_required_adjustment"][0]["quantity_change"],
        json!(1)
    );
}

#[tokio::test]
async fn test_latest_revision_for_unknown_type_is_null() {
    let (_dir, app) = setup_app();

    let (status, body) =
        send(app, get("/element_types_with_updated_bom/1/999", Some(SESSION))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn test_missing_session_is_401() {
    let (_dir, app) = setup_app();

    let (status, body) = send(app, get("/inventory_adjustment_logs/1", None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "ERR_UNAUTHORISED");
}

#[tokio::test]
async fn test_expired_session_is_401() {
    let (_dir, app) = setup_app();

    let (status, _) = send(app, get("/inventory_adjustment_logs/1", Some("sess-expired"))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_adjustment_created_and_logged() {
    let (_dir, app) = setup_app();

    let (status, body) = send(
        app.clone(),
        post_adjustment(json!({
            "element_type_id": 7,
            "element_count": 1,
            "project_id": 1,
            "bom": [{"bom_id": 100, "quantity": 2, "operation": "add"}]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], "Inventory adjusted successfully");

    let (status, logs) = send(app.clone(), get("/inventory_adjustment_logs/1", Some(SESSION))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logs[0]["quantity"], json!(2));
    assert_eq!(logs[0]["adjusted_by"], "Asha Rao");
    assert_eq!(body["adjustment_id"], logs[0]["id"]);

    // latched: the type no longer surfaces
    let (_, diffs) = send(app, get("/element_types_with_updated_bom/1", Some(SESSION))).await;
    assert_eq!(diffs, json!([]));
}

#[tokio::test]
async fn test_insufficient_stock_is_400() {
    let (_dir, app) = setup_app();

    let (status, body) = send(
        app,
        post_adjustment(json!({
            "element_type_id": 7,
            "element_count": 1,
            "project_id": 1,
            "bom": [
                {"bom_id": 100, "quantity": 3, "operation": "add"},
                {"bom_id": 101, "quantity": 100, "operation": "subtract"}
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "ERR_INSUFFICIENT_STOCK");
    assert_eq!(body["error"]["line_index"], json!(1));
    assert_eq!(body["error"]["request_id"], "req-http-1");
}

#[tokio::test]
async fn test_malformed_payload_is_400() {
    let (_dir, app) = setup_app();

    let (status, body) = send(app, post_adjustment(json!({"project_id": "one"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "ERR_INVALID_INPUT");
}

#[tokio::test]
async fn test_invalid_project_id_is_400() {
    let (_dir, app) = setup_app();

    let (status, body) = send(app, get("/element_types_with_updated_bom/0", Some(SESSION))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "ERR_INVALID_INPUT");
}

fn short_deadline_state(db_path: PathBuf) -> (AppState, HeaderMap) {
    let config = ServerConfig {
        database_path: db_path,
        request_timeout_ms: 50,
        ..ServerConfig::default()
    };
    let mut headers = HeaderMap::new();
    headers.insert("authorization", HeaderValue::from_static(SESSION));
    (AppState::new(config), headers)
}

#[tokio::test]
async fn test_adjustment_past_deadline_commits_nothing() {
    let (_dir, db_path) = setup_db();
    let (state, headers) = short_deadline_state(db_path.clone());

    let err = state
        .run_engine(&headers, |conn, ctx, deadline| {
            std::thread::sleep(Duration::from_millis(300));
            apply_engine_command(
                EngineCommand::InventoryAdjustment {
                    request: InventoryAdjustmentRequest {
                        element_type_id: 7,
                        element_count: 1,
                        project_id: 1,
                        bom: vec![AdjustmentLineRequest::new(100, 2, Operation::Add)],
                    },
                    ctx,
                },
                conn,
                &deadline,
            )
        })
        .await
        .unwrap_err();

    assert_eq!(err.0.kind(), ExErrorKind::Timeout);
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let conn = Connection::open(&db_path).unwrap();
    let logs: i64 = conn
        .query_row("SELECT COUNT(*) FROM inventory_adjustment_logs", [], |r| r.get(0))
        .unwrap();
    let on_hand: i64 = conn
        .query_row(
            "SELECT bom_qty FROM inventory WHERE project_id = 1 AND product_id = 100",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(logs, 0);
    assert_eq!(on_hand, 10);
}

#[tokio::test]
async fn test_work_finished_after_deadline_reports_its_outcome() {
    let (_dir, db_path) = setup_db();
    let (state, headers) = short_deadline_state(db_path);

    let value = state
        .run_engine(&headers, |_conn, _ctx, deadline| {
            std::thread::sleep(Duration::from_millis(300));
            assert!(deadline.is_expired());
            Ok(42)
        })
        .await
        .unwrap();

    assert_eq!(value, 42);
}
