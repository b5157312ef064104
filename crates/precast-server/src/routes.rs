//! HTTP routes

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use precast_core::adjustment::{InventoryAdjustmentRequest, InventoryAdjustmentResponse};
use precast_core::errors::{ExError, ExErrorKind};
use precast_engine::{
    apply_engine_command, apply_engine_query, EngineCommand, EngineCommandResult, EngineQuery,
    EngineQueryResult,
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/element_types_with_updated_bom/:project_id",
            get(element_types_with_updated_bom),
        )
        .route(
            "/element_types_with_updated_bom/:project_id/:element_type_id",
            get(element_type_with_updated_bom),
        )
        .route("/inventory_adjustment", post(inventory_adjustment))
        .route(
            "/inventory_adjustment_logs/:project_id",
            get(inventory_adjustment_logs),
        )
        .with_state(state)
}

async fn query(
    state: &AppState,
    headers: &HeaderMap,
    query: EngineQuery,
) -> Result<Json<EngineQueryResult>, ApiError> {
    state
        .run_engine(headers, move |conn, _ctx, _deadline| {
            apply_engine_query(query, conn)
        })
        .await
        .map(Json)
}

async fn element_types_with_updated_bom(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<EngineQueryResult>, ApiError> {
    query(
        &state,
        &headers,
        EngineQuery::ElementTypesWithUpdatedBom { project_id },
    )
    .await
}

async fn element_type_with_updated_bom(
    State(state): State<AppState>,
    Path((project_id, element_type_id)): Path<(i64, i64)>,
    headers: HeaderMap,
) -> Result<Json<EngineQueryResult>, ApiError> {
    query(
        &state,
        &headers,
        EngineQuery::ElementTypeWithUpdatedBom {
            project_id,
            element_type_id,
        },
    )
    .await
}

async fn inventory_adjustment_logs(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<EngineQueryResult>, ApiError> {
    query(&state, &headers, EngineQuery::AdjustmentLogs { project_id }).await
}

async fn inventory_adjustment(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<InventoryAdjustmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<InventoryAdjustmentResponse>), ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        ApiError::from(
            ExError::new(ExErrorKind::InvalidInput)
                .with_op("inventory_adjustment")
                .with_message(rejection.body_text()),
        )
    })?;

    let response = state
        .run_engine(&headers, move |conn, ctx, deadline| {
            let result = apply_engine_command(
                EngineCommand::InventoryAdjustment { request, ctx },
                conn,
                &deadline,
            )?;
            match result {
                EngineCommandResult::InventoryAdjustment(response) => Ok(response),
                other => Err(ExError::new(ExErrorKind::Internal)
                    .with_message(format!("unexpected command result {:?}", other))),
            }
        })
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}
