//! Maintenance routes: types, costs and maintenance records.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use stockroom_core::input::{MaintenanceCostInput, MaintenanceInput};
use stockroom_core::{Maintenance, MaintenanceCost, MaintenanceType};

use super::catalog::named_routes;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/types", named_routes::<MaintenanceType>())
        .route("/costs", get(list_costs).post(create_cost))
        .route(
            "/costs/{id}",
            get(get_cost).put(update_cost).delete(delete_cost),
        )
        .route("/records", get(list_records).post(create_record))
        .route(
            "/records/{id}",
            get(get_record).put(update_record).delete(delete_record),
        )
}

async fn list_costs(State(state): State<AppState>) -> ApiResult<Json<Vec<MaintenanceCost>>> {
    Ok(Json(state.db.maintenance_costs().list().await?))
}

async fn create_cost(
    State(state): State<AppState>,
    body: Result<Json<MaintenanceCostInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MaintenanceCost>)> {
    let Json(input) = body?;
    let cost = state.db.maintenance_costs().create(&input.validate()?).await?;
    Ok((StatusCode::CREATED, Json(cost)))
}

async fn get_cost(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MaintenanceCost>> {
    state
        .db
        .maintenance_costs()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("MaintenanceCost", id))
}

async fn update_cost(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<MaintenanceCostInput>, JsonRejection>,
) -> ApiResult<Json<MaintenanceCost>> {
    let Json(input) = body?;
    Ok(Json(
        state.db.maintenance_costs().update(&id, &input.validate()?).await?,
    ))
}

async fn delete_cost(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.maintenance_costs().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_records(State(state): State<AppState>) -> ApiResult<Json<Vec<Maintenance>>> {
    Ok(Json(state.db.maintenances().list().await?))
}

async fn create_record(
    State(state): State<AppState>,
    body: Result<Json<MaintenanceInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Maintenance>)> {
    let Json(input) = body?;
    let record = state.db.maintenances().create(&input.validate()?).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Maintenance>> {
    state
        .db
        .maintenances()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Maintenance", id))
}

async fn update_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<MaintenanceInput>, JsonRejection>,
) -> ApiResult<Json<Maintenance>> {
    let Json(input) = body?;
    Ok(Json(state.db.maintenances().update(&id, &input.validate()?).await?))
}

async fn delete_record(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.maintenances().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
