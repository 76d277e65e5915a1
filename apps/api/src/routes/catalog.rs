//! Catalog routes: categories, brands, loan types, and the generic
//! `{id, name}` handlers reused by the rental and maintenance trees.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use stockroom_core::input::{LoanTypeInput, NamedInput};
use stockroom_core::{Brand, Category, LoanType};
use stockroom_db::NamedEntity;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/categories", named_routes::<Category>())
        .nest("/brands", named_routes::<Brand>())
        .route("/loan-types", get(list_loan_types).post(create_loan_type))
        .route(
            "/loan-types/{id}",
            get(get_loan_type)
                .put(update_loan_type)
                .patch(update_loan_type)
                .delete(delete_loan_type),
        )
}

// =============================================================================
// Named tables
// =============================================================================

/// CRUD routes for one `{id, name}` table.
pub fn named_routes<T>() -> Router<AppState>
where
    T: NamedEntity + Serialize + 'static,
{
    Router::new()
        .route("/", get(list_named::<T>).post(create_named::<T>))
        .route(
            "/{id}",
            get(get_named::<T>)
                .put(update_named::<T>)
                .patch(update_named::<T>)
                .delete(delete_named::<T>),
        )
}

async fn list_named<T>(State(state): State<AppState>) -> ApiResult<Json<Vec<T>>>
where
    T: NamedEntity + Serialize,
{
    Ok(Json(state.db.named::<T>().list().await?))
}

async fn create_named<T>(
    State(state): State<AppState>,
    body: Result<Json<NamedInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<T>)>
where
    T: NamedEntity + Serialize,
{
    let Json(input) = body?;
    let record = state.db.named::<T>().create(&input.validate()?).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_named<T>(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<T>>
where
    T: NamedEntity + Serialize,
{
    state
        .db
        .named::<T>()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(T::ENTITY, id))
}

async fn update_named<T>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<NamedInput>, JsonRejection>,
) -> ApiResult<Json<T>>
where
    T: NamedEntity + Serialize,
{
    let Json(input) = body?;
    let record = state.db.named::<T>().update(&id, &input.validate()?).await?;
    Ok(Json(record))
}

async fn delete_named<T>(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode>
where
    T: NamedEntity,
{
    state.db.named::<T>().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Loan types
// =============================================================================

async fn list_loan_types(State(state): State<AppState>) -> ApiResult<Json<Vec<LoanType>>> {
    Ok(Json(state.db.loan_types().list().await?))
}

async fn create_loan_type(
    State(state): State<AppState>,
    body: Result<Json<LoanTypeInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<LoanType>)> {
    let Json(input) = body?;
    let loan_type = state.db.loan_types().create(&input.validate()?).await?;
    Ok((StatusCode::CREATED, Json(loan_type)))
}

async fn get_loan_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<LoanType>> {
    state
        .db
        .loan_types()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("LoanType", id))
}

async fn update_loan_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<LoanTypeInput>, JsonRejection>,
) -> ApiResult<Json<LoanType>> {
    let Json(input) = body?;
    let loan_type = state.db.loan_types().update(&id, &input.validate()?).await?;
    Ok(Json(loan_type))
}

/// Deletes the loan type together with its products.
async fn delete_loan_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.loan_types().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
