//! # Product Routes
//!
//! ```text
//! GET    /inventory/products
//! POST   /inventory/products
//! GET    /inventory/products/{id}
//! PUT    /inventory/products/{id}          (partial, same as PATCH)
//! PATCH  /inventory/products/{id}
//! DELETE /inventory/products/{id}
//! POST   /inventory/products/{id}/borrow   { "quantity": 3 }
//! POST   /inventory/products/{id}/return   { "quantity": 3 }
//! ```
//!
//! The movement quantity is validated before the product is looked at, so a
//! bad quantity on an unknown product is a 400, not a 404.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use stockroom_core::input::{MovementInput, ProductInput};
use stockroom_core::Product;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product)
                .put(update_product)
                .patch(update_product)
                .delete(delete_product),
        )
        .route("/products/{id}/borrow", post(borrow))
        .route("/products/{id}/return", post(return_units))
}

async fn list_products(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.db.products().list().await?))
}

async fn create_product(
    State(state): State<AppState>,
    body: Result<Json<ProductInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let Json(input) = body?;
    let fields = input.validate()?;
    let product = state.db.products().create(&fields).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product", id))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ProductInput>, JsonRejection>,
) -> ApiResult<Json<Product>> {
    let Json(input) = body?;
    Ok(Json(state.db.products().update(&id, &input).await?))
}

async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.products().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn borrow(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<MovementInput>, JsonRejection>,
) -> ApiResult<Json<Product>> {
    let Json(input) = body?;
    let quantity = input.validate()?;
    Ok(Json(state.db.products().borrow(&id, quantity).await?))
}

async fn return_units(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<MovementInput>, JsonRejection>,
) -> ApiResult<Json<Product>> {
    let Json(input) = body?;
    let quantity = input.validate()?;
    Ok(Json(state.db.products().return_units(&id, quantity).await?))
}
