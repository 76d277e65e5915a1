//! Rental routes: rentals, payments, payment lookups and rental/product links.
//!
//! Linking a product to a rental does not move stock; clients call
//! `/inventory/products/{id}/borrow` for that.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use stockroom_core::input::{PaymentInput, RentalInput, RentalProductInput};
use stockroom_core::{Payment, PaymentState, PaymentType, Rental, RentalProduct};

use super::catalog::named_routes;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rentals", get(list_rentals).post(create_rental))
        .route(
            "/rentals/{id}",
            get(get_rental).put(update_rental).delete(delete_rental),
        )
        .route("/rentals/{id}/payments", get(rental_payments))
        .route("/rentals/{id}/products", get(rental_products))
        .nest("/payment-types", named_routes::<PaymentType>())
        .nest("/payment-states", named_routes::<PaymentState>())
        .route("/payments", get(list_payments).post(create_payment))
        .route(
            "/payments/{id}",
            get(get_payment).put(update_payment).delete(delete_payment),
        )
        .route("/rental-products", get(list_links).post(create_link))
        .route(
            "/rental-products/{id}",
            get(get_link).put(update_link).delete(delete_link),
        )
}

// =============================================================================
// Rentals
// =============================================================================

async fn list_rentals(State(state): State<AppState>) -> ApiResult<Json<Vec<Rental>>> {
    Ok(Json(state.db.rentals().list().await?))
}

async fn create_rental(
    State(state): State<AppState>,
    body: Result<Json<RentalInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Rental>)> {
    let Json(input) = body?;
    let rental = state.db.rentals().create(&input.validate()?).await?;
    Ok((StatusCode::CREATED, Json(rental)))
}

async fn get_rental(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Rental>> {
    find_rental(&state, id).await.map(Json)
}

async fn update_rental(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<RentalInput>, JsonRejection>,
) -> ApiResult<Json<Rental>> {
    let Json(input) = body?;
    Ok(Json(state.db.rentals().update(&id, &input.validate()?).await?))
}

/// Deletes the rental with its payments and product links.
async fn delete_rental(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.rentals().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn rental_payments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Payment>>> {
    let rental = find_rental(&state, id).await?;
    Ok(Json(state.db.payments().list_for_rental(&rental.id).await?))
}

async fn rental_products(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<RentalProduct>>> {
    let rental = find_rental(&state, id).await?;
    Ok(Json(state.db.rental_products().list_for_rental(&rental.id).await?))
}

async fn find_rental(state: &AppState, id: String) -> ApiResult<Rental> {
    state
        .db
        .rentals()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Rental", id))
}

// =============================================================================
// Payments
// =============================================================================

async fn list_payments(State(state): State<AppState>) -> ApiResult<Json<Vec<Payment>>> {
    Ok(Json(state.db.payments().list().await?))
}

async fn create_payment(
    State(state): State<AppState>,
    body: Result<Json<PaymentInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Payment>)> {
    let Json(input) = body?;
    let payment = state.db.payments().create(&input.validate()?).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

async fn get_payment(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Payment>> {
    state
        .db
        .payments()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Payment", id))
}

async fn update_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<PaymentInput>, JsonRejection>,
) -> ApiResult<Json<Payment>> {
    let Json(input) = body?;
    Ok(Json(state.db.payments().update(&id, &input.validate()?).await?))
}

async fn delete_payment(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.payments().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Rental / product links
// =============================================================================

async fn list_links(State(state): State<AppState>) -> ApiResult<Json<Vec<RentalProduct>>> {
    Ok(Json(state.db.rental_products().list().await?))
}

async fn create_link(
    State(state): State<AppState>,
    body: Result<Json<RentalProductInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RentalProduct>)> {
    let Json(input) = body?;
    let link = state.db.rental_products().create(&input.validate()?).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

async fn get_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<RentalProduct>> {
    state
        .db
        .rental_products()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("RentalProduct", id))
}

async fn update_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<RentalProductInput>, JsonRejection>,
) -> ApiResult<Json<RentalProduct>> {
    let Json(input) = body?;
    Ok(Json(state.db.rental_products().update(&id, &input.validate()?).await?))
}

async fn delete_link(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.rental_products().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
