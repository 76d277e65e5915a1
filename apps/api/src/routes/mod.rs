//! Route tree.

mod catalog;
mod maintenance;
mod products;
mod rentals;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::AppState;

pub fn api() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/inventory", catalog::router().merge(products::router()))
        .nest("/rental", rentals::router())
        .nest("/maintenance", maintenance::router())
}

/// `{status, database}`; 503 when the database does not answer.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    if state.db.health_check().await {
        (StatusCode::OK, Json(json!({ "status": "ok", "database": "up" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "database": "down" })),
        )
    }
}
