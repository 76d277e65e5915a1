//! # stockroom-api
//!
//! HTTP surface of Stockroom.
//!
//! ```text
//! /api
//! ├── /health
//! ├── /inventory/{categories, brands, loan-types}
//! ├── /inventory/products            (+ /{id}/borrow, /{id}/return)
//! ├── /rental/{rentals, payment-types, payment-states, payments, rental-products}
//! └── /maintenance/{types, costs, records}
//! ```
//!
//! Handlers stay thin: parse the body, validate through `stockroom-core`,
//! call one repository method, map the error.

pub mod config;
pub mod error;
pub mod routes;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use stockroom_db::Database;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        AppState { db }
    }
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::api())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
