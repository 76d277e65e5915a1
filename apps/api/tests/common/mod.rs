//! Shared helpers for the HTTP tests: an app over in-memory SQLite and a
//! one-shot request helper.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use stockroom_api::{router, AppState};
use stockroom_db::{Database, DbConfig};

pub async fn app() -> Router {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    router(AppState::new(db))
}

/// Sends one request and returns the status with the decoded JSON body
/// (`Value::Null` for empty bodies).
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

pub async fn create(app: &Router, uri: &str, body: Value) -> Value {
    let (status, value) = send(app, "POST", uri, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "POST {uri}: {value}");
    value
}

pub struct Refs {
    pub category_id: String,
    pub brand_id: String,
    pub loan_type_id: String,
}

pub async fn refs(app: &Router) -> Refs {
    let category = create(app, "/api/inventory/categories", json!({ "name": "Audio" })).await;
    let brand = create(app, "/api/inventory/brands", json!({ "name": "Acme" })).await;
    let loan_type = create(
        app,
        "/api/inventory/loan-types",
        json!({ "name": "Daily", "kind": "daily" }),
    )
    .await;

    Refs {
        category_id: category["id"].as_str().unwrap().to_string(),
        brand_id: brand["id"].as_str().unwrap().to_string(),
        loan_type_id: loan_type["id"].as_str().unwrap().to_string(),
    }
}

pub fn product_body(refs: &Refs, available: Value, loaned: Value) -> Value {
    json!({
        "name": "Speaker",
        "unit_value": "49,90",
        "quantity_available": available,
        "quantity_loaned": loaned,
        "category_id": refs.category_id,
        "brand_id": refs.brand_id,
        "loan_type_id": refs.loan_type_id,
    })
}

pub async fn product(app: &Router, refs: &Refs, available: u32, loaned: u32) -> Value {
    create(
        app,
        "/api/inventory/products",
        product_body(refs, json!(available), json!(loaned)),
    )
    .await
}

pub fn id(value: &Value) -> String {
    value["id"].as_str().unwrap().to_string()
}
