//! HTTP tests for the product routes and the Borrow/Return endpoints.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{app, id, product, product_body, refs, send};

#[tokio::test]
async fn test_health() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "database": "up" }));
}

#[tokio::test]
async fn test_create_reconciles_total_and_derives_status() {
    let app = app().await;
    let refs = refs(&app).await;

    let mut body = product_body(&refs, json!("3"), json!(2));
    body["quantity_total"] = json!("10");
    let (status, created) = send(&app, "POST", "/api/inventory/products", Some(body)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["quantity_available"], 3);
    assert_eq!(created["quantity_loaned"], 2);
    assert_eq!(created["quantity_total"], 5);
    assert_eq!(created["status"], "active");
    assert_eq!(created["unit_value"], "49.90");
    assert_eq!(created["category_name"], "Audio");
}

#[tokio::test]
async fn test_create_rejects_bad_input() {
    let app = app().await;
    let refs = refs(&app).await;

    let body = product_body(&refs, json!("three"), json!(0));
    let (status, err) = send(&app, "POST", "/api/inventory/products", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "validation_error");
    assert_eq!(err["field"], "quantity_available");

    let body = product_body(&refs, json!(1), json!(0));
    let mut body = body;
    body["unit_value"] = json!("  ");
    let (status, err) = send(&app, "POST", "/api/inventory/products", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["field"], "unit_value");

    let mut body = product_body(&refs, json!(1), json!(0));
    body["category_id"] = json!(uuid::Uuid::new_v4().to_string());
    let (status, err) = send(&app, "POST", "/api/inventory/products", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["field"], "category_id");
}

#[tokio::test]
async fn test_malformed_body() {
    let app = app().await;
    let refs = refs(&app).await;
    let p = product(&app, &refs, 1, 0).await;

    let response = {
        use axum::body::Body;
        use axum::http::{header, Request};
        use tower::ServiceExt;

        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/inventory/products/{}/borrow", id(&p)))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{ not json"))
            .unwrap();
        app.clone().oneshot(request).await.unwrap()
    };
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_borrow_then_return() {
    let app = app().await;
    let refs = refs(&app).await;
    let p = product(&app, &refs, 3, 0).await;
    let borrow = format!("/api/inventory/products/{}/borrow", id(&p));
    let ret = format!("/api/inventory/products/{}/return", id(&p));

    let (status, body) = send(&app, "POST", &borrow, Some(json!({ "quantity": 3 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity_available"], 0);
    assert_eq!(body["quantity_loaned"], 3);
    assert_eq!(body["quantity_total"], 3);
    assert_eq!(body["status"], "exhausted");

    let (status, body) = send(&app, "POST", &ret, Some(json!({ "quantity": "3" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity_available"], 3);
    assert_eq!(body["quantity_loaned"], 0);
    assert_eq!(body["status"], "active");
}

#[tokio::test]
async fn test_borrow_insufficient_stock() {
    let app = app().await;
    let refs = refs(&app).await;
    let p = product(&app, &refs, 2, 0).await;
    let uri = format!("/api/inventory/products/{}/borrow", id(&p));

    let (status, err) = send(&app, "POST", &uri, Some(json!({ "quantity": 5 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["detail"], "Insufficient stock. Available: 2.");

    let (_, after) = send(&app, "GET", &format!("/api/inventory/products/{}", id(&p)), None).await;
    assert_eq!(after["quantity_available"], 2);
    assert_eq!(after["quantity_loaned"], 0);
}

#[tokio::test]
async fn test_return_more_than_loaned() {
    let app = app().await;
    let refs = refs(&app).await;
    let p = product(&app, &refs, 5, 2).await;
    let uri = format!("/api/inventory/products/{}/return", id(&p));

    let (status, err) = send(&app, "POST", &uri, Some(json!({ "quantity": 10 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["detail"], "Cannot return more than loaned. Loaned: 2.");
    assert_eq!(err["code"], "insufficient_loaned");
}

#[tokio::test]
async fn test_movement_quantity_must_be_positive() {
    let app = app().await;
    let refs = refs(&app).await;
    let p = product(&app, &refs, 5, 0).await;
    let uri = format!("/api/inventory/products/{}/borrow", id(&p));

    for quantity in [json!(0), json!(-2), json!("x"), json!(null)] {
        let (status, err) = send(&app, "POST", &uri, Some(json!({ "quantity": quantity }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["field"], "quantity");
    }

    // Quantity is checked before the product is looked up.
    let missing = format!("/api/inventory/products/{}/borrow", uuid::Uuid::new_v4());
    let (status, _) = send(&app, "POST", &missing, Some(json!({ "quantity": 0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, err) = send(&app, "POST", &missing, Some(json!({ "quantity": 1 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["code"], "not_found");
}

#[tokio::test]
async fn test_patch_keeps_absent_fields() {
    let app = app().await;
    let refs = refs(&app).await;
    let p = product(&app, &refs, 10, 4).await;
    let uri = format!("/api/inventory/products/{}", id(&p));

    let (status, body) = send(&app, "PATCH", &uri, Some(json!({ "quantity_available": 8 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity_available"], 8);
    assert_eq!(body["quantity_loaned"], 4);
    assert_eq!(body["quantity_total"], 12);
    assert_eq!(body["name"], "Speaker");
    assert_eq!(body["version"], 2);

    let (status, body) = send(&app, "PUT", &uri, Some(json!({ "status": "retired" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "retired");

    let (status, body) = send(&app, "PATCH", &uri, Some(json!({ "quantity_available": 0 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity_total"], 4);
    assert_eq!(body["status"], "exhausted");

    let (status, err) = send(&app, "PATCH", &uri, Some(json!({ "quantity_loaned": 20, "quantity_total": 5, "quantity_available": -1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["field"], "quantity_available");
}

#[tokio::test]
async fn test_delete_product_and_protected_category() {
    let app = app().await;
    let refs = refs(&app).await;
    let p = product(&app, &refs, 1, 0).await;

    let uri = format!("/api/inventory/categories/{}", refs.category_id);
    let (status, err) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["code"], "protected");

    let product_uri = format!("/api/inventory/products/{}", id(&p));
    let (status, _) = send(&app, "DELETE", &product_uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", &product_uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
