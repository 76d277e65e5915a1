//! HTTP tests for rentals, payments, rental/product links and maintenance.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{app, create, id, product, refs, send};

#[tokio::test]
async fn test_rental_links_and_payments() {
    let app = app().await;
    let refs = refs(&app).await;
    let p = product(&app, &refs, 4, 0).await;

    let rental = create(
        &app,
        "/api/rental/rentals",
        json!({ "loaned_on": "2024-04-01", "user_id": "user-1" }),
    )
    .await;
    let rental_id = id(&rental);

    let link = json!({ "rental_id": rental_id, "product_id": id(&p) });
    let created = create(&app, "/api/rental/rental-products", link.clone()).await;
    assert_eq!(created["product_name"], "Speaker");
    assert_eq!(created["loan_type_name"], "Daily");

    let (status, err) = send(&app, "POST", "/api/rental/rental-products", Some(link)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["detail"], "This product is already linked to the rental.");
    assert_eq!(err["field"], "product_id");

    let payment_type = create(&app, "/api/rental/payment-types", json!({ "name": "Cash" })).await;
    let payment_state = create(&app, "/api/rental/payment-states", json!({ "name": "Paid" })).await;
    let payment = create(
        &app,
        "/api/rental/payments",
        json!({
            "total": 120,
            "amount_paid": "60,5",
            "billed_on": "2024-04-02",
            "payment_type_id": id(&payment_type),
            "payment_state_id": id(&payment_state),
            "rental_id": rental_id,
        }),
    )
    .await;
    assert_eq!(payment["total"], "120.00");
    assert_eq!(payment["amount_paid"], "60.50");

    let (status, products) =
        send(&app, "GET", &format!("/api/rental/rentals/{rental_id}/products"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(products.as_array().unwrap().len(), 1);

    let (_, payments) =
        send(&app, "GET", &format!("/api/rental/rentals/{rental_id}/payments"), None).await;
    assert_eq!(payments.as_array().unwrap().len(), 1);

    // Linking does not move stock.
    let (_, current) =
        send(&app, "GET", &format!("/api/inventory/products/{}", id(&p)), None).await;
    assert_eq!(current["quantity_available"], 4);

    let (status, _) = send(&app, "DELETE", &format!("/api/rental/rentals/{rental_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, links) = send(&app, "GET", "/api/rental/rental-products", None).await;
    assert!(links.as_array().unwrap().is_empty());
    let (status, _) =
        send(&app, "GET", &format!("/api/rental/payments/{}", id(&payment)), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rental_link_item_routes() {
    let app = app().await;
    let refs = refs(&app).await;
    let p = product(&app, &refs, 1, 0).await;
    let rental = |day: &str| json!({ "loaned_on": day, "user_id": "user-1" });
    let first = create(&app, "/api/rental/rentals", rental("2024-04-01")).await;
    let second = create(&app, "/api/rental/rentals", rental("2024-04-05")).await;

    let link = create(
        &app,
        "/api/rental/rental-products",
        json!({ "rental_id": id(&first), "product_id": id(&p) }),
    )
    .await;
    let uri = format!("/api/rental/rental-products/{}", id(&link));

    let (status, fetched) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, link);

    let (status, moved) = send(
        &app,
        "PUT",
        &uri,
        Some(json!({ "rental_id": id(&second), "product_id": id(&p) })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["rental_id"], id(&second));
    assert_eq!(moved["product_name"], "Speaker");

    let (status, err) = send(
        &app,
        "PUT",
        &uri,
        Some(json!({ "rental_id": "00000000-0000-4000-8000-000000000000", "product_id": id(&p) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["field"], "rental_id");

    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rental_validation() {
    let app = app().await;

    let (status, err) = send(
        &app,
        "POST",
        "/api/rental/rentals",
        Some(json!({ "loaned_on": "2024-04-10", "returned_on": "2024-04-01", "user_id": "u" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["field"], "returned_on");

    let (status, err) = send(
        &app,
        "POST",
        "/api/rental/rentals",
        Some(json!({ "loaned_on": "2024-04-10" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["field"], "user_id");

    let missing = uuid::Uuid::new_v4();
    let (status, _) = send(&app, "GET", &format!("/api/rental/rentals/{missing}/payments"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_maintenance_protects_product() {
    let app = app().await;
    let refs = refs(&app).await;
    let p = product(&app, &refs, 1, 0).await;

    let kind = create(&app, "/api/maintenance/types", json!({ "name": "Repair" })).await;
    let cost = create(
        &app,
        "/api/maintenance/costs",
        json!({ "total": "35.5", "affected_parts": "lens" }),
    )
    .await;
    assert_eq!(cost["total"], "35.50");

    let record = create(
        &app,
        "/api/maintenance/records",
        json!({
            "performed_on": "2024-06-01",
            "product_id": id(&p),
            "maintenance_type_id": id(&kind),
            "cost_id": id(&cost),
            "user_id": "tech-7",
        }),
    )
    .await;

    let product_uri = format!("/api/inventory/products/{}", id(&p));
    let (status, _) = send(&app, "DELETE", &product_uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/maintenance/records/{}", id(&record)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "DELETE", &product_uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
