use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use menu_manager::http::{router, AppState};
use menu_manager::CatalogStore;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    router(AppState::new(CatalogStore::in_memory()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder.header("content-type", "application/json").body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

#[tokio::test]
async fn update_returns_diffs_and_dedups_pending() {
    let app = app();
    let (status, body) = send(&app, "POST", "/api/v1/products/prod-003", Some(json!({"price": "12.00"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["changes"][0]["type"], "price");
    assert_eq!(body["changes"][0]["before"], "$9.99");

    send(&app, "POST", "/api/v1/products/prod-003", Some(json!({"price": 15}))).await;
    let (_, pending) = send(&app, "GET", "/api/v1/pending-changes", None).await;
    let pending = pending.as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["before"], "$12.00");
    assert_eq!(pending[0]["after"], "$15.00");
}

#[tokio::test]
async fn unknown_product_is_404() {
    let app = app();
    let (status, body) = send(&app, "POST", "/api/v1/products/missing", Some(json!({"inventory": 3}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn create_product_validates_and_allocates_sku() {
    let app = app();
    let (status, body) = send(&app, "POST", "/api/v1/products", Some(json!({"name": "", "price": 5, "category": "Sides"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = send(&app, "POST", "/api/v1/products", Some(json!({"name": "Soup", "price": 5, "category": "Soups"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "POST", "/api/v1/products", Some(json!({"name": "Onion Rings", "price": "4.49", "category": "Sides"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["sku"], "HP-SID-002");
    assert_eq!(body["active"], true);
}

#[tokio::test]
async fn bulk_price_over_selection_then_publish() {
    let app = app();
    send(&app, "POST", "/api/v1/selection/toggle/prod-001", None).await;
    send(&app, "POST", "/api/v1/selection/toggle/nope", None).await;
    let (_, selection) = send(&app, "GET", "/api/v1/selection", None).await;
    assert_eq!(selection["selected"], json!(["prod-001"]));

    let (status, outcome) = send(&app, "POST", "/api/v1/bulk/price", Some(json!({"amount": 10, "mode": "percent_increase"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["results"][0]["ok"], true);

    let (_, product) = send(&app, "GET", "/api/v1/products/prod-001", None).await;
    assert_eq!(product["price"], "12.09");

    let (status, log) = send(&app, "POST", "/api/v1/publish", Some(json!({"publishedBy": "alice"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(log["publishedBy"], "alice");
    assert_eq!(log["changes"][0]["after"], "$12.09");

    let (status, _) = send(&app, "POST", "/api/v1/publish", Some(json!({"publishedBy": "alice"}))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, history) = send(&app, "GET", "/api/v1/publish-log", None).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn bulk_rejects_negative_amounts_and_unknown_operations() {
    let app = app();
    let (status, _) = send(&app, "POST", "/api/v1/bulk/price", Some(json!({"amount": -1, "mode": "set"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, _) = send(&app, "POST", "/api/v1/bulk/price", Some(json!({"amount": 100, "mode": "percent_decrease"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, _) = send(&app, "POST", "/api/v1/bulk/price", Some(json!({"amount": 0, "mode": "set"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, _) = send(&app, "POST", "/api/v1/bulk/explode", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn bulk_delete_with_empty_body() {
    let app = app();
    send(&app, "POST", "/api/v1/selection/all", None).await;
    let (status, outcome) = send(&app, "POST", "/api/v1/bulk/delete", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["results"].as_array().unwrap().len(), 8);
    let (_, products) = send(&app, "GET", "/api/v1/products", None).await;
    assert!(products.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn discard_restores_seed_menu() {
    let app = app();
    send(&app, "POST", "/api/v1/products/prod-001/duplicate", None).await;
    let (status, _) = send(&app, "POST", "/api/v1/discard", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, products) = send(&app, "GET", "/api/v1/products", None).await;
    assert_eq!(products.as_array().unwrap().len(), 8);
    let (_, pending) = send(&app, "GET", "/api/v1/pending-changes", None).await;
    assert!(pending.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn stock_endpoint_floors_at_zero() {
    let app = app();
    let (status, body) = send(&app, "POST", "/api/v1/products/prod-005/stock", Some(json!({"amount": 500, "mode": "remove"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["inventory"], 0);
    assert_eq!(body["changes"][0]["after"], "0");
}

#[tokio::test]
async fn category_in_use_conflicts() {
    let app = app();
    let (status, body) = send(&app, "DELETE", "/api/v1/categories/cat-001", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "category_in_use");
}
