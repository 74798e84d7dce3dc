//! HTTP surface over a shared [`CatalogStore`].
//!
//! The store sits behind one async mutex, so each request sees and mutates a
//! consistent snapshot and no two writers interleave.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use validator::{Validate, ValidationError};
use crate::domain::aggregates::{Category, CategoryDraft, CategoryUpdate, Product, ProductDraft, ProductUpdate};
use crate::domain::changes::{ChangeKind, PendingChange, PublishLog};
use crate::domain::value_objects::Money;
use crate::store::{BulkOutcome, CatalogStore, PriceMode, StockMode};
use crate::MenuError;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<CatalogStore>>,
}

impl AppState {
    pub fn new(store: CatalogStore) -> Self { Self { store: Arc::new(Mutex::new(store)) } }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(json!({"status": "healthy", "service": "menu-manager"})) }))
        .route("/api/v1/products", get(list_products).post(create_product))
        .route("/api/v1/products/:id", get(get_product).post(update_product).delete(delete_product))
        .route("/api/v1/products/:id/duplicate", post(duplicate_product))
        .route("/api/v1/products/:id/stock", post(adjust_stock))
        .route("/api/v1/inventory/low-stock", get(low_stock))
        .route("/api/v1/categories", get(list_categories).post(create_category))
        .route("/api/v1/category-order", post(reorder_categories))
        .route("/api/v1/categories/:id", get(get_category).put(update_category).delete(delete_category))
        .route("/api/v1/selection", get(get_selection).delete(clear_selection).put(update_view))
        .route("/api/v1/selection/all", post(select_all))
        .route("/api/v1/selection/toggle/:id", post(toggle_selection))
        .route("/api/v1/bulk/:operation", post(bulk))
        .route("/api/v1/publish", post(publish))
        .route("/api/v1/discard", post(discard))
        .route("/api/v1/pending-changes", get(pending_changes))
        .route("/api/v1/publish-log", get(publish_log))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// =============================================================================
// Errors
// =============================================================================

fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": code, "message": message.into() }))).into_response()
}

impl IntoResponse for MenuError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            MenuError::ProductNotFound(_) | MenuError::CategoryNotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", message),
            MenuError::CategoryInUse(_) => json_error(StatusCode::CONFLICT, "category_in_use", message),
            MenuError::Validation(_) => json_error(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", message),
            MenuError::StorageError(_) => {
                tracing::error!(error = %message, "storage failure");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", message)
            }
        }
    }
}

fn validated<T: Validate>(request: T) -> Result<T, MenuError> {
    request.validate().map_err(|e| MenuError::Validation(e.to_string()))?;
    Ok(request)
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, MenuError> {
    serde_json::from_slice(body).map_err(|e| MenuError::Validation(format!("invalid request body: {e}")))
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() { Err(ValidationError::new("blank")) } else { Ok(()) }
}

fn positive_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price > Decimal::ZERO { Ok(()) } else { Err(ValidationError::new("non_positive_price")) }
}

fn non_negative(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() && !amount.is_zero() { Err(ValidationError::new("negative_amount")) } else { Ok(()) }
}

/// A bulk price change may not leave products free or negatively priced;
/// `amount_decrease` is floored at zero instead.
fn price_stays_positive(request: &PriceRequest) -> Result<(), ValidationError> {
    match request.mode {
        PriceMode::PercentDecrease if request.amount >= Decimal::ONE_HUNDRED => Err(ValidationError::new("decrease_of_100_percent_or_more")),
        PriceMode::Set if request.amount <= Decimal::ZERO => Err(ValidationError::new("non_positive_price")),
        _ => Ok(()),
    }
}

fn default_true() -> bool { true }

// =============================================================================
// Views
// =============================================================================

/// Pending change with its before/after rendered for display.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingChangeView {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub before: String,
    pub after: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&PendingChange> for PendingChangeView {
    fn from(c: &PendingChange) -> Self {
        Self {
            id: c.id.clone(),
            product_id: c.product_id.clone(),
            product_name: c.product_name.clone(),
            kind: c.kind,
            before: c.before.to_string(),
            after: c.after.to_string(),
            timestamp: c.timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishLogView {
    pub id: String,
    pub changes: Vec<PendingChangeView>,
    pub published_at: DateTime<Utc>,
    pub published_by: String,
}

impl From<&PublishLog> for PublishLogView {
    fn from(log: &PublishLog) -> Self {
        Self {
            id: log.id.clone(),
            changes: log.changes.iter().map(PendingChangeView::from).collect(),
            published_at: log.published_at,
            published_by: log.published_by.clone(),
        }
    }
}

fn views(changes: &[PendingChange]) -> Vec<PendingChangeView> { changes.iter().map(PendingChangeView::from).collect() }

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub product: Product,
    pub changes: Vec<PendingChangeView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionResponse {
    pub selected: Vec<String>,
    pub bulk_edit_mode: bool,
    pub show_inactive: bool,
}

impl From<&CatalogStore> for SelectionResponse {
    fn from(store: &CatalogStore) -> Self {
        Self {
            selected: store.selected_products().iter().cloned().collect(),
            bulk_edit_mode: store.bulk_edit_mode(),
            show_inactive: store.show_inactive(),
        }
    }
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(custom = "not_blank")]
    pub name: String,
    #[validate(custom = "positive_price")]
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[validate(custom = "not_blank")]
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub inventory: u32,
    #[serde(default)]
    pub low_stock_threshold: u32,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub featured: bool,
}

impl From<CreateProductRequest> for ProductDraft {
    fn from(r: CreateProductRequest) -> Self {
        Self {
            name: r.name.trim().to_string(),
            price: Money::new(r.price),
            description: r.description,
            image: r.image,
            category: r.category,
            subcategory: r.subcategory.filter(|s| !s.is_empty()),
            inventory: r.inventory,
            low_stock_threshold: r.low_stock_threshold,
            tags: r.tags,
            active: r.active,
            featured: r.featured,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateProductRequest {
    #[validate(custom = "not_blank")]
    pub name: Option<String>,
    #[validate(custom = "positive_price")]
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub image: Option<String>,
    #[validate(custom = "not_blank")]
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub inventory: Option<u32>,
    pub low_stock_threshold: Option<u32>,
    pub tags: Option<BTreeSet<String>>,
    pub active: Option<bool>,
    pub featured: Option<bool>,
}

impl From<UpdateProductRequest> for ProductUpdate {
    fn from(r: UpdateProductRequest) -> Self {
        Self {
            name: r.name.map(|n| n.trim().to_string()),
            price: r.price.map(Money::new),
            description: r.description,
            image: r.image,
            category: r.category,
            subcategory: r.subcategory,
            inventory: r.inventory,
            low_stock_threshold: r.low_stock_threshold,
            tags: r.tags,
            active: r.active,
            featured: r.featured,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StockRequest {
    pub amount: u32,
    pub mode: StockMode,
}

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "price_stays_positive"))]
pub struct PriceRequest {
    #[validate(custom = "non_negative")]
    pub amount: Decimal,
    pub mode: PriceMode,
}

#[derive(Debug, Deserialize)]
pub struct ActiveRequest {
    pub active: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    #[validate(custom = "not_blank")]
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewRequest {
    pub show_inactive: Option<bool>,
    pub bulk_edit_mode: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    #[validate(custom = "not_blank")]
    pub published_by: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardTarget {
    #[default]
    Seed,
    LastPublish,
}

#[derive(Debug, Deserialize)]
pub struct DiscardParams {
    #[serde(default)]
    pub to: DiscardTarget,
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_products(State(s): State<AppState>) -> Json<Vec<Product>> {
    let store = s.store.lock().await;
    Json(store.visible_products().into_iter().cloned().collect())
}

async fn get_product(State(s): State<AppState>, Path(id): Path<String>) -> Result<Json<Product>, MenuError> {
    let store = s.store.lock().await;
    Ok(Json(store.product(&id)?.clone()))
}

async fn create_product(State(s): State<AppState>, Json(r): Json<CreateProductRequest>) -> Result<(StatusCode, Json<Product>), MenuError> {
    let draft = ProductDraft::from(validated(r)?);
    let product = s.store.lock().await.add_product(draft)?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(State(s): State<AppState>, Path(id): Path<String>, Json(r): Json<UpdateProductRequest>) -> Result<Json<UpdateResponse>, MenuError> {
    let update = ProductUpdate::from(validated(r)?);
    let mut store = s.store.lock().await;
    let changes = store.update_product(&id, update)?;
    Ok(Json(UpdateResponse { product: store.product(&id)?.clone(), changes: views(&changes) }))
}

async fn delete_product(State(s): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, MenuError> {
    s.store.lock().await.delete_product(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn duplicate_product(State(s): State<AppState>, Path(id): Path<String>) -> Result<(StatusCode, Json<Product>), MenuError> {
    let copy = s.store.lock().await.duplicate_product(&id)?;
    Ok((StatusCode::CREATED, Json(copy)))
}

async fn adjust_stock(State(s): State<AppState>, Path(id): Path<String>, Json(r): Json<StockRequest>) -> Result<Json<UpdateResponse>, MenuError> {
    let mut store = s.store.lock().await;
    let changes = store.adjust_stock(&id, r.amount, r.mode)?;
    Ok(Json(UpdateResponse { product: store.product(&id)?.clone(), changes: views(&changes) }))
}

async fn low_stock(State(s): State<AppState>) -> Json<Vec<Product>> {
    let store = s.store.lock().await;
    Json(store.low_stock_products().into_iter().cloned().collect())
}

async fn list_categories(State(s): State<AppState>) -> Json<Vec<Category>> {
    let store = s.store.lock().await;
    Json(store.categories().into_iter().cloned().collect())
}

async fn get_category(State(s): State<AppState>, Path(id): Path<String>) -> Result<Json<Category>, MenuError> {
    let store = s.store.lock().await;
    Ok(Json(store.category(&id)?.clone()))
}

async fn create_category(State(s): State<AppState>, Json(r): Json<CreateCategoryRequest>) -> Result<(StatusCode, Json<Category>), MenuError> {
    let r = validated(r)?;
    let draft = CategoryDraft { name: r.name, icon: r.icon, parent_id: r.parent_id };
    let category = s.store.lock().await.add_category(draft)?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(State(s): State<AppState>, Path(id): Path<String>, Json(update): Json<CategoryUpdate>) -> Result<Json<Category>, MenuError> {
    Ok(Json(s.store.lock().await.update_category(&id, update)?))
}

async fn delete_category(State(s): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, MenuError> {
    s.store.lock().await.delete_category(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn reorder_categories(State(s): State<AppState>, Json(r): Json<ReorderRequest>) -> Result<Json<Vec<Category>>, MenuError> {
    let mut store = s.store.lock().await;
    store.reorder_categories(&r.ids)?;
    Ok(Json(store.categories().into_iter().cloned().collect()))
}

async fn get_selection(State(s): State<AppState>) -> Json<SelectionResponse> {
    let store = s.store.lock().await;
    Json(SelectionResponse::from(&*store))
}

async fn update_view(State(s): State<AppState>, Json(r): Json<ViewRequest>) -> Json<SelectionResponse> {
    let mut store = s.store.lock().await;
    if let Some(show) = r.show_inactive {
        store.set_show_inactive(show);
    }
    if let Some(mode) = r.bulk_edit_mode {
        if mode != store.bulk_edit_mode() {
            store.toggle_bulk_edit_mode();
        }
    }
    Json(SelectionResponse::from(&*store))
}

async fn select_all(State(s): State<AppState>) -> Json<SelectionResponse> {
    let mut store = s.store.lock().await;
    store.select_all();
    Json(SelectionResponse::from(&*store))
}

async fn clear_selection(State(s): State<AppState>) -> Json<SelectionResponse> {
    let mut store = s.store.lock().await;
    store.clear_selection();
    Json(SelectionResponse::from(&*store))
}

async fn toggle_selection(State(s): State<AppState>, Path(id): Path<String>) -> Result<Json<SelectionResponse>, MenuError> {
    let mut store = s.store.lock().await;
    store.product(&id)?;
    store.toggle_product_selection(&id);
    Ok(Json(SelectionResponse::from(&*store)))
}

async fn bulk(State(s): State<AppState>, Path(operation): Path<String>, body: Bytes) -> Result<Json<BulkOutcome>, MenuError> {
    let mut store = s.store.lock().await;
    let outcome = match operation.as_str() {
        "stock" => {
            let r: StockRequest = parse_body(&body)?;
            store.bulk_update_stock(r.amount, r.mode)
        }
        "price" => {
            let r = validated(parse_body::<PriceRequest>(&body)?)?;
            store.bulk_update_price(r.amount, r.mode)
        }
        "active" => {
            let r: ActiveRequest = parse_body(&body)?;
            store.bulk_set_active(r.active)
        }
        "delete" => store.bulk_delete(),
        other => return Err(MenuError::Validation(format!("unknown bulk operation '{other}'"))),
    };
    Ok(Json(outcome))
}

async fn publish(State(s): State<AppState>, Json(r): Json<PublishRequest>) -> Result<Response, MenuError> {
    let r = validated(r)?;
    let mut store = s.store.lock().await;
    Ok(match store.publish(r.published_by.trim()) {
        Some(log) => (StatusCode::CREATED, Json(PublishLogView::from(log))).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

async fn discard(State(s): State<AppState>, Query(params): Query<DiscardParams>) -> StatusCode {
    let mut store = s.store.lock().await;
    match params.to {
        DiscardTarget::Seed => store.discard(),
        DiscardTarget::LastPublish => store.discard_to_last_publish(),
    }
    StatusCode::NO_CONTENT
}

async fn pending_changes(State(s): State<AppState>) -> Json<Vec<PendingChangeView>> {
    let store = s.store.lock().await;
    Json(views(store.pending_changes()))
}

async fn publish_log(State(s): State<AppState>) -> Json<Vec<PublishLogView>> {
    let store = s.store.lock().await;
    Json(store.publish_logs().iter().map(PublishLogView::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_rejects_blank_name_and_free_price() {
        let request: CreateProductRequest = serde_json::from_value(json!({"name": "  ", "price": 0, "category": "Pizza"})).unwrap();
        let err = request.validate().unwrap_err();
        let fields = err.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("price"));
    }

    #[test]
    fn test_update_request_validates_present_fields_only() {
        let request: UpdateProductRequest = serde_json::from_value(json!({"inventory": 4})).unwrap();
        assert!(request.validate().is_ok());
        let request: UpdateProductRequest = serde_json::from_value(json!({"price": "-1.00"})).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_price_request_keeps_prices_positive() {
        let request = |amount: i64, mode: &str| -> PriceRequest { serde_json::from_value(json!({"amount": amount, "mode": mode})).unwrap() };
        assert!(request(100, "percent_decrease").validate().is_err());
        assert!(request(150, "percent_decrease").validate().is_err());
        assert!(request(99, "percent_decrease").validate().is_ok());
        assert!(request(0, "set").validate().is_err());
        assert!(request(4, "set").validate().is_ok());
        assert!(request(500, "amount_decrease").validate().is_ok());
        assert!(request(500, "percent_increase").validate().is_ok());
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(MenuError::ProductNotFound("x".into()).into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(MenuError::CategoryInUse("Pizza".into()).into_response().status(), StatusCode::CONFLICT);
        assert_eq!(MenuError::Validation("bad".into()).into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
