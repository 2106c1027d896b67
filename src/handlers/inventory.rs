use super::common::{
    created_response, no_content_response, success_response, PaginatedResponse, PaginationParams,
};
use crate::{
    errors::ServiceError,
    handlers::AppState,
    services::inventory::{AdjustStockRequest, CreateItemRequest, ItemResponse, UpdateItemRequest},
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::IntoParams;
use uuid::Uuid;

pub fn inventory_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/low-stock", get(low_stock_items))
        .route("/:id", get(get_item).put(update_item).delete(delete_item))
        .route("/:id/adjust", post(adjust_stock))
        .route("/:id/transactions", get(list_transactions))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct InventoryFilters {
    pub search: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/inventory",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Inventory item created", body = ItemResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.services.inventory.create_item(payload).await?;

    info!("Inventory item created: {}", item.id);

    Ok(created_response(item))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/{id}",
    params(("id" = Uuid, Path, description = "Inventory item id")),
    responses(
        (status = 200, description = "Inventory item returned", body = ItemResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state
        .services
        .inventory
        .get_item(item_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Inventory item {} not found", item_id)))?;

    Ok(success_response(item))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    params(PaginationParams, InventoryFilters),
    responses(
        (status = 200, description = "Inventory list returned")
    ),
    tag = "inventory"
)]
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
    Query(filters): Query<InventoryFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let (items, total) = state
        .services
        .inventory
        .list_items(pagination.page, pagination.per_page, filters.search)
        .await?;

    Ok(success_response(PaginatedResponse::new(
        items,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Items at or below their minimum stock level.
#[utoipa::path(
    get,
    path = "/api/v1/inventory/low-stock",
    responses(
        (status = 200, description = "Low stock items returned")
    ),
    tag = "inventory"
)]
pub async fn low_stock_items(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let items = state.services.inventory.low_stock_items().await?;
    Ok(success_response(items))
}

#[utoipa::path(
    put,
    path = "/api/v1/inventory/{id}",
    params(("id" = Uuid, Path, description = "Inventory item id")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Inventory item updated", body = ItemResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.services.inventory.update_item(item_id, payload).await?;

    info!("Inventory item updated: {}", item_id);

    Ok(success_response(item))
}

#[utoipa::path(
    delete,
    path = "/api/v1/inventory/{id}",
    params(("id" = Uuid, Path, description = "Inventory item id")),
    responses(
        (status = 204, description = "Inventory item deleted"),
        (status = 409, description = "Item has ledger history", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.inventory.delete_item(item_id).await?;

    info!("Inventory item deleted: {}", item_id);

    Ok(no_content_response())
}

/// Manually adjust stock. Every adjustment writes a ledger row; the item's
/// quantity is never edited directly.
#[utoipa::path(
    post,
    path = "/api/v1/inventory/{id}/adjust",
    params(("id" = Uuid, Path, description = "Inventory item id")),
    request_body = AdjustStockRequest,
    responses(
        (status = 200, description = "Stock adjusted", body = ItemResponse),
        (status = 400, description = "Invalid adjustment", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn adjust_stock(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<AdjustStockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.services.inventory.adjust_stock(item_id, payload).await?;

    info!("Stock adjusted for item: {}", item_id);

    Ok(success_response(item))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/{id}/transactions",
    params(
        ("id" = Uuid, Path, description = "Inventory item id"),
        PaginationParams
    ),
    responses(
        (status = 200, description = "Transaction history returned")
    ),
    tag = "inventory"
)]
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let (transactions, total) = state
        .services
        .inventory
        .list_transactions(item_id, pagination.page, pagination.per_page)
        .await?;

    Ok(success_response(PaginatedResponse::new(
        transactions,
        pagination.page,
        pagination.per_page,
        total,
    )))
}
