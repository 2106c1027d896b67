use super::common::{
    created_response, no_content_response, success_response, PaginatedResponse, PaginationParams,
};
use crate::{
    errors::ServiceError,
    handlers::AppState,
    services::suppliers::SupplierRequest,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::IntoParams;
use uuid::Uuid;

pub fn supplier_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_suppliers).post(create_supplier))
        .route(
            "/:id",
            get(get_supplier).put(update_supplier).delete(delete_supplier),
        )
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SupplierFilters {
    pub search: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/suppliers",
    request_body = SupplierRequest,
    responses(
        (status = 201, description = "Supplier created"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "suppliers"
)]
pub async fn create_supplier(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SupplierRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let supplier = state.services.suppliers.create_supplier(payload).await?;

    info!("Supplier created: {}", supplier.id);

    Ok(created_response(supplier))
}

#[utoipa::path(
    get,
    path = "/api/v1/suppliers/{id}",
    params(("id" = Uuid, Path, description = "Supplier id")),
    responses(
        (status = 200, description = "Supplier returned"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "suppliers"
)]
pub async fn get_supplier(
    State(state): State<Arc<AppState>>,
    Path(supplier_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let supplier = state
        .services
        .suppliers
        .get_supplier(supplier_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Supplier {} not found", supplier_id)))?;

    Ok(success_response(supplier))
}

#[utoipa::path(
    get,
    path = "/api/v1/suppliers",
    params(PaginationParams, SupplierFilters),
    responses(
        (status = 200, description = "Supplier list returned")
    ),
    tag = "suppliers"
)]
pub async fn list_suppliers(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
    Query(filters): Query<SupplierFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let (suppliers, total) = state
        .services
        .suppliers
        .list_suppliers(pagination.page, pagination.per_page, filters.search)
        .await?;

    Ok(success_response(PaginatedResponse::new(
        suppliers,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/suppliers/{id}",
    params(("id" = Uuid, Path, description = "Supplier id")),
    request_body = SupplierRequest,
    responses(
        (status = 200, description = "Supplier updated"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "suppliers"
)]
pub async fn update_supplier(
    State(state): State<Arc<AppState>>,
    Path(supplier_id): Path<Uuid>,
    Json(payload): Json<SupplierRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let supplier = state
        .services
        .suppliers
        .update_supplier(supplier_id, payload)
        .await?;

    info!("Supplier updated: {}", supplier_id);

    Ok(success_response(supplier))
}

#[utoipa::path(
    delete,
    path = "/api/v1/suppliers/{id}",
    params(("id" = Uuid, Path, description = "Supplier id")),
    responses(
        (status = 204, description = "Supplier deleted"),
        (status = 409, description = "Supplier still referenced", body = crate::errors::ErrorResponse)
    ),
    tag = "suppliers"
)]
pub async fn delete_supplier(
    State(state): State<Arc<AppState>>,
    Path(supplier_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.suppliers.delete_supplier(supplier_id).await?;

    info!("Supplier deleted: {}", supplier_id);

    Ok(no_content_response())
}
