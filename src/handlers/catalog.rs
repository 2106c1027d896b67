use super::common::{
    created_response, no_content_response, success_response, PaginatedResponse, PaginationParams,
};
use crate::{
    errors::ServiceError,
    handlers::AppState,
    services::catalog::{CatalogResponse, CreateCatalogRequest, UpdateCatalogRequest},
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub fn catalog_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_catalog).post(create_catalog))
        .route(
            "/:id",
            get(get_catalog).put(update_catalog).delete(delete_catalog),
        )
}

/// Create a catalog product. Component consumptions, material cost, total
/// cost and pricing are derived server-side.
#[utoipa::path(
    post,
    path = "/api/v1/catalog",
    request_body = CreateCatalogRequest,
    responses(
        (status = 201, description = "Catalog product created", body = CatalogResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn create_catalog(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateCatalogRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let catalog = state.services.catalog.create_catalog(payload).await?;

    info!("Catalog product created: {}", catalog.id);

    Ok(created_response(catalog))
}

#[utoipa::path(
    get,
    path = "/api/v1/catalog/{id}",
    params(("id" = Uuid, Path, description = "Catalog product id")),
    responses(
        (status = 200, description = "Catalog product returned", body = CatalogResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn get_catalog(
    State(state): State<Arc<AppState>>,
    Path(catalog_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let catalog = state
        .services
        .catalog
        .get_catalog(catalog_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Catalog product {} not found", catalog_id))
        })?;

    Ok(success_response(catalog))
}

#[utoipa::path(
    get,
    path = "/api/v1/catalog",
    params(PaginationParams),
    responses(
        (status = 200, description = "Catalog list returned")
    ),
    tag = "catalog"
)]
pub async fn list_catalog(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let (products, total) = state
        .services
        .catalog
        .list_catalog(pagination.page, pagination.per_page)
        .await?;

    Ok(success_response(PaginatedResponse::new(
        products,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Update a catalog product. Components are replaced wholesale and every
/// derived figure is recomputed.
#[utoipa::path(
    put,
    path = "/api/v1/catalog/{id}",
    params(("id" = Uuid, Path, description = "Catalog product id")),
    request_body = UpdateCatalogRequest,
    responses(
        (status = 200, description = "Catalog product updated", body = CatalogResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn update_catalog(
    State(state): State<Arc<AppState>>,
    Path(catalog_id): Path<Uuid>,
    Json(payload): Json<UpdateCatalogRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let catalog = state
        .services
        .catalog
        .update_catalog(catalog_id, payload)
        .await?;

    info!("Catalog product updated: {}", catalog_id);

    Ok(success_response(catalog))
}

#[utoipa::path(
    delete,
    path = "/api/v1/catalog/{id}",
    params(("id" = Uuid, Path, description = "Catalog product id")),
    responses(
        (status = 204, description = "Catalog product deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn delete_catalog(
    State(state): State<Arc<AppState>>,
    Path(catalog_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.catalog.delete_catalog(catalog_id).await?;

    info!("Catalog product deleted: {}", catalog_id);

    Ok(no_content_response())
}
