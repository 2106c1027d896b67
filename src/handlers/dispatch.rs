use super::common::{created_response, success_response, PaginatedResponse, PaginationParams};
use crate::{
    errors::ServiceError,
    handlers::AppState,
    services::dispatch::{
        CreateDispatchBatchRequest, CreateDispatchRequest, DispatchBatchResponse, DispatchResponse,
    },
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub fn dispatch_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_dispatch))
        .route("/batches", get(list_batches).post(create_batch))
        .route("/batches/:id", get(get_batch))
        .route("/orders/:id", get(list_order_dispatches))
        .route("/orders/:id/summary", get(dispatch_summary))
}

/// Dispatch finished bags against an order. Gated on the stitching stage and
/// capped to the order quantity; the order completes on the final dispatch.
#[utoipa::path(
    post,
    path = "/api/v1/dispatch",
    request_body = CreateDispatchRequest,
    responses(
        (status = 201, description = "Dispatch recorded", body = DispatchResponse),
        (status = 400, description = "Quantity exceeds remaining", body = crate::errors::ErrorResponse),
        (status = 422, description = "Stitching gate not cleared", body = crate::errors::ErrorResponse)
    ),
    tag = "dispatch"
)]
pub async fn create_dispatch(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateDispatchRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let dispatch = state.services.dispatch.create_dispatch(payload).await?;

    info!("Dispatch recorded: {}", dispatch.id);

    Ok(created_response(dispatch))
}

#[utoipa::path(
    post,
    path = "/api/v1/dispatch/batches",
    request_body = CreateDispatchBatchRequest,
    responses(
        (status = 201, description = "Dispatch batch created", body = DispatchBatchResponse),
        (status = 409, description = "Duplicate batch number", body = crate::errors::ErrorResponse)
    ),
    tag = "dispatch"
)]
pub async fn create_batch(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateDispatchBatchRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let batch = state.services.dispatch.create_batch(payload).await?;

    info!("Dispatch batch created: {} ({})", batch.batch_number, batch.id);

    Ok(created_response(batch))
}

#[utoipa::path(
    get,
    path = "/api/v1/dispatch/batches/{id}",
    params(("id" = Uuid, Path, description = "Dispatch batch id")),
    responses(
        (status = 200, description = "Batch returned", body = DispatchBatchResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "dispatch"
)]
pub async fn get_batch(
    State(state): State<Arc<AppState>>,
    Path(batch_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let batch = state
        .services
        .dispatch
        .get_batch(batch_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Dispatch batch {} not found", batch_id)))?;

    Ok(success_response(batch))
}

#[utoipa::path(
    get,
    path = "/api/v1/dispatch/batches",
    params(PaginationParams),
    responses(
        (status = 200, description = "Batch list returned")
    ),
    tag = "dispatch"
)]
pub async fn list_batches(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let (batches, total) = state
        .services
        .dispatch
        .list_batches(pagination.page, pagination.per_page)
        .await?;

    Ok(success_response(PaginatedResponse::new(
        batches,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/dispatch/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Dispatches returned")
    ),
    tag = "dispatch"
)]
pub async fn list_order_dispatches(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let dispatches = state
        .services
        .dispatch
        .list_order_dispatches(order_id)
        .await?;

    Ok(success_response(dispatches))
}

/// Dispatched and remaining quantities for an order.
#[utoipa::path(
    get,
    path = "/api/v1/dispatch/orders/{id}/summary",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Summary returned"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "dispatch"
)]
pub async fn dispatch_summary(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let summary = state.services.dispatch.dispatch_summary(order_id).await?;

    Ok(success_response(summary))
}
