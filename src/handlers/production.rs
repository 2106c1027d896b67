use super::common::{
    created_response, success_response, PaginatedResponse, PaginationParams,
};
use crate::{
    errors::ServiceError,
    handlers::AppState,
    services::production::{
        CreateJobCardRequest, CreateStageJobRequest, JobCardResponse, StageJobResponse,
        UpdateStageJobStatusRequest,
    },
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub fn production_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/job-cards", get(list_job_cards).post(create_job_card))
        .route("/job-cards/:id", get(get_job_card))
        .route("/job-cards/:id/consumption", get(consumption_lines))
        .route("/job-cards/:id/reverse", post(reverse_consumption))
        .route("/job-cards/:id/jobs", post(create_stage_job))
        .route("/jobs/:id/status", put(update_stage_job_status))
        .route("/orders/:id/dispatch-ready", get(dispatch_ready))
}

/// Create a job card. Materials for the order are deducted from inventory in
/// the same transaction; a second card for the same order is rejected.
#[utoipa::path(
    post,
    path = "/api/v1/production/job-cards",
    request_body = CreateJobCardRequest,
    responses(
        (status = 201, description = "Job card created", body = JobCardResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order already has a job card", body = crate::errors::ErrorResponse)
    ),
    tag = "production"
)]
pub async fn create_job_card(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateJobCardRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let card = state.services.production.create_job_card(payload).await?;

    info!("Job card created: {} ({})", card.card_number, card.id);

    Ok(created_response(card))
}

#[utoipa::path(
    get,
    path = "/api/v1/production/job-cards/{id}",
    params(("id" = Uuid, Path, description = "Job card id")),
    responses(
        (status = 200, description = "Job card returned", body = JobCardResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "production"
)]
pub async fn get_job_card(
    State(state): State<Arc<AppState>>,
    Path(job_card_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let card = state
        .services
        .production
        .get_job_card(job_card_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Job card {} not found", job_card_id)))?;

    Ok(success_response(card))
}

#[utoipa::path(
    get,
    path = "/api/v1/production/job-cards",
    params(PaginationParams),
    responses(
        (status = 200, description = "Job card list returned")
    ),
    tag = "production"
)]
pub async fn list_job_cards(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let (cards, total) = state
        .services
        .production
        .list_job_cards(pagination.page, pagination.per_page)
        .await?;

    Ok(success_response(PaginatedResponse::new(
        cards,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// The consumption ledger rows written when the card was created.
#[utoipa::path(
    get,
    path = "/api/v1/production/job-cards/{id}/consumption",
    params(("id" = Uuid, Path, description = "Job card id")),
    responses(
        (status = 200, description = "Consumption lines returned"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "production"
)]
pub async fn consumption_lines(
    State(state): State<Arc<AppState>>,
    Path(job_card_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let lines = state
        .services
        .production
        .consumption_lines(job_card_id)
        .await?;

    Ok(success_response(lines))
}

/// Reverse the card's consumption batch, crediting every deducted quantity
/// back to inventory.
#[utoipa::path(
    post,
    path = "/api/v1/production/job-cards/{id}/reverse",
    params(("id" = Uuid, Path, description = "Job card id")),
    responses(
        (status = 200, description = "Consumption reversed"),
        (status = 400, description = "Nothing to reverse", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "production"
)]
pub async fn reverse_consumption(
    State(state): State<Arc<AppState>>,
    Path(job_card_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .production
        .reverse_consumption(job_card_id)
        .await?;

    info!("Consumption reversed for job card: {}", job_card_id);

    Ok(success_response(serde_json::json!({
        "message": "Consumption batch reversed"
    })))
}

/// Create a stage job under a card. Gated on the prior stage per the
/// configured gate policy.
#[utoipa::path(
    post,
    path = "/api/v1/production/job-cards/{id}/jobs",
    params(("id" = Uuid, Path, description = "Job card id")),
    request_body = CreateStageJobRequest,
    responses(
        (status = 201, description = "Stage job created", body = StageJobResponse),
        (status = 404, description = "Job card not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Prior stage gate not cleared", body = crate::errors::ErrorResponse)
    ),
    tag = "production"
)]
pub async fn create_stage_job(
    State(state): State<Arc<AppState>>,
    Path(job_card_id): Path<Uuid>,
    Json(payload): Json<CreateStageJobRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let job = state
        .services
        .production
        .create_stage_job(job_card_id, payload)
        .await?;

    info!("Stage job created: {} ({})", job.stage, job.id);

    Ok(created_response(job))
}

#[utoipa::path(
    put,
    path = "/api/v1/production/jobs/{id}/status",
    params(("id" = Uuid, Path, description = "Stage job id")),
    request_body = UpdateStageJobStatusRequest,
    responses(
        (status = 200, description = "Stage job updated", body = StageJobResponse),
        (status = 400, description = "Unknown status", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "production"
)]
pub async fn update_stage_job_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
    Json(payload): Json<UpdateStageJobStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let job = state
        .services
        .production
        .update_stage_job_status(job_id, payload)
        .await?;

    info!("Stage job status updated: {}", job_id);

    Ok(success_response(job))
}

/// Whether the order's stitching gate has cleared and dispatch may begin.
#[utoipa::path(
    get,
    path = "/api/v1/production/orders/{id}/dispatch-ready",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Readiness returned")
    ),
    tag = "production"
)]
pub async fn dispatch_ready(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let ready = state.services.production.dispatch_ready(order_id).await?;

    Ok(success_response(serde_json::json!({
        "order_id": order_id,
        "dispatch_ready": ready
    })))
}
