use crate::{
    db::DbPool,
    entities::dispatch_batch::{self, ActiveModel as BatchActiveModel, Entity as BatchEntity},
    entities::order::{ActiveModel as OrderActiveModel, Entity as OrderEntity},
    entities::order_dispatch::{self, ActiveModel as DispatchActiveModel, Entity as DispatchEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    services::orders::OrderStatus,
    services::production::ProductionService,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateDispatchBatchRequest {
    #[validate(length(min = 1, message = "Batch number is required"))]
    pub batch_number: String,
    pub dispatch_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateDispatchRequest {
    pub order_id: Uuid,
    pub batch_id: Option<Uuid>,
    #[validate(range(min = 1, message = "Dispatch quantity must be at least 1"))]
    pub quantity: i32,
    pub dispatch_date: Option<DateTime<Utc>>,
    pub vehicle_number: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DispatchResponse {
    pub id: Uuid,
    pub order_id: Uuid,
    pub batch_id: Option<Uuid>,
    pub quantity: i32,
    pub dispatch_date: DateTime<Utc>,
    pub vehicle_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DispatchBatchResponse {
    pub id: Uuid,
    pub batch_number: String,
    pub dispatch_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub dispatches: Vec<DispatchResponse>,
}

/// Progress of an order through dispatch.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DispatchSummary {
    pub order_id: Uuid,
    pub order_quantity: i32,
    pub dispatched: i32,
    pub remaining: i32,
    pub fully_dispatched: bool,
}

/// Service for dispatching finished bags against orders, in batches or
/// individually. Dispatch is gated on the stitching stage of the order's
/// production.
#[derive(Clone)]
pub struct DispatchService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    production: ProductionService,
}

impl DispatchService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        production: ProductionService,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            production,
        }
    }

    /// Creates a dispatch batch (one consignment grouping dispatches).
    #[instrument(skip(self, request), fields(batch_number = %request.batch_number))]
    pub async fn create_batch(
        &self,
        request: CreateDispatchBatchRequest,
    ) -> Result<DispatchBatchResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let now = Utc::now();

        let batch = BatchActiveModel {
            id: Set(Uuid::new_v4()),
            batch_number: Set(request.batch_number.clone()),
            dispatch_date: Set(request.dispatch_date.unwrap_or(now)),
            notes: Set(request.notes.clone()),
            created_at: Set(now),
        }
        .insert(db)
        .await
        .map_err(|e| {
            if ServiceError::is_unique_violation(&e) {
                ServiceError::Conflict(format!(
                    "Batch number '{}' already exists",
                    request.batch_number
                ))
            } else {
                ServiceError::DatabaseError(e)
            }
        })?;

        info!(batch_id = %batch.id, "Dispatch batch created");

        if let Some(event_sender) = &self.event_sender {
            let _ = event_sender.send(Event::DispatchBatchCreated(batch.id)).await;
        }

        Ok(Self::to_batch_response(batch, Vec::new()))
    }

    /// Dispatches a quantity of finished bags against an order.
    ///
    /// Rejected unless the order's stitching gate has cleared, and capped so
    /// the cumulative dispatched quantity never exceeds the order quantity.
    /// The order is completed when the last bag leaves.
    #[instrument(skip(self, request), fields(order_id = %request.order_id, quantity = request.quantity))]
    pub async fn create_dispatch(
        &self,
        request: CreateDispatchRequest,
    ) -> Result<DispatchResponse, ServiceError> {
        request.validate()?;

        if !self.production.dispatch_ready(request.order_id).await? {
            return Err(ServiceError::StageNotReady(
                "Order has not cleared the stitching stage".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let order_model = OrderEntity::find_by_id(request.order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        if order_model.status == OrderStatus::Cancelled.to_string() {
            return Err(ServiceError::InvalidOperation(
                "Cannot dispatch against a cancelled order".to_string(),
            ));
        }

        if let Some(batch_id) = request.batch_id {
            BatchEntity::find_by_id(batch_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound("Dispatch batch not found".to_string())
                })?;
        }

        let already_dispatched = Self::dispatched_quantity(&txn, request.order_id).await?;
        let remaining = order_model.quantity - already_dispatched;
        if request.quantity > remaining {
            return Err(ServiceError::InvalidOperation(format!(
                "Dispatch of {} exceeds the {} remaining on the order",
                request.quantity, remaining
            )));
        }

        let dispatch = DispatchActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(request.order_id),
            batch_id: Set(request.batch_id),
            quantity: Set(request.quantity),
            dispatch_date: Set(request.dispatch_date.unwrap_or(now)),
            vehicle_number: Set(request.vehicle_number.clone()),
            notes: Set(request.notes.clone()),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let fully_dispatched = already_dispatched + request.quantity >= order_model.quantity;
        let mut status_change = None;
        if fully_dispatched && order_model.status != OrderStatus::Completed.to_string() {
            let old_status = order_model.status.clone();
            let version = order_model.version;
            let mut active: OrderActiveModel = order_model.into();
            active.status = Set(OrderStatus::Completed.to_string());
            active.updated_at = Set(Some(now));
            active.version = Set(version + 1);
            active.update(&txn).await?;
            status_change = Some(old_status);
        }

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(
            dispatch_id = %dispatch.id,
            order_id = %request.order_id,
            fully_dispatched,
            "Dispatch recorded"
        );

        if let Some(event_sender) = &self.event_sender {
            let _ = event_sender
                .send(Event::DispatchCreated {
                    dispatch_id: dispatch.id,
                    order_id: request.order_id,
                    quantity: request.quantity,
                })
                .await;
            if let Some(old_status) = status_change {
                let _ = event_sender
                    .send(Event::OrderStatusChanged {
                        order_id: request.order_id,
                        old_status,
                        new_status: OrderStatus::Completed.to_string(),
                    })
                    .await;
            }
        }

        Ok(Self::to_dispatch_response(dispatch))
    }

    /// Retrieves a batch with its dispatches.
    #[instrument(skip(self), fields(batch_id = %batch_id))]
    pub async fn get_batch(
        &self,
        batch_id: Uuid,
    ) -> Result<Option<DispatchBatchResponse>, ServiceError> {
        let db = &*self.db_pool;

        let Some(batch) = BatchEntity::find_by_id(batch_id).one(db).await? else {
            return Ok(None);
        };

        let dispatches = DispatchEntity::find()
            .filter(order_dispatch::Column::BatchId.eq(batch_id))
            .order_by_asc(order_dispatch::Column::CreatedAt)
            .all(db)
            .await?;

        Ok(Some(Self::to_batch_response(batch, dispatches)))
    }

    /// Lists dispatch batches with pagination.
    #[instrument(skip(self))]
    pub async fn list_batches(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<DispatchBatchResponse>, u64), ServiceError> {
        let db = &*self.db_pool;

        let paginator = BatchEntity::find()
            .order_by_desc(dispatch_batch::Column::CreatedAt)
            .paginate(db, limit);
        let total = paginator.num_items().await?;
        let batches = paginator.fetch_page(page.saturating_sub(1)).await?;

        let mut responses = Vec::with_capacity(batches.len());
        for batch in batches {
            let dispatches = DispatchEntity::find()
                .filter(order_dispatch::Column::BatchId.eq(batch.id))
                .order_by_asc(order_dispatch::Column::CreatedAt)
                .all(db)
                .await?;
            responses.push(Self::to_batch_response(batch, dispatches));
        }

        Ok((responses, total))
    }

    /// All dispatches recorded against an order, oldest first.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn list_order_dispatches(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<DispatchResponse>, ServiceError> {
        let db = &*self.db_pool;

        let dispatches = DispatchEntity::find()
            .filter(order_dispatch::Column::OrderId.eq(order_id))
            .order_by_asc(order_dispatch::Column::CreatedAt)
            .all(db)
            .await?;

        Ok(dispatches
            .into_iter()
            .map(Self::to_dispatch_response)
            .collect())
    }

    /// How much of the order has left, and how much remains.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn dispatch_summary(
        &self,
        order_id: Uuid,
    ) -> Result<DispatchSummary, ServiceError> {
        let db = &*self.db_pool;

        let order_model = OrderEntity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        let dispatched = Self::dispatched_quantity(db, order_id).await?;

        Ok(DispatchSummary {
            order_id,
            order_quantity: order_model.quantity,
            dispatched,
            remaining: order_model.quantity - dispatched,
            fully_dispatched: dispatched >= order_model.quantity,
        })
    }

    async fn dispatched_quantity<C: sea_orm::ConnectionTrait>(
        db: &C,
        order_id: Uuid,
    ) -> Result<i32, ServiceError> {
        let dispatches = DispatchEntity::find()
            .filter(order_dispatch::Column::OrderId.eq(order_id))
            .all(db)
            .await?;
        Ok(dispatches.iter().map(|d| d.quantity).sum())
    }

    fn to_dispatch_response(model: order_dispatch::Model) -> DispatchResponse {
        DispatchResponse {
            id: model.id,
            order_id: model.order_id,
            batch_id: model.batch_id,
            quantity: model.quantity,
            dispatch_date: model.dispatch_date,
            vehicle_number: model.vehicle_number,
            notes: model.notes,
            created_at: model.created_at,
        }
    }

    fn to_batch_response(
        batch: dispatch_batch::Model,
        dispatches: Vec<order_dispatch::Model>,
    ) -> DispatchBatchResponse {
        DispatchBatchResponse {
            id: batch.id,
            batch_number: batch.batch_number,
            dispatch_date: batch.dispatch_date,
            notes: batch.notes,
            created_at: batch.created_at,
            dispatches: dispatches
                .into_iter()
                .map(Self::to_dispatch_response)
                .collect(),
        }
    }
}
