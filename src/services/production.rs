use crate::{
    costing::{job_card_status, stage_gate, GatePolicy, JobStatus, Stage},
    db::DbPool,
    entities::inventory_item::{ActiveModel as ItemActiveModel, Entity as ItemEntity},
    entities::inventory_transaction::{
        self, ActiveModel as TransactionActiveModel, Entity as TransactionEntity,
    },
    entities::job_card::{self, ActiveModel as JobCardActiveModel, Entity as JobCardEntity},
    entities::order::{ActiveModel as OrderActiveModel, Entity as OrderEntity},
    entities::order_component::{self, Entity as OrderComponentEntity},
    entities::production_job::{self, ActiveModel as JobActiveModel, Entity as JobEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    services::inventory::insert_ledger_row_with_retry,
    services::orders::OrderStatus,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateJobCardRequest {
    pub order_id: Uuid,
    /// Defaults to "JC-<order number>" when omitted.
    pub card_number: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateStageJobRequest {
    pub stage: Stage,
    pub assigned_to: Option<String>,
    pub quantity: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateStageJobStatusRequest {
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StageJobResponse {
    pub id: Uuid,
    pub job_card_id: Uuid,
    pub stage: String,
    pub status: String,
    pub assigned_to: Option<String>,
    pub quantity: Option<i32>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JobCardResponse {
    pub id: Uuid,
    pub card_number: String,
    pub order_id: Uuid,
    pub consumption_batch_id: Uuid,
    /// Derived from the stage jobs on every read, never stored.
    pub status: String,
    pub jobs: Vec<StageJobResponse>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One line of the consumption deducted when a job card was created.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConsumptionLine {
    pub inventory_item_id: Uuid,
    pub quantity: Decimal,
    pub reversed: bool,
}

/// Service for the production workflow: job cards, stage jobs, and the
/// one-time material deduction.
#[derive(Clone)]
pub struct ProductionService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    gate_policy: GatePolicy,
}

impl ProductionService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        gate_policy: GatePolicy,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            gate_policy,
        }
    }

    pub fn gate_policy(&self) -> GatePolicy {
        self.gate_policy
    }

    /// Creates a job card for an order and deducts the order's material
    /// consumption from inventory — once, atomically.
    ///
    /// The card insert, the ledger rows and the inventory updates share one
    /// database transaction; a failure anywhere rolls the whole thing back
    /// instead of leaving stock half-deducted. A second card for the same
    /// order is rejected, so the deduction cannot repeat even under client
    /// retries.
    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn create_job_card(
        &self,
        request: CreateJobCardRequest,
    ) -> Result<JobCardResponse, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();
        let job_card_id = Uuid::new_v4();
        let batch_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for job card creation");
            ServiceError::DatabaseError(e)
        })?;

        let order_model = OrderEntity::find_by_id(request.order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        if order_model.status == OrderStatus::Cancelled.to_string() {
            return Err(ServiceError::InvalidOperation(
                "Cannot create a job card for a cancelled order".to_string(),
            ));
        }

        let existing = JobCardEntity::find()
            .filter(job_card::Column::OrderId.eq(request.order_id))
            .one(&txn)
            .await?;
        if let Some(card) = existing {
            return Err(ServiceError::Conflict(format!(
                "Order already has job card {}; materials were already deducted",
                card.card_number
            )));
        }

        let card_number = request
            .card_number
            .clone()
            .unwrap_or_else(|| format!("JC-{}", order_model.order_number));

        let card = JobCardActiveModel {
            id: Set(job_card_id),
            card_number: Set(card_number),
            order_id: Set(request.order_id),
            consumption_batch_id: Set(batch_id),
            notes: Set(request.notes.clone()),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            if ServiceError::is_unique_violation(&e) {
                ServiceError::Conflict(
                    "Order already has a job card; materials were already deducted".to_string(),
                )
            } else {
                error!(error = %e, "Failed to insert job card");
                ServiceError::DatabaseError(e)
            }
        })?;

        // Deduct the pre-scaled consumption of every material-bearing
        // component and write the matching ledger rows.
        let components = OrderComponentEntity::find()
            .filter(order_component::Column::OrderId.eq(request.order_id))
            .all(&txn)
            .await?;

        let mut consumed = 0usize;
        let mut low_stock_events = Vec::new();

        for component in &components {
            let (Some(material_id), Some(total)) =
                (component.material_id, component.total_consumption)
            else {
                continue;
            };
            if total.is_zero() {
                continue;
            }

            let item = ItemEntity::find_by_id(material_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::InventoryError(format!(
                        "Material {} referenced by order component no longer exists",
                        material_id
                    ))
                })?;

            let new_quantity = item.quantity - total;

            insert_ledger_row_with_retry(
                &txn,
                material_id,
                "consumption",
                total,
                Some(batch_id),
                Some(job_card_id),
                Some(format!("Job card for order {}", order_model.order_number)),
            )
            .await?;

            let version = item.version;
            let min_stock_level = item.min_stock_level;
            let mut active: ItemActiveModel = item.into();
            active.quantity = Set(new_quantity);
            active.updated_at = Set(Some(now));
            active.version = Set(version + 1);
            active.update(&txn).await?;

            consumed += 1;
            if new_quantity <= min_stock_level {
                low_stock_events.push(Event::LowStock {
                    item_id: material_id,
                    quantity: new_quantity,
                    min_stock_level,
                });
            }
        }

        // Creating the card moves the order into production.
        let order_version = order_model.version;
        let mut order_active: OrderActiveModel = order_model.into();
        order_active.status = Set(OrderStatus::InProduction.to_string());
        order_active.updated_at = Set(Some(now));
        order_active.version = Set(order_version + 1);
        order_active.update(&txn).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, job_card_id = %job_card_id, "Failed to commit job card creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            job_card_id = %job_card_id,
            order_id = %request.order_id,
            components = consumed,
            "Job card created and materials consumed"
        );

        if let Some(event_sender) = &self.event_sender {
            let _ = event_sender
                .send(Event::JobCardCreated {
                    job_card_id,
                    order_id: request.order_id,
                    consumption_batch_id: batch_id,
                })
                .await;
            let _ = event_sender
                .send(Event::MaterialsConsumed {
                    job_card_id,
                    batch_id,
                    components: consumed,
                })
                .await;
            for event in low_stock_events {
                let _ = event_sender.send(event).await;
            }
        }

        Ok(Self::to_card_response(card, Vec::new())?)
    }

    /// Reverses the consumption batch of a job card: credits every deducted
    /// quantity back, writes reversal ledger rows, and marks the originals
    /// reversed. Safe to call once; a second call finds nothing to reverse.
    #[instrument(skip(self), fields(job_card_id = %job_card_id))]
    pub async fn reverse_consumption(&self, job_card_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let card = JobCardEntity::find_by_id(job_card_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Job card not found".to_string()))?;

        let rows = TransactionEntity::find()
            .filter(inventory_transaction::Column::BatchId.eq(card.consumption_batch_id))
            .filter(inventory_transaction::Column::TransactionType.eq("consumption"))
            .filter(inventory_transaction::Column::Reversed.eq(false))
            .all(&txn)
            .await?;

        if rows.is_empty() {
            return Err(ServiceError::InvalidOperation(
                "Consumption batch already reversed or empty".to_string(),
            ));
        }

        for row in rows {
            let item = ItemEntity::find_by_id(row.inventory_item_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::InventoryError(format!(
                        "Material {} from the consumption batch no longer exists",
                        row.inventory_item_id
                    ))
                })?;

            let new_quantity = item.quantity + row.quantity;
            let version = item.version;
            let mut active: ItemActiveModel = item.into();
            active.quantity = Set(new_quantity);
            active.updated_at = Set(Some(now));
            active.version = Set(version + 1);
            active.update(&txn).await?;

            insert_ledger_row_with_retry(
                &txn,
                row.inventory_item_id,
                "reversal",
                row.quantity,
                Some(card.consumption_batch_id),
                Some(job_card_id),
                Some("Consumption batch reversal".to_string()),
            )
            .await?;

            let mut original: TransactionActiveModel = row.into();
            original.reversed = Set(true);
            original.update(&txn).await?;
        }

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(job_card_id = %job_card_id, "Consumption batch reversed");

        if let Some(event_sender) = &self.event_sender {
            let _ = event_sender
                .send(Event::ConsumptionReversed {
                    job_card_id,
                    batch_id: card.consumption_batch_id,
                })
                .await;
        }

        Ok(())
    }

    /// Retrieves a job card with its stage jobs and derived status.
    #[instrument(skip(self), fields(job_card_id = %job_card_id))]
    pub async fn get_job_card(
        &self,
        job_card_id: Uuid,
    ) -> Result<Option<JobCardResponse>, ServiceError> {
        let db = &*self.db_pool;

        let Some(card) = JobCardEntity::find_by_id(job_card_id).one(db).await? else {
            return Ok(None);
        };

        let jobs = JobEntity::find()
            .filter(production_job::Column::JobCardId.eq(job_card_id))
            .order_by_asc(production_job::Column::CreatedAt)
            .all(db)
            .await?;

        Ok(Some(Self::to_card_response(card, jobs)?))
    }

    /// Lists job cards with pagination; each card carries its derived status.
    #[instrument(skip(self))]
    pub async fn list_job_cards(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<JobCardResponse>, u64), ServiceError> {
        let db = &*self.db_pool;

        let paginator = JobCardEntity::find()
            .order_by_desc(job_card::Column::CreatedAt)
            .paginate(db, limit);
        let total = paginator.num_items().await?;
        let cards = paginator.fetch_page(page.saturating_sub(1)).await?;

        let mut responses = Vec::with_capacity(cards.len());
        for card in cards {
            let jobs = JobEntity::find()
                .filter(production_job::Column::JobCardId.eq(card.id))
                .order_by_asc(production_job::Column::CreatedAt)
                .all(db)
                .await?;
            responses.push(Self::to_card_response(card, jobs)?);
        }

        Ok((responses, total))
    }

    /// The consumption lines deducted for a card, for display and audit.
    #[instrument(skip(self), fields(job_card_id = %job_card_id))]
    pub async fn consumption_lines(
        &self,
        job_card_id: Uuid,
    ) -> Result<Vec<ConsumptionLine>, ServiceError> {
        let db = &*self.db_pool;

        let card = JobCardEntity::find_by_id(job_card_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Job card not found".to_string()))?;

        let rows = TransactionEntity::find()
            .filter(inventory_transaction::Column::BatchId.eq(card.consumption_batch_id))
            .filter(inventory_transaction::Column::TransactionType.eq("consumption"))
            .order_by_asc(inventory_transaction::Column::CreatedAt)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| ConsumptionLine {
                inventory_item_id: row.inventory_item_id,
                quantity: row.quantity,
                reversed: row.reversed,
            })
            .collect())
    }

    /// Creates a stage job under a card, gated on the prior stage.
    #[instrument(skip(self, request), fields(job_card_id = %job_card_id, stage = %request.stage))]
    pub async fn create_stage_job(
        &self,
        job_card_id: Uuid,
        request: CreateStageJobRequest,
    ) -> Result<StageJobResponse, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();

        let card = JobCardEntity::find_by_id(job_card_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Job card not found".to_string()))?;

        if let Some(prior) = request.stage.prior() {
            let prior_statuses = self.stage_statuses(card.id, prior).await?;
            if !stage_gate(self.gate_policy, &prior_statuses) {
                return Err(ServiceError::StageNotReady(format!(
                    "{} gate not cleared for policy {}",
                    prior, self.gate_policy
                )));
            }
        }

        let job = JobActiveModel {
            id: Set(Uuid::new_v4()),
            job_card_id: Set(card.id),
            stage: Set(request.stage.to_string()),
            status: Set(JobStatus::Pending.to_string()),
            assigned_to: Set(request.assigned_to.clone()),
            quantity: Set(request.quantity),
            started_at: Set(None),
            completed_at: Set(None),
            notes: Set(request.notes.clone()),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(db)
        .await?;

        info!(job_id = %job.id, stage = %request.stage, "Stage job created");

        if let Some(event_sender) = &self.event_sender {
            let _ = event_sender
                .send(Event::StageJobCreated {
                    job_card_id: card.id,
                    job_id: job.id,
                    stage: request.stage.to_string(),
                })
                .await;
        }

        Self::to_job_response(job)
    }

    /// Updates a stage job's status, stamping start/completion times.
    #[instrument(skip(self, request), fields(job_id = %job_id, new_status = %request.status))]
    pub async fn update_stage_job_status(
        &self,
        job_id: Uuid,
        request: UpdateStageJobStatusRequest,
    ) -> Result<StageJobResponse, ServiceError> {
        request.validate()?;

        let new_status: JobStatus = request.status.parse().map_err(|_| {
            ServiceError::InvalidStatus(format!("Unknown job status '{}'", request.status))
        })?;

        let db = &*self.db_pool;
        let now = Utc::now();

        let job = JobEntity::find_by_id(job_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Stage job not found".to_string()))?;

        let old_status = job.status.clone();
        let stage = job.stage.clone();
        let started_at = job.started_at;

        let mut active: JobActiveModel = job.into();
        active.status = Set(new_status.to_string());
        match new_status {
            JobStatus::Pending => {
                active.started_at = Set(None);
                active.completed_at = Set(None);
            }
            JobStatus::InProgress => {
                active.started_at = Set(Some(started_at.unwrap_or(now)));
                active.completed_at = Set(None);
            }
            JobStatus::Completed => {
                active.started_at = Set(Some(started_at.unwrap_or(now)));
                active.completed_at = Set(Some(now));
            }
        }
        if let Some(notes) = request.notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(Some(now));

        let updated = active.update(db).await?;

        info!(job_id = %job_id, old_status = %old_status, new_status = %new_status, "Stage job status updated");

        if let Some(event_sender) = &self.event_sender {
            let _ = event_sender
                .send(Event::StageJobStatusChanged {
                    job_id,
                    stage,
                    old_status,
                    new_status: new_status.to_string(),
                })
                .await;
        }

        Self::to_job_response(updated)
    }

    /// Whether the order's production has cleared the stitching gate and its
    /// bags may be dispatched.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn dispatch_ready(&self, order_id: Uuid) -> Result<bool, ServiceError> {
        let db = &*self.db_pool;

        let Some(card) = JobCardEntity::find()
            .filter(job_card::Column::OrderId.eq(order_id))
            .one(db)
            .await?
        else {
            return Ok(false);
        };

        let statuses = self.stage_statuses(card.id, Stage::Stitching).await?;
        Ok(stage_gate(self.gate_policy, &statuses))
    }

    async fn stage_statuses(
        &self,
        job_card_id: Uuid,
        stage: Stage,
    ) -> Result<Vec<JobStatus>, ServiceError> {
        let jobs = JobEntity::find()
            .filter(production_job::Column::JobCardId.eq(job_card_id))
            .filter(production_job::Column::Stage.eq(stage.to_string()))
            .all(&*self.db_pool)
            .await?;

        jobs.iter().map(|job| Self::parse_status(&job.status)).collect()
    }

    fn parse_status(raw: &str) -> Result<JobStatus, ServiceError> {
        raw.parse()
            .map_err(|_| ServiceError::InvalidStatus(format!("Corrupt job status '{}'", raw)))
    }

    fn to_card_response(
        card: job_card::Model,
        jobs: Vec<production_job::Model>,
    ) -> Result<JobCardResponse, ServiceError> {
        let statuses = jobs
            .iter()
            .map(|job| Self::parse_status(&job.status))
            .collect::<Result<Vec<_>, _>>()?;
        let derived = job_card_status(&statuses);

        let jobs = jobs
            .into_iter()
            .map(Self::to_job_response)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(JobCardResponse {
            id: card.id,
            card_number: card.card_number,
            order_id: card.order_id,
            consumption_batch_id: card.consumption_batch_id,
            status: derived.to_string(),
            jobs,
            notes: card.notes,
            created_at: card.created_at,
            updated_at: card.updated_at,
        })
    }

    fn to_job_response(model: production_job::Model) -> Result<StageJobResponse, ServiceError> {
        Ok(StageJobResponse {
            id: model.id,
            job_card_id: model.job_card_id,
            stage: model.stage,
            status: model.status,
            assigned_to: model.assigned_to,
            quantity: model.quantity,
            started_at: model.started_at,
            completed_at: model.completed_at,
            notes: model.notes,
            created_at: model.created_at,
        })
    }
}
