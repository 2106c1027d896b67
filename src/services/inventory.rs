use crate::{
    db::DbPool,
    entities::inventory_item::{
        self, ActiveModel as ItemActiveModel, Entity as ItemEntity,
    },
    entities::inventory_transaction::{
        self, ActiveModel as TransactionActiveModel, Entity as TransactionEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Attempts for a ledger insert hitting a unique-key conflict (SQLSTATE
/// 23505), with linear backoff between tries.
const CONFLICT_RETRIES: u32 = 3;
const CONFLICT_BACKOFF_MS: u64 = 50;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    pub material_type: Option<String>,
    #[validate(length(min = 1, message = "Unit is required"))]
    pub unit: String,
    #[serde(default)]
    pub quantity: Decimal,
    #[serde(default)]
    pub min_stock_level: Decimal,
    #[serde(default)]
    pub unit_rate: Decimal,
    pub supplier_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateItemRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    pub material_type: Option<String>,
    #[validate(length(min = 1, message = "Unit is required"))]
    pub unit: String,
    pub min_stock_level: Decimal,
    pub unit_rate: Decimal,
    pub supplier_id: Option<Uuid>,
}

/// A manual stock movement. Positive quantities receive stock ("purchase"),
/// negative quantities issue it ("adjustment").
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct AdjustStockRequest {
    pub quantity_change: Decimal,
    #[validate(length(min = 1, message = "Reason is required"))]
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemResponse {
    pub id: Uuid,
    pub name: String,
    pub material_type: Option<String>,
    pub unit: String,
    pub quantity: Decimal,
    pub min_stock_level: Decimal,
    pub unit_rate: Decimal,
    pub supplier_id: Option<Uuid>,
    pub low_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub inventory_item_id: Uuid,
    pub transaction_type: String,
    pub quantity: Decimal,
    pub batch_id: Option<Uuid>,
    pub job_card_id: Option<Uuid>,
    pub reversed: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Service for raw material stock and its movement ledger.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_item(
        &self,
        request: CreateItemRequest,
    ) -> Result<ItemResponse, ServiceError> {
        request.validate()?;

        let now = Utc::now();
        let item = ItemActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            material_type: Set(request.material_type),
            unit: Set(request.unit),
            quantity: Set(request.quantity),
            min_stock_level: Set(request.min_stock_level),
            unit_rate: Set(request.unit_rate),
            supplier_id: Set(request.supplier_id),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            version: Set(1),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create inventory item");
            ServiceError::DatabaseError(e)
        })?;

        info!(item_id = %item.id, "Inventory item created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::InventoryItemCreated(item.id)).await {
                warn!(error = %e, "Failed to send inventory item created event");
            }
        }

        Ok(Self::to_response(item))
    }

    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn get_item(&self, item_id: Uuid) -> Result<Option<ItemResponse>, ServiceError> {
        let item = ItemEntity::find_by_id(item_id).one(&*self.db_pool).await?;
        Ok(item.map(Self::to_response))
    }

    /// Lists inventory items with pagination and optional name search.
    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        page: u64,
        limit: u64,
        search: Option<String>,
    ) -> Result<(Vec<ItemResponse>, u64), ServiceError> {
        let db = &*self.db_pool;

        let mut query = ItemEntity::find().order_by_asc(inventory_item::Column::Name);
        if let Some(term) = search.filter(|s| !s.trim().is_empty()) {
            query = query.filter(inventory_item::Column::Name.contains(term.trim()));
        }

        let paginator = query.paginate(db, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items.into_iter().map(Self::to_response).collect(), total))
    }

    /// Items at or below their minimum stock level.
    #[instrument(skip(self))]
    pub async fn low_stock_items(&self) -> Result<Vec<ItemResponse>, ServiceError> {
        use sea_orm::sea_query::Expr;

        let items = ItemEntity::find()
            .filter(
                Expr::col(inventory_item::Column::Quantity)
                    .lte(Expr::col(inventory_item::Column::MinStockLevel)),
            )
            .order_by_asc(inventory_item::Column::Name)
            .all(&*self.db_pool)
            .await?;

        Ok(items.into_iter().map(Self::to_response).collect())
    }

    #[instrument(skip(self, request), fields(item_id = %item_id))]
    pub async fn update_item(
        &self,
        item_id: Uuid,
        request: UpdateItemRequest,
    ) -> Result<ItemResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let item = ItemEntity::find_by_id(item_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Inventory item not found".to_string()))?;

        let version = item.version;
        let mut active: ItemActiveModel = item.into();
        active.name = Set(request.name);
        active.material_type = Set(request.material_type);
        active.unit = Set(request.unit);
        active.min_stock_level = Set(request.min_stock_level);
        active.unit_rate = Set(request.unit_rate);
        active.supplier_id = Set(request.supplier_id);
        active.updated_at = Set(Some(Utc::now()));
        active.version = Set(version + 1);

        let updated = active.update(db).await?;

        info!(item_id = %item_id, "Inventory item updated");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::InventoryItemUpdated(item_id)).await {
                warn!(error = %e, "Failed to send inventory item updated event");
            }
        }

        Ok(Self::to_response(updated))
    }

    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn delete_item(&self, item_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let has_history = TransactionEntity::find()
            .filter(inventory_transaction::Column::InventoryItemId.eq(item_id))
            .one(db)
            .await?
            .is_some();
        if has_history {
            return Err(ServiceError::Conflict(
                "Inventory item has ledger history and cannot be deleted".to_string(),
            ));
        }

        let result = ItemEntity::delete_by_id(item_id).exec(db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound("Inventory item not found".to_string()));
        }

        info!(item_id = %item_id, "Inventory item deleted");
        Ok(())
    }

    /// Applies a manual stock adjustment and writes the ledger row, all in
    /// one transaction.
    #[instrument(skip(self, request), fields(item_id = %item_id))]
    pub async fn adjust_stock(
        &self,
        item_id: Uuid,
        request: AdjustStockRequest,
    ) -> Result<ItemResponse, ServiceError> {
        request.validate()?;
        if request.quantity_change.is_zero() {
            return Err(ServiceError::ValidationError(
                "Quantity change must be non-zero".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let item = ItemEntity::find_by_id(item_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Inventory item not found".to_string()))?;

        let old_quantity = item.quantity;
        let new_quantity = old_quantity + request.quantity_change;

        // Manual adjustments cannot take stock below zero; only the production
        // deduction is allowed to, and it reports low stock instead.
        if new_quantity.is_sign_negative() {
            return Err(ServiceError::InsufficientStock(format!(
                "Adjustment of {} would take stock below zero (current {})",
                request.quantity_change, old_quantity
            )));
        }

        let transaction_type = if request.quantity_change.is_sign_positive() {
            "purchase"
        } else {
            "adjustment"
        };

        let transaction_id = insert_ledger_row_with_retry(
            &txn,
            item_id,
            transaction_type,
            request.quantity_change.abs(),
            None,
            None,
            Some(request.reason.clone()),
        )
        .await?;

        let version = item.version;
        let min_stock_level = item.min_stock_level;
        let mut active: ItemActiveModel = item.into();
        active.quantity = Set(new_quantity);
        active.updated_at = Set(Some(Utc::now()));
        active.version = Set(version + 1);
        let updated = active.update(&txn).await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(
            item_id = %item_id,
            old_quantity = %old_quantity,
            new_quantity = %new_quantity,
            "Stock adjusted"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::InventoryAdjusted {
                    item_id,
                    old_quantity,
                    new_quantity,
                    transaction_id,
                    reason: request.reason,
                })
                .await
            {
                warn!(error = %e, "Failed to send inventory adjusted event");
            }
            if new_quantity <= min_stock_level {
                let _ = event_sender
                    .send(Event::LowStock {
                        item_id,
                        quantity: new_quantity,
                        min_stock_level,
                    })
                    .await;
            }
        }

        Ok(Self::to_response(updated))
    }

    /// Ledger rows for one item, newest first.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn list_transactions(
        &self,
        item_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<TransactionResponse>, u64), ServiceError> {
        let db = &*self.db_pool;

        let paginator = TransactionEntity::find()
            .filter(inventory_transaction::Column::InventoryItemId.eq(item_id))
            .order_by_desc(inventory_transaction::Column::CreatedAt)
            .paginate(db, limit);

        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        let responses = rows
            .into_iter()
            .map(|row| TransactionResponse {
                id: row.id,
                inventory_item_id: row.inventory_item_id,
                transaction_type: row.transaction_type,
                quantity: row.quantity,
                batch_id: row.batch_id,
                job_card_id: row.job_card_id,
                reversed: row.reversed,
                notes: row.notes,
                created_at: row.created_at,
            })
            .collect();

        Ok((responses, total))
    }

    fn to_response(model: inventory_item::Model) -> ItemResponse {
        let low_stock = model.quantity <= model.min_stock_level;
        ItemResponse {
            id: model.id,
            name: model.name,
            material_type: model.material_type,
            unit: model.unit,
            quantity: model.quantity,
            min_stock_level: model.min_stock_level,
            unit_rate: model.unit_rate,
            supplier_id: model.supplier_id,
            low_stock,
            created_at: model.created_at,
            updated_at: model.updated_at,
            version: model.version,
        }
    }
}

/// Inserts one ledger row, retrying on unique-key conflicts with a fresh id
/// and linear backoff. Everything else fails immediately; the conflict retry
/// exists only for the duplicate-key race, and the surrounding transaction
/// makes the overall write atomic either way.
pub(crate) async fn insert_ledger_row_with_retry<C: ConnectionTrait>(
    db: &C,
    inventory_item_id: Uuid,
    transaction_type: &str,
    quantity: Decimal,
    batch_id: Option<Uuid>,
    job_card_id: Option<Uuid>,
    notes: Option<String>,
) -> Result<Uuid, ServiceError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let transaction_id = Uuid::new_v4();
        let row = TransactionActiveModel {
            id: Set(transaction_id),
            inventory_item_id: Set(inventory_item_id),
            transaction_type: Set(transaction_type.to_string()),
            quantity: Set(quantity),
            batch_id: Set(batch_id),
            job_card_id: Set(job_card_id),
            reversed: Set(false),
            notes: Set(notes.clone()),
            created_at: Set(Utc::now()),
        };

        match row.insert(db).await {
            Ok(_) => return Ok(transaction_id),
            Err(e) if ServiceError::is_unique_violation(&e) && attempt < CONFLICT_RETRIES => {
                warn!(
                    attempt = attempt,
                    item_id = %inventory_item_id,
                    "Ledger insert hit unique-key conflict, retrying"
                );
                tokio::time::sleep(Duration::from_millis(CONFLICT_BACKOFF_MS * attempt as u64))
                    .await;
            }
            Err(e) => {
                error!(error = %e, item_id = %inventory_item_id, "Ledger insert failed");
                return Err(ServiceError::DatabaseError(e));
            }
        }
    }
}
