use crate::{
    db::DbPool,
    entities::inventory_item::{self, Entity as ItemEntity},
    entities::supplier::{self, ActiveModel as SupplierActiveModel, Entity as SupplierEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct SupplierRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub address: Option<String>,
    pub gst_number: Option<String>,
}

/// Plain CRUD over material suppliers.
#[derive(Clone)]
pub struct SupplierService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl SupplierService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_supplier(
        &self,
        request: SupplierRequest,
    ) -> Result<supplier::Model, ServiceError> {
        request.validate()?;

        let now = Utc::now();
        let model = SupplierActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            contact_person: Set(request.contact_person),
            phone: Set(request.phone),
            email: Set(request.email),
            address: Set(request.address),
            gst_number: Set(request.gst_number),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&*self.db_pool)
        .await?;

        info!(supplier_id = %model.id, "Supplier created");

        if let Some(event_sender) = &self.event_sender {
            let _ = event_sender.send(Event::SupplierCreated(model.id)).await;
        }

        Ok(model)
    }

    #[instrument(skip(self), fields(supplier_id = %supplier_id))]
    pub async fn get_supplier(
        &self,
        supplier_id: Uuid,
    ) -> Result<Option<supplier::Model>, ServiceError> {
        Ok(SupplierEntity::find_by_id(supplier_id)
            .one(&*self.db_pool)
            .await?)
    }

    /// Lists suppliers with pagination, optionally filtered by a name search.
    #[instrument(skip(self))]
    pub async fn list_suppliers(
        &self,
        page: u64,
        limit: u64,
        search: Option<String>,
    ) -> Result<(Vec<supplier::Model>, u64), ServiceError> {
        let mut query = SupplierEntity::find().order_by_asc(supplier::Column::Name);
        if let Some(term) = search.filter(|s| !s.trim().is_empty()) {
            query = query.filter(supplier::Column::Name.contains(term.trim()));
        }

        let paginator = query.paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let suppliers = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((suppliers, total))
    }

    #[instrument(skip(self, request), fields(supplier_id = %supplier_id))]
    pub async fn update_supplier(
        &self,
        supplier_id: Uuid,
        request: SupplierRequest,
    ) -> Result<supplier::Model, ServiceError> {
        request.validate()?;

        let model = SupplierEntity::find_by_id(supplier_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Supplier not found".to_string()))?;

        let mut active: SupplierActiveModel = model.into();
        active.name = Set(request.name);
        active.contact_person = Set(request.contact_person);
        active.phone = Set(request.phone);
        active.email = Set(request.email);
        active.address = Set(request.address);
        active.gst_number = Set(request.gst_number);
        active.updated_at = Set(Some(Utc::now()));

        let updated = active.update(&*self.db_pool).await?;

        info!(supplier_id = %supplier_id, "Supplier updated");

        if let Some(event_sender) = &self.event_sender {
            let _ = event_sender.send(Event::SupplierUpdated(supplier_id)).await;
        }

        Ok(updated)
    }

    /// Deletes a supplier. Refused while inventory items still reference it.
    #[instrument(skip(self), fields(supplier_id = %supplier_id))]
    pub async fn delete_supplier(&self, supplier_id: Uuid) -> Result<(), ServiceError> {
        let model = SupplierEntity::find_by_id(supplier_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Supplier not found".to_string()))?;

        let referenced = ItemEntity::find()
            .filter(inventory_item::Column::SupplierId.eq(supplier_id))
            .count(&*self.db_pool)
            .await?;
        if referenced > 0 {
            return Err(ServiceError::Conflict(format!(
                "Supplier is referenced by {} inventory item(s)",
                referenced
            )));
        }

        let active: SupplierActiveModel = model.into();
        active.delete(&*self.db_pool).await?;

        info!(supplier_id = %supplier_id, "Supplier deleted");

        if let Some(event_sender) = &self.event_sender {
            let _ = event_sender.send(Event::SupplierDeleted(supplier_id)).await;
        }

        Ok(())
    }
}
