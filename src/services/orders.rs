use crate::{
    costing::{derive_costs, reconcile, scale_consumption, CostBreakdown, FixedCharges, PricingEdit},
    db::DbPool,
    entities::catalog::{self, Entity as CatalogEntity},
    entities::catalog_component::{self, Entity as CatalogComponentEntity},
    entities::job_card::{self, Entity as JobCardEntity},
    entities::order::{self, ActiveModel as OrderActiveModel, Entity as OrderEntity},
    entities::order_component::{
        self, ActiveModel as OrderComponentActiveModel, Entity as OrderComponentEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::components::{derive_component, fetch_material_rates, ComponentRequest},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Order lifecycle states. Production and dispatch drive the transitions:
/// job-card creation moves a pending order into production, and the final
/// dispatch completes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    InProduction,
    Completed,
    Cancelled,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 50, message = "Order number is required"))]
    pub order_number: String,
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub customer_name: String,

    /// When set, charges, dimensions and components default from the catalog
    /// product and the component set is cloned onto the order.
    pub catalog_id: Option<Uuid>,

    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,

    pub length: Option<Decimal>,
    pub width: Option<Decimal>,

    pub cutting_charge: Option<Decimal>,
    pub printing_charge: Option<Decimal>,
    pub stitching_charge: Option<Decimal>,
    pub transport_charge: Option<Decimal>,

    /// Supply at most one of `selling_rate` / `margin`.
    pub selling_rate: Option<Decimal>,
    pub margin: Option<Decimal>,

    /// Freestanding component set. Omit to clone from the catalog product.
    pub components: Option<Vec<ComponentRequest>>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderRequest {
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub customer_name: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub length: Option<Decimal>,
    pub width: Option<Decimal>,
    pub cutting_charge: Option<Decimal>,
    pub printing_charge: Option<Decimal>,
    pub stitching_charge: Option<Decimal>,
    pub transport_charge: Option<Decimal>,
    pub selling_rate: Option<Decimal>,
    pub margin: Option<Decimal>,
    /// Omit to keep the existing components (rescaled to the new quantity).
    pub components: Option<Vec<ComponentRequest>>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderStatusRequest {
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderComponentResponse {
    pub id: Uuid,
    pub component_type: String,
    pub length: Option<Decimal>,
    pub width: Option<Decimal>,
    pub roll_width: Option<Decimal>,
    pub material_id: Option<Uuid>,
    pub formula: String,
    pub consumption: Option<Decimal>,
    pub total_consumption: Option<Decimal>,
    pub material_rate: Option<Decimal>,
    pub material_cost: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    pub catalog_id: Option<Uuid>,
    pub status: String,
    pub order_date: DateTime<Utc>,
    pub quantity: i32,
    pub length: Option<Decimal>,
    pub width: Option<Decimal>,
    pub cutting_charge: Decimal,
    pub printing_charge: Decimal,
    pub stitching_charge: Decimal,
    pub transport_charge: Decimal,
    pub material_cost: Decimal,
    pub total_cost: Decimal,
    pub selling_rate: Option<Decimal>,
    pub margin: Option<Decimal>,
    pub notes: Option<String>,
    pub components: Vec<OrderComponentResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Service for managing sales orders.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates an order, cloning components from the catalog product when one
    /// is referenced and scaling every consumption by the order quantity.
    #[instrument(skip(self, request), fields(order_number = %request.order_number))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let order_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        // Resolve the catalog product, if any, for defaults and cloning.
        let catalog_product = match request.catalog_id {
            Some(catalog_id) => Some(
                CatalogEntity::find_by_id(catalog_id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::ValidationError(format!(
                            "Catalog product {} not found",
                            catalog_id
                        ))
                    })?,
            ),
            None => None,
        };

        let component_requests = match (&request.components, &catalog_product) {
            (Some(components), _) => components.clone(),
            (None, Some(product)) => {
                let catalog_components = CatalogComponentEntity::find()
                    .filter(catalog_component::Column::CatalogId.eq(product.id))
                    .order_by_asc(catalog_component::Column::CreatedAt)
                    .all(&txn)
                    .await?;
                catalog_components
                    .into_iter()
                    .map(Self::catalog_component_to_request)
                    .collect()
            }
            (None, None) => Vec::new(),
        };

        let charges = Self::resolve_charges(&request, catalog_product.as_ref());
        let (breakdown, component_models) = Self::derive_and_build_components(
            &txn,
            order_id,
            &component_requests,
            &charges,
            request.quantity,
            now,
        )
        .await?;

        let pricing_edit = PricingEdit::from_options(request.selling_rate, request.margin)
            .map_err(ServiceError::ValidationError)?;
        let (selling_rate, margin) = match pricing_edit {
            Some(edit) => {
                let pricing = reconcile(breakdown.total_cost, edit);
                (Some(pricing.selling_rate), pricing.margin)
            }
            // No edit: inherit the catalog selling rate, re-reconciled
            // against this order's own total cost.
            None => match catalog_product.as_ref().and_then(|p| p.selling_rate) {
                Some(rate) => {
                    let pricing = reconcile(breakdown.total_cost, PricingEdit::SellingRate(rate));
                    (Some(pricing.selling_rate), pricing.margin)
                }
                None => (None, None),
            },
        };

        let length = request.length.or(catalog_product.as_ref().and_then(|p| p.length));
        let width = request.width.or(catalog_product.as_ref().and_then(|p| p.width));

        OrderActiveModel {
            id: Set(order_id),
            order_number: Set(request.order_number.clone()),
            customer_name: Set(request.customer_name.clone()),
            catalog_id: Set(request.catalog_id),
            status: Set(OrderStatus::Pending.to_string()),
            order_date: Set(now),
            quantity: Set(request.quantity),
            length: Set(length),
            width: Set(width),
            cutting_charge: Set(charges.cutting),
            printing_charge: Set(charges.printing),
            stitching_charge: Set(charges.stitching),
            transport_charge: Set(charges.transport),
            material_cost: Set(breakdown.material_cost),
            total_cost: Set(breakdown.total_cost),
            selling_rate: Set(selling_rate),
            margin: Set(margin),
            notes: Set(request.notes.clone()),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            version: Set(1),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to create order");
            ServiceError::DatabaseError(e)
        })?;

        for model in component_models {
            model.insert(&txn).await?;
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, quantity = request.quantity, "Order created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::OrderCreated(order_id)).await {
                warn!(error = %e, order_id = %order_id, "Failed to send order created event");
            }
        }

        self.get_order(order_id)
            .await?
            .ok_or_else(|| ServiceError::InternalError("Order vanished after insert".into()))
    }

    /// Retrieves an order with its components.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<Option<OrderResponse>, ServiceError> {
        let db = &*self.db_pool;

        let Some(order) = OrderEntity::find_by_id(order_id).one(db).await? else {
            return Ok(None);
        };

        let components = OrderComponentEntity::find()
            .filter(order_component::Column::OrderId.eq(order_id))
            .order_by_asc(order_component::Column::CreatedAt)
            .all(db)
            .await?;

        Ok(Some(Self::to_response(order, components)))
    }

    /// Finds an order by its business key.
    #[instrument(skip(self), fields(order_number = %order_number))]
    pub async fn get_order_by_number(
        &self,
        order_number: &str,
    ) -> Result<Option<OrderResponse>, ServiceError> {
        let db = &*self.db_pool;

        let Some(order) = OrderEntity::find()
            .filter(order::Column::OrderNumber.eq(order_number))
            .one(db)
            .await?
        else {
            return Ok(None);
        };

        let components = OrderComponentEntity::find()
            .filter(order_component::Column::OrderId.eq(order.id))
            .all(db)
            .await?;

        Ok(Some(Self::to_response(order, components)))
    }

    /// Lists orders with pagination, optionally filtered by status.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        page: u64,
        per_page: u64,
        status: Option<String>,
    ) -> Result<OrderListResponse, ServiceError> {
        let db = &*self.db_pool;

        let mut query = OrderEntity::find().order_by_desc(order::Column::CreatedAt);
        if let Some(status) = status {
            query = query.filter(order::Column::Status.eq(status));
        }

        let paginator = query.paginate(db, per_page);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;

        let responses = orders
            .into_iter()
            .map(|model| Self::to_response(model, Vec::new()))
            .collect();

        Ok(OrderListResponse {
            orders: responses,
            total,
            page,
            per_page,
        })
    }

    /// Updates an order and rescales its components. Rejected once a job card
    /// exists: consumption has already been deducted, so the figures that fed
    /// that deduction are frozen.
    #[instrument(skip(self, request), fields(order_id = %order_id))]
    pub async fn update_order(
        &self,
        order_id: Uuid,
        request: UpdateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let existing = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        let has_job_card = JobCardEntity::find()
            .filter(job_card::Column::OrderId.eq(order_id))
            .one(&txn)
            .await?
            .is_some();
        if has_job_card {
            return Err(ServiceError::Conflict(
                "Order already has a job card; materials were deducted from its current figures"
                    .to_string(),
            ));
        }

        let component_requests = match &request.components {
            Some(components) => components.clone(),
            None => {
                let existing_components = OrderComponentEntity::find()
                    .filter(order_component::Column::OrderId.eq(order_id))
                    .order_by_asc(order_component::Column::CreatedAt)
                    .all(&txn)
                    .await?;
                existing_components
                    .into_iter()
                    .map(Self::order_component_to_request)
                    .collect()
            }
        };

        let charges = FixedCharges {
            cutting: request.cutting_charge.unwrap_or(existing.cutting_charge),
            printing: request.printing_charge.unwrap_or(existing.printing_charge),
            stitching: request.stitching_charge.unwrap_or(existing.stitching_charge),
            transport: request.transport_charge.unwrap_or(existing.transport_charge),
        };

        let (breakdown, component_models) = Self::derive_and_build_components(
            &txn,
            order_id,
            &component_requests,
            &charges,
            request.quantity,
            now,
        )
        .await?;

        let pricing_edit = PricingEdit::from_options(request.selling_rate, request.margin)
            .map_err(ServiceError::ValidationError)?;
        let (selling_rate, margin) = match pricing_edit {
            Some(edit) => {
                let pricing = reconcile(breakdown.total_cost, edit);
                (Some(pricing.selling_rate), pricing.margin)
            }
            None => match existing.selling_rate {
                Some(rate) => {
                    let pricing = reconcile(breakdown.total_cost, PricingEdit::SellingRate(rate));
                    (Some(pricing.selling_rate), pricing.margin)
                }
                None => (None, None),
            },
        };

        let length = request.length.or(existing.length);
        let width = request.width.or(existing.width);

        let version = existing.version;
        let mut active: OrderActiveModel = existing.into();
        active.customer_name = Set(request.customer_name.clone());
        active.quantity = Set(request.quantity);
        active.length = Set(length);
        active.width = Set(width);
        active.cutting_charge = Set(charges.cutting);
        active.printing_charge = Set(charges.printing);
        active.stitching_charge = Set(charges.stitching);
        active.transport_charge = Set(charges.transport);
        active.material_cost = Set(breakdown.material_cost);
        active.total_cost = Set(breakdown.total_cost);
        active.selling_rate = Set(selling_rate);
        active.margin = Set(margin);
        active.notes = Set(request.notes.clone());
        active.updated_at = Set(Some(now));
        active.version = Set(version + 1);
        active.update(&txn).await?;

        OrderComponentEntity::delete_many()
            .filter(order_component::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await?;
        for model in component_models {
            model.insert(&txn).await?;
        }

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(order_id = %order_id, "Order updated");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::OrderUpdated(order_id)).await {
                warn!(error = %e, order_id = %order_id, "Failed to send order updated event");
            }
        }

        self.get_order(order_id)
            .await?
            .ok_or_else(|| ServiceError::InternalError("Order vanished after update".into()))
    }

    /// Updates an order's status.
    #[instrument(skip(self, request), fields(order_id = %order_id, new_status = %request.status))]
    pub async fn update_order_status(
        &self,
        order_id: Uuid,
        request: UpdateOrderStatusRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;

        let new_status: OrderStatus = request
            .status
            .parse()
            .map_err(|_| ServiceError::InvalidStatus(format!("Unknown status '{}'", request.status)))?;

        let db = &*self.db_pool;
        let now = Utc::now();

        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        let old_status = order.status.clone();
        let version = order.version;

        let mut active: OrderActiveModel = order.into();
        active.status = Set(new_status.to_string());
        active.updated_at = Set(Some(now));
        active.version = Set(version + 1);
        if let Some(notes) = request.notes {
            active.notes = Set(Some(notes));
        }

        let updated = active.update(db).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to update order status");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, old_status = %old_status, new_status = %new_status, "Order status updated");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::OrderStatusChanged {
                    order_id,
                    old_status,
                    new_status: new_status.to_string(),
                })
                .await
            {
                warn!(error = %e, order_id = %order_id, "Failed to send order status changed event");
            }
        }

        Ok(Self::to_response(updated, Vec::new()))
    }

    /// Cancels an order.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_order(
        &self,
        order_id: Uuid,
        reason: Option<String>,
    ) -> Result<OrderResponse, ServiceError> {
        let response = self
            .update_order_status(
                order_id,
                UpdateOrderStatusRequest {
                    status: OrderStatus::Cancelled.to_string(),
                    notes: reason,
                },
            )
            .await?;

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::OrderCancelled(order_id)).await {
                warn!(error = %e, order_id = %order_id, "Failed to send order cancelled event");
            }
        }

        Ok(response)
    }

    fn resolve_charges(
        request: &CreateOrderRequest,
        catalog_product: Option<&catalog::Model>,
    ) -> FixedCharges {
        let fallback = |explicit: Option<Decimal>, from_catalog: fn(&catalog::Model) -> Decimal| {
            explicit
                .or_else(|| catalog_product.map(from_catalog))
                .unwrap_or(Decimal::ZERO)
        };
        FixedCharges {
            cutting: fallback(request.cutting_charge, |p| p.cutting_charge),
            printing: fallback(request.printing_charge, |p| p.printing_charge),
            stitching: fallback(request.stitching_charge, |p| p.stitching_charge),
            transport: fallback(request.transport_charge, |p| p.transport_charge),
        }
    }

    fn catalog_component_to_request(model: catalog_component::Model) -> ComponentRequest {
        ComponentRequest {
            component_type: model.component_type,
            length: model.length,
            width: model.width,
            roll_width: model.roll_width,
            material_id: model.material_id,
            consumption: if model.formula == "manual" {
                model.consumption
            } else {
                None
            },
            formula: model.formula,
        }
    }

    fn order_component_to_request(model: order_component::Model) -> ComponentRequest {
        ComponentRequest {
            component_type: model.component_type,
            length: model.length,
            width: model.width,
            roll_width: model.roll_width,
            material_id: model.material_id,
            consumption: if model.formula == "manual" {
                model.consumption
            } else {
                None
            },
            formula: model.formula,
        }
    }

    /// Derives all components through the costing engine. Per-component
    /// material cost stays a per-bag figure (it feeds the per-bag total cost
    /// the selling rate is quoted against); `total_consumption` carries the
    /// quantity-scaled amount the production deduction will use.
    async fn derive_and_build_components(
        txn: &DatabaseTransaction,
        order_id: Uuid,
        requests: &[ComponentRequest],
        charges: &FixedCharges,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<(CostBreakdown, Vec<OrderComponentActiveModel>), ServiceError> {
        let rates = fetch_material_rates(txn, requests).await?;

        let mut models = Vec::with_capacity(requests.len());
        let mut component_costs = Vec::with_capacity(requests.len());

        for request in requests {
            let derived = derive_component(request, &rates)?;
            if let Some(cost) = derived.material_cost {
                component_costs.push(cost);
            }
            let total_consumption = derived
                .consumption
                .map(|unit| scale_consumption(unit, quantity));
            models.push(OrderComponentActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                component_type: Set(derived.component_type),
                length: Set(derived.length),
                width: Set(derived.width),
                roll_width: Set(derived.roll_width),
                material_id: Set(derived.material_id),
                formula: Set(derived.formula.to_string()),
                consumption: Set(derived.consumption),
                total_consumption: Set(total_consumption),
                material_rate: Set(derived.material_rate),
                material_cost: Set(derived.material_cost),
                created_at: Set(now),
            });
        }

        let breakdown = derive_costs(charges, component_costs);
        Ok((breakdown, models))
    }

    fn to_response(model: order::Model, components: Vec<order_component::Model>) -> OrderResponse {
        OrderResponse {
            id: model.id,
            order_number: model.order_number,
            customer_name: model.customer_name,
            catalog_id: model.catalog_id,
            status: model.status,
            order_date: model.order_date,
            quantity: model.quantity,
            length: model.length,
            width: model.width,
            cutting_charge: model.cutting_charge,
            printing_charge: model.printing_charge,
            stitching_charge: model.stitching_charge,
            transport_charge: model.transport_charge,
            material_cost: model.material_cost,
            total_cost: model.total_cost,
            selling_rate: model.selling_rate,
            margin: model.margin,
            notes: model.notes,
            components: components
                .into_iter()
                .map(|c| OrderComponentResponse {
                    id: c.id,
                    component_type: c.component_type,
                    length: c.length,
                    width: c.width,
                    roll_width: c.roll_width,
                    material_id: c.material_id,
                    formula: c.formula,
                    consumption: c.consumption,
                    total_consumption: c.total_consumption,
                    material_rate: c.material_rate,
                    material_cost: c.material_cost,
                })
                .collect(),
            created_at: model.created_at,
            updated_at: model.updated_at,
            version: model.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn order_status_round_trips() {
        assert_eq!(OrderStatus::InProduction.to_string(), "in_production");
        assert_eq!(
            "in_production".parse::<OrderStatus>().unwrap(),
            OrderStatus::InProduction
        );
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn catalog_clone_preserves_manual_consumption() {
        let model = catalog_component::Model {
            id: Uuid::new_v4(),
            catalog_id: Uuid::new_v4(),
            component_type: "handle".to_string(),
            length: None,
            width: None,
            roll_width: None,
            material_id: None,
            formula: "manual".to_string(),
            consumption: Some(dec!(0.75)),
            material_rate: None,
            material_cost: None,
            created_at: Utc::now(),
        };
        let request = OrderService::catalog_component_to_request(model);
        assert_eq!(request.formula, "manual");
        assert_eq!(request.consumption, Some(dec!(0.75)));
    }

    #[test]
    fn catalog_clone_drops_stale_computed_consumption() {
        let model = catalog_component::Model {
            id: Uuid::new_v4(),
            catalog_id: Uuid::new_v4(),
            component_type: "body".to_string(),
            length: Some(dec!(40)),
            width: Some(dec!(24)),
            roll_width: Some(dec!(30)),
            material_id: None,
            formula: "standard".to_string(),
            consumption: Some(dec!(9.9999)),
            material_rate: None,
            material_cost: None,
            created_at: Utc::now(),
        };
        let request = OrderService::catalog_component_to_request(model);
        // Computed modes rederive from dimensions; the stored value is not
        // carried over as if it were manual.
        assert_eq!(request.consumption, None);
    }
}
