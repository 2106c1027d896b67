use crate::{
    costing::{derive_costs, reconcile, CostBreakdown, FixedCharges, PricingEdit},
    db::DbPool,
    entities::catalog::{self, ActiveModel as CatalogActiveModel, Entity as CatalogEntity},
    entities::catalog_component::{
        self, ActiveModel as ComponentActiveModel, Entity as ComponentEntity,
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
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCatalogRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    pub bag_type: Option<String>,
    pub length: Option<Decimal>,
    pub width: Option<Decimal>,
    #[serde(default = "default_quantity")]
    pub default_quantity: i32,
    #[serde(default)]
    pub cutting_charge: Decimal,
    #[serde(default)]
    pub printing_charge: Decimal,
    #[serde(default)]
    pub stitching_charge: Decimal,
    #[serde(default)]
    pub transport_charge: Decimal,
    /// Supply at most one of `selling_rate` / `margin`; the other is derived.
    pub selling_rate: Option<Decimal>,
    pub margin: Option<Decimal>,
    #[serde(default)]
    pub components: Vec<ComponentRequest>,
    pub notes: Option<String>,
}

fn default_quantity() -> i32 {
    1
}

/// Update uses the same shape as create; the component set is replaced
/// wholesale and every derived figure is recomputed.
pub type UpdateCatalogRequest = CreateCatalogRequest;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CatalogComponentResponse {
    pub id: Uuid,
    pub component_type: String,
    pub length: Option<Decimal>,
    pub width: Option<Decimal>,
    pub roll_width: Option<Decimal>,
    pub material_id: Option<Uuid>,
    pub formula: String,
    pub consumption: Option<Decimal>,
    pub material_rate: Option<Decimal>,
    pub material_cost: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CatalogResponse {
    pub id: Uuid,
    pub name: String,
    pub bag_type: Option<String>,
    pub length: Option<Decimal>,
    pub width: Option<Decimal>,
    pub default_quantity: i32,
    pub cutting_charge: Decimal,
    pub printing_charge: Decimal,
    pub stitching_charge: Decimal,
    pub transport_charge: Decimal,
    pub material_cost: Decimal,
    pub total_cost: Decimal,
    pub selling_rate: Option<Decimal>,
    pub margin: Option<Decimal>,
    pub notes: Option<String>,
    pub components: Vec<CatalogComponentResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

/// Service for managing catalog products and their derived costing.
#[derive(Clone)]
pub struct CatalogService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a catalog product, deriving component consumptions, material
    /// cost, total cost and the pricing counterpart in one transaction.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_catalog(
        &self,
        request: CreateCatalogRequest,
    ) -> Result<CatalogResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let catalog_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for catalog creation");
            ServiceError::DatabaseError(e)
        })?;

        let (breakdown, component_models) =
            Self::derive_and_build_components(&txn, catalog_id, &request, now).await?;

        let pricing_edit = PricingEdit::from_options(request.selling_rate, request.margin)
            .map_err(ServiceError::ValidationError)?;
        let (selling_rate, margin) = match pricing_edit {
            Some(edit) => {
                let pricing = reconcile(breakdown.total_cost, edit);
                (Some(pricing.selling_rate), pricing.margin)
            }
            None => (None, None),
        };

        CatalogActiveModel {
            id: Set(catalog_id),
            name: Set(request.name.clone()),
            bag_type: Set(request.bag_type.clone()),
            length: Set(request.length),
            width: Set(request.width),
            default_quantity: Set(request.default_quantity),
            cutting_charge: Set(request.cutting_charge),
            printing_charge: Set(request.printing_charge),
            stitching_charge: Set(request.stitching_charge),
            transport_charge: Set(request.transport_charge),
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
            error!(error = %e, catalog_id = %catalog_id, "Failed to create catalog product");
            ServiceError::DatabaseError(e)
        })?;

        for model in component_models {
            model.insert(&txn).await.map_err(|e| {
                error!(error = %e, catalog_id = %catalog_id, "Failed to insert catalog component");
                ServiceError::DatabaseError(e)
            })?;
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, catalog_id = %catalog_id, "Failed to commit catalog creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(catalog_id = %catalog_id, total_cost = %breakdown.total_cost, "Catalog product created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::CatalogCreated(catalog_id)).await {
                warn!(error = %e, catalog_id = %catalog_id, "Failed to send catalog created event");
            }
        }

        self.get_catalog(catalog_id)
            .await?
            .ok_or_else(|| ServiceError::InternalError("Catalog vanished after insert".into()))
    }

    /// Retrieves a catalog product with its components.
    #[instrument(skip(self), fields(catalog_id = %catalog_id))]
    pub async fn get_catalog(
        &self,
        catalog_id: Uuid,
    ) -> Result<Option<CatalogResponse>, ServiceError> {
        let db = &*self.db_pool;

        let Some(catalog) = CatalogEntity::find_by_id(catalog_id).one(db).await? else {
            return Ok(None);
        };

        let components = ComponentEntity::find()
            .filter(catalog_component::Column::CatalogId.eq(catalog_id))
            .order_by_asc(catalog_component::Column::CreatedAt)
            .all(db)
            .await?;

        Ok(Some(Self::to_response(catalog, components)))
    }

    /// Lists catalog products with pagination. Freshly listed rows omit
    /// components; fetch a single product for the full detail.
    #[instrument(skip(self))]
    pub async fn list_catalog(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<CatalogResponse>, u64), ServiceError> {
        let db = &*self.db_pool;

        let paginator = CatalogEntity::find()
            .order_by_desc(catalog::Column::CreatedAt)
            .paginate(db, limit);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count catalog products");
            ServiceError::DatabaseError(e)
        })?;

        let items = paginator.fetch_page(page.saturating_sub(1)).await.map_err(|e| {
            error!(error = %e, page = page, "Failed to fetch catalog page");
            ServiceError::DatabaseError(e)
        })?;

        let responses = items
            .into_iter()
            .map(|model| Self::to_response(model, Vec::new()))
            .collect();

        Ok((responses, total))
    }

    /// Replaces a catalog product and its component set, recomputing every
    /// derived figure from the submitted state.
    #[instrument(skip(self, request), fields(catalog_id = %catalog_id))]
    pub async fn update_catalog(
        &self,
        catalog_id: Uuid,
        request: UpdateCatalogRequest,
    ) -> Result<CatalogResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let existing = CatalogEntity::find_by_id(catalog_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Catalog product not found".to_string()))?;

        let (breakdown, component_models) =
            Self::derive_and_build_components(&txn, catalog_id, &request, now).await?;

        let pricing_edit = PricingEdit::from_options(request.selling_rate, request.margin)
            .map_err(ServiceError::ValidationError)?;
        // An update without a pricing edit keeps the stored selling rate and
        // recomputes only the margin against the new total cost.
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

        let version = existing.version;
        let mut active: CatalogActiveModel = existing.into();
        active.name = Set(request.name.clone());
        active.bag_type = Set(request.bag_type.clone());
        active.length = Set(request.length);
        active.width = Set(request.width);
        active.default_quantity = Set(request.default_quantity);
        active.cutting_charge = Set(request.cutting_charge);
        active.printing_charge = Set(request.printing_charge);
        active.stitching_charge = Set(request.stitching_charge);
        active.transport_charge = Set(request.transport_charge);
        active.material_cost = Set(breakdown.material_cost);
        active.total_cost = Set(breakdown.total_cost);
        active.selling_rate = Set(selling_rate);
        active.margin = Set(margin);
        active.notes = Set(request.notes.clone());
        active.updated_at = Set(Some(now));
        active.version = Set(version + 1);
        active.update(&txn).await.map_err(|e| {
            error!(error = %e, catalog_id = %catalog_id, "Failed to update catalog product");
            ServiceError::DatabaseError(e)
        })?;

        // Replace the component set wholesale.
        ComponentEntity::delete_many()
            .filter(catalog_component::Column::CatalogId.eq(catalog_id))
            .exec(&txn)
            .await?;
        for model in component_models {
            model.insert(&txn).await?;
        }

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(catalog_id = %catalog_id, total_cost = %breakdown.total_cost, "Catalog product updated");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::CatalogUpdated(catalog_id)).await {
                warn!(error = %e, catalog_id = %catalog_id, "Failed to send catalog updated event");
            }
        }

        self.get_catalog(catalog_id)
            .await?
            .ok_or_else(|| ServiceError::InternalError("Catalog vanished after update".into()))
    }

    /// Deletes a catalog product and its components. Orders that cloned the
    /// product keep their own component copies and are unaffected.
    #[instrument(skip(self), fields(catalog_id = %catalog_id))]
    pub async fn delete_catalog(&self, catalog_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let existing = CatalogEntity::find_by_id(catalog_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Catalog product not found".to_string()))?;

        ComponentEntity::delete_many()
            .filter(catalog_component::Column::CatalogId.eq(catalog_id))
            .exec(&txn)
            .await?;
        CatalogEntity::delete_by_id(existing.id).exec(&txn).await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(catalog_id = %catalog_id, "Catalog product deleted");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::CatalogDeleted(catalog_id)).await {
                warn!(error = %e, catalog_id = %catalog_id, "Failed to send catalog deleted event");
            }
        }

        Ok(())
    }

    /// Runs every submitted component through the costing engine and builds
    /// the active models to insert, plus the aggregated cost breakdown.
    async fn derive_and_build_components(
        txn: &DatabaseTransaction,
        catalog_id: Uuid,
        request: &CreateCatalogRequest,
        now: DateTime<Utc>,
    ) -> Result<(CostBreakdown, Vec<ComponentActiveModel>), ServiceError> {
        let rates = fetch_material_rates(txn, &request.components).await?;

        let mut component_models = Vec::with_capacity(request.components.len());
        let mut component_costs = Vec::with_capacity(request.components.len());

        for component in &request.components {
            let derived = derive_component(component, &rates)?;
            if let Some(cost) = derived.material_cost {
                component_costs.push(cost);
            }
            component_models.push(ComponentActiveModel {
                id: Set(Uuid::new_v4()),
                catalog_id: Set(catalog_id),
                component_type: Set(derived.component_type),
                length: Set(derived.length),
                width: Set(derived.width),
                roll_width: Set(derived.roll_width),
                material_id: Set(derived.material_id),
                formula: Set(derived.formula.to_string()),
                consumption: Set(derived.consumption),
                material_rate: Set(derived.material_rate),
                material_cost: Set(derived.material_cost),
                created_at: Set(now),
            });
        }

        let charges = FixedCharges {
            cutting: request.cutting_charge,
            printing: request.printing_charge,
            stitching: request.stitching_charge,
            transport: request.transport_charge,
        };
        let breakdown = derive_costs(&charges, component_costs);

        Ok((breakdown, component_models))
    }

    fn to_response(
        model: catalog::Model,
        components: Vec<catalog_component::Model>,
    ) -> CatalogResponse {
        CatalogResponse {
            id: model.id,
            name: model.name,
            bag_type: model.bag_type,
            length: model.length,
            width: model.width,
            default_quantity: model.default_quantity,
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
                .map(|c| CatalogComponentResponse {
                    id: c.id,
                    component_type: c.component_type,
                    length: c.length,
                    width: c.width,
                    roll_width: c.roll_width,
                    material_id: c.material_id,
                    formula: c.formula,
                    consumption: c.consumption,
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
