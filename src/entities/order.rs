use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A sales order. May reference a catalog product (in which case its
/// components were cloned from the catalog at creation time) or carry
/// freestanding dimensions and components of its own.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    #[validate(length(
        min = 1,
        max = 50,
        message = "Order number must be between 1 and 50 characters"
    ))]
    pub order_number: String,

    #[validate(length(min = 1, message = "Customer name is required"))]
    pub customer_name: String,

    pub catalog_id: Option<Uuid>,
    pub status: String,
    pub order_date: DateTime<Utc>,

    /// Number of bags ordered; scales every component consumption.
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
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::catalog::Entity",
        from = "Column::CatalogId",
        to = "super::catalog::Column::Id"
    )]
    Catalog,
    #[sea_orm(has_many = "super::order_component::Entity")]
    Components,
    #[sea_orm(has_many = "super::job_card::Entity")]
    JobCards,
    #[sea_orm(has_many = "super::order_dispatch::Entity")]
    Dispatches,
}

impl Related<super::catalog::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Catalog.def()
    }
}

impl Related<super::order_component::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Components.def()
    }
}

impl Related<super::job_card::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JobCards.def()
    }
}

impl Related<super::order_dispatch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dispatches.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {}
