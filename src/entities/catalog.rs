use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A catalog bag design: dimensions, fixed charges, and derived cost/pricing
/// figures. Material cost and total cost are always recomputed through the
/// costing engine on write, never trusted from the client.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "catalog")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,

    pub bag_type: Option<String>,
    pub length: Option<Decimal>,
    pub width: Option<Decimal>,

    /// Quantity the per-unit figures are quoted against.
    pub default_quantity: i32,

    pub cutting_charge: Decimal,
    pub printing_charge: Decimal,
    pub stitching_charge: Decimal,
    pub transport_charge: Decimal,

    /// Sum of component material costs (derived).
    pub material_cost: Decimal,
    /// Fixed charges plus material cost (derived).
    pub total_cost: Decimal,

    pub selling_rate: Option<Decimal>,
    /// Margin percent over total cost; absent until a pricing edit supplies
    /// one side or when total cost is zero.
    pub margin: Option<Decimal>,

    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::catalog_component::Entity")]
    Components,
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::catalog_component::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Components.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {}
