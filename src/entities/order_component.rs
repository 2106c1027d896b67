use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One material component of an order, either cloned from the catalog at
/// order creation or entered directly on a freestanding order.
///
/// `consumption` is per bag; `total_consumption` is the quantity-scaled
/// figure that job-card creation deducts from inventory. Both are stored so
/// the deduction step never recomputes the math.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_components")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub order_id: Uuid,
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

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
    #[sea_orm(
        belongs_to = "super::inventory_item::Entity",
        from = "Column::MaterialId",
        to = "super::inventory_item::Column::Id"
    )]
    Material,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::inventory_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Material.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {}
