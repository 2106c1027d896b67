use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A production job card for one order. Creating the card is the point at
/// which material consumption is deducted from inventory (exactly once, in
/// the same transaction). The card has no stored status: it is derived from
/// the stage jobs on every read.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "job_cards")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub card_number: String,

    /// One card per order.
    #[sea_orm(unique)]
    pub order_id: Uuid,

    /// Batch id shared by the consumption ledger rows written at creation.
    pub consumption_batch_id: Uuid,

    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
    #[sea_orm(has_many = "super::production_job::Entity")]
    Jobs,
    #[sea_orm(has_many = "super::inventory_transaction::Entity")]
    ConsumptionRows,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::production_job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Jobs.def()
    }
}

impl Related<super::inventory_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConsumptionRows.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {}
