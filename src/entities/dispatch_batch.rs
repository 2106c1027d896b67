use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Groups dispatches that leave together in one consignment.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dispatch_batches")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub batch_number: String,

    pub dispatch_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_dispatch::Entity")]
    Dispatches,
}

impl Related<super::order_dispatch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dispatches.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {}
