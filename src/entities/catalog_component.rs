use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One material component of a catalog product (body fabric, handle webbing,
/// lining, print panel, or a custom-named part).
///
/// `formula` holds "standard", "linear" or "manual"; together with
/// `consumption` it maps to `costing::Consumption` at the service boundary.
/// When the formula is "manual" the stored consumption is authoritative and
/// dimension edits do not recompute it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "catalog_components")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub catalog_id: Uuid,
    pub component_type: String,

    pub length: Option<Decimal>,
    pub width: Option<Decimal>,
    pub roll_width: Option<Decimal>,

    pub material_id: Option<Uuid>,
    pub formula: String,
    /// Per-unit consumption in linear meters.
    pub consumption: Option<Decimal>,
    /// Material unit rate snapshotted from inventory at derivation time.
    pub material_rate: Option<Decimal>,
    pub material_cost: Option<Decimal>,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::catalog::Entity",
        from = "Column::CatalogId",
        to = "super::catalog::Column::Id"
    )]
    Catalog,
    #[sea_orm(
        belongs_to = "super::inventory_item::Entity",
        from = "Column::MaterialId",
        to = "super::inventory_item::Column::Id"
    )]
    Material,
}

impl Related<super::catalog::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Catalog.def()
    }
}

impl Related<super::inventory_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Material.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {}
