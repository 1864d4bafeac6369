use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A sales channel (marketplace, storefront) that orders originate from.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clients")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    /// Sales-group code feeding the generated order-number prefix (e.g. "ST", "DT")
    #[sea_orm(nullable)]
    pub sales_group: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::client_order::Entity")]
    ClientOrders,
    #[sea_orm(has_many = "super::product_mapping::Entity")]
    ProductMappings,
}

impl Related<super::client_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClientOrders.def()
    }
}

impl Related<super::product_mapping::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductMappings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
