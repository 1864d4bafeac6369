use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One inbound sales-channel order line, persisted exactly as received.
/// Immutable once created except for `is_converted`, flipped when a product
/// mapping is found and an internal order is derived.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "client_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub client_id: Uuid,
    pub external_order_no: String,
    pub product_code: String,
    pub option_name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub order_date: DateTime<Utc>,
    pub is_converted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id"
    )]
    Client,
    #[sea_orm(has_many = "super::internal_order::Entity")]
    InternalOrders,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::internal_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InternalOrders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
