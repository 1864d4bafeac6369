use crate::models::OrderStatus;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The canonical fulfillment unit derived from a client order once a product
/// mapping is found. Its quantity always equals the sum of its execution units'
/// quantities.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "internal_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Generated business-visible number, e.g. "ST-260207-X9Z1A"
    #[sea_orm(unique)]
    pub order_number: String,
    pub client_order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub status: OrderStatus,
    #[sea_orm(nullable)]
    pub hold_reason: Option<String>,
    /// A held order flagged to rejoin the pipeline on the next purchase round
    pub is_next_round: bool,
    #[sea_orm(nullable)]
    pub target_ship_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    #[sea_orm(nullable)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::client_order::Entity",
        from = "Column::ClientOrderId",
        to = "super::client_order::Column::Id"
    )]
    ClientOrder,
    #[sea_orm(has_many = "super::order_execution::Entity")]
    Executions,
    #[sea_orm(has_many = "super::order_status_history::Entity")]
    StatusHistory,
}

impl Related<super::client_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClientOrder.def()
    }
}

impl Related<super::order_execution::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Executions.def()
    }
}

impl Related<super::order_status_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
