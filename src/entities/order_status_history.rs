use sea_orm::entity::prelude::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Append-only audit trail of internal-order status changes.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_status_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub internal_order_id: Uuid,
    pub prev_status: String,
    pub new_status: String,
    #[sea_orm(nullable)]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::internal_order::Entity",
        from = "Column::InternalOrderId",
        to = "super::internal_order::Column::Id"
    )]
    InternalOrder,
}

impl Related<super::internal_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InternalOrder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
