use crate::models::{ExecutionSource, ExecutionStatus};
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The smallest fulfillable slice of an internal order: one box. Tracked
/// independently so one box can ship while a sibling is delayed.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_executions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// `{order_number}_{i}x{n}`, unique as long as the parent number is
    #[sea_orm(unique)]
    pub execution_no: String,
    pub internal_order_id: Uuid,
    pub source_type: ExecutionSource,
    #[sea_orm(nullable)]
    pub warehouse_id: Option<Uuid>,
    #[sea_orm(nullable)]
    pub supplier_id: Option<Uuid>,
    pub quantity: i32,
    pub status: ExecutionStatus,
    #[sea_orm(nullable)]
    pub carrier_id: Option<Uuid>,
    #[sea_orm(nullable)]
    pub tracking_number: Option<String>,
    #[sea_orm(nullable)]
    pub shipped_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[sea_orm(nullable)]
    pub updated_at: Option<DateTime<Utc>>,
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
