use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Bill-of-materials line for a set product: one set contains `quantity` units
/// of the component product.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_components")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub set_product_id: Uuid,
    pub component_product_id: Uuid,
    pub quantity: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::SetProductId",
        to = "super::product::Column::Id"
    )]
    SetProduct,
}

impl ActiveModelBehavior for ActiveModel {}
