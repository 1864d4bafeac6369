pub mod inventory;
pub mod orders;
pub mod purchase_orders;
pub mod waybills;

use crate::{
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    services::{InventoryService, OrderService, PurchaseOrderService, WaybillService},
};
use std::sync::Arc;

pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub inventory: InventoryService,
    pub orders: OrderService,
    pub purchase_orders: PurchaseOrderService,
    pub waybills: WaybillService,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender, config: &AppConfig) -> Self {
        let inventory = InventoryService::new(db_pool.clone(), event_sender.clone());
        let orders = OrderService::new(
            db_pool.clone(),
            event_sender.clone(),
            inventory.clone(),
            config.box_capacity,
            config.order_prefix.clone(),
        );
        let purchase_orders =
            PurchaseOrderService::new(db_pool.clone(), event_sender.clone(), orders.clone());
        let waybills = WaybillService::new(db_pool, event_sender, inventory.clone());
        Self {
            inventory,
            orders,
            purchase_orders,
            waybills,
        }
    }
}
