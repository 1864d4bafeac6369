use crate::{
    entities::{stock_transfer, warehouse_stock, warehouse_stock::Entity as WarehouseStock},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Service owning the warehouse stock ledger.
///
/// Every mutation preserves `0 <= allocated <= quantity` for each row. The
/// allocate/release/ship primitives are generic over [`ConnectionTrait`] so
/// order operations can run them inside their own transactions.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Reserves `quantity` units against the (warehouse, product) row.
    ///
    /// The reservation is a single conditional UPDATE; if no row satisfies
    /// `quantity - allocated >= requested`, nothing changes and
    /// [`ServiceError::InsufficientStock`] is returned. Two concurrent
    /// allocations can therefore never oversell the same row.
    pub async fn allocate_stock<C: ConnectionTrait>(
        &self,
        conn: &C,
        warehouse_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "Allocation quantity must be positive".to_string(),
            ));
        }

        let result = WarehouseStock::update_many()
            .col_expr(
                warehouse_stock::Column::Allocated,
                Expr::col(warehouse_stock::Column::Allocated).add(quantity),
            )
            .filter(warehouse_stock::Column::WarehouseId.eq(warehouse_id))
            .filter(warehouse_stock::Column::ProductId.eq(product_id))
            .filter(
                Expr::expr(
                    Expr::col(warehouse_stock::Column::Quantity)
                        .sub(Expr::col(warehouse_stock::Column::Allocated)),
                )
                .gte(quantity),
            )
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            // Distinguish a missing ledger row from a short one.
            let exists = WarehouseStock::find()
                .filter(warehouse_stock::Column::WarehouseId.eq(warehouse_id))
                .filter(warehouse_stock::Column::ProductId.eq(product_id))
                .one(conn)
                .await?
                .is_some();
            if !exists {
                return Err(ServiceError::NotFound(format!(
                    "no stock record for product {} in warehouse {}",
                    product_id, warehouse_id
                )));
            }
            return Err(ServiceError::InsufficientStock(format!(
                "warehouse {} has less than {} available units of product {}",
                warehouse_id, quantity, product_id
            )));
        }

        self.event_sender
            .send_or_log(Event::StockAllocated {
                warehouse_id,
                product_id,
                quantity,
            })
            .await;
        Ok(())
    }

    /// Returns a reservation to the available pool without touching on-hand
    /// quantity. Releasing more than is allocated is a ledger corruption and
    /// is rejected.
    pub async fn release_stock<C: ConnectionTrait>(
        &self,
        conn: &C,
        warehouse_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "Release quantity must be positive".to_string(),
            ));
        }

        let result = WarehouseStock::update_many()
            .col_expr(
                warehouse_stock::Column::Allocated,
                Expr::col(warehouse_stock::Column::Allocated).sub(quantity),
            )
            .filter(warehouse_stock::Column::WarehouseId.eq(warehouse_id))
            .filter(warehouse_stock::Column::ProductId.eq(product_id))
            .filter(warehouse_stock::Column::Allocated.gte(quantity))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::InvalidOperation(format!(
                "cannot release {} units of product {} from warehouse {}: not allocated",
                quantity, product_id, warehouse_id
            )));
        }

        self.event_sender
            .send_or_log(Event::StockReleased {
                warehouse_id,
                product_id,
                quantity,
            })
            .await;
        Ok(())
    }

    /// Converts an allocation into a physical deduction: both `quantity` and
    /// `allocated` drop by the shipped amount. Requires the amount to have
    /// been allocated first.
    pub async fn ship_stock<C: ConnectionTrait>(
        &self,
        conn: &C,
        warehouse_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "Ship quantity must be positive".to_string(),
            ));
        }

        let result = WarehouseStock::update_many()
            .col_expr(
                warehouse_stock::Column::Quantity,
                Expr::col(warehouse_stock::Column::Quantity).sub(quantity),
            )
            .col_expr(
                warehouse_stock::Column::Allocated,
                Expr::col(warehouse_stock::Column::Allocated).sub(quantity),
            )
            .filter(warehouse_stock::Column::WarehouseId.eq(warehouse_id))
            .filter(warehouse_stock::Column::ProductId.eq(product_id))
            .filter(warehouse_stock::Column::Allocated.gte(quantity))
            .filter(warehouse_stock::Column::Quantity.gte(quantity))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::InvalidOperation(format!(
                "cannot ship {} units of product {} from warehouse {}: not allocated",
                quantity, product_id, warehouse_id
            )));
        }

        self.event_sender
            .send_or_log(Event::StockShipped {
                warehouse_id,
                product_id,
                quantity,
            })
            .await;
        Ok(())
    }

    /// Reverses a shipment deduction (waybill deletion): on-hand and
    /// allocation both grow back by `quantity`.
    pub async fn unship_stock<C: ConnectionTrait>(
        &self,
        conn: &C,
        warehouse_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "Quantity must be positive".to_string(),
            ));
        }

        let result = WarehouseStock::update_many()
            .col_expr(
                warehouse_stock::Column::Quantity,
                Expr::col(warehouse_stock::Column::Quantity).add(quantity),
            )
            .col_expr(
                warehouse_stock::Column::Allocated,
                Expr::col(warehouse_stock::Column::Allocated).add(quantity),
            )
            .filter(warehouse_stock::Column::WarehouseId.eq(warehouse_id))
            .filter(warehouse_stock::Column::ProductId.eq(product_id))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "no stock record for product {} in warehouse {}",
                product_id, warehouse_id
            )));
        }
        Ok(())
    }

    /// Manual on-hand correction by a signed delta. A positive delta creates
    /// the ledger row if it does not exist yet; a negative delta may not cut
    /// into allocated units.
    #[instrument(skip(self))]
    pub async fn adjust_stock(
        &self,
        warehouse_id: Uuid,
        product_id: Uuid,
        delta: i32,
        reason: String,
    ) -> Result<warehouse_stock::Model, ServiceError> {
        if delta == 0 {
            return Err(ServiceError::ValidationError(
                "Adjustment delta must be non-zero".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await?;

        let existing = WarehouseStock::find()
            .filter(warehouse_stock::Column::WarehouseId.eq(warehouse_id))
            .filter(warehouse_stock::Column::ProductId.eq(product_id))
            .one(&txn)
            .await?;

        let model = match existing {
            Some(row) => {
                let new_quantity = row.quantity + delta;
                if new_quantity < row.allocated {
                    return Err(ServiceError::InvalidOperation(format!(
                        "adjustment would drop quantity below {} allocated units",
                        row.allocated
                    )));
                }
                let mut active: warehouse_stock::ActiveModel = row.into();
                active.quantity = Set(new_quantity);
                active.update(&txn).await?
            }
            None if delta > 0 => {
                warehouse_stock::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    warehouse_id: Set(warehouse_id),
                    product_id: Set(product_id),
                    quantity: Set(delta),
                    allocated: Set(0),
                }
                .insert(&txn)
                .await?
            }
            None => {
                return Err(ServiceError::NotFound(format!(
                    "no stock record for product {} in warehouse {}",
                    product_id, warehouse_id
                )));
            }
        };

        txn.commit().await?;

        info!(
            warehouse_id = %warehouse_id,
            product_id = %product_id,
            delta = delta,
            reason = %reason,
            "Stock adjusted"
        );
        self.event_sender
            .send_or_log(Event::StockAdjusted {
                warehouse_id,
                product_id,
                delta,
                reason,
            })
            .await;

        Ok(model)
    }

    /// Moves unallocated units between warehouses and records the move.
    /// The destination row is created on demand.
    #[instrument(skip(self))]
    pub async fn transfer_stock(
        &self,
        from_warehouse_id: Uuid,
        to_warehouse_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        reason: Option<String>,
    ) -> Result<stock_transfer::Model, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "Transfer quantity must be positive".to_string(),
            ));
        }
        if from_warehouse_id == to_warehouse_id {
            return Err(ServiceError::ValidationError(
                "Source and destination warehouse must differ".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await?;

        // Only unallocated units may leave the source warehouse.
        let result = WarehouseStock::update_many()
            .col_expr(
                warehouse_stock::Column::Quantity,
                Expr::col(warehouse_stock::Column::Quantity).sub(quantity),
            )
            .filter(warehouse_stock::Column::WarehouseId.eq(from_warehouse_id))
            .filter(warehouse_stock::Column::ProductId.eq(product_id))
            .filter(
                Expr::expr(
                    Expr::col(warehouse_stock::Column::Quantity)
                        .sub(Expr::col(warehouse_stock::Column::Allocated)),
                )
                .gte(quantity),
            )
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            let exists = WarehouseStock::find()
                .filter(warehouse_stock::Column::WarehouseId.eq(from_warehouse_id))
                .filter(warehouse_stock::Column::ProductId.eq(product_id))
                .one(&txn)
                .await?
                .is_some();
            if !exists {
                return Err(ServiceError::NotFound(format!(
                    "no stock record for product {} in warehouse {}",
                    product_id, from_warehouse_id
                )));
            }
            return Err(ServiceError::InsufficientStock(format!(
                "warehouse {} has less than {} free units of product {}",
                from_warehouse_id, quantity, product_id
            )));
        }

        let dest = WarehouseStock::find()
            .filter(warehouse_stock::Column::WarehouseId.eq(to_warehouse_id))
            .filter(warehouse_stock::Column::ProductId.eq(product_id))
            .one(&txn)
            .await?;

        match dest {
            Some(row) => {
                let new_quantity = row.quantity + quantity;
                let mut active: warehouse_stock::ActiveModel = row.into();
                active.quantity = Set(new_quantity);
                active.update(&txn).await?;
            }
            None => {
                warehouse_stock::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    warehouse_id: Set(to_warehouse_id),
                    product_id: Set(product_id),
                    quantity: Set(quantity),
                    allocated: Set(0),
                }
                .insert(&txn)
                .await?;
            }
        }

        let transfer = stock_transfer::ActiveModel {
            id: Set(Uuid::new_v4()),
            from_warehouse_id: Set(from_warehouse_id),
            to_warehouse_id: Set(to_warehouse_id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            reason: Set(reason),
            transferred_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::StockTransferred {
                from_warehouse_id,
                to_warehouse_id,
                product_id,
                quantity,
            })
            .await;

        Ok(transfer)
    }

    /// Current ledger row for one (warehouse, product) pair.
    #[instrument(skip(self))]
    pub async fn get_stock(
        &self,
        warehouse_id: Uuid,
        product_id: Uuid,
    ) -> Result<warehouse_stock::Model, ServiceError> {
        WarehouseStock::find()
            .filter(warehouse_stock::Column::WarehouseId.eq(warehouse_id))
            .filter(warehouse_stock::Column::ProductId.eq(product_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "no stock record for product {} in warehouse {}",
                    product_id, warehouse_id
                ))
            })
    }

    /// Ledger rows of one product across every warehouse.
    #[instrument(skip(self))]
    pub async fn list_product_stock(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<warehouse_stock::Model>, ServiceError> {
        let rows = WarehouseStock::find()
            .filter(warehouse_stock::Column::ProductId.eq(product_id))
            .order_by_asc(warehouse_stock::Column::WarehouseId)
            .all(&*self.db_pool)
            .await?;
        if rows.is_empty() {
            warn!(product_id = %product_id, "Product has no stock records");
        }
        Ok(rows)
    }

    /// Transfer history, newest first.
    #[instrument(skip(self))]
    pub async fn list_transfers(&self) -> Result<Vec<stock_transfer::Model>, ServiceError> {
        Ok(stock_transfer::Entity::find()
            .order_by_desc(stock_transfer::Column::TransferredAt)
            .all(&*self.db_pool)
            .await?)
    }
}
