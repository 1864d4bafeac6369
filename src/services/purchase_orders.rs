use crate::{
    entities::{
        internal_order, internal_order::Entity as InternalOrder, product,
        product::Entity as Product, product_component,
        product_component::Entity as ProductComponent, supplier_order,
        supplier_order::Entity as SupplierOrder, supplier_order_item, supplier_product,
        supplier_product::Entity as SupplierProduct,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::{ExecutionSource, ExecutionStatus, OrderStatus},
    services::{executions, orders::random_suffix, BatchSummary, OrderService},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

const PO_PREFIX: &str = "PO";
const NUMBER_RETRIES: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedSupplierOrder {
    pub id: Uuid,
    pub po_number: String,
    pub supplier_id: Uuid,
    pub round_no: i32,
    pub item_count: usize,
}

/// Result of one purchase-order generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierOrderReport {
    pub created: Vec<CreatedSupplierOrder>,
    pub orders: BatchSummary,
    /// HOLD orders carrying the next-round flag that rejoined the pipeline
    /// because this round was cut.
    pub promoted_to_ready: usize,
}

/// Batches READY supplier-bound orders into per-supplier purchase orders,
/// one same-day round at a time.
#[derive(Clone)]
pub struct PurchaseOrderService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
    orders: OrderService,
}

struct LineItem {
    product_id: Uuid,
    quantity: i32,
    unit_cost: Decimal,
}

impl PurchaseOrderService {
    pub fn new(
        db_pool: Arc<DatabaseConnection>,
        event_sender: EventSender,
        orders: OrderService,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            orders,
        }
    }

    /// Generates purchase orders for the given internal orders.
    ///
    /// Only READY orders with supplier-sourced units participate; set
    /// products are exploded into component lines (`order qty × component
    /// qty`) and every line is routed to the product's primary supplier.
    /// Each supplier group becomes one SupplierOrder whose round number is
    /// the count of that supplier's orders today plus one. Source orders move
    /// to ORDERED with their supplier units INSTRUCTED, and held orders
    /// flagged for the next round are promoted back to READY.
    #[instrument(skip(self, order_ids), fields(count = order_ids.len()))]
    pub async fn create_supplier_orders(
        &self,
        order_ids: &[Uuid],
    ) -> Result<SupplierOrderReport, ServiceError> {
        if order_ids.is_empty() {
            return Err(ServiceError::ValidationError(
                "At least one order id is required".to_string(),
            ));
        }

        let mut summary = BatchSummary::default();
        // BTreeMap keeps supplier iteration order deterministic.
        let mut groups: BTreeMap<Uuid, Vec<LineItem>> = BTreeMap::new();
        let mut sourced_orders: Vec<internal_order::Model> = Vec::new();

        for &order_id in order_ids {
            let order = match InternalOrder::find_by_id(order_id).one(&*self.db_pool).await? {
                Some(order) => order,
                None => {
                    summary.fail(order_id.to_string(), "internal order not found".to_string());
                    continue;
                }
            };
            if order.status != OrderStatus::Ready {
                summary.skip(
                    order.order_number.clone(),
                    format!("order is {}, not READY", order.status),
                );
                continue;
            }

            let units = executions::executions_of(&*self.db_pool, order.id).await?;
            let has_supplier_units = units.iter().any(|u| {
                u.source_type == ExecutionSource::Supplier && u.status == ExecutionStatus::Ready
            });
            if !has_supplier_units {
                summary.skip(
                    order.order_number.clone(),
                    "order has no supplier-sourced units awaiting instruction".to_string(),
                );
                continue;
            }

            match self.explode_order(&order).await {
                Ok(lines) => {
                    for (supplier_id, line) in lines {
                        groups.entry(supplier_id).or_default().push(line);
                    }
                    sourced_orders.push(order);
                }
                Err(e) => summary.fail(order.order_number.clone(), e.to_string()),
            }
        }

        let mut created = Vec::new();
        let today = Utc::now().date_naive();
        for (supplier_id, lines) in groups {
            let txn = self.db_pool.begin().await?;

            let existing_today = SupplierOrder::find()
                .filter(supplier_order::Column::SupplierId.eq(supplier_id))
                .filter(supplier_order::Column::OrderDate.eq(today))
                .count(&txn)
                .await?;
            let round_no = existing_today as i32 + 1;

            let po_number = self.draw_po_number(&txn).await?;
            let order_row = supplier_order::ActiveModel {
                id: Set(Uuid::new_v4()),
                po_number: Set(po_number.clone()),
                supplier_id: Set(supplier_id),
                round_no: Set(round_no),
                order_date: Set(today),
                created_at: Set(Utc::now()),
            }
            .insert(&txn)
            .await?;

            // Same product from several orders collapses into one line.
            let mut merged: BTreeMap<Uuid, (i32, Decimal)> = BTreeMap::new();
            for line in lines {
                let entry = merged
                    .entry(line.product_id)
                    .or_insert((0, line.unit_cost));
                entry.0 += line.quantity;
            }
            let item_count = merged.len();
            for (product_id, (quantity, unit_cost)) in merged {
                supplier_order_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    supplier_order_id: Set(order_row.id),
                    product_id: Set(product_id),
                    quantity: Set(quantity),
                    unit_cost: Set(unit_cost),
                }
                .insert(&txn)
                .await?;
            }

            txn.commit().await?;

            info!(
                po_number = %po_number,
                supplier_id = %supplier_id,
                round_no = round_no,
                items = item_count,
                "Supplier order created"
            );
            self.event_sender
                .send_or_log(Event::SupplierOrderCreated {
                    supplier_order_id: order_row.id,
                    po_number: po_number.clone(),
                    round_no,
                })
                .await;
            created.push(CreatedSupplierOrder {
                id: order_row.id,
                po_number,
                supplier_id,
                round_no,
                item_count,
            });
        }

        for order in sourced_orders {
            match self.mark_ordered(&order).await {
                Ok(()) => {
                    self.event_sender
                        .send_or_log(Event::OrderStatusChanged {
                            order_id: order.id,
                            order_number: order.order_number.clone(),
                            old_status: order.status.to_string(),
                            new_status: OrderStatus::Ordered.to_string(),
                        })
                        .await;
                    summary.success(order.order_number.clone());
                }
                Err(e) => summary.fail(order.order_number.clone(), e.to_string()),
            }
        }

        let promoted_to_ready = self.promote_next_round().await?;

        Ok(SupplierOrderReport {
            created,
            orders: summary,
            promoted_to_ready,
        })
    }

    /// Deletes a purchase order and its lines. The source orders keep their
    /// ORDERED status; reverting them is an explicit, separate rollback so a
    /// discarded PO never silently reshuffles the pipeline.
    #[instrument(skip(self))]
    pub async fn cancel_supplier_order(&self, id: Uuid) -> Result<(), ServiceError> {
        let order = SupplierOrder::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("supplier order {}", id)))?;

        let txn = self.db_pool.begin().await?;
        supplier_order_item::Entity::delete_many()
            .filter(supplier_order_item::Column::SupplierOrderId.eq(id))
            .exec(&txn)
            .await?;
        let po_number = order.po_number.clone();
        order.delete(&txn).await?;
        txn.commit().await?;

        info!(po_number = %po_number, "Supplier order cancelled");
        Ok(())
    }

    /// Purchase orders, newest first.
    #[instrument(skip(self))]
    pub async fn list_supplier_orders(
        &self,
    ) -> Result<Vec<supplier_order::Model>, ServiceError> {
        Ok(SupplierOrder::find()
            .order_by_desc(supplier_order::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?)
    }

    /// Resolves one order's product into supplier-routed line items,
    /// exploding set products into their components.
    async fn explode_order(
        &self,
        order: &internal_order::Model,
    ) -> Result<Vec<(Uuid, LineItem)>, ServiceError> {
        let product = Product::find_by_id(order.product_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("product {} of order {}", order.product_id, order.order_number))
            })?;

        let targets: Vec<(Uuid, i32)> = if product.is_set {
            let components = ProductComponent::find()
                .filter(product_component::Column::SetProductId.eq(product.id))
                .all(&*self.db_pool)
                .await?;
            if components.is_empty() {
                return Err(ServiceError::InvalidOperation(format!(
                    "set product {} has no components",
                    product.code
                )));
            }
            components
                .into_iter()
                .map(|c| (c.component_product_id, order.quantity * c.quantity))
                .collect()
        } else {
            vec![(product.id, order.quantity)]
        };

        let mut lines = Vec::with_capacity(targets.len());
        for (product_id, quantity) in targets {
            let primary = SupplierProduct::find()
                .filter(supplier_product::Column::ProductId.eq(product_id))
                .filter(supplier_product::Column::IsPrimary.eq(true))
                .one(&*self.db_pool)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "no primary supplier for product {}",
                        product_id
                    ))
                })?;
            lines.push((
                primary.supplier_id,
                LineItem {
                    product_id,
                    quantity,
                    unit_cost: primary.unit_cost,
                },
            ));
        }
        Ok(lines)
    }

    async fn mark_ordered(&self, order: &internal_order::Model) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;

        let units = executions::executions_of(&txn, order.id).await?;
        for unit in units.into_iter().filter(|u| {
            u.source_type == ExecutionSource::Supplier && u.status == ExecutionStatus::Ready
        }) {
            executions::transition_execution(&txn, unit, ExecutionStatus::Instructed).await?;
        }

        if !order.status.can_transition(OrderStatus::Ordered) {
            return Err(ServiceError::InvalidOperation(format!(
                "order {} cannot move from {} to ORDERED",
                order.order_number, order.status
            )));
        }
        crate::entities::order_status_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            internal_order_id: Set(order.id),
            prev_status: Set(order.status.to_string()),
            new_status: Set(OrderStatus::Ordered.to_string()),
            reason: Set(Some("purchase order generated".to_string())),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;

        let mut active: internal_order::ActiveModel = order.clone().into();
        active.status = Set(OrderStatus::Ordered);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    /// Brings HOLD orders flagged for "the next purchasing round" back to
    /// READY through the resume path, so warehouse units regain their
    /// allocation. An order whose re-allocation fails stays on HOLD. This
    /// runs exactly when a round is cut, never on a timer.
    async fn promote_next_round(&self) -> Result<usize, ServiceError> {
        let held = InternalOrder::find()
            .filter(internal_order::Column::Status.eq(OrderStatus::Hold))
            .filter(internal_order::Column::IsNextRound.eq(true))
            .all(&*self.db_pool)
            .await?;

        let mut promoted = 0;
        for order in held {
            match self.orders.promote_held_order(&order).await {
                Ok(()) => {
                    info!(order_number = %order.order_number, "Held order promoted into new round");
                    promoted += 1;
                }
                Err(e) => {
                    warn!(
                        order_number = %order.order_number,
                        error = %e,
                        "Next-round promotion failed; order stays on HOLD"
                    );
                }
            }
        }
        Ok(promoted)
    }

    async fn draw_po_number<C: sea_orm::ConnectionTrait>(
        &self,
        conn: &C,
    ) -> Result<String, ServiceError> {
        for _ in 0..NUMBER_RETRIES {
            let candidate = format!(
                "{}-{}-{}",
                PO_PREFIX,
                Utc::now().format("%y%m%d"),
                random_suffix()
            );
            let taken = SupplierOrder::find()
                .filter(supplier_order::Column::PoNumber.eq(candidate.as_str()))
                .one(conn)
                .await?
                .is_some();
            if !taken {
                return Ok(candidate);
            }
        }
        Err(ServiceError::InternalError(format!(
            "could not draw a unique PO number after {} attempts",
            NUMBER_RETRIES
        )))
    }
}
