use crate::{
    entities::{
        client, client::Entity as Client, client_order, client_order::Entity as ClientOrder,
        internal_order, internal_order::Entity as InternalOrder, order_execution,
        order_status_history, product_mapping, product_mapping::Entity as ProductMapping,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::{ExecutionSource, ExecutionStatus, OrderStatus},
    services::{
        executions::{self, plan_executions},
        BatchSummary, InventoryService,
    },
};
use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Sentinel stored when an inbound order carries no option name. Kept as a
/// literal value so the mapping key is always three concrete strings.
pub const NO_OPTION: &str = "no-option";

/// Attempts at drawing a fresh order number before giving up. The unique
/// index on `internal_orders.order_number` is the backstop.
const NUMBER_RETRIES: usize = 5;

const SUFFIX_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ0123456789";
const SUFFIX_LEN: usize = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderInput {
    pub client_name: String,
    pub external_order_no: String,
    pub product_code: String,
    pub option_name: Option<String>,
    pub quantity: i32,
    pub price: Decimal,
    pub order_date: Option<DateTime<Utc>>,
}

/// Outcome of order intake. `Warning` means the client order was persisted
/// but no mapping matched, so no internal order exists yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreateOutcome {
    Success,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderResult {
    pub outcome: CreateOutcome,
    pub client_order_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_order_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    pub execution_count: usize,
}

/// Owns the client-order to internal-order conversion and every status
/// transition of the order lifecycle. Compensating ledger actions run in the
/// same transaction as the status write they compensate for.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
    inventory: InventoryService,
    box_capacity: i32,
    order_prefix: String,
}

impl OrderService {
    pub fn new(
        db_pool: Arc<DatabaseConnection>,
        event_sender: EventSender,
        inventory: InventoryService,
        box_capacity: u32,
        order_prefix: String,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            inventory,
            box_capacity: box_capacity as i32,
            order_prefix,
        }
    }

    /// Ingests one client order line.
    ///
    /// The client order is persisted unconditionally. A mapping miss is not
    /// an error: the line stays unconverted and the caller gets a `Warning`
    /// outcome for human triage. Only an exact (client, product code, option)
    /// match converts; there is no fuzzy fallback.
    #[instrument(skip(self, input), fields(client = %input.client_name, external_order_no = %input.external_order_no))]
    pub async fn create_order(
        &self,
        input: CreateOrderInput,
    ) -> Result<CreateOrderResult, ServiceError> {
        if input.quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "Order quantity must be positive".to_string(),
            ));
        }

        let client = Client::find()
            .filter(client::Column::Name.eq(input.client_name.as_str()))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("client '{}'", input.client_name))
            })?;

        let option_name = match input.option_name.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => NO_OPTION.to_string(),
        };

        let client_order = client_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            client_id: Set(client.id),
            external_order_no: Set(input.external_order_no.clone()),
            product_code: Set(input.product_code.clone()),
            option_name: Set(option_name.clone()),
            quantity: Set(input.quantity),
            price: Set(input.price),
            order_date: Set(input.order_date.unwrap_or_else(Utc::now)),
            is_converted: Set(false),
        }
        .insert(&*self.db_pool)
        .await?;

        let mapping = ProductMapping::find()
            .filter(product_mapping::Column::ClientId.eq(client.id))
            .filter(product_mapping::Column::ClientProductCode.eq(input.product_code.as_str()))
            .filter(product_mapping::Column::ClientOptionName.eq(option_name.as_str()))
            .one(&*self.db_pool)
            .await?;

        let Some(mapping) = mapping else {
            warn!(
                product_code = %input.product_code,
                option_name = %option_name,
                "No product mapping; client order left unconverted"
            );
            self.event_sender
                .send_or_log(Event::OrderReceived {
                    client_order_id: client_order.id,
                    order_number: None,
                    mapped: false,
                })
                .await;
            return Ok(CreateOrderResult {
                outcome: CreateOutcome::Warning,
                client_order_id: client_order.id,
                internal_order_id: None,
                order_number: None,
                execution_count: 0,
            });
        };

        let prefix = client
            .sales_group
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.order_prefix);
        let order_number = self.draw_order_number(prefix).await?;

        let plans = plan_executions(&order_number, input.quantity, self.box_capacity)?;
        let source_type = if mapping.target_warehouse_id.is_some() {
            ExecutionSource::Warehouse
        } else {
            ExecutionSource::Supplier
        };

        let txn = self.db_pool.begin().await?;

        let order = internal_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_number: Set(order_number.clone()),
            client_order_id: Set(client_order.id),
            product_id: Set(mapping.product_id),
            quantity: Set(input.quantity),
            status: Set(OrderStatus::Pending),
            hold_reason: Set(None),
            is_next_round: Set(false),
            target_ship_date: Set(None),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await?;

        let created = executions::insert_executions(
            &txn,
            order.id,
            &plans,
            source_type,
            mapping.target_warehouse_id,
            None,
        )
        .await?;

        let mut converted: client_order::ActiveModel = client_order.into();
        converted.is_converted = Set(true);
        let client_order = converted.update(&txn).await?;

        txn.commit().await?;

        info!(
            order_number = %order_number,
            quantity = input.quantity,
            executions = created.len(),
            source = %source_type,
            "Internal order created"
        );
        self.event_sender
            .send_or_log(Event::OrderReceived {
                client_order_id: client_order.id,
                order_number: Some(order_number.clone()),
                mapped: true,
            })
            .await;

        Ok(CreateOrderResult {
            outcome: CreateOutcome::Success,
            client_order_id: client_order.id,
            internal_order_id: Some(order.id),
            order_number: Some(order_number),
            execution_count: created.len(),
        })
    }

    /// Confirms PENDING orders: allocates stock for warehouse-sourced
    /// execution units and moves units and order to READY.
    ///
    /// Confirmation is all-or-nothing per order (one unit's allocation
    /// failure rolls that order back) but never aborts the batch. Orders not
    /// in PENDING are skipped, so re-confirming is a no-op.
    #[instrument(skip(self, order_ids), fields(count = order_ids.len()))]
    pub async fn confirm_orders(&self, order_ids: &[Uuid]) -> Result<BatchSummary, ServiceError> {
        require_targets(order_ids)?;
        let mut summary = BatchSummary::default();

        for &order_id in order_ids {
            let order = match self.load_order(order_id).await {
                Ok(order) => order,
                Err(e) => {
                    summary.fail(order_id.to_string(), e.to_string());
                    continue;
                }
            };
            if order.status != OrderStatus::Pending {
                summary.skip(
                    order.order_number.clone(),
                    format!("order is {}, not PENDING", order.status),
                );
                continue;
            }

            match self.confirm_one(&order).await {
                Ok(()) => {
                    self.emit_status_change(&order, OrderStatus::Ready).await;
                    summary.success(order.order_number.clone());
                }
                Err(e) => summary.fail(order.order_number.clone(), e.to_string()),
            }
        }
        Ok(summary)
    }

    async fn confirm_one(&self, order: &internal_order::Model) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;

        let units = executions::executions_of(&txn, order.id).await?;
        for unit in units
            .into_iter()
            .filter(|u| u.status == ExecutionStatus::Pending)
        {
            if unit.source_type == ExecutionSource::Warehouse {
                let warehouse_id = unit.warehouse_id.ok_or_else(|| {
                    ServiceError::InvalidOperation(format!(
                        "execution {} is warehouse-sourced but has no warehouse",
                        unit.execution_no
                    ))
                })?;
                self.inventory
                    .allocate_stock(&txn, warehouse_id, order.product_id, unit.quantity)
                    .await
                    .map_err(|e| match e {
                        ServiceError::InsufficientStock(msg) => ServiceError::InsufficientStock(
                            format!("order {}: {}", order.order_number, msg),
                        ),
                        other => other,
                    })?;
            }
            executions::transition_execution(&txn, unit, ExecutionStatus::Ready).await?;
        }

        self.transition_order(&txn, order.clone(), OrderStatus::Ready, None)
            .await?;
        txn.commit().await?;
        Ok(())
    }

    /// Puts orders on HOLD, releasing warehouse allocations first so held
    /// stock is immediately available to other orders. `next_round` marks the
    /// hold as "carry to the next purchasing round".
    #[instrument(skip(self, order_ids), fields(count = order_ids.len()))]
    pub async fn hold_orders(
        &self,
        order_ids: &[Uuid],
        reason: &str,
        next_round: bool,
    ) -> Result<BatchSummary, ServiceError> {
        require_targets(order_ids)?;
        require_reason(reason)?;
        let mut summary = BatchSummary::default();

        for &order_id in order_ids {
            let order = match self.load_order(order_id).await {
                Ok(order) => order,
                Err(e) => {
                    summary.fail(order_id.to_string(), e.to_string());
                    continue;
                }
            };
            if !order.status.can_transition(OrderStatus::Hold) {
                summary.fail(
                    order.order_number.clone(),
                    format!("order is {}, cannot hold", order.status),
                );
                continue;
            }

            match self.hold_one(&order, reason, next_round).await {
                Ok(()) => {
                    self.emit_status_change(&order, OrderStatus::Hold).await;
                    summary.success(order.order_number.clone());
                }
                Err(e) => summary.fail(order.order_number.clone(), e.to_string()),
            }
        }
        Ok(summary)
    }

    async fn hold_one(
        &self,
        order: &internal_order::Model,
        reason: &str,
        next_round: bool,
    ) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;

        // Release before the status flips so stock never reads as committed
        // to an order already off the active path.
        self.release_ready_allocations(&txn, order).await?;

        let mut active: internal_order::ActiveModel = order.clone().into();
        active.status = Set(OrderStatus::Hold);
        active.hold_reason = Set(Some(reason.to_string()));
        active.is_next_round = Set(next_round);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&txn).await?;

        record_status_change(&txn, order, OrderStatus::Hold, Some(reason)).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Brings held orders back to READY, re-allocating stock for their
    /// warehouse-sourced units so a resumed order carries the same ledger
    /// commitment as a freshly confirmed one. Units still PENDING (the order
    /// was held before confirmation) are moved to READY on the way.
    #[instrument(skip(self, order_ids), fields(count = order_ids.len()))]
    pub async fn resume_orders(&self, order_ids: &[Uuid]) -> Result<BatchSummary, ServiceError> {
        require_targets(order_ids)?;
        let mut summary = BatchSummary::default();

        for &order_id in order_ids {
            let order = match self.load_order(order_id).await {
                Ok(order) => order,
                Err(e) => {
                    summary.fail(order_id.to_string(), e.to_string());
                    continue;
                }
            };
            if order.status != OrderStatus::Hold {
                summary.skip(
                    order.order_number.clone(),
                    format!("order is {}, not HOLD", order.status),
                );
                continue;
            }

            match self.resume_one(&order, "resume").await {
                Ok(()) => {
                    self.emit_status_change(&order, OrderStatus::Ready).await;
                    summary.success(order.order_number.clone());
                }
                Err(e) => summary.fail(order.order_number.clone(), e.to_string()),
            }
        }
        Ok(summary)
    }

    /// Used when a purchasing round is cut: a held next-round order rejoins
    /// the pipeline through the same re-allocation path as a manual resume,
    /// so it never reads READY without its ledger commitment.
    pub(crate) async fn promote_held_order(
        &self,
        order: &internal_order::Model,
    ) -> Result<(), ServiceError> {
        self.resume_one(order, "promoted for next purchasing round")
            .await?;
        self.emit_status_change(order, OrderStatus::Ready).await;
        Ok(())
    }

    async fn resume_one(
        &self,
        order: &internal_order::Model,
        reason: &str,
    ) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;

        let units = executions::executions_of(&txn, order.id).await?;
        for unit in units {
            let resumable = matches!(
                unit.status,
                ExecutionStatus::Pending | ExecutionStatus::Ready
            );
            if unit.source_type == ExecutionSource::Warehouse && resumable {
                if let Some(warehouse_id) = unit.warehouse_id {
                    self.inventory
                        .allocate_stock(&txn, warehouse_id, order.product_id, unit.quantity)
                        .await
                        .map_err(|e| match e {
                            ServiceError::InsufficientStock(msg) => {
                                ServiceError::InsufficientStock(format!(
                                    "order {}: {}",
                                    order.order_number, msg
                                ))
                            }
                            other => other,
                        })?;
                }
            }
            if unit.status == ExecutionStatus::Pending {
                executions::transition_execution(&txn, unit, ExecutionStatus::Ready).await?;
            }
        }

        let mut active: internal_order::ActiveModel = order.clone().into();
        active.status = Set(OrderStatus::Ready);
        active.hold_reason = Set(None);
        active.is_next_round = Set(false);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&txn).await?;

        record_status_change(&txn, order, OrderStatus::Ready, Some(reason)).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Stores a target ship date. A future date parks the order in SCHEDULED;
    /// today or a past date corrects straight to READY.
    #[instrument(skip(self, order_ids), fields(count = order_ids.len()))]
    pub async fn schedule_orders(
        &self,
        order_ids: &[Uuid],
        target_date: NaiveDate,
        reason: &str,
    ) -> Result<BatchSummary, ServiceError> {
        require_targets(order_ids)?;
        require_reason(reason)?;
        let mut summary = BatchSummary::default();
        let today = Utc::now().date_naive();

        for &order_id in order_ids {
            let order = match self.load_order(order_id).await {
                Ok(order) => order,
                Err(e) => {
                    summary.fail(order_id.to_string(), e.to_string());
                    continue;
                }
            };

            let desired = if target_date > today {
                OrderStatus::Scheduled
            } else {
                OrderStatus::Ready
            };
            if desired != order.status && !order.status.can_transition(desired) {
                summary.fail(
                    order.order_number.clone(),
                    format!("order is {}, cannot move to {}", order.status, desired),
                );
                continue;
            }

            let result: Result<(), ServiceError> = async {
                let txn = self.db_pool.begin().await?;
                let changed = desired != order.status;
                let mut active: internal_order::ActiveModel = order.clone().into();
                active.status = Set(desired);
                active.target_ship_date = Set(Some(target_date));
                active.updated_at = Set(Some(Utc::now()));
                active.update(&txn).await?;
                if changed {
                    record_status_change(&txn, &order, desired, Some(reason)).await?;
                }
                txn.commit().await?;
                Ok(())
            }
            .await;

            match result {
                Ok(()) => {
                    if desired != order.status {
                        self.emit_status_change(&order, desired).await;
                    }
                    summary.success(order.order_number.clone());
                }
                Err(e) => summary.fail(order.order_number.clone(), e.to_string()),
            }
        }
        Ok(summary)
    }

    /// Cancels orders that have not physically moved.
    ///
    /// Terminal orders are reported as SKIP to keep bulk cancellation
    /// idempotent; an order with a SHIPPING or RETURNED unit is refused
    /// whole. Warehouse allocations of READY units are released unless the
    /// order is on HOLD (the hold already released them).
    #[instrument(skip(self, order_ids), fields(count = order_ids.len()))]
    pub async fn cancel_orders(
        &self,
        order_ids: &[Uuid],
        reason: &str,
    ) -> Result<BatchSummary, ServiceError> {
        require_targets(order_ids)?;
        require_reason(reason)?;
        let mut summary = BatchSummary::default();

        for &order_id in order_ids {
            let order = match self.load_order(order_id).await {
                Ok(order) => order,
                Err(e) => {
                    summary.fail(order_id.to_string(), e.to_string());
                    continue;
                }
            };
            if order.status.is_terminal() {
                summary.skip(
                    order.order_number.clone(),
                    format!("order is already {}", order.status),
                );
                continue;
            }

            let units = executions::executions_of(&*self.db_pool, order.id).await?;
            if units.iter().any(|u| {
                matches!(
                    u.status,
                    ExecutionStatus::Shipping | ExecutionStatus::Returned
                )
            }) {
                summary.fail(
                    order.order_number.clone(),
                    "order has shipped or returned execution units".to_string(),
                );
                continue;
            }

            match self.cancel_one(&order, units, reason).await {
                Ok(()) => {
                    self.emit_status_change(&order, OrderStatus::Cancelled).await;
                    summary.success(order.order_number.clone());
                }
                Err(e) => summary.fail(order.order_number.clone(), e.to_string()),
            }
        }
        Ok(summary)
    }

    async fn cancel_one(
        &self,
        order: &internal_order::Model,
        units: Vec<order_execution::Model>,
        reason: &str,
    ) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;

        for unit in units {
            if unit.status == ExecutionStatus::Cancelled {
                continue;
            }
            // HOLD already released the allocation; releasing again would
            // corrupt the ledger.
            if unit.source_type == ExecutionSource::Warehouse
                && unit.status == ExecutionStatus::Ready
                && order.status != OrderStatus::Hold
            {
                if let Some(warehouse_id) = unit.warehouse_id {
                    self.inventory
                        .release_stock(&txn, warehouse_id, order.product_id, unit.quantity)
                        .await?;
                }
            }
            executions::transition_execution(&txn, unit, ExecutionStatus::Cancelled).await?;
        }

        self.transition_order(&txn, order.clone(), OrderStatus::Cancelled, Some(reason))
            .await?;
        txn.commit().await?;
        Ok(())
    }

    /// Reverts ORDERED orders back to READY after a purchase order is
    /// discarded. Orders not in ORDERED are unaffected.
    #[instrument(skip(self, order_ids), fields(count = order_ids.len()))]
    pub async fn rollback_orders(&self, order_ids: &[Uuid]) -> Result<BatchSummary, ServiceError> {
        require_targets(order_ids)?;
        let mut summary = BatchSummary::default();

        for &order_id in order_ids {
            let order = match self.load_order(order_id).await {
                Ok(order) => order,
                Err(e) => {
                    summary.fail(order_id.to_string(), e.to_string());
                    continue;
                }
            };
            if order.status != OrderStatus::Ordered {
                summary.skip(
                    order.order_number.clone(),
                    format!("order is {}, not ORDERED", order.status),
                );
                continue;
            }

            let result: Result<(), ServiceError> = async {
                let txn = self.db_pool.begin().await?;
                let units = executions::executions_of(&txn, order.id).await?;
                for unit in units
                    .into_iter()
                    .filter(|u| u.status == ExecutionStatus::Instructed)
                {
                    executions::transition_execution(&txn, unit, ExecutionStatus::Ready).await?;
                }
                self.transition_order(&txn, order.clone(), OrderStatus::Ready, Some("rollback"))
                    .await?;
                txn.commit().await?;
                Ok(())
            }
            .await;

            match result {
                Ok(()) => {
                    self.emit_status_change(&order, OrderStatus::Ready).await;
                    summary.success(order.order_number.clone());
                }
                Err(e) => summary.fail(order.order_number.clone(), e.to_string()),
            }
        }
        Ok(summary)
    }

    /// Rewrites the fulfillment source of every execution unit of the given
    /// orders. Touches neither quantities nor statuses, and performs no
    /// inventory action: allocation stays the job of a subsequent confirm.
    #[instrument(skip(self, order_ids), fields(count = order_ids.len()))]
    pub async fn change_order_source(
        &self,
        order_ids: &[Uuid],
        source_type: ExecutionSource,
        warehouse_id: Option<Uuid>,
    ) -> Result<BatchSummary, ServiceError> {
        require_targets(order_ids)?;
        if source_type == ExecutionSource::Warehouse && warehouse_id.is_none() {
            return Err(ServiceError::ValidationError(
                "warehouse_id is required when switching to WAREHOUSE sourcing".to_string(),
            ));
        }
        let mut summary = BatchSummary::default();

        for &order_id in order_ids {
            let order = match self.load_order(order_id).await {
                Ok(order) => order,
                Err(e) => {
                    summary.fail(order_id.to_string(), e.to_string());
                    continue;
                }
            };

            let result: Result<(), ServiceError> = async {
                let txn = self.db_pool.begin().await?;
                let units = executions::executions_of(&txn, order.id).await?;
                for unit in units {
                    let mut active: order_execution::ActiveModel = unit.into();
                    active.source_type = Set(source_type);
                    active.warehouse_id = Set(warehouse_id);
                    if source_type == ExecutionSource::Warehouse {
                        active.supplier_id = Set(None);
                    }
                    active.updated_at = Set(Some(Utc::now()));
                    active.update(&txn).await?;
                }
                txn.commit().await?;
                Ok(())
            }
            .await;

            match result {
                Ok(()) => summary.success(order.order_number.clone()),
                Err(e) => summary.fail(order.order_number.clone(), e.to_string()),
            }
        }
        Ok(summary)
    }

    /// Internal orders, newest first.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        status: Option<OrderStatus>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<internal_order::Model>, u64), ServiceError> {
        let per_page = per_page.clamp(1, 200);
        let mut query = InternalOrder::find().order_by_desc(internal_order::Column::CreatedAt);
        if let Some(status) = status {
            query = query.filter(internal_order::Column::Status.eq(status));
        }
        let total = query.clone().count(&*self.db_pool).await?;
        let rows = query
            .offset(page.saturating_mul(per_page))
            .limit(per_page)
            .all(&*self.db_pool)
            .await?;
        Ok((rows, total))
    }

    pub async fn get_order(&self, order_id: Uuid) -> Result<internal_order::Model, ServiceError> {
        self.load_order(order_id).await
    }

    async fn load_order(&self, order_id: Uuid) -> Result<internal_order::Model, ServiceError> {
        InternalOrder::find_by_id(order_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("internal order {}", order_id)))
    }

    async fn release_ready_allocations<C: ConnectionTrait>(
        &self,
        conn: &C,
        order: &internal_order::Model,
    ) -> Result<(), ServiceError> {
        let units = executions::executions_of(conn, order.id).await?;
        for unit in units {
            if unit.source_type == ExecutionSource::Warehouse
                && unit.status == ExecutionStatus::Ready
            {
                if let Some(warehouse_id) = unit.warehouse_id {
                    self.inventory
                        .release_stock(conn, warehouse_id, order.product_id, unit.quantity)
                        .await?;
                }
            }
        }
        Ok(())
    }

    async fn transition_order<C: ConnectionTrait>(
        &self,
        conn: &C,
        order: internal_order::Model,
        to: OrderStatus,
        reason: Option<&str>,
    ) -> Result<internal_order::Model, ServiceError> {
        if !order.status.can_transition(to) {
            return Err(ServiceError::InvalidOperation(format!(
                "order {} cannot move from {} to {}",
                order.order_number, order.status, to
            )));
        }
        record_status_change(conn, &order, to, reason).await?;
        let mut active: internal_order::ActiveModel = order.into();
        active.status = Set(to);
        active.updated_at = Set(Some(Utc::now()));
        Ok(active.update(conn).await?)
    }

    async fn emit_status_change(&self, order: &internal_order::Model, to: OrderStatus) {
        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id: order.id,
                order_number: order.order_number.clone(),
                old_status: order.status.to_string(),
                new_status: to.to_string(),
            })
            .await;
    }

    /// Draws a `{prefix}-{YYMMDD}-{RAND5}` number not currently in use.
    /// Collision probability is negligible; the bounded retry plus the unique
    /// index cover the residual race.
    async fn draw_order_number(&self, prefix: &str) -> Result<String, ServiceError> {
        for _ in 0..NUMBER_RETRIES {
            let candidate = format_order_number(prefix);
            let taken = InternalOrder::find()
                .filter(internal_order::Column::OrderNumber.eq(candidate.as_str()))
                .one(&*self.db_pool)
                .await?
                .is_some();
            if !taken {
                return Ok(candidate);
            }
        }
        Err(ServiceError::InternalError(format!(
            "could not draw a unique order number after {} attempts",
            NUMBER_RETRIES
        )))
    }
}

pub(crate) fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARS[rng.gen_range(0..SUFFIX_CHARS.len())] as char)
        .collect()
}

fn format_order_number(prefix: &str) -> String {
    format!(
        "{}-{}-{}",
        prefix,
        Utc::now().format("%y%m%d"),
        random_suffix()
    )
}

fn require_reason(reason: &str) -> Result<(), ServiceError> {
    if reason.trim().is_empty() {
        return Err(ServiceError::ValidationError(
            "A reason is required".to_string(),
        ));
    }
    Ok(())
}

fn require_targets(order_ids: &[Uuid]) -> Result<(), ServiceError> {
    if order_ids.is_empty() {
        return Err(ServiceError::ValidationError(
            "At least one order id is required".to_string(),
        ));
    }
    Ok(())
}

async fn record_status_change<C: ConnectionTrait>(
    conn: &C,
    order: &internal_order::Model,
    to: OrderStatus,
    reason: Option<&str>,
) -> Result<(), ServiceError> {
    order_status_history::ActiveModel {
        id: Set(Uuid::new_v4()),
        internal_order_id: Set(order.id),
        prev_status: Set(order.status.to_string()),
        new_status: Set(to.to_string()),
        reason: Set(reason.map(str::to_string)),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await?;
    Ok(())
}
