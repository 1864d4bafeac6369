use crate::{
    entities::{
        carrier, carrier::Entity as Carrier, carrier_alias,
        carrier_alias::Entity as CarrierAlias, internal_order,
        internal_order::Entity as InternalOrder, order_execution,
        order_execution::Entity as OrderExecution, order_status_history,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::{ExecutionSource, ExecutionStatus, OrderStatus},
    services::{executions, BatchSummary, InventoryService},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaybillAction {
    Register,
    Modify,
    Delete,
}

/// One row of a waybill upload. Rows are processed independently; a failing
/// row never aborts its batch.
#[derive(Debug, Clone, Deserialize)]
pub struct WaybillRow {
    pub action: WaybillAction,
    pub execution_no: String,
    pub carrier_name: Option<String>,
    pub tracking_number: Option<String>,
}

enum RowOutcome {
    Applied,
    Skipped(String),
}

/// Applies carrier waybill files to execution units: registration ships the
/// stock and flips the unit to SHIPPING, deletion reverses both.
#[derive(Clone)]
pub struct WaybillService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
    inventory: InventoryService,
}

impl WaybillService {
    pub fn new(
        db_pool: Arc<DatabaseConnection>,
        event_sender: EventSender,
        inventory: InventoryService,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            inventory,
        }
    }

    /// Processes an uploaded batch of waybill rows, returning one outcome per
    /// row keyed by execution number.
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub async fn upload_waybill(&self, rows: &[WaybillRow]) -> Result<BatchSummary, ServiceError> {
        if rows.is_empty() {
            return Err(ServiceError::ValidationError(
                "At least one waybill row is required".to_string(),
            ));
        }

        let mut summary = BatchSummary::default();
        for row in rows {
            match self.apply_row(row).await {
                Ok(RowOutcome::Applied) => summary.success(row.execution_no.clone()),
                Ok(RowOutcome::Skipped(msg)) => summary.skip(row.execution_no.clone(), msg),
                Err(e) => summary.fail(row.execution_no.clone(), e.to_string()),
            }
        }
        Ok(summary)
    }

    async fn apply_row(&self, row: &WaybillRow) -> Result<RowOutcome, ServiceError> {
        let execution = OrderExecution::find()
            .filter(order_execution::Column::ExecutionNo.eq(row.execution_no.as_str()))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("execution {}", row.execution_no)))?;

        match row.action {
            WaybillAction::Register => self.register(execution, row).await,
            WaybillAction::Modify => self.modify(execution, row).await,
            WaybillAction::Delete => self.delete(execution).await,
        }
    }

    /// First-time waybill registration: ships warehouse stock (once) and
    /// moves the unit to SHIPPING. A differing pre-existing tracking number
    /// requires an explicit modify.
    async fn register(
        &self,
        execution: order_execution::Model,
        row: &WaybillRow,
    ) -> Result<RowOutcome, ServiceError> {
        let (carrier, tracking) = self.resolve_row_fields(row).await?;

        if let Some(existing) = execution.tracking_number.as_deref() {
            if existing == tracking {
                return Ok(RowOutcome::Skipped(
                    "tracking number already registered".to_string(),
                ));
            }
            return Err(ServiceError::Conflict(format!(
                "execution {} already has tracking number {}; use modify",
                execution.execution_no, existing
            )));
        }
        if !execution.status.can_transition(ExecutionStatus::Shipping) {
            return Err(ServiceError::InvalidOperation(format!(
                "execution {} is {}, cannot ship",
                execution.execution_no, execution.status
            )));
        }

        let order = self.load_parent(&execution).await?;
        let txn = self.db_pool.begin().await?;

        // Deduct exactly once, even if the same unit is re-registered later.
        if execution.source_type == ExecutionSource::Warehouse && execution.shipped_at.is_none() {
            let warehouse_id = execution.warehouse_id.ok_or_else(|| {
                ServiceError::InvalidOperation(format!(
                    "execution {} is warehouse-sourced but has no warehouse",
                    execution.execution_no
                ))
            })?;
            self.inventory
                .ship_stock(&txn, warehouse_id, order.product_id, execution.quantity)
                .await?;
        }

        let execution_no = execution.execution_no.clone();
        let execution_id = execution.id;
        let mut active: order_execution::ActiveModel = execution.into();
        active.status = Set(ExecutionStatus::Shipping);
        active.carrier_id = Set(Some(carrier.id));
        active.tracking_number = Set(Some(tracking.clone()));
        active.shipped_at = Set(Some(Utc::now()));
        active.updated_at = Set(Some(Utc::now()));
        active.update(&txn).await?;

        self.sync_parent_status(&txn, &order).await?;
        txn.commit().await?;

        info!(
            execution_no = %execution_no,
            carrier = %carrier.name,
            tracking_number = %tracking,
            "Waybill registered"
        );
        self.event_sender
            .send_or_log(Event::WaybillRegistered {
                execution_id,
                execution_no,
                tracking_number: tracking,
            })
            .await;
        Ok(RowOutcome::Applied)
    }

    /// Overwrites carrier and tracking number and re-stamps the ship time.
    /// Never touches the ledger: the original registration already deducted.
    async fn modify(
        &self,
        execution: order_execution::Model,
        row: &WaybillRow,
    ) -> Result<RowOutcome, ServiceError> {
        let (carrier, tracking) = self.resolve_row_fields(row).await?;

        if execution.tracking_number.is_none() {
            return Err(ServiceError::InvalidOperation(format!(
                "execution {} has no waybill to modify; use register",
                execution.execution_no
            )));
        }

        let execution_no = execution.execution_no.clone();
        let mut active: order_execution::ActiveModel = execution.into();
        active.carrier_id = Set(Some(carrier.id));
        active.tracking_number = Set(Some(tracking.clone()));
        active.shipped_at = Set(Some(Utc::now()));
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db_pool).await?;

        info!(
            execution_no = %execution_no,
            carrier = %carrier.name,
            tracking_number = %tracking,
            "Waybill modified"
        );
        Ok(RowOutcome::Applied)
    }

    /// Removes a waybill: clears carrier/tracking, reverts the unit to its
    /// pre-shipping status (READY for warehouse units, INSTRUCTED for
    /// supplier units), and puts any shipped warehouse stock back on the
    /// ledger so the reverted status and the ledger agree. The restored
    /// allocation is then released by the ordinary hold/cancel paths.
    async fn delete(&self, execution: order_execution::Model) -> Result<RowOutcome, ServiceError> {
        if execution.tracking_number.is_none() {
            return Ok(RowOutcome::Skipped("no waybill to delete".to_string()));
        }

        let order = self.load_parent(&execution).await?;
        let txn = self.db_pool.begin().await?;

        if execution.source_type == ExecutionSource::Warehouse && execution.shipped_at.is_some() {
            if let Some(warehouse_id) = execution.warehouse_id {
                self.inventory
                    .unship_stock(&txn, warehouse_id, order.product_id, execution.quantity)
                    .await?;
            }
        }

        let reverted = match execution.source_type {
            ExecutionSource::Warehouse => ExecutionStatus::Ready,
            ExecutionSource::Supplier => ExecutionStatus::Instructed,
        };
        let was_shipping = execution.status == ExecutionStatus::Shipping;
        if was_shipping && !execution.status.can_transition(reverted) {
            return Err(ServiceError::InvalidOperation(format!(
                "execution {} is {}, cannot revert",
                execution.execution_no, execution.status
            )));
        }

        let execution_no = execution.execution_no.clone();
        let mut active: order_execution::ActiveModel = execution.into();
        if was_shipping {
            active.status = Set(reverted);
        }
        active.carrier_id = Set(None);
        active.tracking_number = Set(None);
        active.shipped_at = Set(None);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&txn).await?;

        // A parent already marked SHIPPING no longer has every unit shipping.
        if order.status == OrderStatus::Shipping
            && order.status.can_transition(OrderStatus::Ordered)
        {
            order_status_history::ActiveModel {
                id: Set(Uuid::new_v4()),
                internal_order_id: Set(order.id),
                prev_status: Set(order.status.to_string()),
                new_status: Set(OrderStatus::Ordered.to_string()),
                reason: Set(Some("waybill deleted".to_string())),
                created_at: Set(Utc::now()),
            }
            .insert(&txn)
            .await?;
            let mut parent: internal_order::ActiveModel = order.into();
            parent.status = Set(OrderStatus::Ordered);
            parent.updated_at = Set(Some(Utc::now()));
            parent.update(&txn).await?;
        }

        txn.commit().await?;

        info!(execution_no = %execution_no, "Waybill deleted");
        Ok(RowOutcome::Applied)
    }

    /// Raises the parent order to the status its execution units agree on,
    /// but only along a legal transition.
    async fn sync_parent_status<C: ConnectionTrait>(
        &self,
        conn: &C,
        order: &internal_order::Model,
    ) -> Result<(), ServiceError> {
        let units = executions::executions_of(conn, order.id).await?;
        let Some(target) = executions::aggregate_order_status(&units) else {
            return Ok(());
        };
        if target == order.status {
            return Ok(());
        }
        if !order.status.can_transition(target) {
            warn!(
                order_number = %order.order_number,
                from = %order.status,
                to = %target,
                "Execution units imply an illegal parent transition; leaving order as-is"
            );
            return Ok(());
        }

        order_status_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            internal_order_id: Set(order.id),
            prev_status: Set(order.status.to_string()),
            new_status: Set(target.to_string()),
            reason: Set(Some("derived from execution units".to_string())),
            created_at: Set(Utc::now()),
        }
        .insert(conn)
        .await?;

        let mut active: internal_order::ActiveModel = order.clone().into();
        active.status = Set(target);
        active.updated_at = Set(Some(Utc::now()));
        active.update(conn).await?;

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id: order.id,
                order_number: order.order_number.clone(),
                old_status: order.status.to_string(),
                new_status: target.to_string(),
            })
            .await;
        Ok(())
    }

    async fn load_parent(
        &self,
        execution: &order_execution::Model,
    ) -> Result<internal_order::Model, ServiceError> {
        InternalOrder::find_by_id(execution.internal_order_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "internal order of execution {}",
                    execution.execution_no
                ))
            })
    }

    async fn resolve_row_fields(
        &self,
        row: &WaybillRow,
    ) -> Result<(carrier::Model, String), ServiceError> {
        let carrier_name = row
            .carrier_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ServiceError::ValidationError("carrier name is required".to_string())
            })?;
        let tracking = row
            .tracking_number
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ServiceError::ValidationError("tracking number is required".to_string())
            })?;
        let carrier = self.resolve_carrier(carrier_name).await?;
        Ok((carrier, tracking.to_string()))
    }

    /// Resolves a carrier by exact name or registered alias. No silent
    /// default: an unknown name fails the row.
    async fn resolve_carrier(&self, name: &str) -> Result<carrier::Model, ServiceError> {
        if let Some(carrier) = Carrier::find()
            .filter(carrier::Column::Name.eq(name))
            .one(&*self.db_pool)
            .await?
        {
            return Ok(carrier);
        }
        if let Some(alias) = CarrierAlias::find()
            .filter(carrier_alias::Column::Alias.eq(name))
            .one(&*self.db_pool)
            .await?
        {
            if let Some(carrier) = Carrier::find_by_id(alias.carrier_id)
                .one(&*self.db_pool)
                .await?
            {
                return Ok(carrier);
            }
        }
        Err(ServiceError::NotFound(format!(
            "carrier '{}' (no name or alias match)",
            name
        )))
    }
}
