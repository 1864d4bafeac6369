use crate::{
    entities::{order_execution, order_execution::Entity as OrderExecution},
    errors::ServiceError,
    models::{ExecutionSource, ExecutionStatus, OrderStatus},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

/// One planned execution unit before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub execution_no: String,
    pub quantity: i32,
}

/// Splits an order quantity into box-sized execution units.
///
/// Produces `ceil(quantity / capacity)` units; every unit is filled to
/// `capacity` except a smaller final remainder. Unit numbers follow
/// `{order_number}_{i}x{n}` with 1-based `i`, so the split is self-describing
/// on shipping labels.
pub fn plan_executions(
    order_number: &str,
    quantity: i32,
    capacity: i32,
) -> Result<Vec<ExecutionPlan>, ServiceError> {
    if quantity <= 0 {
        return Err(ServiceError::ValidationError(
            "Order quantity must be positive".to_string(),
        ));
    }
    if capacity <= 0 {
        return Err(ServiceError::ValidationError(
            "Box capacity must be positive".to_string(),
        ));
    }

    let count = (quantity + capacity - 1) / capacity;
    let mut remaining = quantity;
    let mut plans = Vec::with_capacity(count as usize);
    for i in 1..=count {
        let q = remaining.min(capacity);
        plans.push(ExecutionPlan {
            execution_no: format!("{}_{}x{}", order_number, i, count),
            quantity: q,
        });
        remaining -= q;
    }
    Ok(plans)
}

/// Persists planned execution units for an internal order.
///
/// Source routing is decided by the caller from the product mapping: a
/// warehouse target makes every unit `WAREHOUSE`-sourced, otherwise the units
/// are `SUPPLIER`-sourced and wait for purchase-order generation.
pub async fn insert_executions<C: ConnectionTrait>(
    conn: &C,
    internal_order_id: Uuid,
    plans: &[ExecutionPlan],
    source_type: ExecutionSource,
    warehouse_id: Option<Uuid>,
    supplier_id: Option<Uuid>,
) -> Result<Vec<order_execution::Model>, ServiceError> {
    let mut created = Vec::with_capacity(plans.len());
    for plan in plans {
        let model = order_execution::ActiveModel {
            id: Set(Uuid::new_v4()),
            execution_no: Set(plan.execution_no.clone()),
            internal_order_id: Set(internal_order_id),
            source_type: Set(source_type),
            warehouse_id: Set(warehouse_id),
            supplier_id: Set(supplier_id),
            quantity: Set(plan.quantity),
            status: Set(ExecutionStatus::Pending),
            carrier_id: Set(None),
            tracking_number: Set(None),
            shipped_at: Set(None),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(conn)
        .await?;
        created.push(model);
    }
    Ok(created)
}

/// Loads every execution unit of an internal order.
pub async fn executions_of<C: ConnectionTrait>(
    conn: &C,
    internal_order_id: Uuid,
) -> Result<Vec<order_execution::Model>, ServiceError> {
    Ok(OrderExecution::find()
        .filter(order_execution::Column::InternalOrderId.eq(internal_order_id))
        .all(conn)
        .await?)
}

/// Moves one execution through its state machine, stamping `updated_at`.
pub async fn transition_execution<C: ConnectionTrait>(
    conn: &C,
    execution: order_execution::Model,
    to: ExecutionStatus,
) -> Result<order_execution::Model, ServiceError> {
    if !execution.status.can_transition(to) {
        return Err(ServiceError::InvalidOperation(format!(
            "execution {} cannot move from {} to {}",
            execution.execution_no, execution.status, to
        )));
    }
    let mut active: order_execution::ActiveModel = execution.into();
    active.status = Set(to);
    active.updated_at = Set(Some(Utc::now()));
    Ok(active.update(conn).await?)
}

/// Derives the parent order status implied by its execution units, or `None`
/// when the units do not yet agree on one.
///
/// The parent reaches `SHIPPING` only once every non-cancelled unit is
/// shipping; completion is never derived here, it is an external confirmation.
/// An order whose units are all cancelled is itself cancelled.
pub fn aggregate_order_status(executions: &[order_execution::Model]) -> Option<OrderStatus> {
    let active: Vec<_> = executions
        .iter()
        .filter(|e| e.status != ExecutionStatus::Cancelled)
        .collect();
    if active.is_empty() {
        return if executions.is_empty() {
            None
        } else {
            Some(OrderStatus::Cancelled)
        };
    }
    if active.iter().all(|e| e.status == ExecutionStatus::Shipping) {
        return Some(OrderStatus::Shipping);
    }
    None
}
