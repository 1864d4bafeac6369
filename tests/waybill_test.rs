mod common;

use common::*;
use roubiz_api::{
    entities::order_execution,
    models::{ExecutionStatus, OrderStatus},
    services::orders::CreateOrderInput,
    services::waybills::{WaybillAction, WaybillRow},
    services::BatchOutcome,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

async fn confirmed_warehouse_order(
    app: &TestApp,
    quantity: i32,
    stock: i32,
) -> (Uuid, Vec<order_execution::Model>, Uuid, Uuid) {
    let client = seed_client(&app.db, "ACME", None).await;
    let warehouse = seed_warehouse(&app.db, "W").await;
    let product = seed_product(&app.db, "P1", false).await;
    seed_mapping(&app.db, client.id, "P1", "default", product.id, Some(warehouse.id)).await;
    seed_stock(&app.db, warehouse.id, product.id, stock, 0).await;

    let result = app
        .services
        .orders
        .create_order(CreateOrderInput {
            client_name: "ACME".into(),
            external_order_no: format!("EXT-{}", Uuid::new_v4()),
            product_code: "P1".into(),
            option_name: Some("default".into()),
            quantity,
            price: Decimal::new(5_000, 2),
            order_date: None,
        })
        .await
        .unwrap();
    let order_id = result.internal_order_id.unwrap();
    app.services.orders.confirm_orders(&[order_id]).await.unwrap();

    let units = order_execution::Entity::find()
        .filter(order_execution::Column::InternalOrderId.eq(order_id))
        .order_by_asc(order_execution::Column::ExecutionNo)
        .all(app.db.as_ref())
        .await
        .unwrap();
    (order_id, units, warehouse.id, product.id)
}

async fn stock_of(db: &DatabaseConnection, warehouse_id: Uuid, product_id: Uuid) -> (i32, i32) {
    let row = roubiz_api::entities::warehouse_stock::Entity::find()
        .filter(roubiz_api::entities::warehouse_stock::Column::WarehouseId.eq(warehouse_id))
        .filter(roubiz_api::entities::warehouse_stock::Column::ProductId.eq(product_id))
        .one(db)
        .await
        .unwrap()
        .unwrap();
    (row.quantity, row.allocated)
}

async fn execution(db: &DatabaseConnection, execution_no: &str) -> order_execution::Model {
    order_execution::Entity::find()
        .filter(order_execution::Column::ExecutionNo.eq(execution_no))
        .one(db)
        .await
        .unwrap()
        .unwrap()
}

fn register_row(execution_no: &str, carrier: &str, tracking: &str) -> WaybillRow {
    WaybillRow {
        action: WaybillAction::Register,
        execution_no: execution_no.to_owned(),
        carrier_name: Some(carrier.to_owned()),
        tracking_number: Some(tracking.to_owned()),
    }
}

#[tokio::test]
async fn register_ships_stock_and_raises_parent_when_all_units_ship() {
    let app = spawn_app().await;
    let (order_id, units, warehouse_id, product_id) =
        confirmed_warehouse_order(&app, 15, 100).await;
    seed_carrier(&app.db, "CJ", "CJ Logistics").await;
    assert_eq!(stock_of(&app.db, warehouse_id, product_id).await, (100, 15));

    let summary = app
        .services
        .waybills
        .upload_waybill(&[register_row(&units[0].execution_no, "CJ Logistics", "T-001")])
        .await
        .unwrap();
    assert_eq!(summary.succeeded, 1);

    // First box: quantity and allocation both drop by its 10 units
    assert_eq!(stock_of(&app.db, warehouse_id, product_id).await, (90, 5));
    let first = execution(&app.db, &units[0].execution_no).await;
    assert_eq!(first.status, ExecutionStatus::Shipping);
    assert_eq!(first.tracking_number.as_deref(), Some("T-001"));
    assert!(first.shipped_at.is_some());

    // Sibling still pending: parent stays put
    let order = app.services.orders.get_order(order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Ready);

    app.services
        .waybills
        .upload_waybill(&[register_row(&units[1].execution_no, "CJ Logistics", "T-002")])
        .await
        .unwrap();

    assert_eq!(stock_of(&app.db, warehouse_id, product_id).await, (85, 0));
    let order = app.services.orders.get_order(order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Shipping);
}

#[tokio::test]
async fn carrier_resolves_by_alias() {
    let app = spawn_app().await;
    let (_, units, _, _) = confirmed_warehouse_order(&app, 5, 50).await;
    let carrier = seed_carrier(&app.db, "CJ", "CJ Logistics").await;
    seed_carrier_alias(&app.db, carrier.id, "cj korea").await;

    let summary = app
        .services
        .waybills
        .upload_waybill(&[register_row(&units[0].execution_no, "cj korea", "T-100")])
        .await
        .unwrap();
    assert_eq!(summary.succeeded, 1);

    let unit = execution(&app.db, &units[0].execution_no).await;
    assert_eq!(unit.carrier_id, Some(carrier.id));
}

#[tokio::test]
async fn one_bad_row_does_not_abort_the_batch() {
    let app = spawn_app().await;
    let (_, units, _, _) = confirmed_warehouse_order(&app, 15, 100).await;
    seed_carrier(&app.db, "CJ", "CJ Logistics").await;

    let summary = app
        .services
        .waybills
        .upload_waybill(&[
            register_row(&units[0].execution_no, "No Such Carrier", "T-001"),
            register_row(&units[1].execution_no, "CJ Logistics", "T-002"),
            register_row("GHOST_1x1", "CJ Logistics", "T-003"),
        ])
        .await
        .unwrap();
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.items[0].outcome, BatchOutcome::Fail);
    assert_eq!(summary.items[1].outcome, BatchOutcome::Success);
    assert_eq!(summary.items[2].outcome, BatchOutcome::Fail);

    let untouched = execution(&app.db, &units[0].execution_no).await;
    assert_eq!(untouched.status, ExecutionStatus::Ready);
}

#[tokio::test]
async fn duplicate_tracking_number_requires_explicit_modify() {
    let app = spawn_app().await;
    let (_, units, warehouse_id, product_id) = confirmed_warehouse_order(&app, 5, 50).await;
    seed_carrier(&app.db, "CJ", "CJ Logistics").await;

    app.services
        .waybills
        .upload_waybill(&[register_row(&units[0].execution_no, "CJ Logistics", "T-001")])
        .await
        .unwrap();

    // Same number again: idempotent skip, no second deduction
    let summary = app
        .services
        .waybills
        .upload_waybill(&[register_row(&units[0].execution_no, "CJ Logistics", "T-001")])
        .await
        .unwrap();
    assert_eq!(summary.skipped, 1);
    assert_eq!(stock_of(&app.db, warehouse_id, product_id).await, (45, 0));

    // A different number without modify is a conflict
    let summary = app
        .services
        .waybills
        .upload_waybill(&[register_row(&units[0].execution_no, "CJ Logistics", "T-999")])
        .await
        .unwrap();
    assert_eq!(summary.failed, 1);
    assert!(summary.items[0]
        .message
        .as_deref()
        .unwrap()
        .contains("Conflict"));
}

#[tokio::test]
async fn modify_overwrites_without_second_deduction() {
    let app = spawn_app().await;
    let (_, units, warehouse_id, product_id) = confirmed_warehouse_order(&app, 5, 50).await;
    seed_carrier(&app.db, "CJ", "CJ Logistics").await;
    let other = seed_carrier(&app.db, "HJ", "Hanjin").await;

    app.services
        .waybills
        .upload_waybill(&[register_row(&units[0].execution_no, "CJ Logistics", "T-001")])
        .await
        .unwrap();
    assert_eq!(stock_of(&app.db, warehouse_id, product_id).await, (45, 0));

    let summary = app
        .services
        .waybills
        .upload_waybill(&[WaybillRow {
            action: WaybillAction::Modify,
            execution_no: units[0].execution_no.clone(),
            carrier_name: Some("Hanjin".into()),
            tracking_number: Some("T-777".into()),
        }])
        .await
        .unwrap();
    assert_eq!(summary.succeeded, 1);

    let unit = execution(&app.db, &units[0].execution_no).await;
    assert_eq!(unit.carrier_id, Some(other.id));
    assert_eq!(unit.tracking_number.as_deref(), Some("T-777"));
    assert_eq!(unit.status, ExecutionStatus::Shipping);
    // Ledger untouched by the modify
    assert_eq!(stock_of(&app.db, warehouse_id, product_id).await, (45, 0));
}

#[tokio::test]
async fn modify_without_existing_waybill_fails() {
    let app = spawn_app().await;
    let (_, units, _, _) = confirmed_warehouse_order(&app, 5, 50).await;
    seed_carrier(&app.db, "CJ", "CJ Logistics").await;

    let summary = app
        .services
        .waybills
        .upload_waybill(&[WaybillRow {
            action: WaybillAction::Modify,
            execution_no: units[0].execution_no.clone(),
            carrier_name: Some("CJ Logistics".into()),
            tracking_number: Some("T-1".into()),
        }])
        .await
        .unwrap();
    assert_eq!(summary.failed, 1);
}

#[tokio::test]
async fn delete_restocks_and_reverts_statuses() {
    let app = spawn_app().await;
    let (order_id, units, warehouse_id, product_id) = confirmed_warehouse_order(&app, 5, 50).await;
    seed_carrier(&app.db, "CJ", "CJ Logistics").await;

    app.services
        .waybills
        .upload_waybill(&[register_row(&units[0].execution_no, "CJ Logistics", "T-001")])
        .await
        .unwrap();
    assert_eq!(stock_of(&app.db, warehouse_id, product_id).await, (45, 0));
    let order = app.services.orders.get_order(order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Shipping);

    let summary = app
        .services
        .waybills
        .upload_waybill(&[WaybillRow {
            action: WaybillAction::Delete,
            execution_no: units[0].execution_no.clone(),
            carrier_name: None,
            tracking_number: None,
        }])
        .await
        .unwrap();
    assert_eq!(summary.succeeded, 1);

    // Deduction reversed: on-hand and allocation both restored
    assert_eq!(stock_of(&app.db, warehouse_id, product_id).await, (50, 5));
    // Warehouse units go back to READY; they never pass through INSTRUCTED
    let unit = execution(&app.db, &units[0].execution_no).await;
    assert_eq!(unit.status, ExecutionStatus::Ready);
    assert!(unit.tracking_number.is_none());
    assert!(unit.carrier_id.is_none());
    assert!(unit.shipped_at.is_none());

    let order = app.services.orders.get_order(order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Ordered);
}

#[tokio::test]
async fn cancel_after_waybill_delete_releases_the_restored_allocation() {
    let app = spawn_app().await;
    let (order_id, units, warehouse_id, product_id) = confirmed_warehouse_order(&app, 5, 100).await;
    seed_carrier(&app.db, "CJ", "CJ Logistics").await;

    app.services
        .waybills
        .upload_waybill(&[register_row(&units[0].execution_no, "CJ Logistics", "T-001")])
        .await
        .unwrap();
    app.services
        .waybills
        .upload_waybill(&[WaybillRow {
            action: WaybillAction::Delete,
            execution_no: units[0].execution_no.clone(),
            carrier_name: None,
            tracking_number: None,
        }])
        .await
        .unwrap();
    assert_eq!(stock_of(&app.db, warehouse_id, product_id).await, (100, 5));

    let summary = app
        .services
        .orders
        .cancel_orders(&[order_id], "customer refund")
        .await
        .unwrap();
    assert_eq!(summary.succeeded, 1);

    // Nothing references the order any more, so nothing may stay allocated
    assert_eq!(stock_of(&app.db, warehouse_id, product_id).await, (100, 0));
    let order = app.services.orders.get_order(order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn delete_without_waybill_is_a_skip() {
    let app = spawn_app().await;
    let (_, units, _, _) = confirmed_warehouse_order(&app, 5, 50).await;

    let summary = app
        .services
        .waybills
        .upload_waybill(&[WaybillRow {
            action: WaybillAction::Delete,
            execution_no: units[0].execution_no.clone(),
            carrier_name: None,
            tracking_number: None,
        }])
        .await
        .unwrap();
    assert_eq!(summary.skipped, 1);
}

#[tokio::test]
async fn supplier_sourced_register_leaves_ledger_alone() {
    let app = spawn_app().await;
    let client = seed_client(&app.db, "ACME", None).await;
    let supplier = seed_supplier(&app.db, "S1").await;
    let product = seed_product(&app.db, "P1", false).await;
    seed_mapping(&app.db, client.id, "P1", "no-option", product.id, None).await;
    seed_supplier_product(&app.db, supplier.id, product.id, Decimal::new(500, 2), true).await;
    seed_carrier(&app.db, "CJ", "CJ Logistics").await;

    let result = app
        .services
        .orders
        .create_order(CreateOrderInput {
            client_name: "ACME".into(),
            external_order_no: "EXT-1".into(),
            product_code: "P1".into(),
            option_name: None,
            quantity: 4,
            price: Decimal::ZERO,
            order_date: None,
        })
        .await
        .unwrap();
    let order_id = result.internal_order_id.unwrap();
    app.services.orders.confirm_orders(&[order_id]).await.unwrap();
    app.services
        .purchase_orders
        .create_supplier_orders(&[order_id])
        .await
        .unwrap();

    let units = order_execution::Entity::find()
        .filter(order_execution::Column::InternalOrderId.eq(order_id))
        .all(app.db.as_ref())
        .await
        .unwrap();
    assert_eq!(units[0].status, ExecutionStatus::Instructed);

    let summary = app
        .services
        .waybills
        .upload_waybill(&[register_row(&units[0].execution_no, "CJ Logistics", "T-500")])
        .await
        .unwrap();
    assert_eq!(summary.succeeded, 1);

    let unit = execution(&app.db, &units[0].execution_no).await;
    assert_eq!(unit.status, ExecutionStatus::Shipping);

    let order = app.services.orders.get_order(order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Shipping);
}
