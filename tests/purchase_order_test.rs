mod common;

use common::*;
use roubiz_api::{
    entities::{order_execution, supplier_order, supplier_order_item},
    models::{ExecutionStatus, OrderStatus},
    services::orders::CreateOrderInput,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

async fn confirmed_order(app: &TestApp, client_name: &str, code: &str, quantity: i32) -> Uuid {
    let result = app
        .services
        .orders
        .create_order(CreateOrderInput {
            client_name: client_name.to_owned(),
            external_order_no: format!("EXT-{}", Uuid::new_v4()),
            product_code: code.to_owned(),
            option_name: None,
            quantity,
            price: Decimal::new(9_900, 2),
            order_date: None,
        })
        .await
        .unwrap();
    let order_id = result.internal_order_id.unwrap();
    app.services.orders.confirm_orders(&[order_id]).await.unwrap();
    order_id
}

async fn items_of(db: &DatabaseConnection, supplier_order_id: Uuid) -> Vec<supplier_order_item::Model> {
    supplier_order_item::Entity::find()
        .filter(supplier_order_item::Column::SupplierOrderId.eq(supplier_order_id))
        .all(db)
        .await
        .unwrap()
}

#[tokio::test]
async fn generates_po_and_instructs_supplier_units() {
    let app = spawn_app().await;
    let client = seed_client(&app.db, "ACME", None).await;
    let supplier = seed_supplier(&app.db, "S1").await;
    let product = seed_product(&app.db, "P1", false).await;
    seed_mapping(&app.db, client.id, "P1", "no-option", product.id, None).await;
    seed_supplier_product(&app.db, supplier.id, product.id, Decimal::new(500, 2), true).await;

    let order_id = confirmed_order(&app, "ACME", "P1", 23).await;

    let report = app
        .services
        .purchase_orders
        .create_supplier_orders(&[order_id])
        .await
        .unwrap();
    assert_eq!(report.created.len(), 1);
    let po = &report.created[0];
    assert!(po.po_number.starts_with("PO-"));
    assert_eq!(po.round_no, 1);
    assert_eq!(po.supplier_id, supplier.id);
    assert_eq!(report.orders.succeeded, 1);

    let items = items_of(&app.db, po.id).await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 23);
    assert_eq!(items[0].unit_cost, Decimal::new(500, 2));

    let order = app.services.orders.get_order(order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Ordered);
    let units = order_execution::Entity::find()
        .filter(order_execution::Column::InternalOrderId.eq(order_id))
        .all(app.db.as_ref())
        .await
        .unwrap();
    assert!(units.iter().all(|u| u.status == ExecutionStatus::Instructed));
}

#[tokio::test]
async fn same_day_rounds_increment_per_supplier() {
    let app = spawn_app().await;
    let client = seed_client(&app.db, "ACME", None).await;
    let supplier = seed_supplier(&app.db, "S1").await;
    let product = seed_product(&app.db, "P1", false).await;
    seed_mapping(&app.db, client.id, "P1", "no-option", product.id, None).await;
    seed_supplier_product(&app.db, supplier.id, product.id, Decimal::new(500, 2), true).await;

    let first = confirmed_order(&app, "ACME", "P1", 5).await;
    let report = app
        .services
        .purchase_orders
        .create_supplier_orders(&[first])
        .await
        .unwrap();
    assert_eq!(report.created[0].round_no, 1);

    let second = confirmed_order(&app, "ACME", "P1", 7).await;
    let report = app
        .services
        .purchase_orders
        .create_supplier_orders(&[second])
        .await
        .unwrap();
    assert_eq!(report.created[0].round_no, 2);
}

#[tokio::test]
async fn set_products_explode_into_component_lines() {
    let app = spawn_app().await;
    let client = seed_client(&app.db, "ACME", None).await;
    let supplier = seed_supplier(&app.db, "S1").await;
    let set = seed_product(&app.db, "SET1", true).await;
    let comp_a = seed_product(&app.db, "CA", false).await;
    let comp_b = seed_product(&app.db, "CB", false).await;
    seed_component(&app.db, set.id, comp_a.id, 2).await;
    seed_component(&app.db, set.id, comp_b.id, 3).await;
    seed_mapping(&app.db, client.id, "SET1", "no-option", set.id, None).await;
    seed_supplier_product(&app.db, supplier.id, comp_a.id, Decimal::new(100, 2), true).await;
    seed_supplier_product(&app.db, supplier.id, comp_b.id, Decimal::new(200, 2), true).await;

    let order_id = confirmed_order(&app, "ACME", "SET1", 4).await;
    let report = app
        .services
        .purchase_orders
        .create_supplier_orders(&[order_id])
        .await
        .unwrap();
    assert_eq!(report.created.len(), 1);

    let mut items = items_of(&app.db, report.created[0].id).await;
    items.sort_by_key(|i| i.quantity);
    assert_eq!(items.len(), 2);
    // order qty 4 x component qty 2 and 3
    assert_eq!(items[0].product_id, comp_a.id);
    assert_eq!(items[0].quantity, 8);
    assert_eq!(items[1].product_id, comp_b.id);
    assert_eq!(items[1].quantity, 12);
}

#[tokio::test]
async fn order_without_primary_supplier_fails_without_blocking_batch() {
    let app = spawn_app().await;
    let client = seed_client(&app.db, "ACME", None).await;
    let supplier = seed_supplier(&app.db, "S1").await;
    let mapped = seed_product(&app.db, "P1", false).await;
    let orphan = seed_product(&app.db, "P2", false).await;
    seed_mapping(&app.db, client.id, "P1", "no-option", mapped.id, None).await;
    seed_mapping(&app.db, client.id, "P2", "no-option", orphan.id, None).await;
    seed_supplier_product(&app.db, supplier.id, mapped.id, Decimal::new(500, 2), true).await;
    // Registered, but not primary
    seed_supplier_product(&app.db, supplier.id, orphan.id, Decimal::new(500, 2), false).await;

    let good = confirmed_order(&app, "ACME", "P1", 5).await;
    let bad = confirmed_order(&app, "ACME", "P2", 5).await;

    let report = app
        .services
        .purchase_orders
        .create_supplier_orders(&[good, bad])
        .await
        .unwrap();
    assert_eq!(report.orders.succeeded, 1);
    assert_eq!(report.orders.failed, 1);
    assert_eq!(report.created.len(), 1);

    let bad_order = app.services.orders.get_order(bad).await.unwrap();
    assert_eq!(bad_order.status, OrderStatus::Ready);
}

#[tokio::test]
async fn non_ready_orders_are_skipped() {
    let app = spawn_app().await;
    let client = seed_client(&app.db, "ACME", None).await;
    let product = seed_product(&app.db, "P1", false).await;
    seed_mapping(&app.db, client.id, "P1", "no-option", product.id, None).await;

    // Created but never confirmed: still PENDING
    let result = app
        .services
        .orders
        .create_order(CreateOrderInput {
            client_name: "ACME".into(),
            external_order_no: "EXT-1".into(),
            product_code: "P1".into(),
            option_name: None,
            quantity: 2,
            price: Decimal::ZERO,
            order_date: None,
        })
        .await
        .unwrap();
    let order_id = result.internal_order_id.unwrap();

    let report = app
        .services
        .purchase_orders
        .create_supplier_orders(&[order_id])
        .await
        .unwrap();
    assert_eq!(report.created.len(), 0);
    assert_eq!(report.orders.skipped, 1);
}

#[tokio::test]
async fn cutting_a_round_promotes_next_round_holds() {
    let app = spawn_app().await;
    let client = seed_client(&app.db, "ACME", None).await;
    let supplier = seed_supplier(&app.db, "S1").await;
    let product = seed_product(&app.db, "P1", false).await;
    seed_mapping(&app.db, client.id, "P1", "no-option", product.id, None).await;
    seed_supplier_product(&app.db, supplier.id, product.id, Decimal::new(500, 2), true).await;

    let active = confirmed_order(&app, "ACME", "P1", 5).await;
    let deferred = confirmed_order(&app, "ACME", "P1", 3).await;
    app.services
        .orders
        .hold_orders(&[deferred], "carry to next round", true)
        .await
        .unwrap();

    let report = app
        .services
        .purchase_orders
        .create_supplier_orders(&[active])
        .await
        .unwrap();
    assert_eq!(report.promoted_to_ready, 1);

    let promoted = app.services.orders.get_order(deferred).await.unwrap();
    assert_eq!(promoted.status, OrderStatus::Ready);
    assert!(!promoted.is_next_round);
    assert!(promoted.hold_reason.is_none());
}

#[tokio::test]
async fn promotion_restores_warehouse_allocations() {
    let app = spawn_app().await;
    let client = seed_client(&app.db, "ACME", None).await;
    let supplier = seed_supplier(&app.db, "S1").await;
    let warehouse = seed_warehouse(&app.db, "W").await;
    let supplied = seed_product(&app.db, "P1", false).await;
    let stocked = seed_product(&app.db, "P2", false).await;
    seed_mapping(&app.db, client.id, "P1", "no-option", supplied.id, None).await;
    seed_mapping(&app.db, client.id, "P2", "no-option", stocked.id, Some(warehouse.id)).await;
    seed_supplier_product(&app.db, supplier.id, supplied.id, Decimal::new(500, 2), true).await;
    seed_stock(&app.db, warehouse.id, stocked.id, 50, 0).await;

    let deferred = confirmed_order(&app, "ACME", "P2", 8).await;
    app.services
        .orders
        .hold_orders(&[deferred], "carry to next round", true)
        .await
        .unwrap();
    let row = roubiz_api::entities::warehouse_stock::Entity::find()
        .one(app.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.allocated, 0);

    let active = confirmed_order(&app, "ACME", "P1", 5).await;
    let report = app
        .services
        .purchase_orders
        .create_supplier_orders(&[active])
        .await
        .unwrap();
    assert_eq!(report.promoted_to_ready, 1);

    // Promotion goes through the resume path: READY again means allocated again
    let promoted = app.services.orders.get_order(deferred).await.unwrap();
    assert_eq!(promoted.status, OrderStatus::Ready);
    let row = roubiz_api::entities::warehouse_stock::Entity::find()
        .one(app.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.allocated, 8);
}

#[tokio::test]
async fn promotion_leaves_short_stock_orders_on_hold() {
    let app = spawn_app().await;
    let client = seed_client(&app.db, "ACME", None).await;
    let supplier = seed_supplier(&app.db, "S1").await;
    let warehouse = seed_warehouse(&app.db, "W").await;
    let supplied = seed_product(&app.db, "P1", false).await;
    let stocked = seed_product(&app.db, "P2", false).await;
    seed_mapping(&app.db, client.id, "P1", "no-option", supplied.id, None).await;
    seed_mapping(&app.db, client.id, "P2", "no-option", stocked.id, Some(warehouse.id)).await;
    seed_supplier_product(&app.db, supplier.id, supplied.id, Decimal::new(500, 2), true).await;
    seed_stock(&app.db, warehouse.id, stocked.id, 8, 0).await;

    let deferred = confirmed_order(&app, "ACME", "P2", 8).await;
    app.services
        .orders
        .hold_orders(&[deferred], "carry to next round", true)
        .await
        .unwrap();
    // The freed stock was taken by someone else in the meantime
    app.services
        .inventory
        .adjust_stock(warehouse.id, stocked.id, -6, "sold elsewhere".into())
        .await
        .unwrap();

    let active = confirmed_order(&app, "ACME", "P1", 5).await;
    let report = app
        .services
        .purchase_orders
        .create_supplier_orders(&[active])
        .await
        .unwrap();
    assert_eq!(report.promoted_to_ready, 0);

    let stuck = app.services.orders.get_order(deferred).await.unwrap();
    assert_eq!(stuck.status, OrderStatus::Hold);
    assert!(stuck.is_next_round);
}

#[tokio::test]
async fn cancel_po_keeps_ordered_until_explicit_rollback() {
    let app = spawn_app().await;
    let client = seed_client(&app.db, "ACME", None).await;
    let supplier = seed_supplier(&app.db, "S1").await;
    let product = seed_product(&app.db, "P1", false).await;
    seed_mapping(&app.db, client.id, "P1", "no-option", product.id, None).await;
    seed_supplier_product(&app.db, supplier.id, product.id, Decimal::new(500, 2), true).await;

    let order_id = confirmed_order(&app, "ACME", "P1", 5).await;
    let report = app
        .services
        .purchase_orders
        .create_supplier_orders(&[order_id])
        .await
        .unwrap();
    let po_id = report.created[0].id;

    app.services
        .purchase_orders
        .cancel_supplier_order(po_id)
        .await
        .unwrap();

    assert!(supplier_order::Entity::find_by_id(po_id)
        .one(app.db.as_ref())
        .await
        .unwrap()
        .is_none());
    assert!(items_of(&app.db, po_id).await.is_empty());

    // Deleting the PO does not silently revert the order
    let order = app.services.orders.get_order(order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Ordered);

    // The explicit second step does
    let summary = app.services.orders.rollback_orders(&[order_id]).await.unwrap();
    assert_eq!(summary.succeeded, 1);
    let order = app.services.orders.get_order(order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Ready);
    let units = order_execution::Entity::find()
        .filter(order_execution::Column::InternalOrderId.eq(order_id))
        .all(app.db.as_ref())
        .await
        .unwrap();
    assert!(units.iter().all(|u| u.status == ExecutionStatus::Ready));
}

#[tokio::test]
async fn rollback_leaves_non_ordered_orders_alone() {
    let app = spawn_app().await;
    let client = seed_client(&app.db, "ACME", None).await;
    let product = seed_product(&app.db, "P1", false).await;
    seed_mapping(&app.db, client.id, "P1", "no-option", product.id, None).await;

    let order_id = confirmed_order(&app, "ACME", "P1", 2).await;
    let summary = app.services.orders.rollback_orders(&[order_id]).await.unwrap();
    assert_eq!(summary.skipped, 1);

    let order = app.services.orders.get_order(order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Ready);
}
