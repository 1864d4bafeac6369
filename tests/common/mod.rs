#![allow(dead_code)]

use chrono::Utc;
use roubiz_api::{
    config::AppConfig,
    entities::{
        carrier, carrier_alias, client, product, product_component, product_mapping, supplier,
        supplier_product, warehouse, warehouse_stock,
    },
    events,
    handlers::AppServices,
    migrator::Migrator,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use uuid::Uuid;

pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub services: AppServices,
}

/// Fresh in-memory database with the full schema and a drained event channel.
pub async fn spawn_app() -> TestApp {
    spawn_app_with_url("sqlite::memory:").await
}

/// Same as [`spawn_app`] but against an explicit database URL; used with a
/// tempfile-backed SQLite database when a test needs multiple connections.
pub async fn spawn_app_with_url(url: &str) -> TestApp {
    let mut opt = ConnectOptions::new(url.to_owned());
    // An in-memory SQLite database exists per connection; keep the pool at one.
    let max = if url.contains(":memory:") { 1 } else { 5 };
    opt.max_connections(max).sqlx_logging(false);

    let db = Arc::new(Database::connect(opt).await.expect("connect test db"));
    Migrator::up(db.as_ref(), None).await.expect("migrate test db");

    let (event_sender, mut receiver) = events::channel(256);
    tokio::spawn(async move { while receiver.recv().await.is_some() {} });

    let config = AppConfig::new(
        url.to_owned(),
        "127.0.0.1".to_owned(),
        0,
        "test".to_owned(),
    );
    let services = AppServices::new(db.clone(), event_sender, &config);

    TestApp { db, services }
}

pub async fn seed_client(
    db: &DatabaseConnection,
    name: &str,
    sales_group: Option<&str>,
) -> client::Model {
    client::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_owned()),
        sales_group: Set(sales_group.map(str::to_owned)),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_warehouse(db: &DatabaseConnection, name: &str) -> warehouse::Model {
    warehouse::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_owned()),
        location: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_supplier(db: &DatabaseConnection, name: &str) -> supplier::Model {
    supplier::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_owned()),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_carrier(db: &DatabaseConnection, code: &str, name: &str) -> carrier::Model {
    carrier::ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set(code.to_owned()),
        name: Set(name.to_owned()),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_carrier_alias(
    db: &DatabaseConnection,
    carrier_id: Uuid,
    alias: &str,
) -> carrier_alias::Model {
    carrier_alias::ActiveModel {
        id: Set(Uuid::new_v4()),
        carrier_id: Set(carrier_id),
        alias: Set(alias.to_owned()),
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_product(db: &DatabaseConnection, code: &str, is_set: bool) -> product::Model {
    product::ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set(code.to_owned()),
        name: Set(format!("Product {}", code)),
        standard_cost: Set(Decimal::new(1000, 2)),
        is_set: Set(is_set),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_component(
    db: &DatabaseConnection,
    set_product_id: Uuid,
    component_product_id: Uuid,
    quantity: i32,
) -> product_component::Model {
    product_component::ActiveModel {
        id: Set(Uuid::new_v4()),
        set_product_id: Set(set_product_id),
        component_product_id: Set(component_product_id),
        quantity: Set(quantity),
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_supplier_product(
    db: &DatabaseConnection,
    supplier_id: Uuid,
    product_id: Uuid,
    unit_cost: Decimal,
    is_primary: bool,
) -> supplier_product::Model {
    supplier_product::ActiveModel {
        id: Set(Uuid::new_v4()),
        supplier_id: Set(supplier_id),
        product_id: Set(product_id),
        unit_cost: Set(unit_cost),
        is_primary: Set(is_primary),
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_mapping(
    db: &DatabaseConnection,
    client_id: Uuid,
    product_code: &str,
    option_name: &str,
    product_id: Uuid,
    target_warehouse_id: Option<Uuid>,
) -> product_mapping::Model {
    product_mapping::ActiveModel {
        id: Set(Uuid::new_v4()),
        client_id: Set(client_id),
        client_product_code: Set(product_code.to_owned()),
        client_option_name: Set(option_name.to_owned()),
        product_id: Set(product_id),
        target_warehouse_id: Set(target_warehouse_id),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_stock(
    db: &DatabaseConnection,
    warehouse_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    allocated: i32,
) -> warehouse_stock::Model {
    warehouse_stock::ActiveModel {
        id: Set(Uuid::new_v4()),
        warehouse_id: Set(warehouse_id),
        product_id: Set(product_id),
        quantity: Set(quantity),
        allocated: Set(allocated),
    }
    .insert(db)
    .await
    .unwrap()
}
