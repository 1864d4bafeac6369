//! sea-orm entities, one file per table. Master-data tables (client, warehouse,
//! supplier, carrier, product) are owned by out-of-scope admin surfaces; the core
//! reads them by id or name and surfaces absence as NotFound.

pub mod carrier;
pub mod carrier_alias;
pub mod client;
pub mod client_order;
pub mod internal_order;
pub mod order_execution;
pub mod order_status_history;
pub mod product;
pub mod product_component;
pub mod product_mapping;
pub mod stock_transfer;
pub mod supplier;
pub mod supplier_order;
pub mod supplier_order_item;
pub mod supplier_product;
pub mod warehouse;
pub mod warehouse_stock;
