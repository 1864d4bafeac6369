use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_master_tables::Migration),
            Box::new(m20260101_000002_create_product_tables::Migration),
            Box::new(m20260101_000003_create_order_tables::Migration),
            Box::new(m20260101_000004_create_inventory_tables::Migration),
            Box::new(m20260101_000005_create_supplier_order_tables::Migration),
        ]
    }
}

mod m20260101_000001_create_master_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000001_create_master_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Clients::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Clients::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Clients::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Clients::SalesGroup).string().null())
                        .col(ColumnDef::new(Clients::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Warehouses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Warehouses::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Warehouses::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Warehouses::Location).string().null())
                        .col(ColumnDef::new(Warehouses::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Suppliers::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Suppliers::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Suppliers::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Carriers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Carriers::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Carriers::Code)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Carriers::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Carriers::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CarrierAliases::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CarrierAliases::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CarrierAliases::CarrierId).uuid().not_null())
                        .col(
                            ColumnDef::new(CarrierAliases::Alias)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                CarrierAliases::Table.into_table_ref(),
                Carriers::Table.into_table_ref(),
                Suppliers::Table.into_table_ref(),
                Warehouses::Table.into_table_ref(),
                Clients::Table.into_table_ref(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).to_owned())
                    .await?;
            }
            Ok(())
        }
    }

    #[derive(Iden)]
    pub enum Clients {
        Table,
        Id,
        Name,
        SalesGroup,
        CreatedAt,
    }

    #[derive(Iden)]
    pub enum Warehouses {
        Table,
        Id,
        Name,
        Location,
        CreatedAt,
    }

    #[derive(Iden)]
    pub enum Suppliers {
        Table,
        Id,
        Name,
        CreatedAt,
    }

    #[derive(Iden)]
    pub enum Carriers {
        Table,
        Id,
        Code,
        Name,
        CreatedAt,
    }

    #[derive(Iden)]
    pub enum CarrierAliases {
        Table,
        Id,
        CarrierId,
        Alias,
    }
}

mod m20260101_000002_create_product_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000002_create_product_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Products::Code)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(
                            ColumnDef::new(Products::StandardCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::IsSet)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Products::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductComponents::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductComponents::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductComponents::SetProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductComponents::ComponentProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductComponents::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductMappings::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductMappings::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductMappings::ClientId).uuid().not_null())
                        .col(
                            ColumnDef::new(ProductMappings::ClientProductCode)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductMappings::ClientOptionName)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductMappings::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(ProductMappings::TargetWarehouseId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductMappings::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // One mapping per (channel, product code, option name)
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_product_mappings_lookup")
                        .table(ProductMappings::Table)
                        .col(ProductMappings::ClientId)
                        .col(ProductMappings::ClientProductCode)
                        .col(ProductMappings::ClientOptionName)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SupplierProducts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SupplierProducts::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierProducts::SupplierId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierProducts::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierProducts::UnitCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(SupplierProducts::IsPrimary)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_supplier_products_pair")
                        .table(SupplierProducts::Table)
                        .col(SupplierProducts::SupplierId)
                        .col(SupplierProducts::ProductId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                SupplierProducts::Table.into_table_ref(),
                ProductMappings::Table.into_table_ref(),
                ProductComponents::Table.into_table_ref(),
                Products::Table.into_table_ref(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).to_owned())
                    .await?;
            }
            Ok(())
        }
    }

    #[derive(Iden)]
    pub enum Products {
        Table,
        Id,
        Code,
        Name,
        StandardCost,
        IsSet,
        CreatedAt,
    }

    #[derive(Iden)]
    pub enum ProductComponents {
        Table,
        Id,
        SetProductId,
        ComponentProductId,
        Quantity,
    }

    #[derive(Iden)]
    pub enum ProductMappings {
        Table,
        Id,
        ClientId,
        ClientProductCode,
        ClientOptionName,
        ProductId,
        TargetWarehouseId,
        CreatedAt,
    }

    #[derive(Iden)]
    pub enum SupplierProducts {
        Table,
        Id,
        SupplierId,
        ProductId,
        UnitCost,
        IsPrimary,
    }
}

mod m20260101_000003_create_order_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000003_create_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ClientOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ClientOrders::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ClientOrders::ClientId).uuid().not_null())
                        .col(
                            ColumnDef::new(ClientOrders::ExternalOrderNo)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ClientOrders::ProductCode)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ClientOrders::OptionName).string().not_null())
                        .col(ColumnDef::new(ClientOrders::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(ClientOrders::Price)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ClientOrders::OrderDate)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ClientOrders::IsConverted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InternalOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InternalOrders::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InternalOrders::OrderNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(InternalOrders::ClientOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InternalOrders::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(InternalOrders::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InternalOrders::Status).string().not_null())
                        .col(ColumnDef::new(InternalOrders::HoldReason).string().null())
                        .col(
                            ColumnDef::new(InternalOrders::IsNextRound)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(InternalOrders::TargetShipDate)
                                .date()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InternalOrders::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InternalOrders::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_internal_orders_status")
                        .table(InternalOrders::Table)
                        .col(InternalOrders::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderExecutions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderExecutions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderExecutions::ExecutionNo)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(OrderExecutions::InternalOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderExecutions::SourceType)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderExecutions::WarehouseId).uuid().null())
                        .col(ColumnDef::new(OrderExecutions::SupplierId).uuid().null())
                        .col(
                            ColumnDef::new(OrderExecutions::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderExecutions::Status).string().not_null())
                        .col(ColumnDef::new(OrderExecutions::CarrierId).uuid().null())
                        .col(
                            ColumnDef::new(OrderExecutions::TrackingNumber)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(OrderExecutions::ShippedAt).timestamp().null())
                        .col(
                            ColumnDef::new(OrderExecutions::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderExecutions::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_executions_order")
                        .table(OrderExecutions::Table)
                        .col(OrderExecutions::InternalOrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderStatusHistory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderStatusHistory::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderStatusHistory::InternalOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderStatusHistory::PrevStatus)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderStatusHistory::NewStatus)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderStatusHistory::Reason).string().null())
                        .col(
                            ColumnDef::new(OrderStatusHistory::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                OrderStatusHistory::Table.into_table_ref(),
                OrderExecutions::Table.into_table_ref(),
                InternalOrders::Table.into_table_ref(),
                ClientOrders::Table.into_table_ref(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).to_owned())
                    .await?;
            }
            Ok(())
        }
    }

    #[derive(Iden)]
    pub enum ClientOrders {
        Table,
        Id,
        ClientId,
        ExternalOrderNo,
        ProductCode,
        OptionName,
        Quantity,
        Price,
        OrderDate,
        IsConverted,
    }

    #[derive(Iden)]
    pub enum InternalOrders {
        Table,
        Id,
        OrderNumber,
        ClientOrderId,
        ProductId,
        Quantity,
        Status,
        HoldReason,
        IsNextRound,
        TargetShipDate,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    pub enum OrderExecutions {
        Table,
        Id,
        ExecutionNo,
        InternalOrderId,
        SourceType,
        WarehouseId,
        SupplierId,
        Quantity,
        Status,
        CarrierId,
        TrackingNumber,
        ShippedAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    pub enum OrderStatusHistory {
        Table,
        Id,
        InternalOrderId,
        PrevStatus,
        NewStatus,
        Reason,
        CreatedAt,
    }
}

mod m20260101_000004_create_inventory_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000004_create_inventory_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(WarehouseStocks::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WarehouseStocks::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarehouseStocks::WarehouseId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WarehouseStocks::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(WarehouseStocks::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(WarehouseStocks::Allocated)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await?;

            // One ledger row per (warehouse, product)
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_warehouse_stocks_pair")
                        .table(WarehouseStocks::Table)
                        .col(WarehouseStocks::WarehouseId)
                        .col(WarehouseStocks::ProductId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockTransfers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockTransfers::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransfers::FromWarehouseId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransfers::ToWarehouseId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockTransfers::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockTransfers::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockTransfers::Reason).string().null())
                        .col(
                            ColumnDef::new(StockTransfers::TransferredAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                StockTransfers::Table.into_table_ref(),
                WarehouseStocks::Table.into_table_ref(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).to_owned())
                    .await?;
            }
            Ok(())
        }
    }

    #[derive(Iden)]
    pub enum WarehouseStocks {
        Table,
        Id,
        WarehouseId,
        ProductId,
        Quantity,
        Allocated,
    }

    #[derive(Iden)]
    pub enum StockTransfers {
        Table,
        Id,
        FromWarehouseId,
        ToWarehouseId,
        ProductId,
        Quantity,
        Reason,
        TransferredAt,
    }
}

mod m20260101_000005_create_supplier_order_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000005_create_supplier_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(SupplierOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SupplierOrders::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierOrders::PoNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(SupplierOrders::SupplierId).uuid().not_null())
                        .col(ColumnDef::new(SupplierOrders::RoundNo).integer().not_null())
                        .col(ColumnDef::new(SupplierOrders::OrderDate).date().not_null())
                        .col(
                            ColumnDef::new(SupplierOrders::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_supplier_orders_supplier_date")
                        .table(SupplierOrders::Table)
                        .col(SupplierOrders::SupplierId)
                        .col(SupplierOrders::OrderDate)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SupplierOrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SupplierOrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierOrderItems::SupplierOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierOrderItems::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierOrderItems::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierOrderItems::UnitCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                SupplierOrderItems::Table.into_table_ref(),
                SupplierOrders::Table.into_table_ref(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).to_owned())
                    .await?;
            }
            Ok(())
        }
    }

    #[derive(Iden)]
    pub enum SupplierOrders {
        Table,
        Id,
        PoNumber,
        SupplierId,
        RoundNo,
        OrderDate,
        CreatedAt,
    }

    #[derive(Iden)]
    pub enum SupplierOrderItems {
        Table,
        Id,
        SupplierOrderId,
        ProductId,
        Quantity,
        UnitCost,
    }
}
